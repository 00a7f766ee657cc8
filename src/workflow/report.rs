use crate::common::{SUMMARY_FOOTER, SUMMARY_HEADER};
use chrono::{DateTime, Local, SecondsFormat};
use std::{fmt, path::PathBuf};

/// Why a candidate ended up in the summary as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The marker could not be created for a reason other than "already exists".
    ClaimFailed,
    /// The encoder ran (or tried to) and left no output.
    TranscodeFailed,
    /// The output exists but the original could not be moved to the archive.
    ArchiveFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ClaimFailed => "ClaimFailed",
            FailureKind::TranscodeFailed => "TranscodeFailed",
            FailureKind::ArchiveFailed => "ArchiveFailed",
        };
        f.write_str(name)
    }
}

/// One line of the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Processed(PathBuf),
    SkippedOutputExists(PathBuf),
    SkippedAlreadyClaimed(PathBuf),
    /// Dry runs only.
    WouldProcess(PathBuf),
    /// `detail` tells the operator what went wrong or what to do.
    Failed {
        path: PathBuf,
        kind: FailureKind,
        detail: String,
    },
}

impl Decision {
    pub fn is_failure(&self) -> bool {
        matches!(self, Decision::Failed { .. })
    }

    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Decision::SkippedOutputExists(_) | Decision::SkippedAlreadyClaimed(_)
        )
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Processed(path) => write!(f, "Processed: {}", path.display()),
            Decision::SkippedOutputExists(path) => {
                write!(f, "SkippedOutputExists: {}", path.display())
            }
            Decision::SkippedAlreadyClaimed(path) => {
                write!(f, "SkippedAlreadyClaimed: {}", path.display())
            }
            Decision::WouldProcess(path) => write!(f, "WouldProcess: {}", path.display()),
            Decision::Failed { path, kind, detail } => {
                write!(f, "{}: {} ({})", kind, path.display(), detail)
            }
        }
    }
}

/// Per-run record of decisions in arrival order, plus start and end times.
#[derive(Debug, Clone)]
pub struct RunSummary {
    started: DateTime<Local>,
    finished: Option<DateTime<Local>>,
    dry_run: bool,
    decisions: Vec<Decision>,
}

impl RunSummary {
    pub fn start(dry_run: bool) -> Self {
        Self {
            started: Local::now(),
            finished: None,
            dry_run,
            decisions: Vec::new(),
        }
    }

    pub fn record(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    pub fn finish(mut self) -> Self {
        self.finished = Some(Local::now());
        self
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn processed(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, Decision::Processed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.decisions.iter().filter(|d| d.is_skip()).count()
    }

    pub fn failed(&self) -> usize {
        self.decisions.iter().filter(|d| d.is_failure()).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SUMMARY_HEADER)?;
        if self.dry_run {
            writeln!(f, "dry run: nothing was claimed, converted or moved")?;
        }
        writeln!(
            f,
            "started:  {}",
            self.started.to_rfc3339_opts(SecondsFormat::Secs, false)
        )?;
        for decision in &self.decisions {
            writeln!(f, "{}", decision)?;
        }
        if let Some(finished) = self.finished {
            writeln!(
                f,
                "finished: {}",
                finished.to_rfc3339_opts(SecondsFormat::Secs, false)
            )?;
        }
        writeln!(
            f,
            "processed={} skipped={} failed={}",
            self.processed(),
            self.skipped(),
            self.failed()
        )?;
        write!(f, "{}", SUMMARY_FOOTER)
    }
}
