use anyhow::Result;
use recast::config::RunConfig;
use recast::workflow::{
    self,
    executor::{ExitReport, Transcoder},
    report::{Decision, FailureKind},
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Barrier, Mutex},
    thread,
    time::Duration,
};
use tempfile::TempDir;

/// Stands in for the encoder: records each call and writes the output when
/// `produce` is set.
struct FakeEncoder {
    produce: bool,
    calls: Mutex<Vec<PathBuf>>,
}

impl FakeEncoder {
    fn producing() -> Self {
        Self {
            produce: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn broken() -> Self {
        Self {
            produce: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transcoder for FakeEncoder {
    fn transcode(&self, source: &Path, destination: &Path) -> Result<ExitReport> {
        self.calls.lock().unwrap().push(source.to_path_buf());
        if self.produce {
            fs::write(destination, b"hevc")?;
        }
        Ok(ExitReport {
            code: Some(0),
            elapsed: Duration::ZERO,
        })
    }
}

struct Roots {
    _dir: TempDir,
    source: PathBuf,
    logs: PathBuf,
    archive: PathBuf,
}

impl Roots {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        let roots = Self {
            source: base.join("rec"),
            logs: base.join("logs"),
            archive: base.join("archive"),
            _dir: dir,
        };
        for d in [&roots.source, &roots.logs, &roots.archive] {
            fs::create_dir_all(d).unwrap();
        }
        roots
    }

    fn recording(&self, relative: &str) -> PathBuf {
        let path = self.source.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"mpeg-ts").unwrap();
        path
    }

    fn config(&self, worker: &str) -> RunConfig {
        RunConfig {
            source_root: self.source.clone(),
            log_root: self.logs.clone(),
            archive_root: self.archive.clone(),
            worker_id: worker.to_string(),
            dry_run: false,
        }
    }

    fn archived(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.archive)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[test]
fn fresh_tree_is_converted_and_archived_in_path_order() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    let b = roots.recording("B.ts");
    fs::write(roots.source.join("A.log"), b"recorder").unwrap();
    let encoder = FakeEncoder::producing();

    let summary = workflow::run(&roots.config("w1"), &encoder).unwrap();

    assert_eq!(
        summary.decisions(),
        &[Decision::Processed(a.clone()), Decision::Processed(b.clone())]
    );
    assert_eq!(encoder.calls(), vec![a.clone(), b.clone()]);
    assert_eq!(roots.archived(), vec!["A.log", "A.ts", "B.ts"]);
    assert!(!a.exists() && !b.exists());
    assert!(roots.source.join("A.m4v").exists());
    assert!(roots.source.join("B.m4v").exists());
    assert!(roots.logs.join("A.claim").exists());
    assert!(roots.logs.join("B.claim").exists());
}

#[test]
fn existing_marker_skips_only_that_recording() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    let b = roots.recording("B.ts");
    fs::write(roots.logs.join("A.claim"), "other-host:7  /elsewhere/A.m4v\n").unwrap();
    let encoder = FakeEncoder::producing();

    let summary = workflow::run(&roots.config("w1"), &encoder).unwrap();

    assert_eq!(
        summary.decisions(),
        &[
            Decision::SkippedAlreadyClaimed(a.clone()),
            Decision::Processed(b.clone())
        ]
    );
    assert_eq!(encoder.calls(), vec![b]);
    assert!(a.exists());
    assert_eq!(roots.archived(), vec!["B.ts"]);
}

#[test]
fn existing_output_is_claimed_but_neither_converted_nor_archived() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    fs::write(roots.source.join("A.m4v"), b"converted earlier").unwrap();
    let encoder = FakeEncoder::producing();

    let summary = workflow::run(&roots.config("w1"), &encoder).unwrap();

    assert_eq!(summary.decisions(), &[Decision::SkippedOutputExists(a.clone())]);
    assert!(encoder.calls().is_empty());
    assert!(a.exists());
    assert!(roots.archived().is_empty());
    assert!(roots.logs.join("A.claim").exists());
}

#[test]
fn failed_conversion_leaves_source_sidecar_and_marker() {
    let roots = Roots::new();
    let a = roots.recording("nested/A.ts");
    let sidecar = roots.source.join("nested/A.log");
    fs::write(&sidecar, b"recorder").unwrap();
    let encoder = FakeEncoder::broken();

    let summary = workflow::run(&roots.config("w1"), &encoder).unwrap();

    assert_eq!(summary.failed(), 1);
    let line = summary.decisions()[0].to_string();
    assert!(line.starts_with("TranscodeFailed: "), "{}", line);
    assert!(line.contains("A.claim"), "{}", line);
    assert!(a.exists());
    assert!(sidecar.exists());
    assert!(roots.logs.join("A.claim").exists());
    assert!(roots.archived().is_empty());
}

#[test]
fn archive_collision_is_reported_and_the_run_continues() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    let b = roots.recording("B.ts");
    fs::write(roots.archive.join("A.ts"), b"older copy").unwrap();
    let encoder = FakeEncoder::producing();

    let summary = workflow::run(&roots.config("w1"), &encoder).unwrap();

    let decisions = summary.decisions();
    assert_eq!(decisions.len(), 2);
    match &decisions[0] {
        Decision::Failed { path, kind, .. } => {
            assert_eq!(path, &a);
            assert_eq!(*kind, FailureKind::ArchiveFailed);
        }
        other => panic!("unexpected decision {:?}", other),
    }
    assert_eq!(decisions[1], Decision::Processed(b));
    assert!(a.exists());
    assert!(roots.source.join("A.m4v").exists());
    assert_eq!(fs::read(roots.archive.join("A.ts")).unwrap(), b"older copy");
    assert_eq!(summary.failed(), 1);
}

#[test]
fn unusable_marker_namespace_fails_each_claim_without_converting() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    let b = roots.recording("B.ts");
    let mut config = roots.config("w1");
    config.log_root = roots.logs.join("not-a-directory");
    fs::write(&config.log_root, b"").unwrap();
    let encoder = FakeEncoder::producing();

    let summary = workflow::run(&config, &encoder).unwrap();

    let failures: Vec<(PathBuf, FailureKind)> = summary
        .decisions()
        .iter()
        .map(|d| match d {
            Decision::Failed { path, kind, .. } => (path.clone(), *kind),
            other => panic!("unexpected decision {:?}", other),
        })
        .collect();
    assert_eq!(
        failures,
        vec![(a.clone(), FailureKind::ClaimFailed), (b.clone(), FailureKind::ClaimFailed)]
    );
    assert!(encoder.calls().is_empty());
    assert!(a.exists() && b.exists());
    assert!(roots.archived().is_empty());
}

#[test]
fn failed_recording_is_retried_only_after_marker_deletion() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    let broken = FakeEncoder::broken();
    workflow::run(&roots.config("w1"), &broken).unwrap();

    let encoder = FakeEncoder::producing();
    let rerun = workflow::run(&roots.config("w1"), &encoder).unwrap();
    assert_eq!(rerun.decisions(), &[Decision::SkippedAlreadyClaimed(a.clone())]);
    assert!(encoder.calls().is_empty());

    fs::remove_file(roots.logs.join("A.claim")).unwrap();
    let retry = workflow::run(&roots.config("w1"), &encoder).unwrap();
    assert_eq!(retry.decisions(), &[Decision::Processed(a)]);
    assert_eq!(roots.archived(), vec!["A.ts"]);
}

#[test]
fn second_run_over_unchanged_tree_does_no_work() {
    let roots = Roots::new();
    roots.recording("A.ts");
    roots.recording("sub/B.ts");
    fs::write(roots.source.join("A.m4v"), b"converted earlier").unwrap();
    let encoder = FakeEncoder::producing();

    workflow::run(&roots.config("w1"), &encoder).unwrap();
    let calls_after_first = encoder.calls().len();
    let archived_after_first = roots.archived();

    let second = workflow::run(&roots.config("w1"), &encoder).unwrap();
    assert_eq!(encoder.calls().len(), calls_after_first);
    assert_eq!(roots.archived(), archived_after_first);
    assert_eq!(second.processed(), 0);
    assert_eq!(second.failed(), 0);
}

#[test]
fn dry_run_changes_nothing() {
    let roots = Roots::new();
    let a = roots.recording("A.ts");
    let b = roots.recording("B.ts");
    let c = roots.recording("C.ts");
    fs::write(roots.logs.join("A.claim"), b"").unwrap();
    fs::write(roots.source.join("B.m4v"), b"").unwrap();
    let encoder = FakeEncoder::producing();
    let mut config = roots.config("w1");
    config.dry_run = true;

    let summary = workflow::run(&config, &encoder).unwrap();

    assert_eq!(
        summary.decisions(),
        &[
            Decision::SkippedAlreadyClaimed(a),
            Decision::SkippedOutputExists(b),
            Decision::WouldProcess(c.clone()),
        ]
    );
    assert!(encoder.calls().is_empty());
    assert!(c.exists());
    assert!(!roots.logs.join("C.claim").exists());
    assert!(roots.archived().is_empty());
}

#[test]
fn unreachable_source_root_aborts_the_run() {
    let roots = Roots::new();
    let mut config = roots.config("w1");
    config.source_root = roots.source.join("unmounted");
    let encoder = FakeEncoder::producing();

    let err = workflow::run(&config, &encoder).unwrap_err();
    assert_eq!(err.root, config.source_root);
    assert!(encoder.calls().is_empty());
}

#[test]
fn concurrent_workers_convert_each_recording_once() {
    let roots = Arc::new(Roots::new());
    let recordings: Vec<PathBuf> = (0..24)
        .map(|i| roots.recording(&format!("d{}/rec-{:02}.ts", i % 3, i)))
        .collect();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["alpha", "beta"]
        .into_iter()
        .map(|worker| {
            let roots = Arc::clone(&roots);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let encoder = FakeEncoder::producing();
                let config = roots.config(worker);
                barrier.wait();
                let summary = workflow::run(&config, &encoder).unwrap();
                (summary, encoder.calls())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let mut converted: Vec<PathBuf> = results.iter().flat_map(|(_, calls)| calls.clone()).collect();
    converted.sort();
    let mut expected = recordings.clone();
    expected.sort();
    assert_eq!(converted, expected);

    let processed: usize = results.iter().map(|(s, _)| s.processed()).sum();
    let failed: usize = results.iter().map(|(s, _)| s.failed()).sum();
    assert_eq!(processed, recordings.len());
    assert_eq!(failed, 0);
    assert_eq!(roots.archived().len(), recordings.len());
}
