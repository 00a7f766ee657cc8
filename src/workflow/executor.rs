use crate::config::ExecutorConfig;
use anyhow::{Context, Result};
use log::{Level, debug, log_enabled};
use std::{
    path::Path,
    process::{Command, Stdio},
    time::{Duration, Instant},
};

/// What an encoder run reported. Informational only: success is judged by
/// whether the output file exists afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: Option<i32>,
    pub elapsed: Duration,
}

pub trait Transcoder {
    /// Runs to completion. No timeout is applied.
    fn transcode(&self, source: &Path, destination: &Path) -> Result<ExitReport>;
}

/// Invokes the external encoder described by an [`ExecutorConfig`].
pub struct HandBrakeTranscoder {
    config: ExecutorConfig,
}

impl HandBrakeTranscoder {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn command(&self, source: &Path, destination: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.args(self.config.arguments(source, destination));
        cmd.stdin(Stdio::null());
        // The encoder's own chatter is only worth seeing when debugging.
        if !log_enabled!(Level::Debug) {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        cmd
    }
}

impl Transcoder for HandBrakeTranscoder {
    fn transcode(&self, source: &Path, destination: &Path) -> Result<ExitReport> {
        let mut cmd = self.command(source, destination);
        debug!("Running {:?}", cmd);

        let start = Instant::now();
        let status = cmd.status().with_context(|| {
            format!(
                "failed to spawn encoder {:?} for {:?}",
                self.config.binary_path, source
            )
        })?;

        Ok(ExitReport {
            code: status.code(),
            elapsed: start.elapsed(),
        })
    }
}
