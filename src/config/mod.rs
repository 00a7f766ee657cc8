//! Run configuration.
//!
//! Paths and toggles come from the command line (each backed by an environment
//! variable). Encoder overrides come from `RECAST_*` variables and are merged
//! with the platform defaults exactly once, producing an [`ExecutorConfig`].

use crate::common::{
    DEFAULT_ARGUMENT_TEMPLATE, DEFAULT_ENCODER_PATH, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER,
    UNKNOWN_HOST,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use serde::Deserialize;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "recast",
    version,
    about = "Convert .ts recordings to .m4v, coordinating with other workers through marker files"
)]
pub struct Cli {
    /// Root of the recording tree to scan
    #[arg(long, env = "RECAST_SOURCE")]
    pub source: PathBuf,

    /// Shared directory holding claim markers
    #[arg(long, env = "RECAST_LOGS")]
    pub logs: PathBuf,

    /// Directory receiving originals after a successful conversion
    #[arg(long, env = "RECAST_ARCHIVE")]
    pub archive: PathBuf,

    /// Identity written into markers (defaults to `<hostname>:<pid>`)
    #[arg(long, env = "RECAST_WORKER_ID")]
    pub worker_id: Option<String>,

    /// More diagnostics; repeat for trace output
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Report decisions without claiming, converting or moving anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn into_run_config(self) -> RunConfig {
        let worker_id = self.worker_id.unwrap_or_else(default_worker_id);
        RunConfig {
            source_root: self.source,
            log_root: self.logs,
            archive_root: self.archive,
            worker_id,
            dry_run: self.dry_run,
        }
    }
}

/// Everything one pass over the source tree needs, apart from the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source_root: PathBuf,
    pub log_root: PathBuf,
    pub archive_root: PathBuf,
    pub worker_id: String,
    pub dry_run: bool,
}

pub fn default_worker_id() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string());
    format!("{}:{}", host, std::process::id())
}

/// Encoder overrides read from `RECAST_ENCODER` and `RECAST_ENCODER_PRESET`.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
pub struct EncoderEnv {
    pub encoder: Option<PathBuf>,
    pub encoder_preset: Option<String>,
}

impl EncoderEnv {
    pub fn from_env() -> Result<Self> {
        envy::prefixed("RECAST_")
            .from_env::<EncoderEnv>()
            .context("failed to read RECAST_ENCODER* environment variables")
    }
}

/// The encoder binary and the argument template it is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub binary_path: PathBuf,
    pub argument_template: Vec<String>,
}

impl ExecutorConfig {
    pub fn resolve(env: &EncoderEnv) -> Self {
        let binary_path = env
            .encoder
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENCODER_PATH));

        let mut argument_template: Vec<String> = DEFAULT_ARGUMENT_TEMPLATE
            .iter()
            .map(|arg| arg.to_string())
            .collect();
        if let Some(preset) = &env.encoder_preset {
            argument_template.push("--preset".to_string());
            argument_template.push(preset.clone());
        }

        Self {
            binary_path,
            argument_template,
        }
    }

    /// Substitutes the input and output paths into the template.
    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<OsString> {
        self.argument_template
            .iter()
            .map(|arg| match arg.as_str() {
                INPUT_PLACEHOLDER => input.as_os_str().to_os_string(),
                OUTPUT_PLACEHOLDER => output.as_os_str().to_os_string(),
                other => OsString::from(other),
            })
            .collect()
    }
}
