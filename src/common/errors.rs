use log::error;
use std::path::PathBuf;
use thiserror::Error;

/// The source root could not be read. Nothing can be processed.
#[derive(Debug, Error)]
#[error("source root {root:?} is unreachable")]
pub struct DiscoveryError {
    pub root: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The encoder ran, but no output artifact appeared.
#[derive(Debug, Error)]
#[error("transcode produced no output for {source_path:?}; delete {marker:?} to retry")]
pub struct TranscodeFailed {
    pub source_path: PathBuf,
    pub marker: PathBuf,
}

/// Logs the whole context chain and hands the error back to the caller.
pub fn handle_error(error: anyhow::Error) -> anyhow::Error {
    let chain = error
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n  caused by: ");
    error!("{}", chain);
    error
}
