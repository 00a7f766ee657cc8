//! Cross-worker claims over a shared directory.
//!
//! A claim is a marker file named after the candidate's stem. Creating it with
//! `create_new` is the only synchronization between workers: the first create
//! wins and every later attempt sees `AlreadyExists`. Markers are never removed
//! here; deleting one is how an operator asks for a retry.
//!
//! Exclusive create is only as atomic as the filesystem makes it. Local
//! filesystems and NFSv3+ honour it; some SMB and FUSE mounts do not, and two
//! workers on such a mount can both win.

use crate::common::MARKER_EXTENSION;
use crate::workflow::types::Candidate;
use anyhow::{Context, Result, anyhow};
use log::{debug, trace, warn};
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Separator between worker identity and destination in a marker line.
const FIELD_SEPARATOR: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub path: PathBuf,
    pub worker_id: String,
    pub destination: PathBuf,
}

impl Marker {
    fn line(&self) -> String {
        format!(
            "{}{}{}\n",
            self.worker_id,
            FIELD_SEPARATOR,
            self.destination.display()
        )
    }

    /// Parses a marker back for diagnostics. Content never decides whether a
    /// claim is held.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read marker {:?}", path))?;
        let line = content.lines().next().unwrap_or_default();
        let (worker_id, destination) = line
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| anyhow!("malformed marker {:?}: {:?}", path, line))?;
        Ok(Self {
            path: path.to_path_buf(),
            worker_id: worker_id.to_string(),
            destination: PathBuf::from(destination),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(Marker),
    /// `owner` is the worker recorded in the marker, when it can be read.
    AlreadyClaimed {
        marker: PathBuf,
        owner: Option<String>,
    },
}

pub struct ClaimCoordinator {
    log_root: PathBuf,
    worker_id: String,
}

impl ClaimCoordinator {
    pub fn new(log_root: impl Into<PathBuf>, worker_id: impl Into<String>) -> Self {
        Self {
            log_root: log_root.into(),
            worker_id: worker_id.into(),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn marker_path(&self, candidate: &Candidate) -> PathBuf {
        let mut name = candidate.stem().to_os_string();
        name.push(".");
        name.push(MARKER_EXTENSION);
        self.log_root.join(name)
    }

    /// Presence check only. Used by dry runs, which must not create markers.
    pub fn is_claimed(&self, candidate: &Candidate) -> bool {
        self.marker_path(candidate).exists()
    }

    pub fn try_claim(&self, candidate: &Candidate) -> Result<ClaimOutcome> {
        let path = self.marker_path(candidate);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                let owner = match Marker::read(&path) {
                    Ok(existing) => {
                        debug!(
                            worker = existing.worker_id.as_str();
                            "{:?} is held by {}", candidate.path(), existing.worker_id
                        );
                        Some(existing.worker_id)
                    }
                    Err(err) => {
                        trace!(
                            "{:?} is claimed by an unreadable marker: {:#}",
                            candidate.path(),
                            err
                        );
                        None
                    }
                };
                return Ok(ClaimOutcome::AlreadyClaimed {
                    marker: path,
                    owner,
                });
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to create marker {:?}", path));
            }
        };

        let marker = Marker {
            path,
            worker_id: self.worker_id.clone(),
            destination: candidate.output_path(),
        };

        // The claim is already held once the file exists.
        if let Err(err) = file
            .write_all(marker.line().as_bytes())
            .and_then(|_| file.sync_all())
        {
            warn!(
                "Claimed {:?} but could not record the owner in {:?}: {}",
                candidate.path(),
                marker.path,
                err
            );
        }

        Ok(ClaimOutcome::Claimed(marker))
    }
}
