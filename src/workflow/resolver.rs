//! What happens to a candidate once this worker holds its claim.
//!
//! ```text
//! CheckOutput ──exists──▶ SkippedOutputExists
//!      │
//!      ▼
//! Transcoding ──▶ Verify ──exists──▶ Archive ──▶ Processed
//!                    │
//!                    └──missing──▶ Failed (source stays, marker stays)
//! ```

use crate::common::errors::TranscodeFailed;
use crate::workflow::{claim::Marker, executor::Transcoder, types::Candidate};
use anyhow::{Context, Result, anyhow, bail};
use log::{error, info, warn};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum Outcome {
    Processed {
        archived: PathBuf,
        sidecar: Option<PathBuf>,
    },
    SkippedOutputExists,
    Failed(TranscodeFailed),
}

pub struct OutcomeResolver<'a, T: Transcoder + ?Sized> {
    transcoder: &'a T,
    archive_root: &'a Path,
}

impl<'a, T: Transcoder + ?Sized> OutcomeResolver<'a, T> {
    pub fn new(transcoder: &'a T, archive_root: &'a Path) -> Self {
        Self {
            transcoder,
            archive_root,
        }
    }

    /// Must only be called for a candidate this worker has just claimed.
    ///
    /// `Err` means the archive step failed after a good transcode; the output
    /// exists and whatever could not be moved is still at the source.
    pub fn resolve(&self, candidate: &Candidate, marker: &Marker) -> Result<Outcome> {
        let source = candidate.path().display().to_string();
        let output = candidate.output_path();
        if output.exists() {
            info!(path = source.as_str(); "Output {:?} already exists, not converting", output);
            return Ok(Outcome::SkippedOutputExists);
        }

        info!(path = source.as_str(); "Converting {:?} -> {:?}", candidate.path(), output);
        match self.transcoder.transcode(candidate.path(), &output) {
            Ok(report) => {
                info!(
                    path = source.as_str(), duration = &*format!("{:?}", report.elapsed);
                    "Encoder finished for {:?} with code {:?}",
                    candidate.path(),
                    report.code
                );
            }
            Err(err) => {
                error!(
                    path = source.as_str();
                    "Encoder did not run for {:?}: {:#}",
                    candidate.path(),
                    err
                );
            }
        }

        if !output.exists() {
            let failure = TranscodeFailed {
                source_path: candidate.path().to_path_buf(),
                marker: marker.path.clone(),
            };
            warn!(path = source.as_str(); "{}", failure);
            return Ok(Outcome::Failed(failure));
        }

        let archived = move_to_archive(candidate.path(), self.archive_root)
            .with_context(|| format!("failed to archive {:?}", candidate.path()))?;
        info!(path = source.as_str(); "Archived {:?} to {:?}", candidate.path(), archived);

        let sidecar_path = candidate.sidecar_path();
        let sidecar = if sidecar_path.exists() {
            let moved = move_to_archive(&sidecar_path, self.archive_root)
                .with_context(|| format!("failed to archive sidecar log {:?}", sidecar_path))?;
            info!(path = source.as_str(); "Archived sidecar log {:?}", sidecar_path);
            Some(moved)
        } else {
            info!(path = source.as_str(); "No sidecar log at {:?}", sidecar_path);
            None
        };

        Ok(Outcome::Processed { archived, sidecar })
    }
}

/// Moves `path` into `archive_root`, keeping its file name. Refuses to replace
/// an existing archive entry.
pub fn move_to_archive(path: &Path, archive_root: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("{:?} has no file name", path))?;
    let target = archive_root.join(file_name);
    if target.exists() {
        bail!("archive already holds {:?}", target);
    }

    match fs::rename(path, &target) {
        Ok(()) => Ok(target),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            copy_then_remove(path, &target)?;
            Ok(target)
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to move {:?} to {:?}", path, target))
        }
    }
}

fn copy_then_remove(path: &Path, target: &Path) -> Result<()> {
    let mut reader =
        File::open(path).with_context(|| format!("failed to open {:?} for copying", path))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .with_context(|| format!("failed to create {:?}", target))?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.sync_all().map(|_| n));
    if let Err(err) = copied {
        drop(writer);
        let _ = fs::remove_file(target);
        return Err(err).with_context(|| format!("failed to copy {:?} to {:?}", path, target));
    }

    fs::remove_file(path)
        .with_context(|| format!("copied {:?} but failed to remove the original", path))
}
