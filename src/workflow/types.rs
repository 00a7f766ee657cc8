use crate::common::{OUTPUT_EXTENSION, SIDECAR_EXTENSION};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

/// A recording eligible for conversion, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate {
    path: PathBuf,
}

impl Candidate {
    /// Returns `None` for paths without a parent directory or a file stem.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        path.parent()?;
        path.file_stem()?;
        Some(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stem(&self) -> &OsStr {
        self.path.file_stem().unwrap_or_default()
    }

    /// The converted artifact: same directory, same stem, `.m4v`.
    pub fn output_path(&self) -> PathBuf {
        self.path.with_extension(OUTPUT_EXTENSION)
    }

    /// The recorder's sidecar log: same directory, same stem, `.log`.
    pub fn sidecar_path(&self) -> PathBuf {
        self.path.with_extension(SIDECAR_EXTENSION)
    }
}
