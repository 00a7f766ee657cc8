//! Enumerates recordings under the source root.
//!
//! Entries are visited depth-first with siblings sorted by file name, which
//! yields candidates in ascending [`Path`] order without collecting the tree
//! first. Workers scanning the same tree therefore walk it in the same order.

use crate::common::{SOURCE_EXTENSION, errors::DiscoveryError};
use crate::workflow::types::Candidate;
use log::{trace, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

pub struct Discovery {
    root: PathBuf,
}

impl Discovery {
    /// Resolves the root to an absolute path and checks that it can be listed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        let root = root.as_ref();
        let to_error = |source| DiscoveryError {
            root: root.to_path_buf(),
            source,
        };
        let root = fs::canonicalize(root).map_err(to_error)?;
        fs::read_dir(&root).map_err(to_error)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts a fresh walk. Calling it again rescans the tree from the top.
    pub fn scan(&self) -> impl Iterator<Item = Candidate> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable entry under {:?}: {}", self.root, err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_source_file(entry.path()))
            .filter_map(|entry| {
                trace!("Found candidate {:?}", entry.path());
                Candidate::new(entry.into_path())
            })
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}
