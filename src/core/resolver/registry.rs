//! Files already chosen as kept during one resolution pass.
//!
//! Created empty when resolution starts and only ever grows. Owned by the
//! resolver's single-threaded loop, so no locking.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct ResolutionState {
    kept: HashSet<PathBuf>,
    kept_per_folder: BTreeMap<PathBuf, usize>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_kept(&self, path: &Path) -> bool {
        self.kept.contains(path)
    }

    /// Mark a file kept and count it against its folder.
    ///
    /// Returns false if the file was already kept; counts are unchanged then.
    pub fn mark_kept(&mut self, path: &Path) -> bool {
        if !self.kept.insert(path.to_path_buf()) {
            return false;
        }

        let folder = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
        *self.kept_per_folder.entry(folder).or_insert(0) += 1;
        true
    }

    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    /// Kept-file count per containing folder, sorted by folder
    pub fn into_kept_per_folder(self) -> BTreeMap<PathBuf, usize> {
        self.kept_per_folder
    }
}
