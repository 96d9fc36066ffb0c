//! Memory-mapped reads for large image files.

use crate::error::DecodeError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Files at least this large are mapped instead of read (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// File contents, either owned or memory-mapped
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

/// Read a whole file, mapping it when it is large.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, DecodeError> {
    let io_error = |source| DecodeError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();

    if len < MMAP_THRESHOLD {
        return std::fs::read(path).map(FileBytes::Vec).map_err(io_error);
    }

    // SAFETY: the mapping is read-only and dropped before the decode returns.
    // A file truncated concurrently is a decode failure like any other.
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
    Ok(FileBytes::Mmap(mmap))
}
