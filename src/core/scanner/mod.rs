//! # Scanner Module
//!
//! Discovers candidate photo files in the folders of one pool.
//!
//! Only regular files whose extension is on the allow-list are returned
//! (case-insensitive, `jpg` and `jpeg` by default). Paths are canonical,
//! sorted and free of repeats, so a folder listed twice, spelled two ways,
//! or nested inside another listed folder contributes each file once.
//!
//! ## Example
//! ```rust,ignore
//! use ssim_dedup::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/Users/me/Pictures".into()]);
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use std::path::PathBuf;

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Canonical paths of the discovered photos, sorted
    pub photos: Vec<PathBuf>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}
