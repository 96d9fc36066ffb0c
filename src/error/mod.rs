//! # Error Module
//!
//! Error types for the near-duplicate resolver.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Soft vs fatal** - scan and decode errors are collected and the run
//!   continues; a failing duplicate handler aborts the run

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that end a run.
///
/// Scan and decode failures never appear here; the pipeline collects them
/// in its result and keeps going.
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur during photo scanning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while turning a file into pixels or features
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to resize image: {0}")]
    ResizeFailed(String),

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while resolving matched pairs
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid threshold: {value} (must be between 0 and 1)")]
    InvalidThreshold { value: f64 },

    #[error("Duplicate handler failed for {delete} (kept {keep}): {source}")]
    HandlerFailed {
        keep: PathBuf,
        delete: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while writing a report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DedupError>;
