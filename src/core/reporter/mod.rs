//! # Reporter Module
//!
//! Turns a finished run into a report: the keep/delete decisions in the
//! order they were made, how many files were kept per folder, and the run
//! totals.
//!
//! ## Formats
//! - **TSV**: one `keep\tdelete\tssim\trule` row per decision, for scripts
//! - **JSON**: the whole report, pretty-printed

mod export;

pub use export::{write_json, write_report, write_tsv, ExportFormat};

use crate::core::pipeline::PipelineResult;
use crate::core::resolver::{DuplicateAction, Resolution, SkipCounts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete report of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    pub action: DuplicateAction,
    /// Decisions in resolution order
    pub resolutions: Vec<Resolution>,
    /// Kept files per folder, sorted by folder
    pub folders: Vec<FolderSummary>,
    pub totals: RunTotals,
    /// Non-fatal errors
    pub errors: Vec<String>,
}

/// Number of files kept in one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    pub folder: PathBuf,
    pub kept: usize,
}

/// Counters for the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub authoritative_photos: usize,
    pub disposable_photos: usize,
    pub features_extracted: usize,
    pub comparisons: usize,
    pub matched_pairs: usize,
    pub resolved_pairs: usize,
    pub skipped: SkipCounts,
    pub errors: usize,
    pub duration_ms: u64,
}

impl Report {
    /// Build a report for a finished run, stamped with the current time
    pub fn new(result: &PipelineResult, threshold: f64, action: DuplicateAction) -> Self {
        let folders = result
            .kept_per_folder
            .iter()
            .map(|(folder, &kept)| FolderSummary {
                folder: folder.clone(),
                kept,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            threshold,
            action,
            resolutions: result.resolutions.clone(),
            folders,
            totals: RunTotals {
                authoritative_photos: result.authoritative_photos,
                disposable_photos: result.disposable_photos,
                features_extracted: result.features_extracted,
                comparisons: result.total_comparisons,
                matched_pairs: result.matched_pairs,
                resolved_pairs: result.resolutions.len(),
                skipped: result.skipped,
                errors: result.errors.len(),
                duration_ms: result.duration_ms,
            },
            errors: result.errors.clone(),
        }
    }

    /// One-line summary for the terminal
    pub fn summary(&self) -> String {
        let photos = self.totals.authoritative_photos + self.totals.disposable_photos;
        match self.resolutions.len() {
            0 => format!("No duplicates found among {} photos", photos),
            1 => format!("1 duplicate found among {} photos", photos),
            n => format!("{} duplicates found among {} photos", n, photos),
        }
    }
}
