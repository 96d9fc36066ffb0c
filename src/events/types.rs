//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the resolver pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Feature extraction phase events
    Extract(ExtractEvent),
    /// Pair comparison phase events
    Compare(CompareEvent),
    /// Resolution phase events
    Resolve(ResolveEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A photo was found
    PhotoFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_photos: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of photos found so far
    pub photos_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events during feature extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractEvent {
    /// Extraction has started
    Started { total_photos: usize },
    /// Progress update during extraction
    Progress(ExtractProgress),
    /// A photo could not be decoded; it is left out of the comparison
    Error { path: PathBuf, message: String },
    /// Extraction completed
    Completed { total_extracted: usize },
}

/// Progress information during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractProgress {
    /// Number of photos processed so far
    pub completed: usize,
    /// Total number of photos to process
    pub total: usize,
    /// Photo that just finished
    pub current_path: PathBuf,
}

/// Events during the comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_comparisons: usize },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// Comparison completed
    Completed {
        total_comparisons: usize,
        matched_pairs: usize,
    },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of comparisons completed
    pub comparisons_completed: usize,
    /// Total number of comparisons needed
    pub total_comparisons: usize,
}

/// Events during the resolution phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResolveEvent {
    /// Resolution has started
    Started { candidate_pairs: usize },
    /// A pair was resolved and handed to the duplicate handler
    Resolved {
        keep: PathBuf,
        delete: PathBuf,
        score: f64,
        rule: String,
    },
    /// A pair was skipped
    Skipped {
        first: PathBuf,
        second: PathBuf,
        reason: String,
    },
    /// Resolution completed
    Completed {
        resolved: usize,
        skipped: usize,
        /// Distinct files chosen as kept
        kept_files: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Extracting,
    Comparing,
    Resolving,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total photos found across both pools
    pub total_photos: usize,
    /// Photos that produced a feature record
    pub features_extracted: usize,
    /// Pairs scored at or above the threshold
    pub matched_pairs: usize,
    /// Pairs handed to the duplicate handler
    pub resolved_pairs: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Extracting => write!(f, "Extracting features"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Resolving => write!(f, "Resolving"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Resolve(ResolveEvent::Resolved {
            keep: PathBuf::from("/keep/a.jpg"),
            delete: PathBuf::from("/delete/a.jpg"),
            score: 0.97,
            rule: "authoritative".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Resolve(ResolveEvent::Resolved { delete, score, .. }) => {
                assert_eq!(delete, PathBuf::from("/delete/a.jpg"));
                assert_eq!(score, 0.97);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn pipeline_summary_is_serializable() {
        let summary = PipelineSummary {
            total_photos: 1000,
            features_extracted: 998,
            matched_pairs: 42,
            resolved_pairs: 17,
            duration_ms: 5000,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("998"));
        assert!(json.contains("\"resolved_pairs\":17"));
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Extracting.to_string(), "Extracting features");
        assert_eq!(PipelinePhase::Resolving.to_string(), "Resolving");
    }
}
