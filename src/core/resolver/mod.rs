//! # Resolver Module
//!
//! Turns matched pairs into keep/delete decisions.
//!
//! ## How It Works
//! 1. Sort pairs by score, highest first (ties by first path, then second)
//! 2. Walk them one at a time; every decision sees the ones before it
//! 3. Skip a pair when:
//!    - any average R, G or B channel differs by more than the tolerance
//!    - either file no longer exists
//!    - both sides are authoritative
//!    - either side was already kept by an earlier pair
//! 4. Otherwise pick the file to keep (first rule that applies wins):
//!
//! | Rule          | Keeps                                   |
//! |---------------|-----------------------------------------|
//! | Authoritative | the side from the authoritative pool    |
//! | LargerArea    | the side with more original pixels      |
//! | LargerFile    | the side with more bytes on disk        |
//! | FirstNamed    | the first side of the pair              |
//!
//! 5. Hand the loser to the [`DuplicateHandler`]; a handler error ends the run
//!
//! This phase is sequential on purpose: the outcome depends on the order
//! in which pairs are seen.

mod handler;
mod registry;

pub use handler::{rename_target, DuplicateAction, DuplicateHandler};
pub use registry::ResolutionState;

use crate::core::features::FeatureRecord;
use crate::core::similarity::ScoredPair;
use crate::error::ResolveError;
use crate::events::{Event, EventSender, ResolveEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Default maximum per-channel difference of the average colors
pub const DEFAULT_RGB_TOLERANCE: f64 = 2.0;

/// The rule that decided which side of a pair was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepRule {
    Authoritative,
    LargerArea,
    LargerFile,
    FirstNamed,
}

impl std::fmt::Display for KeepRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeepRule::Authoritative => write!(f, "authoritative"),
            KeepRule::LargerArea => write!(f, "larger-area"),
            KeepRule::LargerFile => write!(f, "larger-file"),
            KeepRule::FirstNamed => write!(f, "first-named"),
        }
    }
}

/// Why a pair was not resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Average colors too far apart
    ColorMismatch,
    /// A file vanished before its pair came up
    Missing,
    /// Neither side may be removed
    BothAuthoritative,
    /// A side was already kept by a higher-scoring pair
    AlreadyResolved,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ColorMismatch => write!(f, "color mismatch"),
            SkipReason::Missing => write!(f, "file missing"),
            SkipReason::BothAuthoritative => write!(f, "both authoritative"),
            SkipReason::AlreadyResolved => write!(f, "already resolved"),
        }
    }
}

/// One keep/delete decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub keep: PathBuf,
    pub delete: PathBuf,
    pub score: f64,
    pub rule: KeepRule,
}

/// Number of skipped pairs per reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub color_mismatch: usize,
    pub missing: usize,
    pub both_authoritative: usize,
    pub already_resolved: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::ColorMismatch => self.color_mismatch += 1,
            SkipReason::Missing => self.missing += 1,
            SkipReason::BothAuthoritative => self.both_authoritative += 1,
            SkipReason::AlreadyResolved => self.already_resolved += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.color_mismatch + self.missing + self.both_authoritative + self.already_resolved
    }
}

/// Everything a resolution pass produced
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Decisions in the order they were made
    pub resolutions: Vec<Resolution>,
    /// Kept-file count per folder
    pub kept_per_folder: BTreeMap<PathBuf, usize>,
    pub skipped: SkipCounts,
}

/// Applies the keep/delete policy and drives the duplicate handler
pub struct Resolver {
    handler: Arc<dyn DuplicateHandler>,
    rgb_tolerance: f64,
}

impl Resolver {
    pub fn new(handler: Arc<dyn DuplicateHandler>) -> Self {
        Self {
            handler,
            rgb_tolerance: DEFAULT_RGB_TOLERANCE,
        }
    }

    /// Largest allowed per-channel difference of the average colors
    pub fn with_rgb_tolerance(mut self, tolerance: f64) -> Self {
        self.rgb_tolerance = tolerance;
        self
    }

    pub fn rgb_tolerance(&self) -> f64 {
        self.rgb_tolerance
    }

    /// Resolve every pair, in score order.
    ///
    /// Decisions already handed to the handler stay applied if a later
    /// handler call fails.
    pub fn resolve(
        &self,
        mut pairs: Vec<ScoredPair<'_>>,
        events: &EventSender,
    ) -> Result<ResolutionOutcome, ResolveError> {
        sort_pairs(&mut pairs);

        events.send(Event::Resolve(ResolveEvent::Started {
            candidate_pairs: pairs.len(),
        }));

        let mut state = ResolutionState::new();
        let mut resolutions = Vec::new();
        let mut skipped = SkipCounts::default();

        for pair in &pairs {
            let (keep, delete, rule) = match self.decide(pair, &state) {
                Ok(decision) => decision,
                Err(reason) => {
                    debug!(
                        first = %pair.first().path().display(),
                        second = %pair.second().path().display(),
                        score = pair.score(),
                        %reason,
                        "Skipped pair"
                    );
                    skipped.record(reason);
                    events.send(Event::Resolve(ResolveEvent::Skipped {
                        first: pair.first().path().to_path_buf(),
                        second: pair.second().path().to_path_buf(),
                        reason: reason.to_string(),
                    }));
                    continue;
                }
            };

            let newly_kept = state.mark_kept(keep.path());
            debug_assert!(newly_kept, "kept files never reach another decision");

            info!(
                keep = %keep.path().display(),
                delete = %delete.path().display(),
                score = pair.score(),
                %rule,
                "Resolved duplicate"
            );

            self.handler
                .handle(keep.path(), delete.path())
                .map_err(|source| ResolveError::HandlerFailed {
                    keep: keep.path().to_path_buf(),
                    delete: delete.path().to_path_buf(),
                    source,
                })?;

            events.send(Event::Resolve(ResolveEvent::Resolved {
                keep: keep.path().to_path_buf(),
                delete: delete.path().to_path_buf(),
                score: pair.score(),
                rule: rule.to_string(),
            }));

            resolutions.push(Resolution {
                keep: keep.path().to_path_buf(),
                delete: delete.path().to_path_buf(),
                score: pair.score(),
                rule,
            });
        }

        info!(
            resolved = resolutions.len(),
            skipped = skipped.total(),
            kept_files = state.kept_count(),
            "Resolution complete"
        );
        events.send(Event::Resolve(ResolveEvent::Completed {
            resolved: resolutions.len(),
            skipped: skipped.total(),
            kept_files: state.kept_count(),
        }));

        Ok(ResolutionOutcome {
            resolutions,
            kept_per_folder: state.into_kept_per_folder(),
            skipped,
        })
    }

    /// Run the gates, then pick the kept side
    fn decide<'a>(
        &self,
        pair: &ScoredPair<'a>,
        state: &ResolutionState,
    ) -> Result<(&'a FeatureRecord, &'a FeatureRecord, KeepRule), SkipReason> {
        let (first, second) = (pair.first(), pair.second());

        if !colors_match(first, second, self.rgb_tolerance) {
            return Err(SkipReason::ColorMismatch);
        }

        let (first_len, second_len) =
            match (fs::metadata(first.path()), fs::metadata(second.path())) {
                (Ok(a), Ok(b)) => (a.len(), b.len()),
                _ => return Err(SkipReason::Missing),
            };

        if first.is_authoritative() && second.is_authoritative() {
            return Err(SkipReason::BothAuthoritative);
        }

        if state.is_kept(first.path()) || state.is_kept(second.path()) {
            return Err(SkipReason::AlreadyResolved);
        }

        let decision = if first.is_authoritative() != second.is_authoritative() {
            if first.is_authoritative() {
                (first, second, KeepRule::Authoritative)
            } else {
                (second, first, KeepRule::Authoritative)
            }
        } else if first.origin_area() != second.origin_area() {
            if first.origin_area() > second.origin_area() {
                (first, second, KeepRule::LargerArea)
            } else {
                (second, first, KeepRule::LargerArea)
            }
        } else if first_len != second_len {
            if first_len > second_len {
                (first, second, KeepRule::LargerFile)
            } else {
                (second, first, KeepRule::LargerFile)
            }
        } else {
            (first, second, KeepRule::FirstNamed)
        };

        Ok(decision)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Arc::new(DuplicateAction::Noop))
    }
}

/// Highest score first; equal scores by first path, then second path
pub fn sort_pairs(pairs: &mut [ScoredPair<'_>]) {
    pairs.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.first().path().cmp(b.first().path()))
            .then_with(|| a.second().path().cmp(b.second().path()))
    });
}

/// Every average channel within `tolerance` of the other record's
pub fn colors_match(a: &FeatureRecord, b: &FeatureRecord, tolerance: f64) -> bool {
    a.average_rgb()
        .iter()
        .zip(b.average_rgb().iter())
        .all(|(x, y)| (x - y).abs() <= tolerance)
}
