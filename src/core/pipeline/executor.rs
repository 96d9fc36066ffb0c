//! Pipeline execution implementation.

use crate::core::decoder::ImageDecoder;
use crate::core::features::{FeatureExtractor, FeatureRecord, Pool};
use crate::core::resolver::{
    DuplicateAction, DuplicateHandler, Resolution, Resolver, SkipCounts, DEFAULT_RGB_TOLERANCE,
};
use crate::core::scanner::{ScanConfig, WalkDirScanner};
use crate::core::similarity::{candidate_pair_count, score_pairs, SimilarityThreshold};
use crate::error::{DedupError, DecodeError};
use crate::events::{
    null_sender, Event, EventSender, ExtractEvent, ExtractProgress, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of pipeline execution
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    /// Keep/delete decisions in resolution order
    pub resolutions: Vec<Resolution>,
    /// Kept-file count per folder
    pub kept_per_folder: BTreeMap<PathBuf, usize>,
    /// Photos found in the authoritative folders
    pub authoritative_photos: usize,
    /// Photos found in the disposable folders
    pub disposable_photos: usize,
    /// Photos that produced a feature record
    pub features_extracted: usize,
    /// Pairs that were scored
    pub total_comparisons: usize,
    /// Pairs at or above the threshold
    pub matched_pairs: usize,
    /// Matched pairs that were not resolved, by reason
    pub skipped: SkipCounts,
    /// Non-fatal errors (unreadable folders, undecodable files)
    pub errors: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn total_photos(&self) -> usize {
        self.authoritative_photos + self.disposable_photos
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Folders whose photos are always kept
    pub keep_paths: Vec<PathBuf>,
    /// Folders whose photos may be removed
    pub delete_paths: Vec<PathBuf>,
    /// Minimum similarity score, within [0, 1]
    pub threshold: f64,
    /// Largest allowed per-channel difference of average colors
    pub rgb_tolerance: f64,
    /// What happens to the losing file of each pair
    pub action: DuplicateAction,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keep_paths: Vec::new(),
            delete_paths: Vec::new(),
            threshold: SimilarityThreshold::default().value(),
            rgb_tolerance: DEFAULT_RGB_TOLERANCE,
            action: DuplicateAction::default(),
            scan_config: ScanConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    handler: Option<Arc<dyn DuplicateHandler>>,
    decoder: Option<Box<dyn ImageDecoder>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::from_config(PipelineConfig::default())
    }

    /// Start from an existing configuration
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            config,
            handler: None,
            decoder: None,
        }
    }

    /// Folders whose photos are always kept
    pub fn keep_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.keep_paths = paths;
        self
    }

    /// Folders whose photos may be removed
    pub fn delete_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.delete_paths = paths;
        self
    }

    /// Set the similarity threshold (validated when the pipeline runs)
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the extension allow-list
    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.scan_config.extensions = Some(extensions);
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    pub fn rgb_tolerance(mut self, tolerance: f64) -> Self {
        self.config.rgb_tolerance = tolerance;
        self
    }

    /// Use one of the standard duplicate handlers
    pub fn action(mut self, action: DuplicateAction) -> Self {
        self.config.action = action;
        self
    }

    /// Use a custom duplicate handler; overrides `action`
    pub fn handler(mut self, handler: Arc<dyn DuplicateHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Use a custom decode collaborator
    pub fn decoder(mut self, decoder: Box<dyn ImageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let handler = self
            .handler
            .unwrap_or_else(|| Arc::new(self.config.action) as Arc<dyn DuplicateHandler>);
        let extractor = self
            .decoder
            .map(FeatureExtractor::new)
            .unwrap_or_default();

        Pipeline {
            config: self.config,
            handler,
            extractor,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The near-duplicate resolution pipeline
pub struct Pipeline {
    config: PipelineConfig,
    handler: Arc<dyn DuplicateHandler>,
    extractor: FeatureExtractor,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, DedupError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Each phase finishes completely before the next one starts.
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult, DedupError> {
        let start_time = Instant::now();

        let threshold = SimilarityThreshold::new(self.config.threshold)?;
        if self.config.delete_paths.is_empty() {
            return Err(DedupError::Config(
                "at least one folder of removable photos is required".to_string(),
            ));
        }

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let mut errors = Vec::new();
        let scanner = WalkDirScanner::new(self.config.scan_config.clone());

        let authoritative = scanner.scan_with_events(&self.config.keep_paths, events);
        errors.extend(authoritative.errors.iter().map(ToString::to_string));
        let authoritative = authoritative.photos;

        let disposable = scanner.scan_with_events(&self.config.delete_paths, events);
        errors.extend(disposable.errors.iter().map(ToString::to_string));
        let disposable = remove_authoritative(disposable.photos, &authoritative);

        info!(
            authoritative = authoritative.len(),
            disposable = disposable.len(),
            "Scan complete"
        );

        // Phase 2: Extracting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Extracting,
        }));

        let total_photos = authoritative.len() + disposable.len();
        events.send(Event::Extract(ExtractEvent::Started { total_photos }));

        let completed = AtomicUsize::new(0);
        let (keep_records, keep_errors) =
            self.extract_pool(&authoritative, Pool::Authoritative, &completed, total_photos, events);
        let (delete_records, delete_errors) =
            self.extract_pool(&disposable, Pool::Disposable, &completed, total_photos, events);
        errors.extend(keep_errors);
        errors.extend(delete_errors);

        let features_extracted = keep_records.len() + delete_records.len();
        events.send(Event::Extract(ExtractEvent::Completed {
            total_extracted: features_extracted,
        }));

        // Phase 3: Comparing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        let total_comparisons = candidate_pair_count(keep_records.len(), delete_records.len());
        let matched = score_pairs(&keep_records, &delete_records, threshold, events);
        let matched_pairs = matched.len();

        info!(
            comparisons = total_comparisons,
            matched = matched_pairs,
            threshold = threshold.value(),
            "Comparison complete"
        );

        // Phase 4: Resolving
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Resolving,
        }));

        let resolver =
            Resolver::new(Arc::clone(&self.handler)).with_rgb_tolerance(self.config.rgb_tolerance);
        let outcome = match resolver.resolve(matched, events) {
            Ok(outcome) => outcome,
            Err(e) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                return Err(e.into());
            }
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_photos,
                features_extracted,
                matched_pairs,
                resolved_pairs: outcome.resolutions.len(),
                duration_ms,
            },
        }));

        Ok(PipelineResult {
            resolutions: outcome.resolutions,
            kept_per_folder: outcome.kept_per_folder,
            authoritative_photos: authoritative.len(),
            disposable_photos: disposable.len(),
            features_extracted,
            total_comparisons,
            matched_pairs,
            skipped: outcome.skipped,
            errors,
            duration_ms,
        })
    }

    /// Extract one pool in parallel; records keep the pool's path order
    fn extract_pool(
        &self,
        photos: &[PathBuf],
        pool: Pool,
        completed: &AtomicUsize,
        total: usize,
        events: &EventSender,
    ) -> (Vec<FeatureRecord>, Vec<String>) {
        let results: Vec<Result<FeatureRecord, DecodeError>> = photos
            .par_iter()
            .map(|photo| {
                let result = self.extractor.extract_file(photo, pool);

                let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                match &result {
                    Ok(record) => {
                        debug!(
                            path = %photo.display(),
                            rotation = %record.rotation(),
                            "Extracted features"
                        );
                        events.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                            completed: current,
                            total,
                            current_path: photo.clone(),
                        })));
                    }
                    Err(e) => {
                        warn!(path = %photo.display(), error = %e, "Skipping unreadable photo");
                        events.send(Event::Extract(ExtractEvent::Error {
                            path: photo.clone(),
                            message: e.to_string(),
                        }));
                    }
                }

                result
            })
            .collect();

        let mut records = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => errors.push(e.to_string()),
            }
        }

        (records, errors)
    }
}

/// Drop disposable photos that were also found among the authoritative ones.
///
/// Both lists hold canonical paths, so one file reached through two
/// spellings of the same folder is recognized here.
fn remove_authoritative(disposable: Vec<PathBuf>, authoritative: &[PathBuf]) -> Vec<PathBuf> {
    let authoritative: HashSet<&Path> = authoritative.iter().map(PathBuf::as_path).collect();

    disposable
        .into_iter()
        .filter(|photo| {
            let shared = authoritative.contains(photo.as_path());
            if shared {
                warn!(
                    path = %photo.display(),
                    "Photo is in both pools; treating it as authoritative"
                );
            }
            !shared
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn pattern(seed: u32) -> RgbImage {
        RgbImage::from_fn(64, 48, |x, y| {
            let v = ((x * 7 + y * 13 + seed * 31) % 200) as u8;
            Rgb([v, v.wrapping_add(20), v / 2])
        })
    }

    fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        image.save_with_format(&path, image::ImageFormat::Png).unwrap();
        path
    }

    /// Temp dir and its canonical path; scanned paths are always canonical
    fn temp_root() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        (temp_dir, root)
    }

    fn png_pipeline(keep: &Path, delete: &Path) -> PipelineBuilder {
        Pipeline::builder()
            .keep_paths(vec![keep.to_path_buf()])
            .delete_paths(vec![delete.to_path_buf()])
            .extensions(vec!["png".to_string()])
    }

    #[test]
    fn pipeline_builder_creates_pipeline() {
        let pipeline = Pipeline::builder()
            .delete_paths(vec![PathBuf::from("/photos")])
            .threshold(0.94)
            .action(DuplicateAction::Rename)
            .build();

        assert_eq!(pipeline.config().threshold, 0.94);
        assert_eq!(pipeline.config().action, DuplicateAction::Rename);
        assert_eq!(pipeline.config().rgb_tolerance, DEFAULT_RGB_TOLERANCE);
    }

    #[test]
    fn default_config_is_exact_matching_without_side_effects() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.action, DuplicateAction::Noop);
        assert!(!config.scan_config.include_hidden);
    }

    #[test]
    fn rejects_invalid_threshold_before_scanning() {
        let pipeline = Pipeline::builder()
            .delete_paths(vec![PathBuf::from("/nonexistent")])
            .threshold(1.5)
            .build();

        assert!(matches!(pipeline.run(), Err(DedupError::Resolve(_))));
    }

    #[test]
    fn requires_a_disposable_folder() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = Pipeline::builder()
            .keep_paths(vec![temp_dir.path().to_path_buf()])
            .build();

        assert!(matches!(pipeline.run(), Err(DedupError::Config(_))));
    }

    #[test]
    fn pipeline_handles_empty_directories() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = png_pipeline(temp_dir.path(), temp_dir.path()).build();

        let result = pipeline.run().unwrap();

        assert_eq!(result.total_photos(), 0);
        assert!(result.resolutions.is_empty());
    }

    #[test]
    fn copy_in_disposable_folder_is_resolved_against_authoritative() {
        let (_temp_dir, root) = temp_root();
        let keep = root.join("keep");
        let delete = root.join("delete");
        write_png(&keep, "a.png", &pattern(1));
        write_png(&delete, "a-copy.png", &pattern(1));
        write_png(&delete, "b.png", &pattern(7));

        let result = png_pipeline(&keep, &delete).build().run().unwrap();

        assert_eq!(result.authoritative_photos, 1);
        assert_eq!(result.disposable_photos, 2);
        assert_eq!(result.total_comparisons, 3);
        assert_eq!(result.resolutions.len(), 1);
        assert_eq!(result.resolutions[0].keep, keep.join("a.png"));
        assert_eq!(result.resolutions[0].delete, delete.join("a-copy.png"));
        // Noop leaves everything in place
        assert!(delete.join("a-copy.png").exists());
    }

    #[test]
    fn overlapping_pools_treat_shared_photos_as_authoritative() {
        let temp_dir = TempDir::new().unwrap();
        write_png(temp_dir.path(), "a.png", &pattern(1));
        write_png(temp_dir.path(), "b.png", &pattern(9));

        let result = png_pipeline(temp_dir.path(), temp_dir.path())
            .build()
            .run()
            .unwrap();

        assert_eq!(result.authoritative_photos, 2);
        assert_eq!(result.disposable_photos, 0);
        assert_eq!(result.total_comparisons, 0);
    }

    #[test]
    fn differently_spelled_roots_never_touch_authoritative_photos() {
        let (_temp_dir, root) = temp_root();
        let library = root.join("library");
        write_png(&library, "a.png", &pattern(1));
        fs::create_dir(library.join("sub")).unwrap();

        let result = png_pipeline(&library, &library.join("sub").join(".."))
            .action(DuplicateAction::Delete)
            .build()
            .run()
            .unwrap();

        assert_eq!(result.authoritative_photos, 1);
        assert_eq!(result.disposable_photos, 0);
        assert!(result.resolutions.is_empty());
        assert!(library.join("a.png").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_root_resolves_to_the_same_photos() {
        let (_temp_dir, root) = temp_root();
        let library = root.join("library");
        write_png(&library, "a.png", &pattern(1));
        write_png(&library, "b.png", &pattern(1));
        let alias = root.join("alias");
        std::os::unix::fs::symlink(&library, &alias).unwrap();

        let result = png_pipeline(&library, &alias)
            .action(DuplicateAction::Delete)
            .build()
            .run()
            .unwrap();

        assert_eq!(result.authoritative_photos, 2);
        assert_eq!(result.disposable_photos, 0);
        assert!(library.join("a.png").exists());
        assert!(library.join("b.png").exists());
    }

    #[test]
    fn undecodable_files_are_skipped_and_reported() {
        let temp_dir = TempDir::new().unwrap();
        let delete = temp_dir.path().join("delete");
        write_png(&delete, "good.png", &pattern(3));
        fs::write(delete.join("broken.png"), b"not an image").unwrap();

        let result = png_pipeline(&temp_dir.path().join("keep"), &delete)
            .build()
            .run()
            .unwrap();

        assert_eq!(result.disposable_photos, 2);
        assert_eq!(result.features_extracted, 1);
        // Missing keep folder + broken file
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn phases_are_reported_in_order() {
        let temp_dir = TempDir::new().unwrap();
        write_png(&temp_dir.path().join("delete"), "a.png", &pattern(2));
        let (sender, receiver) = EventChannel::new();

        png_pipeline(&temp_dir.path().join("keep"), &temp_dir.path().join("delete"))
            .build()
            .run_with_events(&sender)
            .unwrap();
        drop(sender);

        let phases: Vec<_> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => Some(phase),
                _ => None,
            })
            .collect();

        assert_eq!(
            phases,
            vec![
                PipelinePhase::Scanning,
                PipelinePhase::Extracting,
                PipelinePhase::Comparing,
                PipelinePhase::Resolving,
            ]
        );
    }
}
