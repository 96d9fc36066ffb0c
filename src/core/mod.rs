//! # Core Module
//!
//! The UI-agnostic near-duplicate resolution engine.
//!
//! ## Modules
//! - `scanner` - Discovers photos in directories
//! - `decoder` - Turns files into RGB pixel buffers
//! - `features` - Extracts rotation-canonical luma features
//! - `similarity` - Scores pairs with structural similarity
//! - `resolver` - Decides which file of a pair to keep
//! - `reporter` - Renders decisions as TSV or JSON
//! - `pipeline` - Orchestrates the full workflow

pub mod decoder;
pub mod features;
pub mod pipeline;
pub mod reporter;
pub mod resolver;
pub mod scanner;
pub mod similarity;

// Re-export commonly used types
pub use features::{FeatureRecord, Pool};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineResult};
pub use reporter::Report;
pub use resolver::{DuplicateAction, DuplicateHandler, KeepRule, Resolution};
pub use scanner::{ScanConfig, WalkDirScanner};
pub use similarity::{structural_similarity, ScoredPair, SimilarityThreshold};
