//! # Pipeline Module
//!
//! Orchestrates one batch run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover photos in the authoritative and disposable folders
//! 2. **Extract** - Build a feature record per photo (parallel)
//! 3. **Compare** - Score every candidate pair (parallel)
//! 4. **Resolve** - Decide keep/delete and invoke the handler (sequential)
//!
//! Each stage collects its complete output before the next one starts.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
