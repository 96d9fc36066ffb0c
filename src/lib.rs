//! # ssim-dedup
//!
//! Finds near-duplicate photographs across two pools of folders and decides,
//! pair by pair, which copy survives.
//!
//! ## Pools
//! - **Authoritative** (`--keep`) - never deleted, only used as a reference
//! - **Disposable** (`--delete`) - eligible for removal when it duplicates
//!   another photo
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Feature extraction, structural similarity, resolution
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` (binary only) - Command-line interface

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DedupError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// `RUST_LOG` takes precedence; otherwise `default_level` is used
/// (e.g. `"info"` or `"debug"`). Calling this twice is harmless.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
