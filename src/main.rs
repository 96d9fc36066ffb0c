//! # ssim-dedup CLI
//!
//! Command-line interface for the near-duplicate photo resolver.
//!
//! ## Usage
//! ```bash
//! ssim-dedup scan --keep ~/Pictures/iCloud --delete ~/Pictures/Imports --threshold 0.94
//! ssim-dedup scan --delete ~/Pictures --action rename --output tsv
//! ```

mod cli;

use ssim_dedup::Result;

fn main() -> Result<()> {
    cli::run()
}
