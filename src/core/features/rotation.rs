//! Rotation canonicalization.
//!
//! The same photo stored at 0, 90, 180 or 270 degrees must produce the same
//! feature record. The decoded image is turned to each of the four
//! orientations before it is normalized, and the normalized candidate whose
//! first [`CORNER_LEN`] lumas have the smallest sum wins. Quarter turns are
//! exact on the pixel grid, so every orientation of a photo yields the same
//! four candidates and therefore the same winner.
//!
//! Candidates with equal leading sums are ordered by their full luma
//! sequence, so the choice never depends on which orientation was stored.

use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Number of leading values summed to rank rotations
pub const CORNER_LEN: usize = 4;

/// Clockwise rotation applied to an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Clockwise90,
    Half,
    Clockwise270,
}

impl Rotation {
    /// Every rotation, in evaluation order
    pub const ALL: [Rotation; 4] = [
        Rotation::None,
        Rotation::Clockwise90,
        Rotation::Half,
        Rotation::Clockwise270,
    ];

    /// Rotation in degrees clockwise
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Half => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Turn an image clockwise by this rotation
    pub fn rotate(self, image: &RgbImage) -> RgbImage {
        match self {
            Rotation::None => image.clone(),
            Rotation::Clockwise90 => imageops::rotate90(image),
            Rotation::Half => imageops::rotate180(image),
            Rotation::Clockwise270 => imageops::rotate270(image),
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

fn corner_sum(lumas: &[f32]) -> f32 {
    lumas.iter().take(CORNER_LEN).sum()
}

/// Order two normalized luma sequences for canonical selection: smaller
/// leading sum first, then the full sequence element by element.
pub fn rank(a: &[f32], b: &[f32]) -> Ordering {
    corner_sum(a).total_cmp(&corner_sum(b)).then_with(|| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}
