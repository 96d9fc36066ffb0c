//! # Features Module
//!
//! Reduces each photo to a fixed-size, rotation-canonical feature record.
//!
//! ## How It Works
//! 1. Decode the file to full-resolution RGB and remember its area
//! 2. Turn the decoded image to each of the four orientations
//! 3. Resize every orientation to 128×128 (Lanczos3) and compute BT.709 luma
//! 4. Keep the canonical orientation (see [`rotation`])
//! 5. Average R, G and B over its 128×128 copy
//! 6. Store mean, population variance and the mean-centered lumas
//!
//! Records are immutable once built and shared read-only by every
//! comparison.

mod resize;
pub mod rotation;

pub use resize::FastResizer;
pub use rotation::Rotation;

use crate::core::decoder::{FastDecoder, ImageDecoder};
use crate::error::DecodeError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Side length of the normalized image
pub const FEATURE_SIZE: u32 = 128;

/// Number of lumas in every extracted record
pub const FEATURE_LEN: usize = (FEATURE_SIZE * FEATURE_SIZE) as usize;

/// ITU-R BT.709 luma weights for R, G and B
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Which pool a photo was discovered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pool {
    /// Always kept; only used as a reference
    Authoritative,
    /// May be handed to the duplicate handler
    Disposable,
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pool::Authoritative => write!(f, "keep"),
            Pool::Disposable => write!(f, "delete"),
        }
    }
}

/// Features of one photo
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    path: PathBuf,
    pool: Pool,
    origin_area: u64,
    average_luma: f32,
    variance_luma: f32,
    centered_lumas: Box<[f32]>,
    average_rgb: [f64; 3],
    rotation: Rotation,
}

impl FeatureRecord {
    /// Build a record from an already-canonical luma sequence.
    ///
    /// Mean and population variance are derived here so they always agree
    /// with the stored centered values.
    pub fn from_lumas(
        path: impl Into<PathBuf>,
        pool: Pool,
        origin_area: u64,
        lumas: &[f32],
        average_rgb: [f64; 3],
    ) -> Self {
        let n = lumas.len().max(1) as f32;
        let average_luma = lumas.iter().sum::<f32>() / n;
        let centered_lumas: Box<[f32]> = lumas.iter().map(|l| l - average_luma).collect();
        let variance_luma = centered_lumas.iter().map(|d| d * d).sum::<f32>() / n;

        Self {
            path: path.into(),
            pool,
            origin_area,
            average_luma,
            variance_luma,
            centered_lumas,
            average_rgb,
            rotation: Rotation::None,
        }
    }

    fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> Pool {
        self.pool
    }

    pub fn is_authoritative(&self) -> bool {
        self.pool == Pool::Authoritative
    }

    /// Pixel count of the full-resolution image
    pub fn origin_area(&self) -> u64 {
        self.origin_area
    }

    pub fn average_luma(&self) -> f32 {
        self.average_luma
    }

    pub fn variance_luma(&self) -> f32 {
        self.variance_luma
    }

    /// `luma[i] - average_luma`, raster order of the canonical rotation
    pub fn centered_lumas(&self) -> &[f32] {
        &self.centered_lumas
    }

    /// Mean R, G, B on the 0-255 scale
    pub fn average_rgb(&self) -> [f64; 3] {
        self.average_rgb
    }

    /// Rotation that was chosen as canonical
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }
}

/// Produces feature records from files or decoded images
pub struct FeatureExtractor {
    decoder: Box<dyn ImageDecoder>,
}

impl FeatureExtractor {
    /// Create an extractor using the given decode collaborator
    pub fn new(decoder: Box<dyn ImageDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode and extract one file.
    ///
    /// An error means the file yields no record; callers skip it.
    pub fn extract_file(&self, path: &Path, pool: Pool) -> Result<FeatureRecord, DecodeError> {
        let image = self.decoder.decode(path)?;
        extract_image(path, image, pool)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Box::new(FastDecoder))
    }
}

/// Extract features from an already-decoded image
pub fn extract_image(
    path: &Path,
    image: RgbImage,
    pool: Pool,
) -> Result<FeatureRecord, DecodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage {
            path: path.to_path_buf(),
        });
    }
    let origin_area = u64::from(width) * u64::from(height);

    let mut resizer = FastResizer::new();
    let (mut scaled, mut lumas) = normalize(&mut resizer, image.clone())?;
    let mut chosen = Rotation::None;

    for turn in &Rotation::ALL[1..] {
        let (candidate, candidate_lumas) = normalize(&mut resizer, turn.rotate(&image))?;
        if rotation::rank(&candidate_lumas, &lumas).is_lt() {
            chosen = *turn;
            scaled = candidate;
            lumas = candidate_lumas;
        }
    }

    Ok(
        FeatureRecord::from_lumas(path, pool, origin_area, &lumas, average_rgb(&scaled))
            .with_rotation(chosen),
    )
}

/// Resize one orientation to the feature size and compute its lumas
fn normalize(
    resizer: &mut FastResizer,
    image: RgbImage,
) -> Result<(RgbImage, Vec<f32>), DecodeError> {
    let scaled = resizer.resize_rgb(image, FEATURE_SIZE, FEATURE_SIZE)?;
    let lumas = scaled.pixels().map(|p| luma(p.0)).collect();
    Ok((scaled, lumas))
}

/// BT.709 luma of one 8-bit RGB pixel
pub fn luma([r, g, b]: [u8; 3]) -> f32 {
    LUMA_WEIGHTS[0] * f32::from(r) + LUMA_WEIGHTS[1] * f32::from(g) + LUMA_WEIGHTS[2] * f32::from(b)
}

fn average_rgb(image: &RgbImage) -> [f64; 3] {
    let mut sums = [0f64; 3];
    for pixel in image.pixels() {
        for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
            *sum += f64::from(channel);
        }
    }

    let count = f64::from(image.width()) * f64::from(image.height());
    sums.map(|sum| sum / count)
}
