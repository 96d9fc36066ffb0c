//! SIMD-accelerated RGB resizing to the normalized feature size.
//!
//! Uses fast_image_resize (AVX2/NEON when available) with a Lanczos3
//! convolution, which keeps fine detail that near-duplicate detection
//! depends on.

use crate::error::DecodeError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;

/// Reusable resizer; holds scratch buffers between calls
pub struct FastResizer {
    resizer: Resizer,
    options: ResizeOptions,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
        }
    }

    /// Resize to exactly `width`×`height`, ignoring aspect ratio.
    ///
    /// An image already at the target size is returned untouched.
    pub fn resize_rgb(
        &mut self,
        image: RgbImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, DecodeError> {
        let (src_width, src_height) = image.dimensions();

        if src_width == 0 || src_height == 0 || width == 0 || height == 0 {
            return Err(DecodeError::ResizeFailed(format!(
                "invalid dimensions {}x{} -> {}x{}",
                src_width, src_height, width, height
            )));
        }

        if (src_width, src_height) == (width, height) {
            return Ok(image);
        }

        let src_image =
            Image::from_vec_u8(src_width, src_height, image.into_raw(), PixelType::U8x3)
                .map_err(|e| DecodeError::ResizeFailed(format!("source buffer: {}", e)))?;

        let mut dst_image = Image::new(width, height, PixelType::U8x3);

        self.resizer
            .resize(&src_image, &mut dst_image, &self.options)
            .map_err(|e| DecodeError::ResizeFailed(e.to_string()))?;

        RgbImage::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| DecodeError::ResizeFailed("result buffer size mismatch".to_string()))
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}
