//! # Decoder Module
//!
//! Turns a photo file into an 8-bit RGB pixel buffer.
//!
//! - JPEG: zune-jpeg (faster than the image crate), large files memory-mapped
//! - Everything else, and JPEGs zune-jpeg rejects: the image crate
//!
//! Any other codec can be plugged in through [`ImageDecoder`].

mod mmap;

pub use mmap::{read_file_bytes, FileBytes};

use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, Luma, RgbImage, Rgba};
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode collaborator: file in, full-resolution RGB pixels out
pub trait ImageDecoder: Send + Sync {
    /// Decode the file at `path`
    fn decode(&self, path: &Path) -> Result<RgbImage, DecodeError>;
}

/// Default decoder, picking the fastest available path per format
#[derive(Debug, Clone, Copy, Default)]
pub struct FastDecoder;

impl ImageDecoder for FastDecoder {
    fn decode(&self, path: &Path) -> Result<RgbImage, DecodeError> {
        let image = if is_jpeg(path) {
            Self::decode_jpeg(path).or_else(|_| Self::decode_fallback(path))?
        } else {
            Self::decode_fallback(path)?
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::EmptyImage {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }
}

impl FastDecoder {
    fn decode_jpeg(path: &Path) -> Result<RgbImage, DecodeError> {
        let bytes = read_file_bytes(path)?;
        let failed = |reason: String| DecodeError::DecodeFailed {
            path: path.to_path_buf(),
            reason,
        };

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&*bytes, options);

        let pixels = decoder
            .decode()
            .map_err(|e| failed(format!("zune-jpeg decode failed: {:?}", e)))?;

        let info = decoder
            .info()
            .ok_or_else(|| failed("missing image info".to_string()))?;
        let width = info.width as u32;
        let height = info.height as u32;

        let buffer_error = || failed("pixel buffer does not match dimensions".to_string());

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => RgbImage::from_raw(width, height, pixels).ok_or_else(buffer_error),
            ColorSpace::RGBA => {
                let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                Ok(DynamicImage::ImageRgba8(buffer).to_rgb8())
            }
            ColorSpace::Luma => {
                let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                    ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
                Ok(DynamicImage::ImageLuma8(buffer).to_rgb8())
            }
            other => Err(failed(format!("unsupported colorspace {:?}", other))),
        }
    }

    fn decode_fallback(path: &Path) -> Result<RgbImage, DecodeError> {
        image::open(path)
            .map(|image| image.to_rgb8())
            .map_err(|e| DecodeError::DecodeFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}
