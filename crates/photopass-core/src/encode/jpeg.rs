//! JPEG output.
//!
//! Processed images are always stored as opaque RGB JPEG at
//! [`OUTPUT_QUALITY`], whatever layout the engine produced.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

/// Quality used for every persisted output.
pub const OUTPUT_QUALITY: u8 = 95;

/// Errors raised while producing JPEG bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("RGB buffer for {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidPixelData {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    /// The underlying encoder rejected the data.
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Flatten `image` to RGB and encode it at [`OUTPUT_QUALITY`].
///
/// Luma is replicated into three channels. Alpha is dropped as is: the stored
/// color samples are kept and nothing is blended underneath.
pub fn encode(image: &DecodedImage) -> Result<Vec<u8>, EncodeError> {
    let rgb = image.clone().into_rgb();
    encode_jpeg(&rgb.pixels, rgb.width, rgb.height, OUTPUT_QUALITY)
}

/// Encode a packed RGB buffer. `quality` is clamped to 1..=100.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    check_rgb_buffer(pixels, width, height)?;

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(out)
}

fn check_rgb_buffer(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
