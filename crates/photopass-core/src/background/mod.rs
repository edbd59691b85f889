//! Background replacement.
//!
//! The pipeline has three stages that run strictly in order:
//!
//! 1. **Segment**: a [`Segmenter`] produces a foreground [`Mask`] the size of
//!    the image (255 = subject, 0 = background).
//! 2. **Composite**: the image is blended over a solid [`BackgroundColor`]
//!    using the mask as opacity.
//! 3. **Flatten**: the result is opaque RGB.
//!
//! The segmentation model is a black box behind the [`Segmenter`] trait. An
//! ONNX binding is available with the `onnx` feature.

mod color;
mod compositor;
#[cfg(feature = "onnx")]
mod onnx;

use thiserror::Error;

use crate::decode::DecodedImage;

pub use color::BackgroundColor;
pub use compositor::{composite, replace_background};
#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmenter;

/// Errors raised by the background pipeline.
#[derive(Debug, Error)]
pub enum BackgroundError {
    /// The background color is not a `#RRGGBB` (or `#RGB`) hex string.
    #[error("Invalid background color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// No usable foreground mask could be obtained.
    #[error("Segmentation unavailable: {0}")]
    SegmentationUnavailable(String),
}

/// Errors raised by a segmentation backend.
#[derive(Debug, Error)]
pub enum SegmentationError {
    /// The model could not be loaded or failed during inference.
    #[error("Segmentation model failed: {0}")]
    Model(String),

    /// The model produced output of an unexpected shape.
    #[error("Unexpected segmentation output: {0}")]
    InvalidOutput(String),

    /// Mask buffer length does not match its declared geometry.
    #[error("Mask buffer mismatch: expected {expected} bytes, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Single-channel foreground opacity, 0 = background, 255 = foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// Create a mask, checking the buffer against the geometry.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, SegmentationError> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(SegmentationError::BufferMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A mask with the same opacity everywhere.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Opacity samples in row-major order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A foreground segmentation capability.
///
/// Implementations must return a mask with exactly the image's dimensions.
/// They are shared between request threads, hence `Send + Sync`.
pub trait Segmenter: Send + Sync {
    /// Compute the foreground mask for `image`.
    fn segment(&self, image: &DecodedImage) -> Result<Mask, SegmentationError>;
}
