//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream is not one of the supported image formats.
    #[error("Unsupported image format (detected: {detected})")]
    UnsupportedFormat {
        /// What the content sniffer found, or "unknown".
        detected: String,
    },

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    Corrupted(String),

    /// Pixel buffer length does not match the declared geometry.
    #[error("Pixel buffer mismatch: expected {expected} bytes, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },

    /// Width or height is zero.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Channel layout of a decoded pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelLayout {
    /// Single-channel luminance.
    Luma,
    /// Three-channel RGB.
    Rgb,
    /// RGB plus straight (non-premultiplied) alpha.
    Rgba,
}

impl ChannelLayout {
    /// Number of 8-bit samples per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Luma => 1,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    /// Number of color (non-alpha) samples per pixel.
    #[inline]
    pub fn color_channels(self) -> usize {
        match self {
            ChannelLayout::Luma => 1,
            ChannelLayout::Rgb | ChannelLayout::Rgba => 3,
        }
    }

    /// Whether the last sample of each pixel is alpha.
    #[inline]
    pub fn has_alpha(self) -> bool {
        matches!(self, ChannelLayout::Rgba)
    }
}

/// Encoded formats accepted by the codec adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormatKind {
    Jpeg,
    Png,
    Bmp,
    Tiff,
    WebP,
}

impl ImageFormatKind {
    /// Map a sniffed `image` crate format to a supported format.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormatKind::Jpeg),
            image::ImageFormat::Png => Some(ImageFormatKind::Png),
            image::ImageFormat::Bmp => Some(ImageFormatKind::Bmp),
            image::ImageFormat::Tiff => Some(ImageFormatKind::Tiff),
            image::ImageFormat::WebP => Some(ImageFormatKind::WebP),
            _ => None,
        }
    }

    /// Convert to the image crate's format.
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormatKind::Jpeg => image::ImageFormat::Jpeg,
            ImageFormatKind::Png => image::ImageFormat::Png,
            ImageFormatKind::Bmp => image::ImageFormat::Bmp,
            ImageFormatKind::Tiff => image::ImageFormat::Tiff,
            ImageFormatKind::WebP => image::ImageFormat::WebP,
        }
    }

    /// Upper-case format name as reported by the metadata query.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormatKind::Jpeg => "JPEG",
            ImageFormatKind::Png => "PNG",
            ImageFormatKind::Bmp => "BMP",
            ImageFormatKind::Tiff => "TIFF",
            ImageFormatKind::WebP => "WEBP",
        }
    }
}

/// Format and geometry of an encoded image, read without keeping pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Detected encoded format.
    pub format: ImageFormatKind,
    /// Color mode of the stored data (`L`, `LA`, `RGB`, `RGBA`, `I;16`, ...).
    ///
    /// Indexed PNGs report `P`. Palette BMP and TIFF files report the mode
    /// the decoder expands them to (`RGB`/`RGBA`).
    pub mode: String,
}

/// A decoded image: geometry, channel layout and 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Channel layout of `pixels`.
    pub layout: ChannelLayout,
    /// Samples in row-major order, `layout.channels()` bytes per pixel.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage, checking the buffer against the geometry.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        pixels: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize) * layout.channels();
        if pixels.len() != expected {
            return Err(DecodeError::BufferMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }

    /// Create an image of the given layout filled with one pixel value.
    ///
    /// `pixel` must hold `layout.channels()` samples.
    pub fn filled(width: u32, height: u32, layout: ChannelLayout, pixel: &[u8]) -> Self {
        debug_assert_eq!(pixel.len(), layout.channels(), "Fill pixel size mismatch");
        let pixels = pixel.repeat((width as usize) * (height as usize));
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    /// Create a DecodedImage from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: ChannelLayout::Rgb,
            pixels: img.into_raw(),
        }
    }

    /// Create a DecodedImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: ChannelLayout::Rgba,
            pixels: img.into_raw(),
        }
    }

    /// Create a DecodedImage from an image::GrayImage.
    pub fn from_gray_image(img: image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            layout: ChannelLayout::Luma,
            pixels: img.into_raw(),
        }
    }

    /// Number of samples per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// Samples of the pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels();
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * c;
        &self.pixels[idx..idx + c]
    }

    /// Convert to a three-channel RGB image.
    ///
    /// Luma is replicated into R, G and B; alpha is discarded without
    /// blending, leaving the stored color samples as they are.
    pub fn into_rgb(self) -> DecodedImage {
        let pixels = match self.layout {
            ChannelLayout::Rgb => return self,
            ChannelLayout::Luma => self.pixels.iter().flat_map(|&v| [v, v, v]).collect(),
            ChannelLayout::Rgba => self
                .pixels
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        };
        DecodedImage {
            width: self.width,
            height: self.height,
            layout: ChannelLayout::Rgb,
            pixels,
        }
    }
}
