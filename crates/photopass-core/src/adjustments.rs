//! Tonal adjustments: brightness, contrast and saturation.
//!
//! All three are a linear interpolation between a reference and the
//! original sample:
//!
//! ```text
//! output = reference + factor * (original - reference)
//! ```
//!
//! | Adjustment | Reference |
//! |------------|-----------|
//! | Brightness | 0 (black) |
//! | Contrast   | 128 (mid-gray) |
//! | Saturation | per-pixel BT.601 luma |
//!
//! Results are clamped to [0, 255] and truncated toward zero. A factor of
//! 1.0 is the exact identity. Alpha is carried through unchanged.

use crate::decode::DecodedImage;
use crate::luminance::calculate_luma_u8;

/// Mid-gray reference used by contrast.
pub const CONTRAST_MIDPOINT: f32 = 128.0;

/// Scale every color sample toward or away from black.
///
/// # Example
/// ```
/// use photopass_core::adjustments::adjust_brightness;
/// use photopass_core::decode::{ChannelLayout, DecodedImage};
///
/// let red = DecodedImage::filled(2, 2, ChannelLayout::Rgb, &[255, 0, 0]);
/// let darker = adjust_brightness(&red, 0.5);
/// assert_eq!(darker.pixel(0, 0), &[127, 0, 0]);
/// ```
pub fn adjust_brightness(image: &DecodedImage, factor: f32) -> DecodedImage {
    map_color_samples(image, |v| blend(0.0, v, factor))
}

/// Scale every color sample toward or away from mid-gray.
pub fn adjust_contrast(image: &DecodedImage, factor: f32) -> DecodedImage {
    map_color_samples(image, |v| blend(CONTRAST_MIDPOINT, v, factor))
}

/// Scale every color sample toward or away from its pixel's luma.
///
/// Factor 0.0 produces a gray image (still three-channel). Luma images have
/// no chroma and are returned unchanged.
pub fn adjust_saturation(image: &DecodedImage, factor: f32) -> DecodedImage {
    let channels = image.channels();
    if image.layout.color_channels() == 1 {
        return image.clone();
    }

    let mut out = image.clone();
    for px in out.pixels.chunks_exact_mut(channels) {
        let gray = calculate_luma_u8(px[0], px[1], px[2]) as f32;
        px[0] = blend(gray, px[0], factor);
        px[1] = blend(gray, px[1], factor);
        px[2] = blend(gray, px[2], factor);
    }
    out
}

/// Interpolate from `reference` toward `value` by `factor`, quantized to u8.
#[inline]
fn blend(reference: f32, value: u8, factor: f32) -> u8 {
    let v = reference + factor * (value as f32 - reference);
    // `as u8` saturates and truncates toward zero
    v.clamp(0.0, 255.0) as u8
}

/// Apply `f` to every color sample, leaving alpha untouched.
fn map_color_samples(image: &DecodedImage, f: impl Fn(u8) -> u8) -> DecodedImage {
    let channels = image.channels();
    let color = image.layout.color_channels();

    let mut out = image.clone();
    for px in out.pixels.chunks_exact_mut(channels) {
        for sample in &mut px[..color] {
            *sample = f(*sample);
        }
    }
    out
}


// ============================================================================
// Property-Based Tests
// ============================================================================
