//! Color conversions: grayscale and sepia.
//!
//! Both produce an opaque three-channel RGB image regardless of the input
//! layout.

use crate::decode::{ChannelLayout, DecodedImage};
use crate::luminance::calculate_luma_u8;

/// Sepia tone matrix, one row per output channel (R, G, B).
pub const SEPIA_MATRIX: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Convert to gray, replicated into R, G and B.
///
/// Uses the BT.601 fixed-point luma. Alpha is dropped.
pub fn grayscale(image: &DecodedImage) -> DecodedImage {
    let rgb = image.clone().into_rgb();
    let pixels = rgb
        .pixels
        .chunks_exact(3)
        .flat_map(|px| {
            let y = calculate_luma_u8(px[0], px[1], px[2]);
            [y, y, y]
        })
        .collect();

    DecodedImage {
        width: rgb.width,
        height: rgb.height,
        layout: ChannelLayout::Rgb,
        pixels,
    }
}

/// Apply a sepia tone.
///
/// Every pixel is multiplied by [`SEPIA_MATRIX`], then all samples are divided
/// by the largest value found anywhere in the image and scaled to 255
/// (truncating). The brightest output sample is therefore always 255, unless
/// the image is pure black, which stays black.
pub fn sepia(image: &DecodedImage) -> DecodedImage {
    let rgb = image.clone().into_rgb();

    let toned: Vec<f64> = rgb
        .pixels
        .chunks_exact(3)
        .flat_map(|px| {
            let (r, g, b) = (f64::from(px[0]), f64::from(px[1]), f64::from(px[2]));
            SEPIA_MATRIX.map(|row| row[0] * r + row[1] * g + row[2] * b)
        })
        .collect();

    let max = toned.iter().copied().fold(0.0f64, f64::max);
    let pixels = if max > 0.0 {
        toned
            .iter()
            .map(|&v| ((v / max) * 255.0).clamp(0.0, 255.0) as u8)
            .collect()
    } else {
        vec![0u8; toned.len()]
    };

    DecodedImage {
        width: rgb.width,
        height: rgb.height,
        layout: ChannelLayout::Rgb,
        pixels,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
