//! Exact-size resampling.
//!
//! Target dimensions are taken literally: aspect ratio is never preserved
//! automatically. All functions return new `DecodedImage` instances without
//! modifying the input.

use image::imageops;
use image::{GrayImage, RgbImage, RgbaImage};

use super::{ChannelLayout, DecodedImage};
use crate::transform::TransformError;

/// Resample `image` to exactly `width` x `height`, keeping its layout.
///
/// # Errors
///
/// Returns `TransformError::InvalidParameter` if either target dimension is zero.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
) -> Result<DecodedImage, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidParameter {
            operation: "resize",
            detail: format!("target size {width}x{height} must be non-zero"),
        });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let filter = imageops::FilterType::Lanczos3;
    let (w, h) = (image.width, image.height);
    let pixels = image.pixels.clone();

    let resized = match image.layout {
        ChannelLayout::Luma => GrayImage::from_raw(w, h, pixels)
            .map(|buf| DecodedImage::from_gray_image(imageops::resize(&buf, width, height, filter))),
        ChannelLayout::Rgb => RgbImage::from_raw(w, h, pixels)
            .map(|buf| DecodedImage::from_rgb_image(imageops::resize(&buf, width, height, filter))),
        ChannelLayout::Rgba => RgbaImage::from_raw(w, h, pixels)
            .map(|buf| DecodedImage::from_rgba_image(imageops::resize(&buf, width, height, filter))),
    };

    resized.ok_or_else(|| TransformError::InvalidParameter {
        operation: "resize",
        detail: format!("source buffer does not match {w}x{h}"),
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Output has exactly the requested geometry.
        #[test]
        fn prop_output_matches_target(
            (src_w, src_h) in (1u32..=40, 1u32..=40),
            (dst_w, dst_h) in (1u32..=40, 1u32..=40),
        ) {
            let img = DecodedImage::filled(src_w, src_h, ChannelLayout::Rgb, &[10, 20, 30]);
            let out = resize(&img, dst_w, dst_h).unwrap();

            prop_assert_eq!(out.width, dst_w);
            prop_assert_eq!(out.height, dst_h);
            prop_assert_eq!(out.pixels.len(), (dst_w * dst_h * 3) as usize);
        }

        /// Property: Same-size resize never changes a sample by more than one level.
        #[test]
        fn prop_same_size_within_one_level(
            (w, h) in (1u32..=24, 1u32..=24),
            seed in any::<u8>(),
        ) {
            let pixels: Vec<u8> = (0..(w * h * 3) as usize)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();
            let img = DecodedImage::new(w, h, ChannelLayout::Rgb, pixels).unwrap();
            let out = resize(&img, w, h).unwrap();

            for (a, b) in img.pixels.iter().zip(out.pixels.iter()) {
                prop_assert!((*a as i32 - *b as i32).abs() <= 1);
            }
        }
    }
}
