//! Mirror operations.

use serde::{Deserialize, Serialize};

use crate::decode::DecodedImage;

/// Mirror axis for [`apply_flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    /// Mirror left to right.
    Horizontal,
    /// Mirror top to bottom.
    Vertical,
}

impl FlipAxis {
    /// Lower-case name used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            FlipAxis::Horizontal => "horizontal",
            FlipAxis::Vertical => "vertical",
        }
    }
}

impl std::str::FromStr for FlipAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" => Ok(FlipAxis::Horizontal),
            "vertical" => Ok(FlipAxis::Vertical),
            other => Err(format!(
                "direction must be 'horizontal' or 'vertical', got '{other}'"
            )),
        }
    }
}

/// Mirror an image along `axis`. Exact and self-inverse.
pub fn apply_flip(image: &DecodedImage, axis: FlipAxis) -> DecodedImage {
    let channels = image.channels();
    let row_len = image.width as usize * channels;
    let mut output = Vec::with_capacity(image.pixels.len());

    match axis {
        FlipAxis::Horizontal => {
            for row in image.pixels.chunks_exact(row_len) {
                for px in row.chunks_exact(channels).rev() {
                    output.extend_from_slice(px);
                }
            }
        }
        FlipAxis::Vertical => {
            for row in image.pixels.chunks_exact(row_len).rev() {
                output.extend_from_slice(row);
            }
        }
    }

    DecodedImage {
        width: image.width,
        height: image.height,
        layout: image.layout,
        pixels: output,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decode::ChannelLayout;
    use proptest::prelude::*;

    fn rgba_image() -> impl Strategy<Value = DecodedImage> {
        (1u32..=16, 1u32..=16).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<u8>(), (w * h * 4) as usize).prop_map(move |pixels| {
                DecodedImage::new(w, h, ChannelLayout::Rgba, pixels).unwrap()
            })
        })
    }

    proptest! {
        /// Property: Flipping twice along the same axis is the identity.
        #[test]
        fn prop_flip_is_self_inverse(img in rgba_image(), vertical in any::<bool>()) {
            let axis = if vertical { FlipAxis::Vertical } else { FlipAxis::Horizontal };
            prop_assert_eq!(apply_flip(&apply_flip(&img, axis), axis), img);
        }

        /// Property: Horizontal flip moves (x, y) to (w - 1 - x, y).
        #[test]
        fn prop_horizontal_mirrors_columns(img in rgba_image()) {
            let out = apply_flip(&img, FlipAxis::Horizontal);
            for y in 0..img.height {
                for x in 0..img.width {
                    prop_assert_eq!(out.pixel(img.width - 1 - x, y), img.pixel(x, y));
                }
            }
        }
    }
}
