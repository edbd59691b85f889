//! Mask-driven compositing over a solid background.

use tracing::{debug, warn};

use super::{BackgroundColor, BackgroundError, Mask, Segmenter};
use crate::decode::{ChannelLayout, DecodedImage};

/// Blend `image` over a solid `background` using `mask` as opacity.
///
/// Per channel:
///
/// ```text
/// out = (m * fg + (255 - m) * bg + 127) / 255
/// ```
///
/// which is exact at m = 0 (pure background) and m = 255 (pure image). The
/// foreground is the image's RGB; any alpha it carries is ignored because
/// the mask alone defines opacity. The result is opaque RGB.
///
/// # Errors
///
/// Returns [`BackgroundError::SegmentationUnavailable`] when the mask size
/// differs from the image size.
pub fn composite(
    image: &DecodedImage,
    mask: &Mask,
    background: BackgroundColor,
) -> Result<DecodedImage, BackgroundError> {
    if (mask.width(), mask.height()) != (image.width, image.height) {
        return Err(BackgroundError::SegmentationUnavailable(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            image.width,
            image.height
        )));
    }

    let fg = image.clone().into_rgb();
    let bg = background.to_array();

    let mut pixels = Vec::with_capacity(fg.pixels.len());
    for (px, &m) in fg.pixels.chunks_exact(3).zip(mask.data()) {
        let m = u32::from(m);
        for c in 0..3 {
            let v = (m * u32::from(px[c]) + (255 - m) * u32::from(bg[c]) + 127) / 255;
            pixels.push(v as u8);
        }
    }

    Ok(DecodedImage {
        width: image.width,
        height: image.height,
        layout: ChannelLayout::Rgb,
        pixels,
    })
}

/// Replace the background of `image` with a solid `color`.
///
/// The color is parsed before the segmenter runs, so a malformed color never
/// costs a model invocation. A missing segmenter, a segmenter error, or a
/// mask of the wrong size all surface as
/// [`BackgroundError::SegmentationUnavailable`]. Nothing is retried.
pub fn replace_background(
    image: &DecodedImage,
    segmenter: Option<&dyn Segmenter>,
    color: &str,
) -> Result<DecodedImage, BackgroundError> {
    let background = BackgroundColor::parse(color)?;

    let segmenter = segmenter.ok_or_else(|| {
        warn!("background replacement requested without a segmentation model");
        BackgroundError::SegmentationUnavailable("no segmentation model configured".to_string())
    })?;

    let mask = segmenter.segment(image).map_err(|e| {
        warn!(error = %e, "segmentation failed");
        BackgroundError::SegmentationUnavailable(e.to_string())
    })?;

    debug!(
        width = mask.width(),
        height = mask.height(),
        color = color,
        "compositing over solid background"
    );
    composite(image, &mask, background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::SegmentationError;

    /// Returns a fixed mask regardless of input.
    struct FixedMask(Mask);

    impl Segmenter for FixedMask {
        fn segment(&self, _image: &DecodedImage) -> Result<Mask, SegmentationError> {
            Ok(self.0.clone())
        }
    }

    /// Foreground is the left half of the image.
    struct LeftHalf;

    impl Segmenter for LeftHalf {
        fn segment(&self, image: &DecodedImage) -> Result<Mask, SegmentationError> {
            let (w, h) = (image.width, image.height);
            let data = (0..w * h)
                .map(|i| if i % w < w / 2 { 255 } else { 0 })
                .collect();
            Mask::new(w, h, data)
        }
    }

    struct Broken;

    impl Segmenter for Broken {
        fn segment(&self, _image: &DecodedImage) -> Result<Mask, SegmentationError> {
            Err(SegmentationError::Model("inference session crashed".to_string()))
        }
    }

    fn photo() -> DecodedImage {
        DecodedImage::filled(8, 6, ChannelLayout::Rgb, &[200, 100, 50])
    }

    #[test]
    fn test_zero_mask_is_background() {
        let out = composite(&photo(), &Mask::filled(8, 6, 0), BackgroundColor::new(0, 255, 0))
            .unwrap();
        assert!(out.pixels.chunks_exact(3).all(|px| px == [0, 255, 0]));
    }

    #[test]
    fn test_full_mask_is_original() {
        let out = composite(&photo(), &Mask::filled(8, 6, 255), BackgroundColor::new(0, 255, 0))
            .unwrap();
        assert_eq!(out, photo());
    }

    #[test]
    fn test_half_mask_blends() {
        let img = DecodedImage::filled(1, 1, ChannelLayout::Rgb, &[255, 0, 100]);
        let out = composite(&img, &Mask::filled(1, 1, 128), BackgroundColor::new(0, 255, 100))
            .unwrap();
        // (128*255 + 127*0 + 127) / 255 = 128, (127*255 + 127) / 255 = 127
        assert_eq!(out.pixels, vec![128, 127, 100]);
    }

    #[test]
    fn test_source_alpha_ignored_and_output_opaque() {
        let img = DecodedImage::filled(2, 2, ChannelLayout::Rgba, &[10, 20, 30, 0]);
        let out = composite(&img, &Mask::filled(2, 2, 255), BackgroundColor::new(0, 0, 0))
            .unwrap();
        assert_eq!(out.layout, ChannelLayout::Rgb);
        assert_eq!(out.pixel(1, 1), &[10, 20, 30]);
    }

    #[test]
    fn test_mask_size_mismatch() {
        let err = composite(&photo(), &Mask::filled(4, 4, 255), BackgroundColor::new(0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, BackgroundError::SegmentationUnavailable(_)));
    }

    #[test]
    fn test_replace_background_left_half() {
        let out = replace_background(&photo(), Some(&LeftHalf), "#0000FF").unwrap();
        assert_eq!(out.pixel(0, 0), &[200, 100, 50]);
        assert_eq!(out.pixel(7, 5), &[0, 0, 255]);
    }

    #[test]
    fn test_replace_background_invalid_color_skips_model() {
        let err = replace_background(&photo(), Some(&Broken), "#GGHHII").unwrap_err();
        assert!(matches!(err, BackgroundError::InvalidColor(_)));
    }

    #[test]
    fn test_replace_background_without_segmenter() {
        let err = replace_background(&photo(), None, "#00FF00").unwrap_err();
        assert!(matches!(err, BackgroundError::SegmentationUnavailable(_)));
    }

    #[test]
    fn test_replace_background_segmenter_failure() {
        let err = replace_background(&photo(), Some(&Broken), "#00FF00").unwrap_err();
        match err {
            BackgroundError::SegmentationUnavailable(msg) => {
                assert!(msg.contains("inference session crashed"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_replace_background_wrong_mask_size() {
        let seg = FixedMask(Mask::filled(3, 3, 255));
        let err = replace_background(&photo(), Some(&seg), "#00FF00").unwrap_err();
        assert!(matches!(err, BackgroundError::SegmentationUnavailable(_)));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
