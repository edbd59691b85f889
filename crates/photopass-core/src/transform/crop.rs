//! Image cropping in pixel coordinates.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner
//! - The region is `[x, x + width) × [y, y + height)`
//!
//! A region that does not fit entirely inside the source is an error; it is
//! never clamped or padded.
//!
//! # Example
//!
//! ```ignore
//! // Take the 50x50 block starting at (10, 20)
//! let cropped = apply_crop(&image, 10, 20, 50, 50)?;
//! ```

use super::TransformError;
use crate::decode::DecodedImage;

/// Apply crop to an image using pixel coordinates.
///
/// # Arguments
///
/// * `image` - Source image to crop
/// * `x` - Left edge of the crop region
/// * `y` - Top edge of the crop region
/// * `width` - Width of the crop region (at least 1)
/// * `height` - Height of the crop region (at least 1)
///
/// # Errors
///
/// - [`TransformError::InvalidParameter`] when `width` or `height` is zero
/// - [`TransformError::OutOfBounds`] when the region extends past the source
pub fn apply_crop(
    image: &DecodedImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<DecodedImage, TransformError> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidParameter {
            operation: "crop",
            detail: format!("crop size must be at least 1x1, got {width}x{height}"),
        });
    }

    let right = x.checked_add(width);
    let bottom = y.checked_add(height);
    let fits = matches!((right, bottom), (Some(r), Some(b)) if r <= image.width && b <= image.height);
    if !fits {
        return Err(TransformError::OutOfBounds {
            operation: "crop",
            detail: format!(
                "region x={x} y={y} {width}x{height} exceeds image {}x{}",
                image.width, image.height
            ),
        });
    }

    // Fast path: full crop returns a clone
    if x == 0 && y == 0 && width == image.width && height == image.height {
        return Ok(image.clone());
    }

    let channels = image.channels();
    let src_stride = image.width as usize * channels;
    let row_len = width as usize * channels;
    let mut output = Vec::with_capacity(row_len * height as usize);

    // Copy pixel data row by row
    for row in y as usize..(y + height) as usize {
        let start = row * src_stride + x as usize * channels;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    Ok(DecodedImage {
        width,
        height,
        layout: image.layout,
        pixels: output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ChannelLayout;

    /// Create a test image where each pixel has a unique value based on position.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        DecodedImage::new(width, height, ChannelLayout::Rgb, pixels).unwrap()
    }

    #[test]
    fn test_full_crop() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, 0, 0, 100, 100).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_center_crop() {
        let img = test_image(10, 10);
        let result = apply_crop(&img, 2, 2, 6, 6).unwrap();

        assert_eq!(result.width, 6);
        assert_eq!(result.height, 6);
        // Value at (2, 2) = 2 * 10 + 2 = 22
        assert_eq!(result.pixel(0, 0), &[22, 22, 22]);
        // Value at (7, 7) = 77
        assert_eq!(result.pixel(5, 5), &[77, 77, 77]);
    }

    #[test]
    fn test_crop_100x100_region() {
        let img = test_image(200, 150);
        let result = apply_crop(&img, 10, 10, 100, 100).unwrap();
        assert_eq!((result.width, result.height), (100, 100));
        assert_eq!(result.pixels.len(), 100 * 100 * 3);
    }

    #[test]
    fn test_crop_exactly_at_edge() {
        let img = test_image(10, 10);
        let result = apply_crop(&img, 9, 9, 1, 1).unwrap();
        assert_eq!(result.pixel(0, 0), &[99, 99, 99]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let img = test_image(10, 10);
        let err = apply_crop(&img, 5, 5, 6, 5).unwrap_err();
        assert!(matches!(
            err,
            TransformError::OutOfBounds {
                operation: "crop",
                ..
            }
        ));
        assert!(err.to_string().contains("x=5"));
    }

    #[test]
    fn test_crop_origin_outside() {
        let img = test_image(10, 10);
        assert!(apply_crop(&img, 10, 0, 1, 1).is_err());
        assert!(apply_crop(&img, 0, 10, 1, 1).is_err());
    }

    #[test]
    fn test_crop_overflow_is_out_of_bounds() {
        let img = test_image(10, 10);
        let err = apply_crop(&img, u32::MAX, 0, 2, 2).unwrap_err();
        assert!(matches!(err, TransformError::OutOfBounds { .. }));
    }

    #[test]
    fn test_crop_zero_size_rejected() {
        let img = test_image(10, 10);
        let err = apply_crop(&img, 0, 0, 0, 5).unwrap_err();
        assert!(matches!(err, TransformError::InvalidParameter { .. }));
    }

    #[test]
    fn test_crop_keeps_layout() {
        let img = DecodedImage::filled(8, 8, ChannelLayout::Rgba, &[1, 2, 3, 4]);
        let result = apply_crop(&img, 1, 1, 3, 2).unwrap();
        assert_eq!(result.layout, ChannelLayout::Rgba);
        assert_eq!(result.pixels.len(), 3 * 2 * 4);
        assert_eq!(result.pixel(2, 1), &[1, 2, 3, 4]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
