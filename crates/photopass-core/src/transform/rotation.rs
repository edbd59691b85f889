//! Image rotation with an expanded canvas and bicubic interpolation.
//!
//! # Algorithm
//!
//! The rotation uses inverse mapping: for each pixel in the output image,
//! we calculate which source position it came from and interpolate the
//! 4x4 neighborhood around it.
//!
//! For a counter-clockwise rotation by angle θ, with θ' = -θ, the inverse
//! transform is:
//! ```text
//! src_x =  cos(θ') * x + sin(θ') * y + c
//! src_y = -sin(θ') * x + cos(θ') * y + f
//! ```
//!
//! `cos` and `sin` are rounded to 15 decimal places, which makes right
//! angles produce exact integer corners (and therefore exact canvas sizes).
//! Exact multiples of 90 degrees skip interpolation entirely and permute
//! pixels.

use crate::decode::DecodedImage;

/// Keys cubic convolution parameter.
const CUBIC_A: f64 = -0.5;

/// Inverse affine map from output pixel space to source pixel space.
#[derive(Debug, Clone, Copy)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    #[inline]
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }
}

#[inline]
fn round15(v: f64) -> f64 {
    (v * 1e15).round() / 1e15
}

/// Build the inverse map and the expanded canvas size.
fn inverse_map(width: u32, height: u32, angle_degrees: f64) -> (Affine, u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let theta = -angle_degrees.to_radians();
    let cos = round15(theta.cos());
    let sin = round15(theta.sin());

    let mut m = Affine {
        a: cos,
        b: sin,
        c: 0.0,
        d: -sin,
        e: cos,
        f: 0.0,
    };

    // Rotate around the source center
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (c, f) = m.apply(-cx, -cy);
    m.c = c + cx;
    m.f = f + cy;

    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| m.apply(x, y));
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in corners {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let new_w = ((max_x.ceil() - min_x.floor()) as u32).max(1);
    let new_h = ((max_y.ceil() - min_y.floor()) as u32).max(1);

    // Re-center on the expanded canvas
    let (c, f) = m.apply(-(new_w as f64 - w) / 2.0, -(new_h as f64 - h) / 2.0);
    m.c = c;
    m.f = f;

    (m, new_w, new_h)
}

/// Normalize to [0, 360).
fn normalize_angle(angle_degrees: f64) -> f64 {
    let a = angle_degrees.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Rotate an image counter-clockwise around its center.
///
/// The output canvas is expanded to fit the entire rotated image (no
/// clipping). Exposed corners are black, or transparent black for RGBA.
pub fn apply_rotation(image: &DecodedImage, angle_degrees: f64) -> DecodedImage {
    let angle = normalize_angle(angle_degrees);
    if angle == 0.0 {
        return image.clone();
    }
    if angle == 90.0 {
        return rotate_right_angle(image, RightAngle::Ccw90);
    }
    if angle == 180.0 {
        return rotate_right_angle(image, RightAngle::Half);
    }
    if angle == 270.0 {
        return rotate_right_angle(image, RightAngle::Cw90);
    }

    let (m, dst_w, dst_h) = inverse_map(image.width, image.height, angle);
    let channels = image.channels();
    // Zero is black for Luma/RGB and transparent black for RGBA
    let mut output = vec![0u8; dst_w as usize * dst_h as usize * channels];

    let (src_w, src_h) = (image.width as f64, image.height as f64);
    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let (sx, sy) = m.apply(dst_x as f64 + 0.5, dst_y as f64 + 0.5);
            if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
                continue;
            }
            let dst_idx = (dst_y as usize * dst_w as usize + dst_x as usize) * channels;
            sample_bicubic(image, sx, sy, &mut output[dst_idx..dst_idx + channels]);
        }
    }

    DecodedImage {
        width: dst_w,
        height: dst_h,
        layout: image.layout,
        pixels: output,
    }
}

#[derive(Debug, Clone, Copy)]
enum RightAngle {
    Ccw90,
    Half,
    Cw90,
}

fn rotate_right_angle(image: &DecodedImage, turn: RightAngle) -> DecodedImage {
    let (w, h) = (image.width as usize, image.height as usize);
    let channels = image.channels();
    let (dst_w, dst_h) = match turn {
        RightAngle::Half => (w, h),
        RightAngle::Ccw90 | RightAngle::Cw90 => (h, w),
    };

    let mut output = vec![0u8; image.pixels.len()];
    for y in 0..dst_h {
        for x in 0..dst_w {
            let (sx, sy) = match turn {
                RightAngle::Ccw90 => (w - 1 - y, x),
                RightAngle::Half => (w - 1 - x, h - 1 - y),
                RightAngle::Cw90 => (y, h - 1 - x),
            };
            let src = (sy * w + sx) * channels;
            let dst = (y * dst_w + x) * channels;
            output[dst..dst + channels].copy_from_slice(&image.pixels[src..src + channels]);
        }
    }

    DecodedImage {
        width: dst_w as u32,
        height: dst_h as u32,
        layout: image.layout,
        pixels: output,
    }
}

/// Keys cubic convolution kernel.
#[inline]
fn cubic_weight(x: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        ((CUBIC_A + 2.0) * x - (CUBIC_A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((CUBIC_A * x - 5.0 * CUBIC_A) * x + 8.0 * CUBIC_A) * x - 4.0 * CUBIC_A
    } else {
        0.0
    }
}

/// Sample a 4x4 neighborhood at continuous position (x, y), where pixel
/// centers sit at half-integer coordinates. Neighbors outside the image are
/// clamped to the edge.
fn sample_bicubic(image: &DecodedImage, x: f64, y: f64, out: &mut [u8]) {
    let channels = image.channels();
    let (w, h) = (image.width as i64, image.height as i64);

    let xin = x - 0.5;
    let yin = y - 0.5;
    let x0 = xin.floor();
    let y0 = yin.floor();
    let dx = xin - x0;
    let dy = yin - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let wx = [
        cubic_weight(1.0 + dx),
        cubic_weight(dx),
        cubic_weight(1.0 - dx),
        cubic_weight(2.0 - dx),
    ];
    let wy = [
        cubic_weight(1.0 + dy),
        cubic_weight(dy),
        cubic_weight(1.0 - dy),
        cubic_weight(2.0 - dy),
    ];

    let mut sum = [0.0f64; 4];
    for (ky, &wyk) in wy.iter().enumerate() {
        let py = (y0 + ky as i64 - 1).clamp(0, h - 1) as usize;
        for (kx, &wxk) in wx.iter().enumerate() {
            let px = (x0 + kx as i64 - 1).clamp(0, w - 1) as usize;
            let idx = (py * image.width as usize + px) * channels;
            let weight = wxk * wyk;
            for c in 0..channels {
                sum[c] += image.pixels[idx + c] as f64 * weight;
            }
        }
    }

    for c in 0..channels {
        out[c] = sum[c].round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ChannelLayout;

    /// Create a simple test image with a gradient pattern.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) * 8) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        DecodedImage::new(width, height, ChannelLayout::Rgb, pixels).unwrap()
    }

    fn rotated_size(width: u32, height: u32, angle: f64) -> (u32, u32) {
        let out = apply_rotation(&DecodedImage::filled(width, height, ChannelLayout::Luma, &[1]), angle);
        (out.width, out.height)
    }

    /// Unique value per position, single channel.
    fn indexed_image(width: u32, height: u32) -> DecodedImage {
        let pixels = (0..width * height).map(|i| (i % 251) as u8).collect();
        DecodedImage::new(width, height, ChannelLayout::Luma, pixels).unwrap()
    }

    #[test]
    fn test_no_rotation() {
        let img = test_image(100, 50);
        assert_eq!(apply_rotation(&img, 0.0), img);
        assert_eq!(apply_rotation(&img, 360.0), img);
        assert_eq!(apply_rotation(&img, -360.0), img);
    }

    #[test]
    fn test_90_degree_rotation_bounds() {
        assert_eq!(rotated_size(100, 50, 90.0), (50, 100));
        assert_eq!(rotated_size(100, 50, -90.0), (50, 100));
        assert_eq!(rotated_size(100, 50, 270.0), (50, 100));
    }

    #[test]
    fn test_180_degree_rotation_bounds() {
        assert_eq!(rotated_size(100, 50, 180.0), (100, 50));
    }

    #[test]
    fn test_45_degree_rotation_bounds() {
        // Diagonal of 100x100 square is ~141.4, plus ceil/floor slack
        let (w, h) = rotated_size(100, 100, 45.0);
        assert_eq!((w, h), (142, 142));
    }

    #[test]
    fn test_opposite_rotations_same_bounds() {
        let (w1, h1) = rotated_size(100, 80, 30.0);
        let (w2, h2) = rotated_size(100, 80, -30.0);
        assert_eq!((w1, h1), (w2, h2));
    }

    #[test]
    fn test_rotate_90_swaps_dimensions() {
        let img = test_image(100, 50);
        let result = apply_rotation(&img, 90.0);
        assert_eq!((result.width, result.height), (50, 100));
    }

    #[test]
    fn test_rotate_90_is_counter_clockwise() {
        // 3x2, values 0..6 row-major:
        // 0 1 2
        // 3 4 5
        // Counter-clockwise by 90 gives 2x3:
        // 2 5
        // 1 4
        // 0 3
        let img = indexed_image(3, 2);
        let out = apply_rotation(&img, 90.0);
        assert_eq!((out.width, out.height), (2, 3));
        assert_eq!(out.pixels, vec![2, 5, 1, 4, 0, 3]);

        let cw = apply_rotation(&img, -90.0);
        assert_eq!(cw.pixels, vec![3, 0, 4, 1, 5, 2]);

        let half = apply_rotation(&img, 180.0);
        assert_eq!(half.pixels, vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_four_quarter_turns_is_identity() {
        let img = indexed_image(7, 4);
        let mut out = img.clone();
        for _ in 0..4 {
            out = apply_rotation(&out, 90.0);
        }
        assert_eq!(out, img);
    }

    #[test]
    fn test_rotation_expands_canvas() {
        let img = test_image(100, 100);
        let result = apply_rotation(&img, 45.0);
        assert!(result.width > img.width);
        assert!(result.height > img.height);
        assert_eq!(
            result.pixels.len(),
            (result.width * result.height * 3) as usize
        );
    }

    #[test]
    fn test_exposed_corners_black() {
        let img = DecodedImage::filled(40, 40, ChannelLayout::Rgb, &[255, 255, 255]);
        let out = apply_rotation(&img, 45.0);
        assert_eq!(out.pixel(0, 0), &[0, 0, 0]);
        let (cx, cy) = (out.width / 2, out.height / 2);
        assert_eq!(out.pixel(cx, cy), &[255, 255, 255]);
    }

    #[test]
    fn test_exposed_corners_transparent_for_rgba() {
        let img = DecodedImage::filled(40, 40, ChannelLayout::Rgba, &[255, 0, 0, 255]);
        let out = apply_rotation(&img, 30.0);
        assert_eq!(out.layout, ChannelLayout::Rgba);
        assert_eq!(out.pixel(0, 0), &[0, 0, 0, 0]);
        let (cx, cy) = (out.width / 2, out.height / 2);
        assert_eq!(out.pixel(cx, cy), &[255, 0, 0, 255]);
    }

    #[test]
    fn test_cubic_weight_partition_of_unity() {
        for dx in [0.0, 0.1, 0.25, 0.5, 0.9] {
            let sum = cubic_weight(1.0 + dx)
                + cubic_weight(dx)
                + cubic_weight(1.0 - dx)
                + cubic_weight(2.0 - dx);
            assert!((sum - 1.0).abs() < 1e-12, "sum {sum} at {dx}");
        }
        assert_eq!(cubic_weight(0.0), 1.0);
        assert_eq!(cubic_weight(1.0), 0.0);
        assert_eq!(cubic_weight(2.0), 0.0);
    }

    #[test]
    fn test_small_image_rotation() {
        let img = test_image(1, 1);
        let result = apply_rotation(&img, 45.0);
        assert!(result.width >= 1 && result.height >= 1);

        let thin = test_image(100, 1);
        let result = apply_rotation(&thin, 30.0);
        assert!(result.width > 0 && result.height > 0);
    }

    #[test]
    fn test_bounds_never_zero() {
        for angle in [1.0, 15.0, 45.0, 89.0, 90.0, 135.0, 179.0, 180.0, 270.0, 359.0] {
            let (w, h) = rotated_size(10, 10, angle);
            assert!(w > 0, "Width should be > 0 for angle {}", angle);
            assert!(h > 0, "Height should be > 0 for angle {}", angle);
        }
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

    proptest! {
        /// Property: Output buffer always matches the reported bounds.
        #[test]
        fn prop_output_matches_bounds(
            (width, height) in (1u32..=40, 1u32..=40),
            angle in -360.0f64..=360.0,
        ) {
            let img = DecodedImage::filled(width, height, ChannelLayout::Rgb, &[9, 9, 9]);
            let out = apply_rotation(&img, angle);
            let (_, w, h) = inverse_map(width, height, normalize_angle(angle));
            let right_angle = normalize_angle(angle) % 90.0 == 0.0;
            if !right_angle {
                prop_assert_eq!((out.width, out.height), (w, h));
            }
            prop_assert_eq!(out.pixels.len(), (out.width * out.height * 3) as usize);
        }

        /// Property: Canvas never shrinks below the source's smaller side.
        #[test]
        fn prop_canvas_contains_source(
            (width, height) in (1u32..=60, 1u32..=60),
            angle in -360.0f64..=360.0,
        ) {
            let img = DecodedImage::filled(width, height, ChannelLayout::Luma, &[1]);
            let out = apply_rotation(&img, angle);
            prop_assert!(out.width.max(out.height) >= width.min(height));
        }

        /// Property: Rotating by +a then -a preserves dimensions for right angles.
        #[test]
        fn prop_right_angle_round_trip(
            (width, height) in (1u32..=20, 1u32..=20),
            k in -4i32..=4,
        ) {
            let pixels = (0..width * height).map(|i| (i % 256) as u8).collect();
            let img = DecodedImage::new(width, height, ChannelLayout::Luma, pixels).unwrap();
            let angle = k as f64 * 90.0;
            let back = apply_rotation(&apply_rotation(&img, angle), -angle);
            prop_assert_eq!(back, img);
        }
    }
}
