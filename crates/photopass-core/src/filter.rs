//! Convolution filters: Gaussian blur and sharpening.
//!
//! # Border handling
//!
//! Both filters clamp sample coordinates to the image (edge pixels are
//! replicated outward). A uniform image therefore stays exactly uniform,
//! including at its borders.

use crate::decode::{ChannelLayout, DecodedImage};

/// Gaussian blur with standard deviation equal to `radius`.
///
/// The kernel extends `3 * radius` pixels to each side and is normalized in
/// Q16 fixed point so its weights sum to exactly 1.0. The blur is separable
/// (horizontal pass then vertical pass). RGBA images are blurred with
/// premultiplied color so transparent pixels do not bleed their color.
///
/// A radius of 0 returns an unchanged copy.
pub fn gaussian_blur(image: &DecodedImage, radius: u32) -> DecodedImage {
    if radius == 0 {
        return image.clone();
    }

    let kernel = gaussian_kernel_q16(radius);
    let channels = image.channels();
    let (width, height) = (image.width as usize, image.height as usize);

    let src = if image.layout.has_alpha() {
        premultiply(&image.pixels)
    } else {
        image.pixels.clone()
    };

    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];
    horizontal_pass(&src, &mut tmp, width, height, channels, &kernel);
    vertical_pass(&tmp, &mut out, width, height, channels, &kernel);

    if image.layout.has_alpha() {
        unpremultiply(&mut out);
    }

    DecodedImage {
        width: image.width,
        height: image.height,
        layout: image.layout,
        pixels: out,
    }
}

/// Unsharp-mask sharpening.
///
/// ```text
/// output = original + factor * (original - smooth(original))
/// ```
///
/// `smooth` is the 3x3 kernel `[[1,1,1],[1,5,1],[1,1,1]] / 13`. Because the
/// detail term is added on top of the original, factor 1.0 is already a
/// visible enhancement rather than the identity. Alpha is left untouched.
pub fn sharpen(image: &DecodedImage, factor: f32) -> DecodedImage {
    let smoothed = smooth3x3(image);
    let channels = image.channels();
    let color = image.layout.color_channels();

    let mut out = image.clone();
    for (px, sm) in out
        .pixels
        .chunks_exact_mut(channels)
        .zip(smoothed.chunks_exact(channels))
    {
        for c in 0..color {
            let original = px[c] as f32;
            let detail = original - sm[c] as f32;
            px[c] = (original + factor * detail).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn gaussian_kernel_q16(radius: u32) -> Vec<u32> {
    let sigma = radius as f64;
    let half = (3.0 * sigma).ceil() as i32;
    let denom = 2.0 * sigma * sigma;

    let weights_f: Vec<f64> = (-half..=half)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|&wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Fold the rounding residue into the center tap so the kernel sums to 1.0
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    weights
}

fn horizontal_pass(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    k: &[u32],
) {
    let radius = (k.len() / 2) as isize;
    let max_x = width as isize - 1;
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius).clamp(0, max_x) as usize;
                let idx = (row + sx) * channels;
                for c in 0..channels {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = (row + x) * channels;
            for c in 0..channels {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    channels: usize,
    k: &[u32],
) {
    let radius = (k.len() / 2) as isize;
    let max_y = height as isize - 1;
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius).clamp(0, max_y) as usize;
                let idx = (sy * width + x) * channels;
                for c in 0..channels {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = (y * width + x) * channels;
            for c in 0..channels {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

#[inline]
fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

/// 3x3 smoothing with clamped borders, rounded to u8.
fn smooth3x3(image: &DecodedImage) -> Vec<u8> {
    const WEIGHTS: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
    const TOTAL: u32 = 13;

    let channels = image.channels();
    let (w, h) = (image.width as isize, image.height as isize);
    let mut out = vec![0u8; image.pixels.len()];

    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u32; 4];
            for (ky, row) in WEIGHTS.iter().enumerate() {
                let sy = (y + ky as isize - 1).clamp(0, h - 1);
                for (kx, &kw) in row.iter().enumerate() {
                    let sx = (x + kx as isize - 1).clamp(0, w - 1);
                    let idx = ((sy * w + sx) as usize) * channels;
                    for c in 0..channels {
                        acc[c] += kw * u32::from(image.pixels[idx + c]);
                    }
                }
            }
            let out_idx = ((y * w + x) as usize) * channels;
            for c in 0..channels {
                out[out_idx + c] = ((acc[c] + TOTAL / 2) / TOTAL) as u8;
            }
        }
    }
    out
}

fn premultiply(pixels: &[u8]) -> Vec<u8> {
    let mut out = pixels.to_vec();
    for px in out.chunks_exact_mut(ChannelLayout::Rgba.channels()) {
        let a = u32::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * a + 127) / 255) as u8;
        }
    }
    out
}

fn unpremultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(ChannelLayout::Rgba.channels()) {
        let a = u32::from(px[3]);
        for c in &mut px[..3] {
            *c = if a == 0 {
                0
            } else {
                ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8
            };
        }
    }
}
