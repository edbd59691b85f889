//! Luma calculation using ITU-R BT.601 coefficients.
//!
//! This is the weighting used when a color image is stored as an 8-bit gray
//! image. Saturation uses it as its per-pixel reference and grayscale
//! conversion writes it out directly.

/// Calculate 8-bit luma from u8 RGB values.
///
/// Uses 16.16 fixed point with the BT.601 weights scaled to 65536
/// (19595 + 38470 + 7471) and rounds half up, so a gray input maps to itself.
#[inline]
pub fn calculate_luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let acc = 19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + 0x8000;
    (acc >> 16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficients_sum_to_one() {
        // 0.299, 0.587, 0.114 scaled to 65536
        assert_eq!(19595 + 38470 + 7471, 65536);
    }

    #[test]
    fn test_luma_pure_white() {
        assert_eq!(calculate_luma_u8(255, 255, 255), 255);
    }

    #[test]
    fn test_luma_pure_black() {
        assert_eq!(calculate_luma_u8(0, 0, 0), 0);
    }

    #[test]
    fn test_luma_gray_preserves_value() {
        for v in 0..=255u8 {
            assert_eq!(calculate_luma_u8(v, v, v), v);
        }
    }

    #[test]
    fn test_luma_primaries() {
        // 0.299 * 255 = 76.2, 0.587 * 255 = 149.7, 0.114 * 255 = 29.1
        assert_eq!(calculate_luma_u8(255, 0, 0), 76);
        assert_eq!(calculate_luma_u8(0, 255, 0), 150);
        assert_eq!(calculate_luma_u8(0, 0, 255), 29);
    }
}
