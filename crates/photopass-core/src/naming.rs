//! Output file naming.
//!
//! A processed image is stored as `<stem><suffix><ext>`, keeping the input
//! extension even though the content is always JPEG. The suffix records the
//! operation and its parameters, so the same request always maps to the same
//! output name.

use crate::operation::Operation;

/// Build the output identifier for `filename` processed by `op`.
///
/// ```text
/// photo.jpg + Brightness { factor: 1.5 }        -> photo_brightness_1.5.jpg
/// photo.png + Crop { 10, 20, 100x50 }           -> photo_crop_10_20_100x50.png
/// photo.jpg + ReplaceBackground { "#00FF00" }   -> photo_background_#00FF00.jpg
/// ```
pub fn processed_name(filename: &str, op: &Operation) -> String {
    let (stem, ext) = split_extension(filename);
    format!("{stem}{}{ext}", suffix(op))
}

/// Suffix appended to the input stem for `op`.
pub fn suffix(op: &Operation) -> String {
    match op {
        Operation::Brightness { factor } => format!("_brightness_{}", float_repr(*factor)),
        Operation::Contrast { factor } => format!("_contrast_{}", float_repr(*factor)),
        Operation::Saturation { factor } => format!("_saturation_{}", float_repr(*factor)),
        Operation::Blur { radius } => format!("_blur_{radius}"),
        Operation::Sharpen { factor } => format!("_sharpen_{}", float_repr(*factor)),
        Operation::Grayscale => "_grayscale".to_string(),
        Operation::Sepia => "_sepia".to_string(),
        Operation::Resize { width, height } => format!("_resize_{width}x{height}"),
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => format!("_crop_{x}_{y}_{width}x{height}"),
        Operation::Rotate { angle } => format!("_rotate_{}", float_repr(*angle)),
        Operation::Flip { axis } => format!("_flip_{}", axis.as_str()),
        Operation::ReplaceBackground { color } => format!("_background_{color}"),
    }
}

/// Split `name` into stem and extension (with its dot).
///
/// Leading dots belong to the stem, so `.hidden` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(i) => name.split_at(leading + i),
        None => (name, ""),
    }
}

/// Render a float the way a Python `repr` would.
///
/// Integral values keep one decimal (`1.0`, `-90.0`), other values use the
/// shortest round-trip digits (`0.5`, `1.25`), and very small or very large
/// magnitudes switch to scientific notation with a two-digit exponent
/// (`1e-05`, `1.5e+16`).
pub fn float_repr(v: f64) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "nan".to_string()
        } else if v > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let magnitude = v.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{v:e}");
        return match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(d) => ('-', d),
                    None => ('+', exp),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => sci,
        };
    }

    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
