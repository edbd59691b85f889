//! Operation descriptors and their declared parameter ranges.

use serde::{Deserialize, Serialize};

use crate::transform::{FlipAxis, TransformError};

/// Allowed factor range for brightness, contrast and sharpen.
pub const FACTOR_RANGE: (f64, f64) = (0.1, 3.0);
/// Allowed factor range for saturation (0.0 is full desaturation).
pub const SATURATION_RANGE: (f64, f64) = (0.0, 3.0);
/// Allowed blur radius range.
pub const BLUR_RADIUS_RANGE: (u32, u32) = (1, 20);
/// Allowed resize target range, per axis.
pub const RESIZE_RANGE: (u32, u32) = (1, 4096);
/// Allowed rotation angle range, in degrees.
pub const ROTATE_RANGE: (f64, f64) = (-360.0, 360.0);

/// One editing request, consumed once by the engine or the background
/// pipeline.
///
/// Serialized with an `operation` tag:
///
/// ```text
/// {"operation": "brightness", "factor": 1.5}
/// {"operation": "crop", "x": 0, "y": 0, "width": 100, "height": 100}
/// {"operation": "flip", "axis": "horizontal"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    Brightness {
        factor: f64,
    },
    Contrast {
        factor: f64,
    },
    Saturation {
        factor: f64,
    },
    Blur {
        radius: u32,
    },
    Sharpen {
        factor: f64,
    },
    Grayscale,
    Sepia,
    Resize {
        width: u32,
        height: u32,
    },
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Rotate {
        angle: f64,
    },
    Flip {
        #[serde(alias = "direction")]
        axis: FlipAxis,
    },
    ReplaceBackground {
        color: String,
    },
}

impl Operation {
    /// Stable snake_case name, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Brightness { .. } => "brightness",
            Operation::Contrast { .. } => "contrast",
            Operation::Saturation { .. } => "saturation",
            Operation::Blur { .. } => "blur",
            Operation::Sharpen { .. } => "sharpen",
            Operation::Grayscale => "grayscale",
            Operation::Sepia => "sepia",
            Operation::Resize { .. } => "resize",
            Operation::Crop { .. } => "crop",
            Operation::Rotate { .. } => "rotate",
            Operation::Flip { .. } => "flip",
            Operation::ReplaceBackground { .. } => "replace_background",
        }
    }

    /// Check every parameter against its declared range.
    ///
    /// Geometry that depends on the image (a crop region reaching past the
    /// edge) is checked later by the transform itself. The background color
    /// is parsed by the background pipeline.
    pub fn validate(&self) -> Result<(), TransformError> {
        let op = self.name();
        match *self {
            Operation::Brightness { factor }
            | Operation::Contrast { factor }
            | Operation::Sharpen { factor } => check_f64(op, "factor", factor, FACTOR_RANGE),
            Operation::Saturation { factor } => check_f64(op, "factor", factor, SATURATION_RANGE),
            Operation::Blur { radius } => check_u32(op, "radius", radius, BLUR_RADIUS_RANGE),
            Operation::Resize { width, height } => {
                check_u32(op, "width", width, RESIZE_RANGE)?;
                check_u32(op, "height", height, RESIZE_RANGE)
            }
            Operation::Crop { width, height, .. } => {
                check_u32(op, "width", width, (1, u32::MAX))?;
                check_u32(op, "height", height, (1, u32::MAX))
            }
            Operation::Rotate { angle } => check_f64(op, "angle", angle, ROTATE_RANGE),
            Operation::Grayscale
            | Operation::Sepia
            | Operation::Flip { .. }
            | Operation::ReplaceBackground { .. } => Ok(()),
        }
    }
}

fn check_f64(
    op: &'static str,
    param: &str,
    value: f64,
    (min, max): (f64, f64),
) -> Result<(), TransformError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(op, param, value, min, max))
    }
}

fn check_u32(
    op: &'static str,
    param: &str,
    value: u32,
    (min, max): (u32, u32),
) -> Result<(), TransformError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(op, param, value, min, max))
    }
}

fn out_of_range<T: std::fmt::Display>(
    op: &'static str,
    param: &str,
    value: T,
    min: T,
    max: T,
) -> TransformError {
    TransformError::InvalidParameter {
        operation: op,
        detail: format!("{param}={value} is outside [{min}, {max}]"),
    }
}
