//! Geometric transforms: crop, rotation and flip.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, x grows right, y grows down
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Crop regions are in whole pixels and must lie inside the image
//!
//! Geometric transforms move every channel, alpha included.

mod crop;
mod flip;
mod rotation;

use thiserror::Error;

pub use crop::apply_crop;
pub use flip::{apply_flip, FlipAxis};
pub use rotation::apply_rotation;

/// Errors raised by the transformation engine.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The requested geometry does not fit the image.
    #[error("{operation}: out of bounds: {detail}")]
    OutOfBounds {
        operation: &'static str,
        detail: String,
    },

    /// A parameter is outside its declared range.
    #[error("{operation}: invalid parameter: {detail}")]
    InvalidParameter {
        operation: &'static str,
        detail: String,
    },

    /// The operation needs a segmentation model and cannot run as a plain
    /// pixel transform.
    #[error("replace_background requires a segmentation model; use the background pipeline")]
    RequiresSegmentation,
}
