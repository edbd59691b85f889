//! Operation dispatch for the pixel transforms.
//!
//! [`apply`] is a pure function: one decoded image in, one new image out,
//! no I/O and no shared state. Background replacement needs a segmentation
//! model and goes through [`crate::background::replace_background`] instead.

use tracing::debug;

use crate::adjustments::{adjust_brightness, adjust_contrast, adjust_saturation};
use crate::color::{grayscale, sepia};
use crate::decode::{resize, DecodedImage};
use crate::filter::{gaussian_blur, sharpen};
use crate::operation::Operation;
use crate::transform::{apply_crop, apply_flip, apply_rotation, TransformError};

/// Apply one operation to an image.
///
/// # Errors
///
/// - [`TransformError::OutOfBounds`] when a crop region leaves the image
/// - [`TransformError::InvalidParameter`] for degenerate geometry (zero-sized
///   resize or crop)
/// - [`TransformError::RequiresSegmentation`] for
///   [`Operation::ReplaceBackground`]
pub fn apply(image: DecodedImage, op: &Operation) -> Result<DecodedImage, TransformError> {
    debug!(
        operation = op.name(),
        width = image.width,
        height = image.height,
        layout = ?image.layout,
        "applying transform"
    );

    // Factors are validated to a small range; pixel math runs in f32
    let out = match *op {
        Operation::Brightness { factor } => adjust_brightness(&image, factor as f32),
        Operation::Contrast { factor } => adjust_contrast(&image, factor as f32),
        Operation::Saturation { factor } => adjust_saturation(&image, factor as f32),
        Operation::Blur { radius } => gaussian_blur(&image, radius),
        Operation::Sharpen { factor } => sharpen(&image, factor as f32),
        Operation::Grayscale => grayscale(&image),
        Operation::Sepia => sepia(&image),
        Operation::Resize { width, height } => resize(&image, width, height)?,
        Operation::Crop {
            x,
            y,
            width,
            height,
        } => apply_crop(&image, x, y, width, height)?,
        Operation::Rotate { angle } => apply_rotation(&image, angle),
        Operation::Flip { axis } => apply_flip(&image, axis),
        Operation::ReplaceBackground { .. } => return Err(TransformError::RequiresSegmentation),
    };

    debug!(
        operation = op.name(),
        width = out.width,
        height = out.height,
        "transform complete"
    );
    Ok(out)
}
