//! ONNX Runtime binding for a salient-object segmentation model.
//!
//! Expects a U²-Net style network: one `1x3x320x320` float input and a
//! first output whose channel 0 is the foreground probability map.

use std::path::Path;
use std::sync::Mutex;

use image::{imageops, GrayImage, RgbImage};
use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use tracing::{debug, info};

use super::{Mask, SegmentationError, Segmenter};
use crate::decode::DecodedImage;

/// Model input edge length.
const INPUT_SIZE: u32 = 320;

/// ImageNet channel means.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations.
const STD: [f32; 3] = [0.229, 0.224, 0.225];

fn model_error(e: impl std::fmt::Display) -> SegmentationError {
    SegmentationError::Model(e.to_string())
}

/// Segmenter backed by an ONNX model file.
///
/// The session is serialized behind a mutex so one segmenter can be shared
/// across request threads.
pub struct OnnxSegmenter {
    session: Mutex<Session>,
}

impl OnnxSegmenter {
    /// Load a model from an ONNX file.
    pub fn from_file<P: AsRef<Path>>(model_path: P) -> Result<Self, SegmentationError> {
        let path = model_path.as_ref();
        info!("Loading segmentation model from {}", path.display());

        let session = Session::builder()
            .map_err(model_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_error)?
            .with_intra_threads(4)
            .map_err(model_error)?
            .commit_from_file(path)
            .map_err(|e| {
                SegmentationError::Model(format!(
                    "failed to load model from {}: {e}",
                    path.display()
                ))
            })?;

        info!("Segmentation model loaded");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Segmenter for OnnxSegmenter {
    fn segment(&self, image: &DecodedImage) -> Result<Mask, SegmentationError> {
        let _span = tracing::debug_span!("onnx_segment").entered();

        let rgb = image.clone().into_rgb();
        let frame = RgbImage::from_raw(rgb.width, rgb.height, rgb.pixels).ok_or_else(|| {
            SegmentationError::InvalidOutput("image buffer does not match its size".to_string())
        })?;
        let input = preprocess(&frame);

        let prediction = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| SegmentationError::Model("session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![TensorRef::from_array_view(input.view()).map_err(model_error)?])
                .map_err(model_error)?;
            let output = outputs[0].try_extract_array::<f32>().map_err(model_error)?;

            let shape = output.shape().to_vec();
            if shape.len() != 4 || shape[0] < 1 || shape[1] < 1 {
                return Err(SegmentationError::InvalidOutput(format!(
                    "expected a 1xCxHxW map, got shape {shape:?}"
                )));
            }
            let (h, w) = (shape[2], shape[3]);
            // Channel 0 of the first batch item
            let values: Vec<f32> = output.iter().take(h * w).copied().collect();
            (values, w as u32, h as u32)
        };

        let (values, map_w, map_h) = prediction;
        debug!(map_w, map_h, "model output received");
        postprocess(&values, map_w, map_h, image.width, image.height)
    }
}

/// Resize to the model input, scale by the image's own maximum, then
/// normalize with ImageNet statistics into an NCHW tensor.
fn preprocess(frame: &RgbImage) -> Array4<f32> {
    let resized = imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, imageops::FilterType::Lanczos3);

    let max = resized.as_raw().iter().copied().max().unwrap_or(0);
    let scale = f32::from(max).max(1e-6);

    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let v = f32::from(pixel[c]) / scale;
            tensor[[0, c, y as usize, x as usize]] = (v - MEAN[c]) / STD[c];
        }
    }
    tensor
}

/// Min-max normalize the probability map, quantize and resize it back to
/// the source size.
fn postprocess(
    values: &[f32],
    map_w: u32,
    map_h: u32,
    width: u32,
    height: u32,
) -> Result<Mask, SegmentationError> {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if range.is_nan() || range <= 0.0 {
        // No contrast in the prediction: nothing is foreground
        return Ok(Mask::filled(width, height, 0));
    }

    let quantized: Vec<u8> = values
        .iter()
        .map(|&v| (((v - min) / range) * 255.0).clamp(0.0, 255.0) as u8)
        .collect();

    let map = GrayImage::from_raw(map_w, map_h, quantized).ok_or_else(|| {
        SegmentationError::InvalidOutput(format!("{map_w}x{map_h} map has wrong length"))
    })?;
    let resized = if (map_w, map_h) == (width, height) {
        map
    } else {
        imageops::resize(&map, width, height, imageops::FilterType::Lanczos3)
    };

    Mask::new(width, height, resized.into_raw())
}
