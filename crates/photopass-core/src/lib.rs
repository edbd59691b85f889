//! Photopass Core - Image editing library
//!
//! This crate provides the core image processing functionality for Photopass,
//! including decoding, the transformation engine, background replacement,
//! JPEG output, and the storage-backed processing service.

pub mod adjustments;
pub mod background;
pub mod color;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod filter;
pub mod luminance;
pub mod naming;
pub mod operation;
pub mod service;
pub mod transform;

pub use background::{BackgroundColor, BackgroundError, Mask, SegmentationError, Segmenter};
pub use config::{ConfigError, ProcessorConfig};
pub use decode::{DecodeError, DecodedImage};
pub use encode::EncodeError;
pub use naming::processed_name;
pub use operation::Operation;
pub use service::{
    ErrorKind, ImageInfo, ImageProcessor, ProcessError, ProcessingResult, StoredImage,
    UploadReceipt,
};
pub use transform::{FlipAxis, TransformError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_request_to_output_name() {
        let op: Operation =
            serde_json::from_str(r#"{"operation": "flip", "direction": "horizontal"}"#).unwrap();
        assert_eq!(op.name(), "flip");
        assert_eq!(processed_name("cat.jpg", &op), "cat_flip_horizontal.jpg");
    }

    #[test]
    fn test_engine_pipeline_end_to_end() {
        let image = DecodedImage::filled(10, 4, decode::ChannelLayout::Rgb, &[120, 60, 30]);
        let ops = [
            Operation::Crop {
                x: 2,
                y: 0,
                width: 6,
                height: 4,
            },
            Operation::Rotate { angle: 90.0 },
            Operation::Grayscale,
        ];

        let out = ops
            .iter()
            .try_fold(image, |img, op| engine::apply(img, op))
            .unwrap();
        assert_eq!((out.width, out.height), (4, 6));
        let bytes = encode::encode(&out).unwrap();
        assert_eq!(decode::decode(&bytes).unwrap().width, 4);
    }
}
