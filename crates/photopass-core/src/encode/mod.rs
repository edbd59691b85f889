//! Image encoding for Photopass.
//!
//! This module provides functionality for:
//! - Normalizing any decoded buffer to opaque three-channel color
//! - Encoding to JPEG at the fixed output quality
//!
//! # Examples
//!
//! ```ignore
//! use photopass_core::decode::{ChannelLayout, DecodedImage};
//! use photopass_core::encode::encode;
//!
//! let image = DecodedImage::filled(100, 100, ChannelLayout::Rgb, &[128, 128, 128]);
//! let jpeg_bytes = encode(&image).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;

pub use jpeg::{encode, encode_jpeg, EncodeError, OUTPUT_QUALITY};
