//! Image decoding for Photopass.
//!
//! This module provides functionality for:
//! - Decoding stored bytes (JPEG, PNG, BMP, TIFF, WebP) with content sniffing
//! - Reading format and color-mode metadata
//! - Exact-size resampling
//!
//! # Architecture
//!
//! Every decoded image lands in one of three channel layouts (luma, RGB,
//! RGBA) with 8-bit samples, so the rest of the engine only deals with
//! those three cases.
//!
//! # Examples
//!
//! ```ignore
//! use photopass_core::decode::{decode, DecodedImage};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let image = decode(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod codec;
mod resize;
mod types;

pub use codec::{decode, from_dynamic, probe, sniff_format};
pub use resize::resize;
pub use types::{
    ChannelLayout, DecodeError, DecodedImage, ImageFormatKind, ImageMetadata,
};
