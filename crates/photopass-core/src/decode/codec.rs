//! Content-sniffed decoding of stored image bytes.

use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageReader};

use super::{ChannelLayout, DecodeError, DecodedImage, ImageFormatKind, ImageMetadata};

/// Decode image bytes into a [`DecodedImage`].
///
/// The format is detected from the byte content, never from a file name, and
/// must be one of JPEG, PNG, BMP, TIFF or WebP.
///
/// Channel layout is chosen from the stored color type: gray stays [`ChannelLayout::Luma`],
/// anything carrying alpha becomes [`ChannelLayout::Rgba`], the rest becomes
/// [`ChannelLayout::Rgb`]. Samples wider than 8 bits are narrowed.
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedFormat` if the content is not a supported format.
/// Returns `DecodeError::Corrupted` if the data cannot be decoded.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let (_, img) = decode_dynamic(bytes)?;
    from_dynamic(img)
}

/// Read format, geometry and color mode of encoded bytes.
///
/// # Errors
///
/// Same as [`decode`].
pub fn probe(bytes: &[u8]) -> Result<ImageMetadata, DecodeError> {
    let (format, img) = decode_dynamic(bytes)?;
    Ok(ImageMetadata {
        width: img.width(),
        height: img.height(),
        format,
        mode: stored_mode(format, bytes, img.color()).to_string(),
    })
}

/// PNG header offset of the IHDR color-type byte.
const PNG_COLOR_TYPE_OFFSET: usize = 25;

/// IHDR color type of an indexed PNG.
const PNG_INDEXED: u8 = 3;

/// Color mode as stored, before any palette expansion by the decoder.
fn stored_mode(format: ImageFormatKind, bytes: &[u8], color: ColorType) -> &'static str {
    let indexed_png = format == ImageFormatKind::Png
        && bytes.get(PNG_COLOR_TYPE_OFFSET) == Some(&PNG_INDEXED);
    if indexed_png {
        "P"
    } else {
        color_mode_name(color)
    }
}

/// Detect the supported format of `bytes` from its magic number.
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedFormat` for unknown or unsupported content.
pub fn sniff_format(bytes: &[u8]) -> Result<ImageFormatKind, DecodeError> {
    let detected = image::guess_format(bytes).map_err(|_| DecodeError::UnsupportedFormat {
        detected: "unknown".to_string(),
    })?;
    ImageFormatKind::from_image_format(detected).ok_or_else(|| DecodeError::UnsupportedFormat {
        detected: format!("{detected:?}"),
    })
}

fn decode_dynamic(bytes: &[u8]) -> Result<(ImageFormatKind, DynamicImage), DecodeError> {
    let format = sniff_format(bytes)?;

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format.to_image_format());

    let img = reader
        .decode()
        .map_err(|e| DecodeError::Corrupted(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(DecodeError::InvalidDimensions {
            width: img.width(),
            height: img.height(),
        });
    }

    Ok((format, img))
}

/// Convert a `DynamicImage` into the engine's three supported layouts.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for an empty image.
pub fn from_dynamic(img: DynamicImage) -> Result<DecodedImage, DecodeError> {
    let (width, height) = (img.width(), img.height());
    let (layout, pixels) = match img.color() {
        ColorType::L8 | ColorType::L16 => (ChannelLayout::Luma, img.into_luma8().into_raw()),
        color if color.has_alpha() => (ChannelLayout::Rgba, img.into_rgba8().into_raw()),
        _ => (ChannelLayout::Rgb, img.into_rgb8().into_raw()),
    };
    DecodedImage::new(width, height, layout, pixels)
}

/// Short color-mode name in the conventional `L`/`RGB`/`RGBA` notation.
fn color_mode_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGBF",
        ColorType::Rgba32F => "RGBAF",
        _ => "UNKNOWN",
    }
}
