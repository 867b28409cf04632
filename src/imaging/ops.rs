//! Decode, rescale, and re-encode operations on in-memory upload buffers.
//!
//! Uploads arrive as byte payloads, not files, so everything here works on
//! `&[u8]` through `std::io::Cursor`. The declared [`ImageFormat`] is
//! authoritative: decoding never guesses the format from magic bytes, it
//! fails with [`ImagingError::Decode`] when the payload does not match.

use crate::types::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use std::io::Cursor;
use thiserror::Error;

use super::calculations::scaled_dimensions;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("failed to decode {format} payload: {reason}")]
    Decode {
        format: ImageFormat,
        reason: String,
    },
    #[error("failed to encode {format} payload: {reason}")]
    Encode {
        format: ImageFormat,
        reason: String,
    },
}

/// Result of probing an upload's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

fn decoder_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpg => image::ImageFormat::Jpeg,
        // GIF is stored verbatim; nothing ever decodes it here.
        ImageFormat::Gif => image::ImageFormat::Gif,
    }
}

/// Read the pixel dimensions from a payload's header without a full decode.
pub fn decode_dimensions(bytes: &[u8], format: ImageFormat) -> Result<Dimensions, ImagingError> {
    let reader = ImageReader::with_format(Cursor::new(bytes), decoder_format(format));
    let (width, height) = reader.into_dimensions().map_err(|e| ImagingError::Decode {
        format,
        reason: e.to_string(),
    })?;
    Ok(Dimensions { width, height })
}

/// Downscale a payload to exactly `target_width`, preserving aspect ratio,
/// and re-encode it in its original format.
///
/// `jpeg_quality` applies only to JPG re-encodes; PNG output is lossless.
/// Callers are expected to skip this entirely when the source width already
/// equals the target, so the stored bytes stay byte-identical to the upload.
pub fn scale_to_width(
    bytes: &[u8],
    format: ImageFormat,
    target_width: u32,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ImagingError> {
    let reader = ImageReader::with_format(Cursor::new(bytes), decoder_format(format));
    let img = reader.decode().map_err(|e| ImagingError::Decode {
        format,
        reason: e.to_string(),
    })?;

    let (w, h) = scaled_dimensions((img.width(), img.height()), target_width);
    let resized = img.resize_exact(w, h, FilterType::Lanczos3);

    let mut out = Vec::new();
    match format {
        ImageFormat::Png => resized
            .write_with_encoder(PngEncoder::new(Cursor::new(&mut out)))
            .map_err(|e| ImagingError::Encode {
                format,
                reason: e.to_string(),
            })?,
        ImageFormat::Jpg => resized
            .write_with_encoder(JpegEncoder::new_with_quality(
                Cursor::new(&mut out),
                jpeg_quality,
            ))
            .map_err(|e| ImagingError::Encode {
                format,
                reason: e.to_string(),
            })?,
        ImageFormat::Gif => {
            return Err(ImagingError::Encode {
                format,
                reason: "GIF payloads are stored verbatim and never rescaled".into(),
            });
        }
    }
    Ok(out)
}
