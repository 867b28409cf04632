//! Upload validation and normalization pipeline.
//!
//! Mirrors the submit-side checks of the image edit flow as one pure-ish
//! function: given the form title, the locale, and the multipart payload,
//! either produce a normalized payload ready to persist or a set of
//! field-scoped errors for redisplay. The only store interaction is the
//! read-only title-uniqueness lookup behind [`TitleIndex`].
//!
//! Rules, in order:
//! 1. blank title → `title/required`; another image owning the same
//!    title+locale → `title/duplicate`
//! 2. missing or empty payload → `bytes/required`
//! 3. filename extension decides the format (`.png`, `.jpg`/`.jpeg`,
//!    `.gif`, case-insensitive); anything else → `bytes/unsupportedType`
//! 4. PNG/JPG only: malformed payload → `bytes/decodeFailed`; width below
//!    the configured minimum → `bytes/tooSmall`; width above it →
//!    Lanczos3 downscale to exactly the minimum; width equal → bytes pass
//!    through untouched. GIF skips step 4 entirely.
//!
//! Errors accumulate — a blank title does not hide a too-small payload.

use crate::config::ImagesConfig;
use crate::imaging;
use crate::store::StoreError;
use crate::types::{EntityId, ImageFormat, Locale};
use std::fmt;
use tracing::debug;

/// Read-only title-uniqueness lookup, implemented by the content store.
pub trait TitleIndex {
    /// Id of the image owning `title` (compared lower-cased) in `locale`,
    /// if any.
    fn image_id_for_title(
        &self,
        title: &str,
        locale: Locale,
    ) -> Result<Option<EntityId>, StoreError>;
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    TitleRequired,
    TitleDuplicate,
    BytesRequired,
    UnsupportedType { filename: String },
    TooSmall { width: u32, minimum: u32 },
    DecodeFailed { reason: String },
}

impl FieldError {
    /// Form field the error attaches to.
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::TitleRequired | FieldError::TitleDuplicate => "title",
            _ => "bytes",
        }
    }

    /// Stable machine-readable code for form rendering.
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::TitleRequired | FieldError::BytesRequired => "required",
            FieldError::TitleDuplicate => "duplicate",
            FieldError::UnsupportedType { .. } => "unsupportedType",
            FieldError::TooSmall { .. } => "tooSmall",
            FieldError::DecodeFailed { .. } => "decodeFailed",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::TitleRequired => write!(f, "title is required"),
            FieldError::TitleDuplicate => {
                write!(f, "another image already uses this title in this locale")
            }
            FieldError::BytesRequired => write!(f, "an image file is required"),
            FieldError::UnsupportedType { filename } => {
                write!(f, "unsupported file type: {filename:?} (expected .png, .jpg or .gif)")
            }
            FieldError::TooSmall { width, minimum } => {
                write!(f, "image is {width}px wide; minimum is {minimum}px")
            }
            FieldError::DecodeFailed { reason } => {
                write!(f, "could not decode image: {reason}")
            }
        }
    }
}

/// Accumulated field errors from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Whether any error is attached to the given form field.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field() == field)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}/{}: {}", e.field(), e.code(), e)?;
        }
        Ok(())
    }
}

/// A multipart file upload as received from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original filename as sent by the browser; decides the format.
    pub filename: String,
    /// Declared MIME type, if the client sent one.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A validated, possibly rescaled payload ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUpload {
    pub format: ImageFormat,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Decoded width after normalization; `None` for GIF (never decoded).
    pub width: Option<u32>,
}

/// Result of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted(NormalizedUpload),
    Rejected(FieldErrors),
}

/// Map a filename to an accepted format by its extension, case-insensitive.
///
/// Extension-based detection is authoritative; no content sniffing. A payload
/// whose bytes disagree with its extension fails later at decode time.
pub fn detect_format(filename: &str) -> Option<ImageFormat> {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".png") {
        Some(ImageFormat::Png)
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some(ImageFormat::Jpg)
    } else if lower.ends_with(".gif") {
        Some(ImageFormat::Gif)
    } else {
        None
    }
}

/// Run the full validation pipeline for an edit of `image_id`.
///
/// Pure with respect to the store apart from the title-uniqueness read;
/// persistence is the caller's job. A hard store failure propagates as
/// `Err`; everything recoverable lands in [`Outcome::Rejected`].
pub fn validate_and_normalize<S: TitleIndex>(
    index: &S,
    image_id: EntityId,
    title: &str,
    locale: Locale,
    upload: Option<&Upload>,
    images: &ImagesConfig,
) -> Result<Outcome, StoreError> {
    let mut errors = FieldErrors::new();

    if title.trim().is_empty() {
        errors.push(FieldError::TitleRequired);
    } else {
        let owner = index.image_id_for_title(&title.to_lowercase(), locale)?;
        if owner.is_some_and(|id| id != image_id) {
            errors.push(FieldError::TitleDuplicate);
        }
    }

    let mut accepted = None;
    match upload {
        None => errors.push(FieldError::BytesRequired),
        Some(upload) if upload.bytes.is_empty() => errors.push(FieldError::BytesRequired),
        Some(upload) => match detect_format(&upload.filename) {
            None => errors.push(FieldError::UnsupportedType {
                filename: upload.filename.clone(),
            }),
            Some(format) => {
                let content_type = upload
                    .content_type
                    .clone()
                    .unwrap_or_else(|| format.canonical_content_type().to_string());
                match normalize_payload(upload, format, images) {
                    Ok((bytes, width)) => {
                        accepted = Some(NormalizedUpload {
                            format,
                            content_type,
                            bytes,
                            width,
                        });
                    }
                    Err(e) => errors.push(e),
                }
            }
        },
    }

    match accepted {
        Some(normalized) if errors.is_empty() => Ok(Outcome::Accepted(normalized)),
        _ => Ok(Outcome::Rejected(errors)),
    }
}

/// Width-gate and rescale a single payload. GIF passes through untouched.
fn normalize_payload(
    upload: &Upload,
    format: ImageFormat,
    images: &ImagesConfig,
) -> Result<(Vec<u8>, Option<u32>), FieldError> {
    if format == ImageFormat::Gif {
        return Ok((upload.bytes.clone(), None));
    }

    let dims = imaging::decode_dimensions(&upload.bytes, format)
        .map_err(|e| FieldError::DecodeFailed { reason: e.to_string() })?;
    debug!(filename = %upload.filename, width = dims.width, height = dims.height, "decoded upload");

    let minimum = images.min_width;
    if dims.width < minimum {
        // Payload is discarded with the error; nothing partial persists.
        return Err(FieldError::TooSmall { width: dims.width, minimum });
    }
    if dims.width > minimum {
        let scaled = imaging::scale_to_width(&upload.bytes, format, minimum, images.jpeg_quality)
            .map_err(|e| FieldError::DecodeFailed { reason: e.to_string() })?;
        debug!(filename = %upload.filename, from = dims.width, to = minimum, "downscaled upload");
        return Ok((scaled, Some(minimum)));
    }
    Ok((upload.bytes.clone(), Some(dims.width)))
}
