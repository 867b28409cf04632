//! Image processing — pure Rust, in-memory byte buffers only.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe dimensions** | `image::ImageReader::into_dimensions` (header only) |
//! | **Downscale** | `image::imageops` Lanczos3 via `DynamicImage::resize_exact` |
//! | **Re-encode** | `PngEncoder` / `JpegEncoder` (same format as input) |
//!
//! GIF payloads are stored verbatim and never pass through this module.
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (unit testable, no pixels)
//! - **Ops**: decode/rescale/re-encode on `&[u8]` buffers

mod calculations;
pub mod ops;

pub use calculations::scaled_dimensions;
pub use ops::{decode_dimensions, scale_to_width, Dimensions, ImagingError};
