//! Shared test fixtures: synthetic image payloads and a seeded store.
//!
//! Only compiled for unit tests (`#[cfg(test)]` in lib.rs). Integration
//! tests under `tests/` carry their own copies of the byte encoders since
//! they link against the public API only.

use crate::config::ImagesConfig;
use crate::edit::EditService;
use crate::store::{sha256_hex, ContentStore};
use crate::types::{ContentLicense, Contributor, EntityId, Image, ImageFormat, LiteracySkill, Locale};
use chrono::{TimeZone, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::RgbImage;
use std::io::Cursor;

/// Encode a synthetic gradient PNG with the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(PngEncoder::new(Cursor::new(&mut out)))
        .unwrap();
    out
}

/// Encode a synthetic gradient JPEG with the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(Cursor::new(&mut out), 90))
        .unwrap();
    out
}

/// A minimal valid image entity, title already in stored (lower-cased) form.
pub fn sample_image() -> Image {
    let bytes = vec![1, 2, 3];
    Image {
        id: 0,
        title: "sample cat".to_string(),
        locale: Locale::En,
        image_format: ImageFormat::Png,
        content_type: "image/png".to_string(),
        checksum: sha256_hex(&bytes),
        bytes,
        content_license: ContentLicense::PublicDomain,
        literacy_skills: vec![LiteracySkill::Vocabulary],
        numeracy_skills: Vec::new(),
        revision: 1,
        last_updated: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        letters: Vec::new(),
        numbers: Vec::new(),
        words: Vec::new(),
    }
}

pub fn contributor() -> Contributor {
    Contributor { name: "test-contributor".to_string(), locale: Locale::En }
}

/// Ids assigned while seeding the in-memory store.
pub struct Seed {
    pub image_id: EntityId,
    pub letter_id: EntityId,
    pub number_id: EntityId,
    pub word_id: EntityId,
}

/// An EditService over an in-memory store seeded with one image and one
/// label entity of each kind.
pub fn seeded_service() -> (EditService, Seed) {
    let mut store = ContentStore::open_in_memory().unwrap();
    let letter_id = store.insert_letter(Locale::En, "c").unwrap();
    let number_id = store.insert_number(Locale::En, 3).unwrap();
    let word_id = store.insert_word(Locale::En, "cat").unwrap();
    let image_id = store.insert_image(&sample_image()).unwrap();
    let service = EditService::new(store, ImagesConfig::default());
    (service, Seed { image_id, letter_id, number_id, word_id })
}
