//! End-to-end edit-flow tests against a real SQLite store.

use chalkboard::config::ImagesConfig;
use chalkboard::edit::{EditService, ImageSubmission, LabelSelection, SubmitOutcome};
use chalkboard::store::{sha256_hex, ContentStore, StoreError};
use chalkboard::types::{
    ContentLicense, Contributor, EntityId, Image, ImageFormat, LiteracySkill, Locale,
};
use chalkboard::validate::Upload;
use chrono::Utc;
use image::codecs::png::PngEncoder;
use image::RgbImage;
use std::io::Cursor;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(PngEncoder::new(Cursor::new(&mut out)))
        .unwrap();
    out
}

fn png_upload(name: &str, width: u32, height: u32) -> Upload {
    Upload {
        filename: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: png_bytes(width, height),
    }
}

fn blank_image(title: &str, locale: Locale) -> Image {
    let bytes = png_bytes(640, 480);
    Image {
        id: 0,
        title: title.to_string(),
        locale,
        image_format: ImageFormat::Png,
        content_type: "image/png".to_string(),
        checksum: sha256_hex(&bytes),
        bytes,
        content_license: ContentLicense::PublicDomain,
        literacy_skills: Vec::new(),
        numeracy_skills: Vec::new(),
        revision: 1,
        last_updated: Utc::now(),
        letters: Vec::new(),
        numbers: Vec::new(),
        words: Vec::new(),
    }
}

struct Fixture {
    service: EditService,
    ctx: Contributor,
    image_id: EntityId,
    letter_id: EntityId,
    word_id: EntityId,
}

fn fixture() -> Fixture {
    let mut store = ContentStore::open_in_memory().unwrap();
    let letter_id = store.insert_letter(Locale::En, "a").unwrap();
    let word_id = store.insert_word(Locale::En, "apple").unwrap();
    store.insert_number(Locale::En, 1).unwrap();
    let image_id = store.insert_image(&blank_image("apple", Locale::En)).unwrap();
    Fixture {
        service: EditService::new(store, ImagesConfig::default()),
        ctx: Contributor { name: "tester".to_string(), locale: Locale::En },
        image_id,
        letter_id,
        word_id,
    }
}

fn submission(title: &str, upload: Upload) -> ImageSubmission {
    ImageSubmission {
        title: title.to_string(),
        locale: Locale::En,
        content_license: ContentLicense::CcBySa,
        literacy_skills: vec![LiteracySkill::Vocabulary],
        numeracy_skills: Vec::new(),
        upload: Some(upload),
    }
}

#[test]
fn submit_downscales_wide_png_and_finalizes() {
    let mut fx = fixture();

    let outcome = fx
        .service
        .submit(&fx.ctx, fx.image_id, submission("Green Apple", png_upload("apple.PNG", 800, 600)))
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Saved(id) if id == fx.image_id));

    let image = fx.service.store().image(fx.image_id).unwrap();
    assert_eq!(image.title, "green apple");
    assert_eq!(image.image_format, ImageFormat::Png);
    assert_eq!(image.revision, 2);
    assert_eq!(image.checksum, sha256_hex(&image.bytes));

    let dims = chalkboard::imaging::decode_dimensions(&image.bytes, ImageFormat::Png).unwrap();
    assert_eq!((dims.width, dims.height), (640, 480));
}

#[test]
fn submit_rejects_narrow_png_without_persisting() {
    let mut fx = fixture();
    let before = fx.service.store().image(fx.image_id).unwrap();

    let outcome = fx
        .service
        .submit(&fx.ctx, fx.image_id, submission("apple", png_upload("apple.png", 320, 240)))
        .unwrap();
    match outcome {
        SubmitOutcome::Rejected { errors, form } => {
            let codes: Vec<_> = errors.iter().map(|e| (e.field(), e.code())).collect();
            assert_eq!(codes, vec![("bytes", "tooSmall")]);
            // Supporting lists come back for redisplay
            assert_eq!(form.letters.len(), 1);
            assert_eq!(form.numbers.len(), 1);
            assert_eq!(form.words.len(), 1);
        }
        SubmitOutcome::Saved(_) => panic!("expected rejection"),
    }

    let after = fx.service.store().image(fx.image_id).unwrap();
    assert_eq!(after.revision, before.revision);
    assert_eq!(after.bytes, before.bytes);
}

#[test]
fn submit_gif_passes_through_verbatim() {
    let mut fx = fixture();
    // 10px-wide "GIF": never decoded, so the payload only needs the name
    let payload = vec![0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 10, 0, 10, 0];
    let upload = Upload {
        filename: "icon.gif".to_string(),
        content_type: None,
        bytes: payload.clone(),
    };

    let outcome = fx.service.submit(&fx.ctx, fx.image_id, submission("icon", upload)).unwrap();
    assert!(matches!(outcome, SubmitOutcome::Saved(_)));

    let image = fx.service.store().image(fx.image_id).unwrap();
    assert_eq!(image.image_format, ImageFormat::Gif);
    assert_eq!(image.bytes, payload);
    assert_eq!(image.content_type, "image/gif");
}

#[test]
fn duplicate_title_across_images_rejected() {
    let mut store = ContentStore::open_in_memory().unwrap();
    store.insert_image(&blank_image("cat", Locale::En)).unwrap();
    let dog_id = store.insert_image(&blank_image("dog", Locale::En)).unwrap();
    let mut service = EditService::new(store, ImagesConfig::default());
    let ctx = Contributor { name: "tester".to_string(), locale: Locale::En };

    // Stealing another image's title is rejected, case-insensitively
    match service
        .submit(&ctx, dog_id, submission("Cat", png_upload("cat.png", 640, 480)))
        .unwrap()
    {
        SubmitOutcome::Rejected { errors, .. } => {
            let codes: Vec<_> = errors.iter().map(|e| (e.field(), e.code())).collect();
            assert_eq!(codes, vec![("title", "duplicate")]);
        }
        SubmitOutcome::Saved(_) => panic!("expected rejection"),
    }

    // Re-submitting its own title (any case) is fine
    let outcome = service
        .submit(&ctx, dog_id, submission("DOG", png_upload("dog.png", 640, 480)))
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Saved(_)));
}

#[test]
fn unsupported_extension_rejected() {
    let mut fx = fixture();
    let upload = Upload {
        filename: "photo.webp".to_string(),
        content_type: Some("image/webp".to_string()),
        bytes: vec![1, 2, 3],
    };
    match fx.service.submit(&fx.ctx, fx.image_id, submission("apple", upload)).unwrap() {
        SubmitOutcome::Rejected { errors, .. } => {
            let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
            assert_eq!(codes, vec!["unsupportedType"]);
        }
        SubmitOutcome::Saved(_) => panic!("expected rejection"),
    }
}

#[test]
fn label_round_trip_survives_reload() {
    let mut fx = fixture();
    let selection = LabelSelection {
        letter_id: Some(fx.letter_id),
        word_id: Some(fx.word_id),
        ..Default::default()
    };
    fx.service.add_labels(&fx.ctx, fx.image_id, selection).unwrap();
    // Repeat: idempotent
    fx.service.add_labels(&fx.ctx, fx.image_id, selection).unwrap();

    let image = fx.service.store().image(fx.image_id).unwrap();
    assert_eq!(image.letters.len(), 1);
    assert_eq!(image.words.len(), 1);
    assert!(image.numbers.is_empty());

    fx.service
        .remove_labels(&fx.ctx, fx.image_id, LabelSelection {
            letter_id: Some(fx.letter_id),
            ..Default::default()
        })
        .unwrap();
    let image = fx.service.store().image(fx.image_id).unwrap();
    assert!(image.letters.is_empty());
    assert_eq!(image.words.len(), 1);
}

#[test]
fn unknown_label_entity_is_hard_not_found() {
    let mut fx = fixture();
    let err = fx
        .service
        .add_labels(&fx.ctx, fx.image_id, LabelSelection {
            number_id: Some(4242),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: "number", id: 4242 }));
}

#[test]
fn file_backed_store_survives_reopen() {
    let tmp = tempfile::TempDir::new().unwrap();
    let db = tmp.path().join("content.db");

    let image_id = {
        let mut store = ContentStore::open(&db).unwrap();
        let image_id = store.insert_image(&blank_image("persisted", Locale::Sw)).unwrap();
        let mut service = EditService::new(store, ImagesConfig::default());
        let ctx = Contributor { name: "tester".to_string(), locale: Locale::Sw };
        let mut sub = submission("Persisted Cat", png_upload("c.png", 1280, 720));
        sub.locale = Locale::Sw;
        service.submit(&ctx, image_id, sub).unwrap();
        image_id
    };

    let store = ContentStore::open(&db).unwrap();
    let image = store.image(image_id).unwrap();
    assert_eq!(image.title, "persisted cat");
    assert_eq!(image.revision, 2);
    let dims = chalkboard::imaging::decode_dimensions(&image.bytes, ImageFormat::Png).unwrap();
    assert_eq!(dims.width, 640);
    // 720 * (640/1280) = 360
    assert_eq!(dims.height, 360);
}
