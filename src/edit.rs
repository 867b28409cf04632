//! Edit-flow orchestration.
//!
//! The library-facing equivalent of the image edit endpoints: load the form
//! data, run the validation pipeline on a submit, finalize and persist on
//! success, and apply label add/remove requests. HTTP routing, sessions, and
//! templating are collaborator concerns; callers hand in an explicit
//! [`Contributor`] context instead of ambient session state.
//!
//! Error model: hard failures (missing image, missing label entity, storage
//! errors) propagate as [`StoreError`]; recoverable validation failures come
//! back as data inside [`SubmitOutcome::Rejected`] together with the
//! repopulated form.

use crate::config::ImagesConfig;
use crate::labels;
use crate::store::{sha256_hex, ContentStore, StoreError};
use crate::types::{
    ContentLicense, Contributor, EntityId, Image, LabelKind, Letter, LiteracySkill, Locale,
    Number, NumeracySkill, Word,
};
use crate::validate::{self, FieldErrors, Outcome, Upload};
use chrono::Utc;
use tracing::{info, warn};

/// Everything the edit form needs: the image plus the option lists.
#[derive(Debug, Clone)]
pub struct EditForm {
    pub image: Image,
    pub content_licenses: &'static [ContentLicense],
    pub literacy_skills: &'static [LiteracySkill],
    pub numeracy_skills: &'static [NumeracySkill],
    /// Locale-ordered label entities for assignment, per the contributor's locale.
    pub letters: Vec<Letter>,
    pub numbers: Vec<Number>,
    pub words: Vec<Word>,
}

/// Form fields bound on submit. `upload` is the multipart `bytes` field;
/// `None` when the request carried no file part.
#[derive(Debug, Clone)]
pub struct ImageSubmission {
    pub title: String,
    pub locale: Locale,
    pub content_license: ContentLicense,
    pub literacy_skills: Vec<LiteracySkill>,
    pub numeracy_skills: Vec<NumeracySkill>,
    pub upload: Option<Upload>,
}

/// Result of a submit: saved, or rejected with field errors and the form
/// to redisplay (submitted fields applied, stored payload untouched).
#[derive(Debug)]
pub enum SubmitOutcome {
    Saved(EntityId),
    Rejected { errors: FieldErrors, form: EditForm },
}

/// Optional per-kind label selection, mirroring the
/// `letterId`/`numberId`/`wordId` parameters of the label endpoints.
/// Any subset may be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelSelection {
    pub letter_id: Option<EntityId>,
    pub number_id: Option<EntityId>,
    pub word_id: Option<EntityId>,
}

/// Synchronous edit-flow service over the content store.
pub struct EditService {
    store: ContentStore,
    images: ImagesConfig,
}

impl EditService {
    pub fn new(store: ContentStore, images: ImagesConfig) -> Self {
        Self { store, images }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Load the edit form for an image: the entity itself, every license and
    /// skill variant, and the label entities ordered for the contributor's
    /// locale.
    pub fn edit_form(&self, ctx: &Contributor, id: EntityId) -> Result<EditForm, StoreError> {
        let image = self.store.image(id)?;
        self.form_for(ctx, image)
    }

    fn form_for(&self, ctx: &Contributor, image: Image) -> Result<EditForm, StoreError> {
        Ok(EditForm {
            image,
            content_licenses: ContentLicense::ALL,
            literacy_skills: LiteracySkill::ALL,
            numeracy_skills: NumeracySkill::ALL,
            letters: self.store.letters_ordered(ctx.locale)?,
            numbers: self.store.numbers_ordered(ctx.locale)?,
            words: self.store.words_ordered(ctx.locale)?,
        })
    }

    /// Handle a form submit: validate, and on success finalize and persist.
    ///
    /// Finalization is the single read-modify-write of the row: lower-cased
    /// title, fresh `last_updated`, revision bumped by exactly 1, checksum
    /// recomputed over the normalized payload.
    pub fn submit(
        &mut self,
        ctx: &Contributor,
        id: EntityId,
        submission: ImageSubmission,
    ) -> Result<SubmitOutcome, StoreError> {
        let mut image = self.store.image(id)?;

        let outcome = validate::validate_and_normalize(
            &self.store,
            id,
            &submission.title,
            submission.locale,
            submission.upload.as_ref(),
            &self.images,
        )?;

        match outcome {
            Outcome::Rejected(errors) => {
                warn!(contributor = %ctx.name, image = id, %errors, "submit rejected");
                apply_fields(&mut image, &submission);
                let form = self.form_for(ctx, image)?;
                Ok(SubmitOutcome::Rejected { errors, form })
            }
            Outcome::Accepted(normalized) => {
                apply_fields(&mut image, &submission);
                image.title = image.title.to_lowercase();
                image.image_format = normalized.format;
                image.content_type = normalized.content_type;
                image.checksum = sha256_hex(&normalized.bytes);
                image.bytes = normalized.bytes;
                image.last_updated = Utc::now();
                image.revision += 1;
                self.store.update_image(&image)?;
                info!(
                    contributor = %ctx.name,
                    image = id,
                    revision = image.revision,
                    format = %image.image_format,
                    "image updated"
                );
                Ok(SubmitOutcome::Saved(id))
            }
        }
    }

    /// Apply the add side of a label request: each present id is resolved
    /// (a missing entity is a hard not-found, not a skip) and appended
    /// unless already present. Each changed kind is persisted immediately.
    pub fn add_labels(
        &mut self,
        ctx: &Contributor,
        id: EntityId,
        selection: LabelSelection,
    ) -> Result<(), StoreError> {
        let mut image = self.store.image(id)?;

        if let Some(letter_id) = selection.letter_id {
            let letter = self.store.letter(letter_id)?;
            if let Some(next) = labels::append_label(&image.letters, letter) {
                image.letters = next;
                self.persist_labels(ctx, &image, LabelKind::Letter, "added")?;
            }
        }
        if let Some(number_id) = selection.number_id {
            let number = self.store.number(number_id)?;
            if let Some(next) = labels::append_label(&image.numbers, number) {
                image.numbers = next;
                self.persist_labels(ctx, &image, LabelKind::Number, "added")?;
            }
        }
        if let Some(word_id) = selection.word_id {
            let word = self.store.word(word_id)?;
            if let Some(next) = labels::append_label(&image.words, word) {
                image.words = next;
                self.persist_labels(ctx, &image, LabelKind::Word, "added")?;
            }
        }
        Ok(())
    }

    /// Apply the remove side of a label request. Removing an id that is not
    /// in the collection is a no-op; an id that no entity has at all is a
    /// hard not-found.
    pub fn remove_labels(
        &mut self,
        ctx: &Contributor,
        id: EntityId,
        selection: LabelSelection,
    ) -> Result<(), StoreError> {
        let mut image = self.store.image(id)?;

        if let Some(letter_id) = selection.letter_id {
            self.store.letter(letter_id)?;
            if let Some(next) = labels::remove_label(&image.letters, letter_id) {
                image.letters = next;
                self.persist_labels(ctx, &image, LabelKind::Letter, "removed")?;
            }
        }
        if let Some(number_id) = selection.number_id {
            self.store.number(number_id)?;
            if let Some(next) = labels::remove_label(&image.numbers, number_id) {
                image.numbers = next;
                self.persist_labels(ctx, &image, LabelKind::Number, "removed")?;
            }
        }
        if let Some(word_id) = selection.word_id {
            self.store.word(word_id)?;
            if let Some(next) = labels::remove_label(&image.words, word_id) {
                image.words = next;
                self.persist_labels(ctx, &image, LabelKind::Word, "removed")?;
            }
        }
        Ok(())
    }

    fn persist_labels(
        &mut self,
        ctx: &Contributor,
        image: &Image,
        kind: LabelKind,
        action: &str,
    ) -> Result<(), StoreError> {
        self.store.update_image(image)?;
        info!(contributor = %ctx.name, image = image.id, %kind, action, "label collection updated");
        Ok(())
    }
}

/// Copy the plain form fields onto the entity. The payload-derived fields
/// (format, content type, bytes, checksum) are set only on acceptance.
fn apply_fields(image: &mut Image, submission: &ImageSubmission) {
    image.title = submission.title.clone();
    image.locale = submission.locale;
    image.content_license = submission.content_license;
    image.literacy_skills = submission.literacy_skills.clone();
    image.numeracy_skills = submission.numeracy_skills.clone();
}
