//! SQLite-backed content store.
//!
//! Owns the schema and every read/write the edit flow needs: read image by
//! id, case-insensitive title lookup for the uniqueness check, transactional
//! full-entity update, locale-ordered label entity lists, and inserts for
//! seeding. Label associations live in join tables with an explicit
//! `position` column so insertion order survives a round trip.
//!
//! Skill sets are stored as JSON text columns; everything enum-valued is
//! stored as its `as_str` form and parsed back through `FromStr`, so a
//! corrupt row surfaces as [`StoreError::Corrupt`] instead of a panic.

use crate::types::{
    ContentLicense, EntityId, Image, ImageFormat, Letter, LiteracySkill, Locale, Number,
    NumeracySkill, Word,
};
use crate::validate::TitleIndex;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: EntityId },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt {column} in row {id}: {reason}")]
    Corrupt {
        column: &'static str,
        id: EntityId,
        reason: String,
    },
}

fn corrupt<E: std::fmt::Display>(column: &'static str, id: EntityId) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Corrupt { column, id, reason: e.to_string() }
}

/// Hex SHA-256 of a payload, stored alongside the row for change tracking.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// The content catalog: images plus the three label entity tables.
pub struct ContentStore {
    conn: Connection,
}

impl ContentStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        debug!(path = %path.display(), "content store opened");
        Ok(store)
    }

    /// In-memory store, used by tests and `--db :memory:` dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS images (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                title            TEXT NOT NULL,
                locale           TEXT NOT NULL,
                image_format     TEXT NOT NULL,
                content_type     TEXT NOT NULL,
                bytes            BLOB NOT NULL,
                checksum         TEXT NOT NULL,
                content_license  TEXT NOT NULL,
                literacy_skills  TEXT NOT NULL DEFAULT '[]',
                numeracy_skills  TEXT NOT NULL DEFAULT '[]',
                revision         INTEGER NOT NULL DEFAULT 1,
                last_updated     TEXT NOT NULL,
                UNIQUE (title, locale)
            );
            CREATE TABLE IF NOT EXISTS letters (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                locale  TEXT NOT NULL,
                text    TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS numbers (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                locale  TEXT NOT NULL,
                value   INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS words (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                locale  TEXT NOT NULL,
                text    TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS image_letters (
                image_id  INTEGER NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                letter_id INTEGER NOT NULL REFERENCES letters(id),
                position  INTEGER NOT NULL,
                PRIMARY KEY (image_id, letter_id)
            );
            CREATE TABLE IF NOT EXISTS image_numbers (
                image_id  INTEGER NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                number_id INTEGER NOT NULL REFERENCES numbers(id),
                position  INTEGER NOT NULL,
                PRIMARY KEY (image_id, number_id)
            );
            CREATE TABLE IF NOT EXISTS image_words (
                image_id  INTEGER NOT NULL REFERENCES images(id) ON DELETE CASCADE,
                word_id   INTEGER NOT NULL REFERENCES words(id),
                position  INTEGER NOT NULL,
                PRIMARY KEY (image_id, word_id)
            );
            CREATE INDEX IF NOT EXISTS idx_letters_locale ON letters(locale);
            CREATE INDEX IF NOT EXISTS idx_numbers_locale ON numbers(locale);
            CREATE INDEX IF NOT EXISTS idx_words_locale ON words(locale);",
        )?;
        Ok(())
    }

    // ---- images ----

    /// Read a full image, label collections included.
    pub fn image(&self, id: EntityId) -> Result<Image, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, locale, image_format, content_type, bytes, checksum,
                        content_license, literacy_skills, numeracy_skills, revision, last_updated
                 FROM images WHERE id = ?1",
                [id],
                |row| {
                    Ok(RawImageRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        locale: row.get(2)?,
                        image_format: row.get(3)?,
                        content_type: row.get(4)?,
                        bytes: row.get(5)?,
                        checksum: row.get(6)?,
                        content_license: row.get(7)?,
                        literacy_skills: row.get(8)?,
                        numeracy_skills: row.get(9)?,
                        revision: row.get(10)?,
                        last_updated: row.get(11)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound { kind: "image", id })?;

        let mut image = row.into_image()?;
        image.letters = self.image_letters(id)?;
        image.numbers = self.image_numbers(id)?;
        image.words = self.image_words(id)?;
        Ok(image)
    }

    /// Insert a new image (the `id` field of the argument is ignored).
    /// Returns the assigned id. Intended for seeding; the edit flow itself
    /// only ever updates existing rows.
    pub fn insert_image(&mut self, image: &Image) -> Result<EntityId, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO images (title, locale, image_format, content_type, bytes, checksum,
                                 content_license, literacy_skills, numeracy_skills, revision,
                                 last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                image.title,
                image.locale.as_str(),
                image.image_format.as_str(),
                image.content_type,
                image.bytes,
                image.checksum,
                image.content_license.as_str(),
                skills_json(&image.literacy_skills, image.id)?,
                skills_json(&image.numeracy_skills, image.id)?,
                image.revision,
                image.last_updated.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_labels(&tx, id, image)?;
        tx.commit()?;
        Ok(id)
    }

    /// Persist the full entity — row and label join tables — in one
    /// transaction (single read-modify-write; last write wins).
    pub fn update_image(&mut self, image: &Image) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            "UPDATE images
             SET title = ?2, locale = ?3, image_format = ?4, content_type = ?5, bytes = ?6,
                 checksum = ?7, content_license = ?8, literacy_skills = ?9,
                 numeracy_skills = ?10, revision = ?11, last_updated = ?12
             WHERE id = ?1",
            params![
                image.id,
                image.title,
                image.locale.as_str(),
                image.image_format.as_str(),
                image.content_type,
                image.bytes,
                image.checksum,
                image.content_license.as_str(),
                skills_json(&image.literacy_skills, image.id)?,
                skills_json(&image.numeracy_skills, image.id)?,
                image.revision,
                image.last_updated.to_rfc3339(),
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound { kind: "image", id: image.id });
        }
        tx.execute("DELETE FROM image_letters WHERE image_id = ?1", [image.id])?;
        tx.execute("DELETE FROM image_numbers WHERE image_id = ?1", [image.id])?;
        tx.execute("DELETE FROM image_words WHERE image_id = ?1", [image.id])?;
        write_labels(&tx, image.id, image)?;
        tx.commit()?;
        debug!(id = image.id, revision = image.revision, "image updated");
        Ok(())
    }

    // ---- label entities ----

    pub fn letter(&self, id: EntityId) -> Result<Letter, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, locale, text FROM letters WHERE id = ?1",
                [id],
                |row| Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or(StoreError::NotFound { kind: "letter", id })?;
        Ok(Letter {
            id: row.0,
            locale: Locale::from_str(&row.1).map_err(corrupt("locale", row.0))?,
            text: row.2,
        })
    }

    pub fn number(&self, id: EntityId) -> Result<Number, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, locale, value FROM numbers WHERE id = ?1",
                [id],
                |row| Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or(StoreError::NotFound { kind: "number", id })?;
        Ok(Number {
            id: row.0,
            locale: Locale::from_str(&row.1).map_err(corrupt("locale", row.0))?,
            value: row.2,
        })
    }

    pub fn word(&self, id: EntityId) -> Result<Word, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, locale, text FROM words WHERE id = ?1",
                [id],
                |row| Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or(StoreError::NotFound { kind: "word", id })?;
        Ok(Word {
            id: row.0,
            locale: Locale::from_str(&row.1).map_err(corrupt("locale", row.0))?,
            text: row.2,
        })
    }

    pub fn insert_letter(&self, locale: Locale, text: &str) -> Result<EntityId, StoreError> {
        self.conn.execute(
            "INSERT INTO letters (locale, text) VALUES (?1, ?2)",
            params![locale.as_str(), text],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_number(&self, locale: Locale, value: i64) -> Result<EntityId, StoreError> {
        self.conn.execute(
            "INSERT INTO numbers (locale, value) VALUES (?1, ?2)",
            params![locale.as_str(), value],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_word(&self, locale: Locale, text: &str) -> Result<EntityId, StoreError> {
        self.conn.execute(
            "INSERT INTO words (locale, text) VALUES (?1, ?2)",
            params![locale.as_str(), text],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All letters for a locale, ordered by text (form option list order).
    pub fn letters_ordered(&self, locale: Locale) -> Result<Vec<Letter>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, locale, text FROM letters WHERE locale = ?1 ORDER BY text")?;
        let rows = stmt.query_map([locale.as_str()], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut letters = Vec::new();
        for row in rows {
            let (id, loc, text) = row?;
            letters.push(Letter {
                id,
                locale: Locale::from_str(&loc).map_err(corrupt("locale", id))?,
                text,
            });
        }
        Ok(letters)
    }

    /// All numbers for a locale, ordered by value.
    pub fn numbers_ordered(&self, locale: Locale) -> Result<Vec<Number>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, locale, value FROM numbers WHERE locale = ?1 ORDER BY value")?;
        let rows = stmt.query_map([locale.as_str()], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;
        let mut numbers = Vec::new();
        for row in rows {
            let (id, loc, value) = row?;
            numbers.push(Number {
                id,
                locale: Locale::from_str(&loc).map_err(corrupt("locale", id))?,
                value,
            });
        }
        Ok(numbers)
    }

    /// All words for a locale, ordered by text.
    pub fn words_ordered(&self, locale: Locale) -> Result<Vec<Word>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, locale, text FROM words WHERE locale = ?1 ORDER BY text")?;
        let rows = stmt.query_map([locale.as_str()], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut words = Vec::new();
        for row in rows {
            let (id, loc, text) = row?;
            words.push(Word {
                id,
                locale: Locale::from_str(&loc).map_err(corrupt("locale", id))?,
                text,
            });
        }
        Ok(words)
    }

    // ---- image label collections ----

    fn image_letters(&self, image_id: EntityId) -> Result<Vec<Letter>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.locale, l.text
             FROM image_letters il JOIN letters l ON l.id = il.letter_id
             WHERE il.image_id = ?1 ORDER BY il.position",
        )?;
        let rows = stmt.query_map([image_id], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut letters = Vec::new();
        for row in rows {
            let (id, loc, text) = row?;
            letters.push(Letter {
                id,
                locale: Locale::from_str(&loc).map_err(corrupt("locale", id))?,
                text,
            });
        }
        Ok(letters)
    }

    fn image_numbers(&self, image_id: EntityId) -> Result<Vec<Number>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT n.id, n.locale, n.value
             FROM image_numbers inum JOIN numbers n ON n.id = inum.number_id
             WHERE inum.image_id = ?1 ORDER BY inum.position",
        )?;
        let rows = stmt.query_map([image_id], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;
        let mut numbers = Vec::new();
        for row in rows {
            let (id, loc, value) = row?;
            numbers.push(Number {
                id,
                locale: Locale::from_str(&loc).map_err(corrupt("locale", id))?,
                value,
            });
        }
        Ok(numbers)
    }

    fn image_words(&self, image_id: EntityId) -> Result<Vec<Word>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT w.id, w.locale, w.text
             FROM image_words iw JOIN words w ON w.id = iw.word_id
             WHERE iw.image_id = ?1 ORDER BY iw.position",
        )?;
        let rows = stmt.query_map([image_id], |row| {
            Ok((row.get::<_, EntityId>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut words = Vec::new();
        for row in rows {
            let (id, loc, text) = row?;
            words.push(Word {
                id,
                locale: Locale::from_str(&loc).map_err(corrupt("locale", id))?,
                text,
            });
        }
        Ok(words)
    }
}

impl TitleIndex for ContentStore {
    fn image_id_for_title(
        &self,
        title: &str,
        locale: Locale,
    ) -> Result<Option<EntityId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM images WHERE lower(title) = lower(?1) AND locale = ?2",
                params![title, locale.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

fn skills_json<T: serde::Serialize>(skills: &[T], id: EntityId) -> Result<String, StoreError> {
    serde_json::to_string(skills).map_err(corrupt("skills", id))
}

/// Rewrite the three join tables from the entity's in-memory label lists.
fn write_labels(
    tx: &rusqlite::Transaction<'_>,
    image_id: EntityId,
    image: &Image,
) -> Result<(), StoreError> {
    for (position, letter) in image.letters.iter().enumerate() {
        tx.execute(
            "INSERT INTO image_letters (image_id, letter_id, position) VALUES (?1, ?2, ?3)",
            params![image_id, letter.id, position as i64],
        )?;
    }
    for (position, number) in image.numbers.iter().enumerate() {
        tx.execute(
            "INSERT INTO image_numbers (image_id, number_id, position) VALUES (?1, ?2, ?3)",
            params![image_id, number.id, position as i64],
        )?;
    }
    for (position, word) in image.words.iter().enumerate() {
        tx.execute(
            "INSERT INTO image_words (image_id, word_id, position) VALUES (?1, ?2, ?3)",
            params![image_id, word.id, position as i64],
        )?;
    }
    Ok(())
}

/// Raw column values fetched inside the rusqlite closure; conversions to
/// enum/chrono/json types happen afterwards so their failures can map to
/// [`StoreError::Corrupt`] instead of being shoehorned into rusqlite errors.
struct RawImageRow {
    id: EntityId,
    title: String,
    locale: String,
    image_format: String,
    content_type: String,
    bytes: Vec<u8>,
    checksum: String,
    content_license: String,
    literacy_skills: String,
    numeracy_skills: String,
    revision: u32,
    last_updated: String,
}

impl RawImageRow {
    fn into_image(self) -> Result<Image, StoreError> {
        let id = self.id;
        Ok(Image {
            id,
            title: self.title,
            locale: Locale::from_str(&self.locale).map_err(corrupt("locale", id))?,
            image_format: ImageFormat::from_str(&self.image_format)
                .map_err(corrupt("image_format", id))?,
            content_type: self.content_type,
            bytes: self.bytes,
            checksum: self.checksum,
            content_license: ContentLicense::from_str(&self.content_license)
                .map_err(corrupt("content_license", id))?,
            literacy_skills: serde_json::from_str::<Vec<LiteracySkill>>(&self.literacy_skills)
                .map_err(corrupt("literacy_skills", id))?,
            numeracy_skills: serde_json::from_str::<Vec<NumeracySkill>>(&self.numeracy_skills)
                .map_err(corrupt("numeracy_skills", id))?,
            revision: self.revision,
            last_updated: DateTime::parse_from_rfc3339(&self.last_updated)
                .map_err(corrupt("last_updated", id))?
                .with_timezone(&Utc),
            letters: Vec::new(),
            numbers: Vec::new(),
            words: Vec::new(),
        })
    }
}
