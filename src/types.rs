//! Shared content-model types.
//!
//! The entities mirror the relational store one-to-one: an [`Image`] row plus
//! three independent label entities ([`Letter`], [`Number`], [`Word`]) that
//! images reference but never own. Reference data that used to be open strings
//! in older exports — licenses, skills, locales — is modeled as closed enums
//! so an invalid value is unrepresentable past the deserialization boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Row identifier shared by all content entities.
pub type EntityId = i64;

#[derive(Error, Debug)]
#[error("unknown {kind} value: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! closed_enum {
    ($(#[$doc:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order. Drives form option lists.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

closed_enum! {
    /// Language/region tag scoping title uniqueness and label ordering.
    Locale {
        En => "en",
        Sw => "sw",
        Es => "es",
        Ar => "ar",
    }
}

closed_enum! {
    /// Accepted upload formats. Anything else is rejected at validation time.
    ImageFormat {
        Png => "png",
        Jpg => "jpg",
        Gif => "gif",
    }
}

impl ImageFormat {
    /// Canonical MIME type, used when an upload declares no content type.
    pub fn canonical_content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }
}

closed_enum! {
    /// License under which a contributor publishes content.
    ContentLicense {
        PublicDomain => "public_domain",
        CcBy => "cc_by",
        CcBySa => "cc_by_sa",
        CcByNc => "cc_by_nc",
        CcByNcSa => "cc_by_nc_sa",
    }
}

closed_enum! {
    /// Literacy skill an image can support in exercises.
    LiteracySkill {
        LetterIdentification => "letter_identification",
        PhonemicAwareness => "phonemic_awareness",
        LetterSoundCorrespondence => "letter_sound_correspondence",
        WordRecognition => "word_recognition",
        Vocabulary => "vocabulary",
        ReadingComprehension => "reading_comprehension",
    }
}

closed_enum! {
    /// Numeracy skill an image can support in exercises.
    NumeracySkill {
        NumberIdentification => "number_identification",
        OneToOneCorrespondence => "one_to_one_correspondence",
        Counting => "counting",
        Addition => "addition",
        Subtraction => "subtraction",
        ShapeRecognition => "shape_recognition",
    }
}

/// A letter of an alphabet, scoped to a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Letter {
    pub id: EntityId,
    pub locale: Locale,
    pub text: String,
}

/// A number taught in numeracy exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    pub id: EntityId,
    pub locale: Locale,
    pub value: i64,
}

/// A vocabulary word, scoped to a locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: EntityId,
    pub locale: Locale,
    pub text: String,
}

/// An image content item with its payload and label associations.
///
/// Invariants maintained by the store and the edit flow:
/// - `title` is stored lower-cased and is unique per locale
/// - `revision` increases by exactly 1 on each successful update
/// - label lists carry no duplicate ids; order is insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: EntityId,
    pub title: String,
    pub locale: Locale,
    pub image_format: ImageFormat,
    /// Declared MIME type of the stored payload.
    pub content_type: String,
    /// Raw (possibly rescaled) payload bytes.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`, recomputed on every update.
    pub checksum: String,
    pub content_license: ContentLicense,
    pub literacy_skills: Vec<LiteracySkill>,
    pub numeracy_skills: Vec<NumeracySkill>,
    /// Monotonic counter for optimistic change tracking.
    pub revision: u32,
    pub last_updated: DateTime<Utc>,
    pub letters: Vec<Letter>,
    pub numbers: Vec<Number>,
    pub words: Vec<Word>,
}

/// Authenticated contributor context, passed explicitly into every
/// operation instead of living in ambient session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,
    pub locale: Locale,
}

/// The three label collections an image carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Letter,
    Number,
    Word,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Letter => "letter",
            LabelKind::Number => "number",
            LabelKind::Word => "word",
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
