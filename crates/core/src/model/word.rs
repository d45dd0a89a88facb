use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{UserId, WordId};

pub const MAX_WORD_TEXT_CHARS: usize = 255;
pub const MAX_TRANSLATION_CHARS: usize = 500;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("word text cannot be empty")]
    EmptyText,
    #[error("definition cannot be empty")]
    EmptyDefinition,
    #[error("{field} is too long ({len} > {max} characters)")]
    TooLong {
        field: WordField,
        len: usize,
        max: usize,
    },
    #[error("unknown word field {0:?}")]
    UnknownField(String),
}

//
// ─── FIELDS ────────────────────────────────────────────────────────────────────
//

/// Editable fields of a catalog word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordField {
    Text,
    Definition,
    Example,
    Translation,
}

impl WordField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WordField::Text => "text",
            WordField::Definition => "definition",
            WordField::Example => "example",
            WordField::Translation => "translation",
        }
    }
}

impl std::str::FromStr for WordField {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(WordField::Text),
            "definition" => Ok(WordField::Definition),
            "example" => Ok(WordField::Example),
            "translation" => Ok(WordField::Translation),
            _ => Err(WordError::UnknownField(s.to_owned())),
        }
    }
}

impl std::fmt::Display for WordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated word as it arrives from an import or edit flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDraft {
    pub text: String,
    pub definition: String,
    pub example: Option<String>,
    pub translation: Option<String>,
}

impl WordDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            definition: definition.into(),
            example: None,
            translation: None,
        }
    }

    #[must_use]
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    #[must_use]
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    /// Trim, check and normalize the draft.
    ///
    /// Blank optional fields become `None`.
    ///
    /// # Errors
    ///
    /// Returns `WordError` if text or definition is empty, or a field is too long.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedWord, WordError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(WordError::EmptyText);
        }
        check_len(WordField::Text, &text, MAX_WORD_TEXT_CHARS)?;

        let definition = self.definition.trim().to_owned();
        if definition.is_empty() {
            return Err(WordError::EmptyDefinition);
        }

        let example = normalize_optional(self.example);
        let translation = normalize_optional(self.translation);
        if let Some(t) = translation.as_deref() {
            check_len(WordField::Translation, t, MAX_TRANSLATION_CHARS)?;
        }

        Ok(ValidatedWord {
            text,
            definition,
            example,
            translation,
            created_at: now,
        })
    }
}

fn check_len(field: WordField, value: &str, max: usize) -> Result<(), WordError> {
    let len = value.chars().count();
    if len > max {
        return Err(WordError::TooLong { field, len, max });
    }
    Ok(())
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_owned())
        .filter(|val| !val.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWord {
    pub text: String,
    pub definition: String,
    pub example: Option<String>,
    pub translation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedWord {
    #[must_use]
    pub fn assign_id(self, id: WordId, added_by: Option<UserId>) -> Word {
        Word {
            id,
            text: self.text,
            definition: self.definition,
            example: self.example,
            translation: self.translation,
            added_by,
            created_at: self.created_at,
            is_active: true,
        }
    }
}

//
// ─── WORD ──────────────────────────────────────────────────────────────────────
//

/// A catalog entry. Catalog order is `(created_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub text: String,
    pub definition: String,
    pub example: Option<String>,
    pub translation: Option<String>,
    pub added_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Word {
    /// Returns a copy with one field replaced, re-running validation.
    ///
    /// # Errors
    ///
    /// Returns `WordError` if the edited word no longer validates.
    pub fn edited(&self, field: WordField, value: impl Into<String>) -> Result<Word, WordError> {
        let value = value.into();
        let mut draft = WordDraft {
            text: self.text.clone(),
            definition: self.definition.clone(),
            example: self.example.clone(),
            translation: self.translation.clone(),
        };
        match field {
            WordField::Text => draft.text = value,
            WordField::Definition => draft.definition = value,
            WordField::Example => draft.example = Some(value),
            WordField::Translation => draft.translation = Some(value),
        }

        let validated = draft.validate(self.created_at)?;
        Ok(Word {
            is_active: self.is_active,
            ..validated.assign_id(self.id, self.added_by)
        })
    }

    /// Case-insensitive key used for duplicate detection.
    #[must_use]
    pub fn normalized_text(&self) -> String {
        self.text.to_lowercase()
    }

    #[must_use]
    pub fn field_value(&self, field: WordField) -> Option<&str> {
        match field {
            WordField::Text => Some(&self.text),
            WordField::Definition => Some(&self.definition),
            WordField::Example => self.example.as_deref(),
            WordField::Translation => self.translation.as_deref(),
        }
    }
}

//
// ─── EDIT HISTORY ──────────────────────────────────────────────────────────────
//

/// Audit entry for one field edit. `new_value` is `None` when a blank value
/// cleared an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEdit {
    pub word_id: WordId,
    pub edited_by: UserId,
    pub field: WordField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub edited_at: DateTime<Utc>,
}

impl WordEdit {
    /// Record the change of `field` from `before` to `after`.
    #[must_use]
    pub fn between(
        before: &Word,
        after: &Word,
        field: WordField,
        edited_by: UserId,
        edited_at: DateTime<Utc>,
    ) -> Self {
        Self {
            word_id: after.id,
            edited_by,
            field,
            old_value: before.field_value(field).map(str::to_owned),
            new_value: after.field_value(field).map(str::to_owned),
            edited_at,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
