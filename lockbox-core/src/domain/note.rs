//! Note domain model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{require, Record, RecordKind, MASK};
use super::result::Result;

/// A private free-text note
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for NoteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteRecord")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("body", &MASK)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFields {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub category: String,
}

impl NoteFields {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            category: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl fmt::Debug for NoteFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteFields")
            .field("title", &self.title)
            .field("body", &MASK)
            .field("category", &self.category)
            .finish()
    }
}

impl Record for NoteRecord {
    type Fields = NoteFields;

    const KIND: RecordKind = RecordKind::Note;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn fields(&self) -> NoteFields {
        NoteFields {
            title: self.title.clone(),
            body: self.body.clone(),
            category: self.category.clone(),
        }
    }

    fn assemble(
        id: Uuid,
        fields: NoteFields,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: fields.title,
            body: fields.body,
            category: fields.category,
            created_at,
            updated_at,
        }
    }

    fn validate(fields: &NoteFields) -> Result<()> {
        require("title", &fields.title)?;
        require("body", &fields.body)
    }

    fn sensitive_value(&self) -> &str {
        &self.body
    }

    fn masked(&self) -> Self {
        Self {
            body: MASK.to_string(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_body_required() {
        assert!(NoteRecord::validate(&NoteFields::new("Wifi", "pass: abc")).is_ok());
        assert!(NoteRecord::validate(&NoteFields::new("", "pass: abc")).is_err());
        assert!(NoteRecord::validate(&NoteFields::new("Wifi", "")).is_err());
    }

    #[test]
    fn test_debug_redacts_body() {
        let fields = NoteFields::new("Diary", "very private");
        assert!(!format!("{:?}", fields).contains("very private"));
    }
}
