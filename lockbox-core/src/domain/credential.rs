//! Credential domain model

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{require, Record, RecordKind, MASK};
use super::result::{Error, Result};

/// Default length of a generated secret
pub const DEFAULT_SECRET_LENGTH: usize = 12;

const SECRET_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()";

/// A stored login for a site or application
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub label: String,
    pub username: String,
    pub secret: String,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("username", &self.username)
            .field("secret", &MASK)
            .field("category", &self.category)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Mutable credential fields
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFields {
    pub label: String,
    pub username: String,
    pub secret: String,
    #[serde(default)]
    pub category: String,
}

impl CredentialFields {
    pub fn new(
        label: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            username: username.into(),
            secret: secret.into(),
            category: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl fmt::Debug for CredentialFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialFields")
            .field("label", &self.label)
            .field("username", &self.username)
            .field("secret", &MASK)
            .field("category", &self.category)
            .finish()
    }
}

impl Record for CredentialRecord {
    type Fields = CredentialFields;

    const KIND: RecordKind = RecordKind::Credential;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn fields(&self) -> CredentialFields {
        CredentialFields {
            label: self.label.clone(),
            username: self.username.clone(),
            secret: self.secret.clone(),
            category: self.category.clone(),
        }
    }

    fn assemble(
        id: Uuid,
        fields: CredentialFields,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            label: fields.label,
            username: fields.username,
            secret: fields.secret,
            category: fields.category,
            created_at,
            updated_at,
        }
    }

    fn validate(fields: &CredentialFields) -> Result<()> {
        require("label", &fields.label)?;
        require("username", &fields.username)?;
        require("secret", &fields.secret)
    }

    fn sensitive_value(&self) -> &str {
        &self.secret
    }

    fn masked(&self) -> Self {
        Self {
            secret: MASK.to_string(),
            ..self.clone()
        }
    }
}

/// Generate a random secret from letters, digits and `!@#$%^&*()`
pub fn generate_secret(length: usize) -> Result<String> {
    if length == 0 {
        return Err(Error::validation("secret length must be positive"));
    }
    let mut rng = rand::thread_rng();
    Ok((0..length)
        .map(|_| SECRET_CHARSET[rng.gen_range(0..SECRET_CHARSET.len())] as char)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_all_fields() {
        let ok = CredentialFields::new("GitHub", "octo", "hunter2");
        assert!(CredentialRecord::validate(&ok).is_ok());

        for fields in [
            CredentialFields::new("", "octo", "hunter2"),
            CredentialFields::new("GitHub", " ", "hunter2"),
            CredentialFields::new("GitHub", "octo", ""),
        ] {
            let err = CredentialRecord::validate(&fields).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_category_is_optional() {
        let fields = CredentialFields::new("Bank", "me", "pw").with_category("");
        assert!(CredentialRecord::validate(&fields).is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let now = Utc::now();
        let record = CredentialRecord::assemble(
            Uuid::new_v4(),
            CredentialFields::new("Mail", "me@example.com", "s3cr3t!"),
            now,
            now,
        );
        let rendered = format!("{:?}", record);
        assert!(!rendered.contains("s3cr3t!"));
        assert!(rendered.contains("Mail"));
    }

    #[test]
    fn test_masked_hides_only_secret() {
        let now = Utc::now();
        let record = CredentialRecord::assemble(
            Uuid::new_v4(),
            CredentialFields::new("Mail", "me", "s3cr3t").with_category("work"),
            now,
            now,
        );
        let masked = record.masked();
        assert_eq!(masked.secret, MASK);
        assert_eq!(masked.label, "Mail");
        assert_eq!(masked.category, "work");
        assert_eq!(masked.id, record.id);
    }

    #[test]
    fn test_generate_secret() {
        let secret = generate_secret(DEFAULT_SECRET_LENGTH).unwrap();
        assert_eq!(secret.len(), DEFAULT_SECRET_LENGTH);
        assert!(secret.bytes().all(|b| SECRET_CHARSET.contains(&b)));
        assert!(generate_secret(0).is_err());
    }
}
