//! Static email/password table for local login.
//!
//! Passwords are stored either as Argon2 PHC strings (anything starting with
//! `$argon2`) or as plaintext. Plaintext entries exist for parity with the
//! demo accounts and are reported at startup as insecure.

use std::collections::HashMap;
use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::Deserialize;

use super::allowlist::canonical_email;
use super::types::Identity;

const ARGON2_PREFIX: &str = "$argon2";

#[derive(Clone, Deserialize)]
pub struct LocalCredentialRecord {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for LocalCredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCredentialRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

impl LocalCredentialRecord {
    pub fn new(id: u64, email: &str, password: &str, name: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_hashed(&self) -> bool {
        self.password.starts_with(ARGON2_PREFIX)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            email: canonical_email(&self.email),
            name: Some(self.name.clone()),
            avatar_url: None,
            email_verified: false,
        }
    }

    fn password_matches(&self, supplied: &str) -> bool {
        if !self.is_hashed() {
            return self.password == supplied;
        }

        match PasswordHash::new(&self.password) {
            Ok(hash) => Argon2::default()
                .verify_password(supplied.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                tracing::error!("Unparseable password hash for user {}: {}", self.id, e);
                false
            }
        }
    }
}

/// Local accounts keyed by canonical email.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    records: HashMap<String, LocalCredentialRecord>,
}

impl CredentialTable {
    pub fn new(records: impl IntoIterator<Item = LocalCredentialRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                record.email = canonical_email(&record.email);
                (record.email.clone(), record)
            })
            .filter(|(email, _)| !email.is_empty())
            .collect();
        Self { records }
    }

    /// The two built-in demo accounts.
    pub fn demo() -> Self {
        Self::new([
            LocalCredentialRecord::new(1, "demo@gmail.com", "password123", "Demo User"),
            LocalCredentialRecord::new(2, "user@example.com", "demo123", "Test User"),
        ])
    }

    /// Parse a JSON array of `{id, email, password, name}` objects.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<LocalCredentialRecord> = serde_json::from_str(raw)?;
        Ok(Self::new(records))
    }

    /// Look up `email` (any casing) and check `password` against it.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&LocalCredentialRecord> {
        self.records
            .get(&canonical_email(email))
            .filter(|record| record.password_matches(password))
    }

    /// Number of accounts whose password is stored in plaintext.
    pub fn plaintext_count(&self) -> usize {
        self.records.values().filter(|r| !r.is_hashed()).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Produce an Argon2id PHC string suitable for `LOCAL_USERS`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}
