//! Email allowlist with optional display names.

use std::collections::HashMap;

/// Name returned for allowlisted addresses configured without one.
pub const DEFAULT_DISPLAY_NAME: &str = "Authorized User";

/// Trim and lowercase an email address.
///
/// This is the only form used for allowlist membership, credential lookup
/// and token subjects.
pub fn canonical_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistEntry {
    pub email: String,
    pub display_name: Option<String>,
}

impl AllowlistEntry {
    pub fn new(email: &str, display_name: Option<&str>) -> Self {
        Self {
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
        }
    }
}

/// Immutable set of canonical emails allowed to sign in with Google.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    entries: HashMap<String, Option<String>>,
}

impl Allowlist {
    pub fn new(entries: impl IntoIterator<Item = AllowlistEntry>) -> Self {
        let mut map: HashMap<String, Option<String>> = HashMap::new();
        for entry in entries {
            let email = canonical_email(&entry.email);
            if email.is_empty() {
                continue;
            }
            let name = entry
                .display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            let slot = map.entry(email).or_default();
            if name.is_some() {
                *slot = name;
            }
        }
        Self { entries: map }
    }

    /// Parse the `ALLOWED_EMAILS` format: comma-separated entries, each either
    /// `email` or `email=Display Name`.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(',').map(|item| match item.split_once('=') {
            Some((email, name)) => AllowlistEntry::new(email, Some(name)),
            None => AllowlistEntry::new(item, None),
        }))
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        self.entries.contains_key(&canonical_email(email))
    }

    /// Configured display name, if the address is allowlisted and has one.
    pub fn display_name(&self, email: &str) -> Option<&str> {
        self.entries
            .get(&canonical_email(email))
            .and_then(|name| name.as_deref())
    }

    pub fn display_name_for(&self, email: &str) -> String {
        self.display_name(email)
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
