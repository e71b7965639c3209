//! Core value types: locale codes and user identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A language/region identifier such as `en_US` or `de`.
///
/// The original casing is kept for storage and display; only
/// [`LocaleCode::language_key`] normalizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleCode(String);

impl LocaleCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Catalog key for this code: lower-cased, cut at the first region separator.
    ///
    /// `en_US` → `en`, `PT_br` → `pt`, `fr` → `fr`.
    pub fn language_key(&self) -> String {
        language_key(&self.0)
    }
}

/// Lower-cased language part of a raw code (text before the first `_`).
pub fn language_key(code: &str) -> String {
    code.split('_').next().unwrap_or_default().to_lowercase()
}

impl fmt::Display for LocaleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocaleCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for LocaleCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for LocaleCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LocaleCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LocaleCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Identity of the caller, as supplied by the host.
///
/// Used only as a persistence key; the inner value is never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserIdentity {
    Anonymous,
    User(String),
}

impl UserIdentity {
    /// Build an identity from a raw host value.
    ///
    /// Missing, blank and `"0"` all denote an unauthenticated caller.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("0") => UserIdentity::Anonymous,
            Some(id) => UserIdentity::User(id.to_string()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, UserIdentity::Anonymous)
    }

    /// Persistence key for an authenticated user.
    pub fn key(&self) -> Option<&str> {
        match self {
            UserIdentity::Anonymous => None,
            UserIdentity::User(id) => Some(id),
        }
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserIdentity::Anonymous => f.write_str("anonymous"),
            UserIdentity::User(id) => write!(f, "user:{}", id),
        }
    }
}
