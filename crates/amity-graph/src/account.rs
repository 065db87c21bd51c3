//! Account identifiers.
//!
//! Accounts are identified by email address. The canonical form is trimmed
//! and lower-cased; anything that does not look like an email never reaches
//! the edge store.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// Trim and lower-case a raw identifier.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Check a raw identifier against the email grammar after normalization.
pub fn is_valid(raw: &str) -> bool {
    EMAIL_RE.is_match(&normalize(raw))
}

/// A canonical, validated account identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Normalize and validate a raw identifier.
    pub fn parse(raw: &str) -> Option<Self> {
        let canonical = normalize(raw);
        EMAIL_RE.is_match(&canonical).then_some(Self(canonical))
    }

    /// Wrap an identifier read back from storage, where it was written canonical.
    pub(crate) fn from_stored(stored: String) -> Self {
        Self(stored)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for AccountId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| GraphError::invalid(format!("invalid email: {s}")))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}
