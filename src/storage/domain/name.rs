//! Validated backend name type.

use super::StorageDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a backend name.
const MAX_NAME_LENGTH: usize = 100;

/// Validated, lowercase alphanumeric-plus-underscores backend identifier.
///
/// The name keys every bus surface of a backend: `swarm:process:started`,
/// `logs:swarm:enable`, `log swarm on`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackendName(String);

impl BackendName {
    /// Creates a validated backend name.
    ///
    /// The input is trimmed and lowercased. Only characters in `[a-z0-9_]` are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageDomainError::EmptyBackendName`] when the value is empty
    /// after trimming, [`StorageDomainError::InvalidBackendName`] when it
    /// contains characters outside `[a-z0-9_]`, or
    /// [`StorageDomainError::BackendNameTooLong`] when it exceeds 100
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, StorageDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(StorageDomainError::EmptyBackendName);
        }

        if normalized.len() > MAX_NAME_LENGTH {
            return Err(StorageDomainError::BackendNameTooLong(raw));
        }

        let is_valid = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !is_valid {
            return Err(StorageDomainError::InvalidBackendName(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the backend name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the capitalised name used in messages and `check:*` events.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_ascii_uppercase().to_string() + chars.as_str()
        })
    }
}

impl TryFrom<String> for BackendName {
    type Error = StorageDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BackendName> for String {
    fn from(value: BackendName) -> Self {
        value.0
    }
}

impl AsRef<str> for BackendName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BackendName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
