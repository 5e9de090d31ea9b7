//! Upload result type.

use serde::{Deserialize, Serialize};

/// Where uploaded content can be found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    hash: String,
    url: String,
}

impl Locator {
    /// Creates a locator for content `hash` reachable under `url`.
    #[must_use]
    pub fn new(hash: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
        }
    }

    /// Returns the content hash.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Returns the public retrieval URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}
