//! Display names.

use crate::codec::ProtocolError;
use std::fmt;

/// A display name that passed join validation: non-empty after trimming and
/// at most [`UserName::MAX_CHARS`] characters. Holds the trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Maximum length in characters.
    pub const MAX_CHARS: usize = 50;

    /// Validate and trim a raw name from a `joinRoom` intent.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidName`] when the trimmed name is empty
    /// or longer than [`UserName::MAX_CHARS`].
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::InvalidName("name is empty"));
        }
        if trimmed.chars().count() > Self::MAX_CHARS {
            return Err(ProtocolError::InvalidName("name is too long"));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
