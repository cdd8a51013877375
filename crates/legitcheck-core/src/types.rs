//! Strong type definitions for LegitCheck.
//!
//! Identifiers are newtypes so that an unchecked string from a query
//! parameter or a scanned frame cannot be used as a registry key by accident.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::identifier::is_valid_format;

/// A document identifier: `doc_<unixMillis>_<lowercase base36>`.
///
/// Always matches `^doc_[0-9]+_[a-z0-9]+$`. Construction goes through
/// [`DocumentId::parse`] or an [`IdGenerator`](crate::IdGenerator), so holding a
/// `DocumentId` means the format has been checked.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Parse and validate an identifier.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if is_valid_format(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidIdentifier(s.to_string()))
        }
    }

    /// Assemble an identifier from its timestamp and suffix parts.
    pub(crate) fn from_parts(millis: u64, suffix: &str) -> Self {
        Self(format!("doc_{}_{}", millis, suffix))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The millisecond timestamp embedded at generation time.
    ///
    /// Returns `None` if the digits overflow `u64`.
    pub fn embedded_millis(&self) -> Option<u64> {
        self.0
            .strip_prefix("doc_")
            .and_then(|rest| rest.split('_').next())
            .and_then(|digits| digits.parse().ok())
    }

    /// The random base-36 suffix.
    pub fn suffix(&self) -> &str {
        self.0.rsplit('_').next().unwrap_or_default()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid_format(&s) {
            Ok(Self(s))
        } else {
            Err(CoreError::InvalidIdentifier(s))
        }
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Get current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
