//! Verification outcomes and the audit log model.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentStatus;
use crate::hash::ContentHash;
use crate::identifier::random_suffix;

/// Outcome of resolving a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Revoked,
    NotFound,
}

impl Verdict {
    /// The verdict for a resolved document.
    pub fn for_status(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Active => Self::Valid,
            DocumentStatus::Revoked => Self::Revoked,
        }
    }

    /// User-facing message.
    pub fn message(self) -> &'static str {
        match self {
            Self::Valid => "Document is valid and authentic",
            Self::Revoked => "Document has been revoked by the issuer",
            Self::NotFound => "Document not found in our database",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result recorded in the verification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogResult {
    Valid,
    Invalid,
    Revoked,
}

impl LogResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "valid" => Some(Self::Valid),
            "invalid" => Some(Self::Invalid),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl From<Verdict> for LogResult {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Valid => Self::Valid,
            Verdict::Revoked => Self::Revoked,
            Verdict::NotFound => Self::Invalid,
        }
    }
}

/// How a resolved document was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// The caller supplied the identifier.
    Identifier,
    /// The identifier was extracted from a scanned payload or file bytes.
    EmbeddedIdentifier,
    /// The file bytes hashed to a registered document.
    ContentHash,
}

/// One append-only audit record per verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationLogEntry {
    /// `log_<unixMillis>_<suffix>`.
    pub id: String,
    /// The identifier attempted. May be an unresolved raw guess or a
    /// `sha256:` placeholder when only the hash path ran.
    pub document_id: String,
    pub timestamp: i64,
    pub result: LogResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl VerificationLogEntry {
    /// Create an entry with a fresh log id.
    pub fn new(document_id: impl Into<String>, result: LogResult, timestamp: i64) -> Self {
        Self {
            id: format!("log_{}_{}", timestamp, random_suffix(9)),
            document_id: document_id.into(),
            timestamp,
            result,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Attach the requester's network identity.
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// The `documentId` recorded when a lookup used only the content hash.
    pub fn hash_placeholder(hash: &ContentHash) -> String {
        format!("sha256:{}", hash.to_hex())
    }
}
