//! Document: the verifiable unit.
//!
//! A document record pairs the descriptive metadata an issuer supplied with the
//! hash of the stamped PDF and the location of that PDF. Only the status
//! fields ever change after creation, and only through
//! [`Document::revoke`](crate::revocation).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::ContentHash;
use crate::types::DocumentId;

/// Document status lifecycle. `Active` is initial, `Revoked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Active,
    Revoked,
}

impl DocumentStatus {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }

    /// Parse the lowercase wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revocation details, present only once a document is revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revocation {
    /// When the revocation happened (Unix milliseconds).
    pub revoked_at: i64,
    /// The actor who revoked the document.
    pub revoked_by: String,
    /// Optional free-text reason.
    #[serde(
        rename = "revokedReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reason: Option<String>,
}

/// Issuer-supplied descriptive metadata for a new document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    pub description: String,
    pub document_type: String,
    pub recipient_name: String,
    pub recipient_email: String,
    /// Uploader-supplied filename. Metadata only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
}

/// A registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Primary key, embedded in the verification URL.
    pub id: DocumentId,

    /// Issuer identity at issuance time. Denormalized and immutable.
    pub issuer_id: String,
    pub issuer_name: String,

    pub title: String,
    pub description: String,
    pub document_type: String,
    pub recipient_name: String,
    pub recipient_email: String,

    /// SHA-256 of the stamped PDF bytes. The sole integrity anchor.
    pub hash: ContentHash,

    pub status: DocumentStatus,

    /// Creation time (Unix milliseconds).
    pub issued_at: i64,

    /// Set only on the transition to `Revoked`.
    #[serde(flatten)]
    pub revocation: Option<Revocation>,

    /// `{origin}/verify?id={id}`.
    pub verification_url: String,

    /// Display rendering of the verification URL. Never read by verification.
    pub qr_code_data: String,

    /// Retrievable location of the stamped PDF blob.
    pub document_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
}

impl Document {
    /// Whether the document is still active.
    pub fn is_active(&self) -> bool {
        self.status == DocumentStatus::Active
    }

    pub fn revoked_at(&self) -> Option<i64> {
        self.revocation.as_ref().map(|r| r.revoked_at)
    }

    pub fn revoked_by(&self) -> Option<&str> {
        self.revocation.as_ref().map(|r| r.revoked_by.as_str())
    }

    pub fn revoked_reason(&self) -> Option<&str> {
        self.revocation.as_ref().and_then(|r| r.reason.as_deref())
    }
}

/// Kind of organization an issuer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerKind {
    Education,
    Healthcare,
}

impl IssuerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Healthcare => "healthcare",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "education" => Some(Self::Education),
            "healthcare" => Some(Self::Healthcare),
            _ => None,
        }
    }
}

/// Approval status of an issuer. Only `Verified` issuers may issue documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerStatus {
    Pending,
    Verified,
    Rejected,
}

impl IssuerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for IssuerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An organization allowed (once approved) to issue documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    pub id: String,
    /// The account that owns this issuer. Used in blob paths.
    pub user_id: String,
    pub organization_name: String,
    #[serde(rename = "type")]
    pub kind: IssuerKind,
    #[serde(default)]
    pub description: String,
    pub status: IssuerStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

impl Issuer {
    pub fn is_verified(&self) -> bool {
        self.status == IssuerStatus::Verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::digest;

    fn sample() -> Document {
        Document {
            id: DocumentId::parse("doc_1700000000000_abc123xyz").unwrap(),
            issuer_id: "issuer_1".into(),
            issuer_name: "State University".into(),
            title: "Diploma".into(),
            description: "Bachelor of Science".into(),
            document_type: "certificate".into(),
            recipient_name: "Sam Doe".into(),
            recipient_email: "sam@example.org".into(),
            hash: digest(b"stamped"),
            status: DocumentStatus::Active,
            issued_at: 1_700_000_000_000,
            revocation: None,
            verification_url: "https://x/verify?id=doc_1700000000000_abc123xyz".into(),
            qr_code_data: "data:image/svg+xml;base64,".into(),
            document_url: "memory://issued_docs/u1/doc.pdf".into(),
            original_file_name: Some("diploma.pdf".into()),
        }
    }

    #[test]
    fn test_json_field_names() {
        let doc = sample();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["issuerId"], "issuer_1");
        assert_eq!(value["status"], "active");
        assert_eq!(value["hash"], doc.hash.to_hex());
        assert!(value.get("revokedAt").is_none());
        assert!(value.get("revokedBy").is_none());
    }

    #[test]
    fn test_revocation_fields_flatten() {
        let mut doc = sample();
        doc.status = DocumentStatus::Revoked;
        doc.revocation = Some(Revocation {
            revoked_at: 5,
            revoked_by: "issuer_1".into(),
            reason: Some("error".into()),
        });

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["revokedAt"], 5);
        assert_eq!(value["revokedBy"], "issuer_1");
        assert_eq!(value["revokedReason"], "error");

        let back: Document = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.revoked_by(), Some("issuer_1"));
        assert_eq!(back.revoked_reason(), Some("error"));
    }

    #[test]
    fn test_status_names() {
        for status in [DocumentStatus::Active, DocumentStatus::Revoked] {
            assert_eq!(DocumentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DocumentStatus::parse("deleted"), None);
    }

    #[test]
    fn test_issuer_type_field() {
        let json = r#"{
            "id": "iss_1",
            "userId": "user_1",
            "organizationName": "General Hospital",
            "type": "healthcare",
            "status": "verified",
            "createdAt": 1
        }"#;
        let issuer: Issuer = serde_json::from_str(json).unwrap();
        assert_eq!(issuer.kind, IssuerKind::Healthcare);
        assert!(issuer.is_verified());
        assert_eq!(issuer.description, "");
    }
}
