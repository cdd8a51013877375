//! Record validation at the store boundary.

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::{Document, DocumentMetadata, DocumentStatus, Issuer};
use crate::error::CoreError;
use crate::identifier::VERIFY_PATH;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles");
}

/// Validate issuer-supplied metadata before anything is stamped.
///
/// This checks:
/// - Every descriptive field is non-blank
/// - The recipient email looks like `local@domain.tld`
pub fn validate_metadata(metadata: &DocumentMetadata) -> Result<(), CoreError> {
    let required = [
        ("title", &metadata.title),
        ("description", &metadata.description),
        ("documentType", &metadata.document_type),
        ("recipientName", &metadata.recipient_name),
        ("recipientEmail", &metadata.recipient_email),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(CoreError::InvalidMetadata(format!("{name} is required")));
        }
    }

    if !EMAIL_RE.is_match(metadata.recipient_email.trim()) {
        return Err(CoreError::InvalidMetadata(format!(
            "recipientEmail is not an address: {:?}",
            metadata.recipient_email
        )));
    }

    Ok(())
}

/// Validate a document record before it is persisted.
///
/// This performs:
/// - Verification URL check (must end with the URL derived from `id`)
/// - Status/revocation consistency
/// - Blob location presence
pub fn validate_document(doc: &Document) -> Result<(), CoreError> {
    // 1. The verification URL is re-derivable from the id
    let suffix = format!("{}{}", VERIFY_PATH, doc.id);
    if !doc.verification_url.ends_with(&suffix) {
        return Err(CoreError::InvalidRecord(format!(
            "verification url {:?} does not point at {}",
            doc.verification_url, doc.id
        )));
    }

    // 2. Revocation fields exist exactly when revoked
    match (doc.status, &doc.revocation) {
        (DocumentStatus::Active, Some(_)) => {
            return Err(CoreError::InvalidRecord(
                "active document carries revocation fields".into(),
            ));
        }
        (DocumentStatus::Revoked, None) => {
            return Err(CoreError::InvalidRecord(
                "revoked document lacks revocation fields".into(),
            ));
        }
        _ => {}
    }

    // 3. Blob location
    if doc.document_url.is_empty() {
        return Err(CoreError::InvalidRecord("document url is empty".into()));
    }

    if doc.issuer_id.is_empty() {
        return Err(CoreError::InvalidRecord("issuer id is empty".into()));
    }

    Ok(())
}

/// Validate an issuer record.
pub fn validate_issuer(issuer: &Issuer) -> Result<(), CoreError> {
    if issuer.id.trim().is_empty() {
        return Err(CoreError::InvalidRecord("issuer id is empty".into()));
    }
    if issuer.user_id.trim().is_empty() {
        return Err(CoreError::InvalidRecord("issuer user id is empty".into()));
    }
    if issuer.organization_name.trim().is_empty() {
        return Err(CoreError::InvalidRecord(
            "organization name is empty".into(),
        ));
    }
    Ok(())
}
