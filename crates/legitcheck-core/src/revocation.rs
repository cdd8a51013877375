//! The document status state machine.
//!
//! ```text
//!   active ──revoke──▶ revoked
//! ```
//!
//! `revoked` is terminal. Revoking twice is reported, not applied; every other
//! transition is rejected.

use crate::document::{Document, DocumentStatus, Revocation};
use crate::error::RevocationError;

impl DocumentStatus {
    /// Check a transition from `self` to `to`.
    pub fn transition(self, to: DocumentStatus) -> Result<DocumentStatus, RevocationError> {
        match (self, to) {
            (DocumentStatus::Active, DocumentStatus::Revoked) => Ok(to),
            (DocumentStatus::Revoked, DocumentStatus::Revoked) => {
                Err(RevocationError::AlreadyRevoked)
            }
            (from, to) => Err(RevocationError::InvalidTransition { from, to }),
        }
    }

    /// Whether no transition leaves this state.
    pub fn is_terminal(self) -> bool {
        self == DocumentStatus::Revoked
    }
}

impl Revocation {
    /// Build revocation details for `actor_id` at `now`.
    ///
    /// A blank reason is stored as no reason.
    pub fn new(actor_id: &str, reason: Option<&str>, now: i64) -> Result<Self, RevocationError> {
        if actor_id.trim().is_empty() {
            return Err(RevocationError::MissingActor);
        }
        Ok(Self {
            revoked_at: now,
            revoked_by: actor_id.to_string(),
            reason: reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        })
    }
}

impl Document {
    /// Move this document to `Revoked`, recording `revocation`.
    ///
    /// On error the record is left untouched, so an already-revoked document
    /// keeps its original `revokedAt`/`revokedBy`.
    pub fn revoke(&mut self, revocation: Revocation) -> Result<(), RevocationError> {
        self.status = self.status.transition(DocumentStatus::Revoked)?;
        self.revocation = Some(revocation);
        Ok(())
    }
}
