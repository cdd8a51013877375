pub mod audit;
pub mod issue;
pub mod issuer;
pub mod logs;
pub mod revoke;
pub mod verify;

use anyhow::{Context, Result};
use serde_json::Value;

use legitcheck::core::DocumentId;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_id(raw: &str) -> Result<DocumentId> {
    DocumentId::parse(raw.trim()).with_context(|| format!("{:?} is not a document identifier", raw))
}
