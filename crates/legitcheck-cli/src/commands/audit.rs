use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use legitcheck::store::{BlobStore, DocumentStore};
use legitcheck::IssuanceService;

use super::{parse_id, print_json};

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Document identifier
    pub id: String,
}

/// Exit status: 0 when the stored PDF still matches its recorded hash.
pub async fn execute<S: DocumentStore, B: BlobStore>(
    issuance: &IssuanceService<S, B>,
    args: AuditArgs,
) -> Result<ExitCode> {
    let audit = issuance.audit_blob(&parse_id(&args.id)?).await?;

    print_json(&json!({
        "id": audit.document_id,
        "documentUrl": audit.document_url,
        "expected": audit.expected,
        "actual": audit.actual,
        "intact": audit.is_intact(),
    }))?;

    Ok(if audit.is_intact() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
