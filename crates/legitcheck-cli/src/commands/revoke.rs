use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use legitcheck::core::RevocationError;
use legitcheck::store::{BlobStore, DocumentStore};
use legitcheck::{IssuanceService, ServiceError};

use super::{parse_id, print_json};

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Document identifier
    pub id: String,

    /// Who is revoking
    #[arg(long)]
    pub actor: String,

    #[arg(long)]
    pub reason: Option<String>,
}

pub async fn execute<S: DocumentStore, B: BlobStore>(
    issuance: &IssuanceService<S, B>,
    args: RevokeArgs,
) -> Result<ExitCode> {
    let id = parse_id(&args.id)?;

    match issuance
        .revoke(&id, &args.actor, args.reason.as_deref())
        .await
    {
        Ok(doc) => {
            print_json(&serde_json::to_value(&doc)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ServiceError::Revocation(RevocationError::AlreadyRevoked)) => {
            let doc = issuance.document(&id).await?;
            eprintln!(
                "{} was already revoked by {}",
                id,
                doc.revoked_by().unwrap_or("unknown")
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e.into()),
    }
}
