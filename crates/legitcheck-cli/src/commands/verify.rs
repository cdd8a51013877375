use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{ArgGroup, Args};
use serde_json::json;

use legitcheck::core::Verdict;
use legitcheck::store::DocumentStore;
use legitcheck::{RequestContext, Resolution, VerificationRequest, VerificationResolver};

use super::print_json;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["id", "file", "payload"])))]
pub struct VerifyArgs {
    /// Document identifier
    #[arg(long)]
    pub id: Option<String>,

    /// PDF to check; its embedded link is tried before its hash
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Text decoded from a QR code
    #[arg(long)]
    pub payload: Option<String>,

    /// Requester address recorded in the log
    #[arg(long)]
    pub ip: Option<String>,

    /// Requester user agent recorded in the log
    #[arg(long)]
    pub user_agent: Option<String>,
}

/// Exit status: 0 valid, 1 not found, 2 revoked.
pub async fn execute<S: DocumentStore>(
    resolver: &VerificationResolver<S>,
    args: VerifyArgs,
) -> Result<ExitCode> {
    let resolution = run(resolver, args).await?;

    let document = resolution.document.as_ref().map(|d| {
        json!({
            "id": d.id,
            "title": d.title,
            "issuerName": d.issuer_name,
            "recipientName": d.recipient_name,
            "issuedAt": d.issued_at,
            "revokedAt": d.revoked_at(),
            "revokedReason": d.revoked_reason(),
        })
    });
    print_json(&json!({
        "verdict": resolution.verdict,
        "message": resolution.message(),
        "matchedBy": resolution.matched_by,
        "document": document,
    }))?;

    Ok(match resolution.verdict {
        Verdict::Valid => ExitCode::SUCCESS,
        Verdict::NotFound => ExitCode::from(1),
        Verdict::Revoked => ExitCode::from(2),
    })
}

async fn run<S: DocumentStore>(
    resolver: &VerificationResolver<S>,
    args: VerifyArgs,
) -> Result<Resolution> {
    let request = if let Some(id) = args.id {
        VerificationRequest::Identifier(id)
    } else if let Some(payload) = args.payload {
        VerificationRequest::ScannedPayload(payload)
    } else if let Some(file) = args.file {
        let bytes = tokio::fs::read(&file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        VerificationRequest::Upload(Bytes::from(bytes))
    } else {
        anyhow::bail!("nothing to verify");
    };

    let context = RequestContext {
        ip_address: args.ip,
        user_agent: args.user_agent,
    };
    Ok(resolver.resolve(request, &context).await)
}
