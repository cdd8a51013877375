use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Args;

use legitcheck::core::{Document, DocumentMetadata};
use legitcheck::store::{BlobStore, DocumentStore};
use legitcheck::IssuanceService;

use super::print_json;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Issuing issuer's id; must be verified
    #[arg(long)]
    pub issuer: String,

    /// PDF to stamp
    #[arg(long, short)]
    pub file: PathBuf,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: String,

    #[arg(long = "type", default_value = "certificate")]
    pub document_type: String,

    #[arg(long)]
    pub recipient_name: String,

    #[arg(long)]
    pub recipient_email: String,

    /// Also write the stamped PDF here
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub async fn execute<S: DocumentStore, B: BlobStore>(
    issuance: &IssuanceService<S, B>,
    args: IssueArgs,
) -> Result<ExitCode> {
    let doc = run(issuance, args).await?;
    print_json(&serde_json::to_value(&doc)?)?;
    Ok(ExitCode::SUCCESS)
}

async fn run<S: DocumentStore, B: BlobStore>(
    issuance: &IssuanceService<S, B>,
    args: IssueArgs,
) -> Result<Document> {
    let issuer = issuance.issuer(&args.issuer).await?;
    let upload = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;

    let metadata = DocumentMetadata {
        title: args.title,
        description: args.description,
        document_type: args.document_type,
        recipient_name: args.recipient_name,
        recipient_email: args.recipient_email,
        original_file_name: args
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    };

    let doc = issuance
        .issue(&issuer, Bytes::from(upload), metadata)
        .await
        .with_context(|| format!("issuing {}", args.file.display()))?;

    if let Some(out) = &args.out {
        let stamped = issuance
            .blobs()
            .get(&doc.document_url)
            .await?
            .with_context(|| format!("stamped PDF missing at {}", doc.document_url))?;
        tokio::fs::write(out, &stamped)
            .await
            .with_context(|| format!("writing {}", out.display()))?;
        tracing::info!(path = %out.display(), "wrote stamped copy");
    }

    Ok(doc)
}
