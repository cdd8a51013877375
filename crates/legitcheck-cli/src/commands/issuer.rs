use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::process::ExitCode;

use legitcheck::core::IssuerKind;
use legitcheck::store::{BlobStore, DocumentStore};
use legitcheck::IssuanceService;

use super::print_json;

#[derive(Subcommand, Debug)]
pub enum IssuerCommand {
    /// Register a new issuer, pending review
    Add(AddArgs),

    /// Allow an issuer to issue documents
    Approve(ReviewArgs),

    /// Refuse an issuer
    Reject(ReviewArgs),

    /// Show an issuer record
    Show {
        /// Issuer id
        id: String,
    },

    /// List an issuer's documents, newest first, with counts
    Documents {
        /// Issuer id
        id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Education,
    Healthcare,
}

impl From<KindArg> for IssuerKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Education => IssuerKind::Education,
            KindArg::Healthcare => IssuerKind::Healthcare,
        }
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Account that owns the issuer; used in blob paths
    #[arg(long)]
    pub user_id: String,

    /// Organization name, printed on verification results
    #[arg(long)]
    pub name: String,

    #[arg(long, value_enum)]
    pub kind: KindArg,

    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Issuer id
    pub id: String,

    /// Who made the decision
    #[arg(long, default_value = "admin")]
    pub reviewer: String,
}

pub async fn execute<S: DocumentStore, B: BlobStore>(
    issuance: &IssuanceService<S, B>,
    command: IssuerCommand,
) -> Result<ExitCode> {
    print_json(&run(issuance, command).await?)?;
    Ok(ExitCode::SUCCESS)
}

async fn run<S: DocumentStore, B: BlobStore>(
    issuance: &IssuanceService<S, B>,
    command: IssuerCommand,
) -> Result<Value> {
    let issuer = match command {
        IssuerCommand::Add(args) => {
            issuance
                .register_issuer(&args.user_id, &args.name, args.kind.into(), &args.description)
                .await?
        }
        IssuerCommand::Approve(args) => issuance.approve_issuer(&args.id, &args.reviewer).await?,
        IssuerCommand::Reject(args) => issuance.reject_issuer(&args.id, &args.reviewer).await?,
        IssuerCommand::Show { id } => issuance.issuer(&id).await?,
        IssuerCommand::Documents { id } => {
            let stats = issuance.issuer_stats(&id).await?;
            let documents: Vec<_> = issuance
                .documents_for_issuer(&id)
                .await?
                .into_iter()
                .map(|d| {
                    json!({
                        "id": d.id,
                        "title": d.title,
                        "recipientName": d.recipient_name,
                        "status": d.status,
                        "issuedAt": d.issued_at,
                    })
                })
                .collect();
            return Ok(json!({ "stats": stats, "documents": documents }));
        }
    };
    Ok(serde_json::to_value(&issuer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use legitcheck_testkit::{sample_pdf, TestFixture};

    fn add(user_id: &str) -> IssuerCommand {
        IssuerCommand::Add(AddArgs {
            user_id: user_id.into(),
            name: "City Clinic".into(),
            kind: KindArg::Healthcare,
            description: String::new(),
        })
    }

    #[tokio::test]
    async fn test_add_then_approve() {
        let fixture = TestFixture::new();
        let added = run(&fixture.issuance, add("u7")).await.unwrap();
        assert_eq!(added["status"], "pending");
        assert_eq!(added["type"], "healthcare");
        let id = added["id"].as_str().unwrap().to_string();

        let approved = run(
            &fixture.issuance,
            IssuerCommand::Approve(ReviewArgs {
                id: id.clone(),
                reviewer: "admin".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(approved["status"], "verified");
        assert_eq!(approved["approvedBy"], "admin");

        let shown = run(&fixture.issuance, IssuerCommand::Show { id }).await.unwrap();
        assert_eq!(shown, approved);
    }

    #[tokio::test]
    async fn test_documents_listing() {
        let fixture = TestFixture::new();
        fixture.issue("One", sample_pdf(1, "One")).await.unwrap();
        fixture.issue("Two", sample_pdf(1, "Two")).await.unwrap();

        let listing = run(
            &fixture.issuance,
            IssuerCommand::Documents {
                id: fixture.issuer.id.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(listing["stats"]["total"], 2);
        assert_eq!(listing["stats"]["revoked"], 0);
        assert_eq!(listing["documents"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_issuer_fails() {
        let fixture = TestFixture::new();
        let res = run(
            &fixture.issuance,
            IssuerCommand::Show {
                id: "issuer_missing".into(),
            },
        )
        .await;
        assert!(res.is_err());
    }
}
