//! `legitcheck`: issue, verify and revoke documents from the command line.
//!
//! The registry is a SQLite file and stamped PDFs live in a directory. Both,
//! and the serving origin, come from flags or `LEGITCHECK_*` variables.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use legitcheck::{IssuanceService, VerificationResolver};

mod commands;
mod config;

use config::GlobalArgs;

#[derive(Parser, Debug)]
#[command(name = "legitcheck")]
#[command(version, about = "Issue and verify tamper-evident documents", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register and review issuers
    #[command(subcommand)]
    Issuer(commands::issuer::IssuerCommand),

    /// Stamp a PDF with its verification QR code and register it
    Issue(commands::issue::IssueArgs),

    /// Verify a document by identifier, scanned payload or file
    Verify(commands::verify::VerifyArgs),

    /// Revoke an issued document
    Revoke(commands::revoke::RevokeArgs),

    /// Show recent verification attempts
    Logs(commands::logs::LogsArgs),

    /// Re-hash a stored PDF and compare it with the registry
    Audit(commands::audit::AuditArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    let service_config = cli.global.service_config()?;
    let store = Arc::new(cli.global.open_store()?);
    let blobs = Arc::new(cli.global.open_blobs()?);

    let issuance = IssuanceService::new(store.clone(), blobs, service_config);
    let resolver = VerificationResolver::new(store);

    match cli.command {
        Commands::Issuer(cmd) => commands::issuer::execute(&issuance, cmd).await,
        Commands::Issue(args) => commands::issue::execute(&issuance, args).await,
        Commands::Verify(args) => commands::verify::execute(&resolver, args).await,
        Commands::Revoke(args) => commands::revoke::execute(&issuance, args).await,
        Commands::Logs(args) => commands::logs::execute(&resolver, args).await,
        Commands::Audit(args) => commands::audit::execute(&issuance, args).await,
    }
}

/// Log to stderr, filtered by `LEGITCHECK_LOG`, then `RUST_LOG`.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("LEGITCHECK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("legitcheck=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
