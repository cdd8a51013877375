use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use legitcheck::store::DocumentStore;
use legitcheck::VerificationResolver;

use super::print_json;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// How many entries to show
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,
}

pub async fn execute<S: DocumentStore>(
    resolver: &VerificationResolver<S>,
    args: LogsArgs,
) -> Result<ExitCode> {
    let total = resolver.log_count().await?;
    let entries = resolver.recent_logs(args.limit).await?;
    print_json(&json!({ "total": total, "entries": entries }))?;
    Ok(ExitCode::SUCCESS)
}
