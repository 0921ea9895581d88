//! Removes test users and everything attached to their accounts

use std::process::ExitCode;
use std::sync::Arc;

use testaccounts::config::AppConfig;
use testaccounts::data::Database;
use testaccounts::logging::init_tracing;
use testaccounts::service::CleanupService;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let db = Database::connect(&config.database.path).await?;
    let service = CleanupService::new(Arc::new(db));
    let report = service.run(&config.cleanup.email_pattern).await?;

    tracing::info!(
        matched = report.matched,
        deleted = report.deleted.len(),
        failed = report.failures.len(),
        rows_removed = report.rows_removed,
        "Cleanup run finished"
    );

    Ok(ExitCode::SUCCESS)
}
