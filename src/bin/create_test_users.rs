//! Creates test users with access tokens and exports their credentials

use std::process::ExitCode;
use std::sync::Arc;

use testaccounts::config::AppConfig;
use testaccounts::data::Database;
use testaccounts::error::AppError;
use testaccounts::logging::init_tracing;
use testaccounts::service::SeedService;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let db = Database::connect(&config.database.path).await?;
    let service = SeedService::new(Arc::new(db), config.seed.clone(), config.oauth.clone());

    match service.run().await {
        Ok(report) => {
            tracing::info!(
                requested = report.requested,
                created = report.created.len(),
                failed = report.failures.len(),
                "Seed run finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        // Already reported by the seed run
        Err(AppError::ApplicationNotFound(_)) => Ok(ExitCode::FAILURE),
        Err(error) => Err(error.into()),
    }
}
