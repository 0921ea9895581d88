//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// One Gregorian year in seconds (365.2425 days)
pub const SECONDS_PER_YEAR: i64 = 31_556_952;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub oauth: OAuthClientConfig,
    pub seed: SeedConfig,
    pub cleanup: CleanupConfig,
    pub logging: LoggingConfig,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Pre-registered OAuth application used to issue test tokens
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    /// Checked against the registered application when set
    pub client_secret: Option<String>,
}

/// Test user generation settings
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Number of users to create (default: 500)
    pub count: usize,
    /// Username prefix, followed by the zero-padded index (default: "testuser")
    pub username_prefix: String,
    /// Password prefix, followed by the index and "!" (default: "TestPass")
    pub password_prefix: String,
    /// Domain of the generated email addresses (default: "test.com")
    pub email_domain: String,
    /// Credentials CSV destination
    pub output_path: PathBuf,
    /// Space separated token scopes (default: "read write follow")
    pub scopes: String,
    /// Token lifetime in seconds (default: two years)
    pub token_expires_in: i64,
    /// Log a progress line every N users (default: 50)
    pub progress_interval: usize,
    /// RSA key size for account key pairs (default: 2048)
    pub key_bits: usize,
}

/// Test user removal settings
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// SQL `LIKE` pattern matched against user emails (default: "%@test.com")
    pub email_pattern: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (TESTACCOUNTS__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("database.path", "data/testaccounts.db")?
            .set_default("oauth.client_id", "YHTqsYJu26bZ1hO2J2YN6Ajx-0z4SIDIMeln0CgGx3o")?
            .set_default(
                "oauth.client_secret",
                "RF9HsYzBxumbW3AzNLSH0jO8zhFTIRy8Xene8gDZtMI",
            )?
            .set_default("seed.count", 500)?
            .set_default("seed.username_prefix", "testuser")?
            .set_default("seed.password_prefix", "TestPass")?
            .set_default("seed.email_domain", "test.com")?
            .set_default("seed.output_path", "test_users_with_tokens.csv")?
            .set_default("seed.scopes", "read write follow")?
            .set_default("seed.token_expires_in", 2 * SECONDS_PER_YEAR)?
            .set_default("seed.progress_interval", 50)?
            .set_default("seed.key_bits", 2048)?
            .set_default("cleanup.email_pattern", "%@test.com")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (TESTACCOUNTS__*)
            .add_source(
                Environment::with_prefix("TESTACCOUNTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_KEY_BITS: usize = 512;

        if self.oauth.client_id.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "oauth.client_id must not be empty".to_string(),
            ));
        }

        if self.seed.scopes.split_whitespace().next().is_none() {
            return Err(crate::error::AppError::Config(
                "seed.scopes must name at least one scope".to_string(),
            ));
        }

        if self.seed.token_expires_in <= 0 {
            return Err(crate::error::AppError::Config(
                "seed.token_expires_in must be greater than 0".to_string(),
            ));
        }

        if self.seed.progress_interval == 0 {
            return Err(crate::error::AppError::Config(
                "seed.progress_interval must be greater than 0".to_string(),
            ));
        }

        if self.seed.key_bits < MIN_KEY_BITS {
            return Err(crate::error::AppError::Config(format!(
                "seed.key_bits must be at least {}",
                MIN_KEY_BITS
            )));
        }

        if !has_literal_domain(&self.cleanup.email_pattern) {
            return Err(crate::error::AppError::Config(format!(
                "cleanup.email_pattern must contain '@' followed by a literal domain: {}",
                self.cleanup.email_pattern
            )));
        }

        Ok(())
    }
}

/// Whether a `LIKE` pattern pins at least one literal character after `@`
///
/// Rejects patterns such as `%` or `%@%` that would select every user.
fn has_literal_domain(pattern: &str) -> bool {
    pattern
        .rsplit_once('@')
        .map(|(_, domain)| domain.chars().any(|c| c != '%' && c != '_'))
        .unwrap_or(false)
}
