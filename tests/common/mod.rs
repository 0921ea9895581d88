//! Common test utilities for E2E tests

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use testaccounts::config::{OAuthClientConfig, SECONDS_PER_YEAR, SeedConfig};
use testaccounts::data::{Database, EntityId, OAuthApplication};

pub const CLIENT_ID: &str = "YHTqsYJu26bZ1hO2J2YN6Ajx-0z4SIDIMeln0CgGx3o";

/// Test environment backed by a temporary SQLite database
pub struct TestEnv {
    pub db: Arc<Database>,
    pub _temp_dir: TempDir,
    pub output_path: PathBuf,
}

impl TestEnv {
    /// Create a new empty environment
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let output_path = temp_dir.path().join("test_users_with_tokens.csv");

        Self {
            db: Arc::new(db),
            _temp_dir: temp_dir,
            output_path,
        }
    }

    /// Register the OAuth application the seed run looks up
    pub async fn register_application(&self) -> OAuthApplication {
        let app = OAuthApplication {
            id: EntityId::new().0,
            name: "Load tests".to_string(),
            uid: CLIENT_ID.to_string(),
            secret: "client-secret".to_string(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            scopes: "read write follow".to_string(),
            website: None,
            created_at: Utc::now(),
        };
        self.db.insert_oauth_application(&app).await.unwrap();
        app
    }

    /// Seed configuration writing to this environment's output path
    pub fn seed_config(&self, count: usize) -> SeedConfig {
        SeedConfig {
            count,
            username_prefix: "testuser".to_string(),
            password_prefix: "TestPass".to_string(),
            email_domain: "test.com".to_string(),
            output_path: self.output_path.clone(),
            scopes: "read write follow".to_string(),
            token_expires_in: 2 * SECONDS_PER_YEAR,
            progress_interval: 2,
            key_bits: 512,
        }
    }

    pub fn oauth_config(&self) -> OAuthClientConfig {
        OAuthClientConfig {
            client_id: CLIENT_ID.to_string(),
            client_secret: Some("client-secret".to_string()),
        }
    }
}
