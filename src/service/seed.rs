//! Test user generation
//!
//! Creates sequentially numbered users with local accounts, issues each an
//! OAuth access token for a pre-registered application, and exports the
//! credentials to CSV.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{generate_key_pair, generate_token, hash_password};
use crate::config::{OAuthClientConfig, SeedConfig};
use crate::data::{Account, AccountStore, EntityId, OAuthAccessToken, OAuthApplication, User};
use crate::error::AppError;
use crate::export::{CredentialRow, CredentialsWriter};

/// Deterministic credentials for the user at a given position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUserCredentials {
    /// 1-based position in the run
    pub number: usize,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TestUserCredentials {
    /// Credentials for the zero-based loop index `index`
    ///
    /// User numbers start at 1 and are zero-padded to four digits in the
    /// username (`testuser0001`).
    pub fn for_index(seed: &SeedConfig, index: usize) -> Self {
        let number = index + 1;
        let username = format!("{}{:04}", seed.username_prefix, number);
        let email = format!("{}@{}", username, seed.email_domain);
        let password = format!("{}{}!", seed.password_prefix, number);

        Self {
            number,
            username,
            email,
            password,
        }
    }
}

/// A user that could not be created
#[derive(Debug, Clone)]
pub struct SeedFailure {
    pub number: usize,
    pub username: String,
    pub error: String,
}

/// Outcome of a seed run
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub application_id: String,
    pub output_path: PathBuf,
    pub requested: usize,
    /// Exported rows, in creation order
    pub created: Vec<CredentialRow>,
    pub failures: Vec<SeedFailure>,
}

/// Seed service
pub struct SeedService<S> {
    store: Arc<S>,
    seed: SeedConfig,
    oauth: OAuthClientConfig,
}

impl<S: AccountStore> SeedService<S> {
    /// Create new seed service
    pub fn new(store: Arc<S>, seed: SeedConfig, oauth: OAuthClientConfig) -> Self {
        Self { store, seed, oauth }
    }

    /// Create the configured number of users and export their credentials
    ///
    /// # Errors
    /// Returns [`AppError::ApplicationNotFound`] before creating anything when
    /// the OAuth application is not registered, or an error if the output
    /// file cannot be created. Failures of individual users are recorded in
    /// the report instead.
    pub async fn run(&self) -> Result<SeedReport, AppError> {
        let Some(app) = self
            .store
            .find_application_by_uid(&self.oauth.client_id)
            .await?
        else {
            tracing::error!(
                client_id = %self.oauth.client_id,
                "ERROR: Application with client_id '{}' not found!",
                self.oauth.client_id
            );
            return Err(AppError::ApplicationNotFound(self.oauth.client_id.clone()));
        };

        if let Some(secret) = self.oauth.client_secret.as_deref() {
            if secret != app.secret {
                tracing::warn!(
                    client_id = %app.uid,
                    "Configured client secret does not match the registered application"
                );
            }
        }

        let count = self.seed.count;
        tracing::info!(
            application_id = %app.id,
            "Application: {} (ID: {})",
            app.name,
            app.id
        );
        tracing::info!(count, "Creating {} test users...", count);

        let mut writer = CredentialsWriter::create(&self.seed.output_path)?;
        let mut report = SeedReport {
            application_id: app.id.clone(),
            output_path: self.seed.output_path.clone(),
            requested: count,
            created: Vec::new(),
            failures: Vec::new(),
        };

        for index in 0..count {
            let credentials = TestUserCredentials::for_index(&self.seed, index);

            let outcome = match self.create_user(&app, &credentials).await {
                Ok(row) => writer.append(&row).map(|()| row),
                Err(error) => Err(error),
            };

            match outcome {
                Ok(row) => {
                    if credentials.number % self.seed.progress_interval == 0 {
                        tracing::info!(
                            exported = writer.rows(),
                            "Created user {}/{}: {}",
                            credentials.number,
                            count,
                            credentials.username
                        );
                    }
                    report.created.push(row);
                }
                Err(error) => {
                    tracing::error!(
                        index = credentials.number,
                        username = %credentials.username,
                        "Error creating user {}: {}",
                        credentials.number,
                        error
                    );
                    report.failures.push(SeedFailure {
                        number: credentials.number,
                        username: credentials.username,
                        error: error.to_string(),
                    });
                }
            }
        }

        let rows = writer.finish()?;
        tracing::info!(
            rows,
            failures = report.failures.len(),
            "CSV file created: {}",
            report.output_path.display()
        );

        Ok(report)
    }

    /// Create one user with its account and token
    ///
    /// The user is persisted before the token is issued; a token failure
    /// leaves the user in place without an exported row.
    async fn create_user(
        &self,
        app: &OAuthApplication,
        credentials: &TestUserCredentials,
    ) -> Result<CredentialRow, AppError> {
        let encrypted_password = hash_password(&credentials.password)?;
        let keys = generate_key_pair(self.seed.key_bits).await?;
        let now = Utc::now();

        let account = Account {
            id: EntityId::new().0,
            username: credentials.username.clone(),
            domain: None,
            display_name: None,
            note: None,
            private_key_pem: Some(keys.private_key_pem),
            public_key_pem: keys.public_key_pem,
            created_at: now,
            updated_at: now,
        };

        let user = User {
            id: EntityId::new().0,
            email: credentials.email.clone(),
            encrypted_password,
            account_id: account.id.clone(),
            agreement: true,
            approved: true,
            confirmed_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        self.store.create_user_with_account(&user, &account).await?;

        let token = self.issue_token(app, &user).await?;

        Ok(CredentialRow {
            email: credentials.email.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            access_token: token.token,
            user_id: user.id,
            account_id: account.id,
        })
    }

    /// Issue an access token with a refresh token for `user`
    async fn issue_token(
        &self,
        app: &OAuthApplication,
        user: &User,
    ) -> Result<OAuthAccessToken, AppError> {
        let token = OAuthAccessToken {
            id: EntityId::new().0,
            token: generate_token(),
            refresh_token: Some(generate_token()),
            application_id: app.id.clone(),
            resource_owner_id: user.id.clone(),
            scopes: self.seed.scopes.clone(),
            expires_in: Some(self.seed.token_expires_in),
            created_at: Utc::now(),
            revoked_at: None,
        };

        self.store.insert_access_token(&token).await?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SECONDS_PER_YEAR;
    use crate::data::MockAccountStore;
    use crate::export::read_credentials;
    use tempfile::TempDir;

    fn seed_config(temp_dir: &TempDir, count: usize) -> SeedConfig {
        SeedConfig {
            count,
            username_prefix: "testuser".to_string(),
            password_prefix: "TestPass".to_string(),
            email_domain: "test.com".to_string(),
            output_path: temp_dir.path().join("test_users_with_tokens.csv"),
            scopes: "read write follow".to_string(),
            token_expires_in: 2 * SECONDS_PER_YEAR,
            progress_interval: 50,
            key_bits: 512,
        }
    }

    fn oauth_config() -> OAuthClientConfig {
        OAuthClientConfig {
            client_id: "client-id".to_string(),
            client_secret: Some("client-secret".to_string()),
        }
    }

    fn application() -> OAuthApplication {
        OAuthApplication {
            id: "app-1".to_string(),
            name: "Load tests".to_string(),
            uid: "client-id".to_string(),
            secret: "client-secret".to_string(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            scopes: "read write follow".to_string(),
            website: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn credentials_are_zero_padded_and_one_based() {
        let temp_dir = TempDir::new().unwrap();
        let seed = seed_config(&temp_dir, 500);

        let first = TestUserCredentials::for_index(&seed, 0);
        assert_eq!(first.number, 1);
        assert_eq!(first.username, "testuser0001");
        assert_eq!(first.email, "testuser0001@test.com");
        assert_eq!(first.password, "TestPass1!");

        let last = TestUserCredentials::for_index(&seed, 499);
        assert_eq!(last.username, "testuser0500");
        assert_eq!(last.password, "TestPass500!");

        let wide = TestUserCredentials::for_index(&seed, 12_344);
        assert_eq!(wide.username, "testuser12345");
    }

    #[tokio::test]
    async fn missing_application_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let seed = seed_config(&temp_dir, 3);
        let output_path = seed.output_path.clone();

        let mut store = MockAccountStore::new();
        store
            .expect_find_application_by_uid()
            .times(1)
            .returning(|_| Ok(None));
        store.expect_create_user_with_account().never();
        store.expect_insert_access_token().never();

        let service = SeedService::new(Arc::new(store), seed, oauth_config());
        let error = service.run().await.expect_err("missing application is fatal");

        assert!(matches!(
            error,
            AppError::ApplicationNotFound(client_id) if client_id == "client-id"
        ));
        assert!(!output_path.exists());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_application_is_logged_as_error() {
        let temp_dir = TempDir::new().unwrap();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut store = MockAccountStore::new();
        store
            .expect_find_application_by_uid()
            .returning(|_| Ok(None));

        let service = SeedService::new(
            Arc::new(store),
            seed_config(&temp_dir, 1),
            oauth_config(),
        );
        assert!(service.run().await.is_err());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("ERROR"));
        assert!(output.contains("Application with client_id 'client-id' not found!"));
    }

    #[tokio::test]
    async fn failed_user_is_skipped_and_run_continues() {
        let temp_dir = TempDir::new().unwrap();
        let seed = seed_config(&temp_dir, 3);
        let output_path = seed.output_path.clone();

        let mut store = MockAccountStore::new();
        store
            .expect_find_application_by_uid()
            .times(1)
            .returning(|_| Ok(Some(application())));
        store
            .expect_create_user_with_account()
            .times(3)
            .returning(|user, _| {
                if user.email == "testuser0002@test.com" {
                    Err(AppError::Validation("email already taken".to_string()))
                } else {
                    Ok(())
                }
            });
        store
            .expect_insert_access_token()
            .times(2)
            .returning(|_| Ok(()));

        let service = SeedService::new(Arc::new(store), seed, oauth_config());
        let report = service.run().await.unwrap();

        assert_eq!(report.requested, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].number, 2);
        assert!(report.failures[0].error.contains("email already taken"));

        let rows = read_credentials(&output_path).unwrap();
        let usernames: Vec<_> = rows.iter().map(|row| row.username.as_str()).collect();
        assert_eq!(usernames, vec!["testuser0001", "testuser0003"]);
        assert_eq!(rows, report.created);
    }

    #[tokio::test]
    async fn token_failure_leaves_no_row() {
        let temp_dir = TempDir::new().unwrap();
        let seed = seed_config(&temp_dir, 2);
        let output_path = seed.output_path.clone();

        let mut store = MockAccountStore::new();
        store
            .expect_find_application_by_uid()
            .returning(|_| Ok(Some(application())));
        store
            .expect_create_user_with_account()
            .times(2)
            .returning(|_, _| Ok(()));
        let mut issued = 0;
        store
            .expect_insert_access_token()
            .times(2)
            .returning(move |_| {
                issued += 1;
                if issued == 1 {
                    Err(AppError::Validation("token collision".to_string()))
                } else {
                    Ok(())
                }
            });

        let service = SeedService::new(Arc::new(store), seed, oauth_config());
        let report = service.run().await.unwrap();

        let rows = read_credentials(&output_path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "testuser0002");
        assert_eq!(report.failures[0].number, 1);
    }

    #[tokio::test]
    async fn issued_tokens_carry_scopes_and_two_year_lifetime() {
        let temp_dir = TempDir::new().unwrap();
        let seed = seed_config(&temp_dir, 2);

        let mut store = MockAccountStore::new();
        store
            .expect_find_application_by_uid()
            .returning(|_| Ok(Some(application())));
        store
            .expect_create_user_with_account()
            .withf(|user, account| {
                user.account_id == account.id
                    && user.approved
                    && user.agreement
                    && user.confirmed_at.is_some()
                    && account.domain.is_none()
                    && account.private_key_pem.is_some()
            })
            .times(2)
            .returning(|_, _| Ok(()));
        store
            .expect_insert_access_token()
            .withf(|token| {
                token.application_id == "app-1"
                    && token.scopes == "read write follow"
                    && token.expires_in == Some(63_113_904)
                    && token.refresh_token.is_some()
                    && token.revoked_at.is_none()
            })
            .times(2)
            .returning(|_| Ok(()));

        let service = SeedService::new(Arc::new(store), seed, oauth_config());
        let report = service.run().await.unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.created.len(), 2);
        assert_ne!(
            report.created[0].access_token,
            report.created[1].access_token
        );
    }
}
