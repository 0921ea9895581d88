//! Test user removal
//!
//! Deletes every user whose email matches a pattern, together with its
//! account and the records hanging off it. Each user is handled on its own:
//! a failure is reported and the run moves on to the next user.

use std::sync::Arc;

use crate::data::AccountStore;
use crate::error::AppError;

/// A user whose cascade failed
#[derive(Debug, Clone)]
pub struct CleanupFailure {
    pub email: String,
    pub error: String,
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub matched: usize,
    /// Emails of fully removed users
    pub deleted: Vec<String>,
    pub failures: Vec<CleanupFailure>,
    /// Rows removed across all successful cascades
    pub rows_removed: u64,
}

/// Cleanup service
pub struct CleanupService<S> {
    store: Arc<S>,
}

impl<S: AccountStore> CleanupService<S> {
    /// Create new cleanup service
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete all users matching `email_pattern`
    ///
    /// # Errors
    /// Only the initial user lookup is fatal. Cascade failures are recorded in
    /// the report; rows removed before the failing step stay removed.
    pub async fn run(&self, email_pattern: &str) -> Result<CleanupReport, AppError> {
        let users = self
            .store
            .find_users_by_email_pattern(email_pattern)
            .await?;

        tracing::info!(
            pattern = %email_pattern,
            matched = users.len(),
            "Found users to delete"
        );

        let mut report = CleanupReport {
            matched: users.len(),
            ..CleanupReport::default()
        };

        for user in users {
            tracing::info!(email = %user.email, "Deleting user {}...", user.email);

            match self.store.delete_user_cascade(&user).await {
                Ok(summary) => {
                    tracing::debug!(
                        email = %user.email,
                        rows = summary.total(),
                        "Cascade finished"
                    );
                    tracing::info!(
                        email = %user.email,
                        "Deleted user and account: {}",
                        user.email
                    );
                    report.rows_removed += summary.total();
                    report.deleted.push(user.email);
                }
                Err(error) => {
                    tracing::error!(
                        email = %user.email,
                        "Failed to delete {}: {}",
                        user.email,
                        error
                    );
                    report.failures.push(CleanupFailure {
                        email: user.email,
                        error: error.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
