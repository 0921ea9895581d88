//! Store interface used by the seed and cleanup services
//!
//! The services only talk to persistence through [`AccountStore`], so their
//! iteration and error handling can be exercised against a mock.

use super::models::{Account, OAuthAccessToken, OAuthApplication, User};
use crate::error::AppError;

/// One step of the manual deletion cascade for a test user
///
/// Steps run in the order of [`CascadeStep::ORDER`]; each one must finish
/// before the next, because later steps are blocked by rows the earlier steps
/// remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeStep {
    Statuses,
    Mentions,
    Notifications,
    Favourites,
    Blocks,
    FollowRequests,
    /// Follows whose target is the account
    Followers,
    /// Follows made by the account
    Following,
    Conversations,
    AccessTokens,
    AccessGrants,
    Account,
    User,
}

/// Which identifier a cascade step is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeScope {
    Account,
    User,
}

impl CascadeStep {
    pub const ORDER: [CascadeStep; 13] = [
        Self::Statuses,
        Self::Mentions,
        Self::Notifications,
        Self::Favourites,
        Self::Blocks,
        Self::FollowRequests,
        Self::Followers,
        Self::Following,
        Self::Conversations,
        Self::AccessTokens,
        Self::AccessGrants,
        Self::Account,
        Self::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statuses => "statuses",
            Self::Mentions => "mentions",
            Self::Notifications => "notifications",
            Self::Favourites => "favourites",
            Self::Blocks => "blocks",
            Self::FollowRequests => "follow_requests",
            Self::Followers => "followers",
            Self::Following => "following",
            Self::Conversations => "conversations",
            Self::AccessTokens => "access_tokens",
            Self::AccessGrants => "access_grants",
            Self::Account => "account",
            Self::User => "user",
        }
    }

    /// Table and column the step filters on
    pub(crate) fn target(&self) -> (&'static str, &'static str) {
        match self {
            Self::Statuses => ("statuses", "account_id"),
            Self::Mentions => ("mentions", "account_id"),
            Self::Notifications => ("notifications", "account_id"),
            Self::Favourites => ("favourites", "account_id"),
            Self::Blocks => ("blocks", "account_id"),
            Self::FollowRequests => ("follow_requests", "account_id"),
            Self::Followers => ("follows", "target_account_id"),
            Self::Following => ("follows", "account_id"),
            Self::Conversations => ("account_conversations", "account_id"),
            Self::AccessTokens => ("oauth_access_tokens", "resource_owner_id"),
            Self::AccessGrants => ("oauth_access_grants", "resource_owner_id"),
            Self::Account => ("accounts", "id"),
            Self::User => ("users", "id"),
        }
    }

    pub fn scope(&self) -> CascadeScope {
        match self {
            Self::AccessTokens | Self::AccessGrants | Self::User => CascadeScope::User,
            _ => CascadeScope::Account,
        }
    }
}

impl std::fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows removed per cascade step, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub removed: Vec<(CascadeStep, u64)>,
}

impl CascadeSummary {
    pub fn record(&mut self, step: CascadeStep, rows: u64) {
        self.removed.push((step, rows));
    }

    pub fn removed_for(&self, step: CascadeStep) -> u64 {
        self.removed
            .iter()
            .filter(|(recorded, _)| *recorded == step)
            .map(|(_, rows)| *rows)
            .sum()
    }

    pub fn total(&self) -> u64 {
        self.removed.iter().map(|(_, rows)| rows).sum()
    }
}

/// Persistence operations needed by the seed and cleanup runs
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait AccountStore {
    /// Look up an OAuth application by client ID
    async fn find_application_by_uid(
        &self,
        uid: &str,
    ) -> Result<Option<OAuthApplication>, AppError>;

    /// Persist a user together with its account, atomically
    async fn create_user_with_account(&self, user: &User, account: &Account)
    -> Result<(), AppError>;

    /// Persist an access token built with plaintext token values
    async fn insert_access_token(&self, token: &OAuthAccessToken) -> Result<(), AppError>;

    /// Users whose email matches a SQL `LIKE` pattern, ordered by ID
    async fn find_users_by_email_pattern(&self, pattern: &str) -> Result<Vec<User>, AppError>;

    /// Delete a user, its account and every dependent record
    ///
    /// Steps run one after another with no enclosing transaction: a failure
    /// leaves the rows removed by earlier steps deleted.
    async fn delete_user_cascade(&self, user: &User) -> Result<CascadeSummary, AppError>;
}
