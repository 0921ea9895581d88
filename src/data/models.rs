//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Users and Accounts
// =============================================================================

/// Authentication record for a local user
///
/// Every user owns exactly one local account through `account_id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2id PHC string
    pub encrypted_password: String,
    pub account_id: String,
    /// Whether the user accepted the server rules
    pub agreement: bool,
    /// Whether the registration was approved by moderators
    pub approved: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public profile entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    /// `None` for local accounts
    pub domain: Option<String>,
    pub display_name: Option<String>,
    pub note: Option<String>,
    /// RSA private key (PEM format), only present for local accounts
    pub private_key_pem: Option<String>,
    /// RSA public key (PEM format)
    pub public_key_pem: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_local(&self) -> bool {
        self.domain.is_none()
    }
}

// =============================================================================
// Account-owned collections
// =============================================================================

/// A post/toot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: String,
    pub account_id: String,
    pub text: String,
    /// Visibility: public, unlisted, private, direct
    pub visibility: String,
    pub in_reply_to_id: Option<String>,
    pub reblog_of_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An account mentioned by a status
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Mention {
    pub id: String,
    /// The mentioned account
    pub account_id: String,
    pub status_id: String,
    pub created_at: DateTime<Utc>,
}

/// Notification delivered to `account_id`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub account_id: String,
    /// Who triggered this notification
    pub from_account_id: String,
    /// Type: mention, favourite, reblog, follow, follow_request
    pub activity_type: String,
    pub activity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Favourite (like) relationship
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Favourite {
    pub id: String,
    pub account_id: String,
    pub status_id: String,
    pub created_at: DateTime<Utc>,
}

/// Directed relationship between two accounts
///
/// Shared shape of blocks, follow requests and follows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRelationship {
    pub id: String,
    pub account_id: String,
    pub target_account_id: String,
    pub created_at: DateTime<Utc>,
}

impl AccountRelationship {
    pub fn new(account_id: &str, target_account_id: &str) -> Self {
        Self {
            id: EntityId::new().0,
            account_id: account_id.to_string(),
            target_account_id: target_account_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Per-account view of a direct conversation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountConversation {
    pub id: String,
    pub account_id: String,
    pub conversation_id: String,
    pub unread: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// OAuth Applications, Tokens and Grants
// =============================================================================

/// OAuth application registration
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OAuthApplication {
    pub id: String,
    pub name: String,
    /// Client ID
    pub uid: String,
    /// Client secret
    pub secret: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// OAuth access token
///
/// `token` and `refresh_token` hold plaintext values when the struct is built
/// for issuance, and `sha256:` digests when loaded from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OAuthAccessToken {
    pub id: String,
    pub token: String,
    pub refresh_token: Option<String>,
    pub application_id: String,
    /// User ID
    pub resource_owner_id: String,
    /// Space separated scopes
    pub scopes: String,
    /// Lifetime in seconds, `None` for non-expiring tokens
    pub expires_in: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl OAuthAccessToken {
    /// Expiry instant derived from `created_at + expires_in`
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|seconds| self.created_at + chrono::Duration::seconds(seconds))
    }

    pub fn scope_list(&self) -> Vec<&str> {
        self.scopes.split_whitespace().collect()
    }
}

/// OAuth authorization grant (authorization code)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OAuthAccessGrant {
    pub id: String,
    pub token: String,
    pub application_id: String,
    pub resource_owner_id: String,
    pub redirect_uri: String,
    pub scopes: String,
    pub expires_in: i64,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}
