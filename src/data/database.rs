//! SQLite database operations
//!
//! All database access goes through this module.

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use super::store::{AccountStore, CascadeScope, CascadeStep, CascadeSummary};
use crate::auth::token::hash_token;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::debug!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users and Accounts
    // =========================================================================

    /// Insert account and user in a single transaction
    ///
    /// The account goes first since the user row references it.
    pub async fn insert_user_with_account(
        &self,
        user: &User,
        account: &Account,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, domain, display_name, note,
                private_key_pem, public_key_pem, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.domain)
        .bind(&account.display_name)
        .bind(&account.note)
        .bind(&account.private_key_pem)
        .bind(&account.public_key_pem)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, encrypted_password, account_id, agreement,
                approved, confirmed_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.encrypted_password)
        .bind(&user.account_id)
        .bind(user.agreement)
        .bind(user.approved)
        .bind(user.confirmed_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get users whose email matches a `LIKE` pattern
    pub async fn get_users_by_email_pattern(&self, pattern: &str) -> Result<Vec<User>, AppError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email LIKE ? ORDER BY id ASC")
                .bind(pattern)
                .fetch_all(&self.pool)
                .await?;

        Ok(users)
    }

    /// Count all users
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    // =========================================================================
    // Account-owned collections
    // =========================================================================

    /// Insert status
    pub async fn insert_status(&self, status: &Status) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO statuses (
                id, account_id, text, visibility, in_reply_to_id, reblog_of_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&status.id)
        .bind(&status.account_id)
        .bind(&status.text)
        .bind(&status.visibility)
        .bind(&status.in_reply_to_id)
        .bind(&status.reblog_of_id)
        .bind(status.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get status by ID
    pub async fn get_status(&self, id: &str) -> Result<Option<Status>, AppError> {
        let status = sqlx::query_as::<_, Status>("SELECT * FROM statuses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    /// Insert mention
    pub async fn insert_mention(&self, mention: &Mention) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO mentions (id, account_id, status_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&mention.id)
        .bind(&mention.account_id)
        .bind(&mention.status_id)
        .bind(mention.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert notification
    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, account_id, from_account_id, activity_type, activity_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.account_id)
        .bind(&notification.from_account_id)
        .bind(&notification.activity_type)
        .bind(&notification.activity_id)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert favourite
    pub async fn insert_favourite(&self, favourite: &Favourite) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO favourites (id, account_id, status_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&favourite.id)
        .bind(&favourite.account_id)
        .bind(&favourite.status_id)
        .bind(favourite.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert block
    pub async fn insert_block(&self, block: &AccountRelationship) -> Result<(), AppError> {
        self.insert_relationship("blocks", block).await
    }

    /// Insert follow request
    pub async fn insert_follow_request(
        &self,
        request: &AccountRelationship,
    ) -> Result<(), AppError> {
        self.insert_relationship("follow_requests", request).await
    }

    /// Insert follow (`account_id` follows `target_account_id`)
    pub async fn insert_follow(&self, follow: &AccountRelationship) -> Result<(), AppError> {
        self.insert_relationship("follows", follow).await
    }

    async fn insert_relationship(
        &self,
        table: &'static str,
        relationship: &AccountRelationship,
    ) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {table} (id, account_id, target_account_id, created_at) VALUES (?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(&relationship.id)
            .bind(&relationship.account_id)
            .bind(&relationship.target_account_id)
            .bind(relationship.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert account conversation
    pub async fn insert_account_conversation(
        &self,
        conversation: &AccountConversation,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO account_conversations (
                id, account_id, conversation_id, unread, created_at
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.account_id)
        .bind(&conversation.conversation_id)
        .bind(conversation.unread)
        .bind(conversation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Deletion cascade
    // =========================================================================

    /// Run a single cascade step for the given user/account pair
    ///
    /// # Returns
    /// Number of rows removed
    pub async fn delete_cascade_step(
        &self,
        step: CascadeStep,
        user_id: &str,
        account_id: &str,
    ) -> Result<u64, AppError> {
        let (table, column) = step.target();
        let sql = format!("DELETE FROM {table} WHERE {column} = ?");
        let result = sqlx::query(&sql)
            .bind(scoped_id(step, user_id, account_id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count rows a cascade step would remove
    pub async fn count_cascade_step(
        &self,
        step: CascadeStep,
        user_id: &str,
        account_id: &str,
    ) -> Result<i64, AppError> {
        let (table, column) = step.target();
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(scoped_id(step, user_id, account_id))
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // OAuth Applications, Tokens and Grants
    // =========================================================================

    /// Insert OAuth application
    pub async fn insert_oauth_application(&self, app: &OAuthApplication) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO oauth_applications (
                id, name, uid, secret, redirect_uri, scopes, website, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&app.id)
        .bind(&app.name)
        .bind(&app.uid)
        .bind(&app.secret)
        .bind(&app.redirect_uri)
        .bind(&app.scopes)
        .bind(&app.website)
        .bind(app.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get OAuth application by client ID
    pub async fn get_oauth_application_by_uid(
        &self,
        uid: &str,
    ) -> Result<Option<OAuthApplication>, AppError> {
        let app =
            sqlx::query_as::<_, OAuthApplication>("SELECT * FROM oauth_applications WHERE uid = ?")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;

        Ok(app)
    }

    /// Insert OAuth access token
    ///
    /// Token values are stored hashed; `token` carries the plaintexts.
    pub async fn insert_oauth_access_token(
        &self,
        token: &OAuthAccessToken,
    ) -> Result<(), AppError> {
        let token_hash = hash_token(&token.token);
        let refresh_token_hash = token.refresh_token.as_deref().map(hash_token);
        sqlx::query(
            r#"
            INSERT INTO oauth_access_tokens (
                id, token, refresh_token, application_id, resource_owner_id,
                scopes, expires_in, created_at, revoked_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token_hash)
        .bind(&refresh_token_hash)
        .bind(&token.application_id)
        .bind(&token.resource_owner_id)
        .bind(&token.scopes)
        .bind(token.expires_in)
        .bind(token.created_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get OAuth access token by plaintext token value
    pub async fn get_oauth_access_token(
        &self,
        token: &str,
    ) -> Result<Option<OAuthAccessToken>, AppError> {
        let token = sqlx::query_as::<_, OAuthAccessToken>(
            "SELECT * FROM oauth_access_tokens WHERE token = ? AND revoked_at IS NULL",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    /// Get all access tokens issued to a user
    pub async fn get_oauth_access_tokens_for_owner(
        &self,
        resource_owner_id: &str,
    ) -> Result<Vec<OAuthAccessToken>, AppError> {
        let tokens = sqlx::query_as::<_, OAuthAccessToken>(
            "SELECT * FROM oauth_access_tokens WHERE resource_owner_id = ? ORDER BY created_at ASC",
        )
        .bind(resource_owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tokens)
    }

    /// Insert OAuth access grant
    pub async fn insert_oauth_access_grant(
        &self,
        grant: &OAuthAccessGrant,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO oauth_access_grants (
                id, token, application_id, resource_owner_id, redirect_uri,
                scopes, expires_in, created_at, revoked_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&grant.id)
        .bind(hash_token(&grant.token))
        .bind(&grant.application_id)
        .bind(&grant.resource_owner_id)
        .bind(&grant.redirect_uri)
        .bind(&grant.scopes)
        .bind(grant.expires_in)
        .bind(grant.created_at)
        .bind(grant.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn scoped_id<'a>(step: CascadeStep, user_id: &'a str, account_id: &'a str) -> &'a str {
    match step.scope() {
        CascadeScope::Account => account_id,
        CascadeScope::User => user_id,
    }
}

impl AccountStore for Database {
    async fn find_application_by_uid(
        &self,
        uid: &str,
    ) -> Result<Option<OAuthApplication>, AppError> {
        self.get_oauth_application_by_uid(uid).await
    }

    async fn create_user_with_account(
        &self,
        user: &User,
        account: &Account,
    ) -> Result<(), AppError> {
        self.insert_user_with_account(user, account).await
    }

    async fn insert_access_token(&self, token: &OAuthAccessToken) -> Result<(), AppError> {
        self.insert_oauth_access_token(token).await
    }

    async fn find_users_by_email_pattern(&self, pattern: &str) -> Result<Vec<User>, AppError> {
        self.get_users_by_email_pattern(pattern).await
    }

    async fn delete_user_cascade(&self, user: &User) -> Result<CascadeSummary, AppError> {
        let account = self
            .get_account(&user.account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("account {}", user.account_id)))?;

        let mut summary = CascadeSummary::default();
        for step in CascadeStep::ORDER {
            let rows = self.delete_cascade_step(step, &user.id, &account.id).await?;
            tracing::trace!(step = %step, rows, email = %user.email, "Cascade step completed");
            summary.record(step, rows);
        }

        Ok(summary)
    }
}
