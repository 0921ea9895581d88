//! testaccounts - Synthetic test accounts for a Mastodon-compatible instance
//!
//! Two one-shot batch utilities share this library:
//!
//! - `create-test-users`: creates numbered users with local accounts, issues
//!   each an OAuth access token and exports the credentials to CSV
//! - `remove-test-users`: deletes every user matching a test email pattern,
//!   cascading through the account's records
//!
//! # Modules
//!
//! - `service`: The seed and cleanup runs
//! - `data`: SQLite database and the store interface
//! - `auth`: Passwords, tokens and account key pairs
//! - `export`: Credentials CSV
//! - `config`: Configuration management
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod logging;
pub mod service;
