//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - The store interface consumed by the services

mod database;
mod models;
mod store;

pub use database::Database;
pub use models::*;
#[cfg(test)]
pub use store::MockAccountStore;
pub use store::{AccountStore, CascadeScope, CascadeStep, CascadeSummary};
