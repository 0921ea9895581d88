//! Service layer
//!
//! Contains the two batch runs. Services orchestrate credential generation,
//! the store and the CSV export.

mod cleanup;
mod seed;

pub use cleanup::{CleanupFailure, CleanupReport, CleanupService};
pub use seed::{SeedFailure, SeedReport, SeedService, TestUserCredentials};
