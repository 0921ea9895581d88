//! Credentials for generated users
//!
//! Handles:
//! - Password hashing
//! - OAuth token values
//! - Account key pairs

pub mod keys;
pub mod password;
pub mod token;

pub use keys::{KeyPair, generate_key_pair};
pub use password::{hash_password, verify_password};
pub use token::{generate_token, hash_token};
