//! RSA key pairs for local accounts

use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::AppError;

/// PEM-encoded account key pair
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// PKCS#8 private key
    pub private_key_pem: String,
    /// SPKI public key
    pub public_key_pem: String,
}

/// Generate an RSA key pair on the blocking pool
pub async fn generate_key_pair(bits: usize) -> Result<KeyPair, AppError> {
    tokio::task::spawn_blocking(move || -> Result<KeyPair, anyhow::Error> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, bits)?;
        let public_key = RsaPublicKey::from(&private_key);
        let private_key_pem = private_key.to_pkcs8_pem(LineEnding::LF)?.to_string();
        let public_key_pem = public_key.to_public_key_pem(LineEnding::LF)?;
        Ok(KeyPair {
            private_key_pem,
            public_key_pem,
        })
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
    .map_err(|e| AppError::Credentials(format!("failed to generate key pair: {e}")))
}
