#![deny(missing_docs)]
//! Sealed-box encryption for GitHub Actions secrets.
//!
//! GitHub only accepts secret values encrypted to the scope's public key with
//! a libsodium sealed box (X25519 key agreement, XSalsa20-Poly1305). The
//! [`Sealer`] trait is the seam the dispatcher encrypts through;
//! [`SodiumSealer`] is the implementation.
//!
//! Before the first seal the process runs a one-shot readiness check: an
//! ephemeral keypair seals and unseals a fixed sample. The check runs at most
//! once per process no matter how many callers race on it, and every caller
//! observes the same outcome.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crypto_box::aead::OsRng;
use crypto_box::{PublicKey, SecretKey};
use thiserror::Error;
use tokio::sync::OnceCell;

/// Length of an X25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = crypto_box::KEY_SIZE;

/// Errors from sealing.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The recipient key is not valid base64 or has the wrong length.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// The readiness check failed; no sealing is possible in this process.
    #[error("crypto backend not ready: {0}")]
    NotReady(String),

    /// Sealing itself failed.
    #[error("crypto operation failed: {0}")]
    OperationFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Encrypts a plaintext to a recipient public key.
#[async_trait]
pub trait Sealer: Send + Sync {
    /// Seal `plaintext` to the base64 `recipient_key`, returning base64 ciphertext.
    async fn seal(&self, plaintext: &[u8], recipient_key: &str) -> Result<String, CryptoError>;
}

static READY: OnceCell<Result<(), String>> = OnceCell::const_new();

/// Wait for the process-wide readiness check.
pub async fn ready() -> Result<(), CryptoError> {
    READY
        .get_or_init(|| async {
            let outcome = self_test();
            match &outcome {
                Ok(()) => tracing::debug!("sealed box self-test passed"),
                Err(reason) => tracing::error!(%reason, "sealed box self-test failed"),
            }
            outcome
        })
        .await
        .clone()
        .map_err(CryptoError::NotReady)
}

fn self_test() -> Result<(), String> {
    const SAMPLE: &[u8] = b"ghcr-crypto readiness sample";
    let secret = SecretKey::generate(&mut OsRng);
    let sealed = secret
        .public_key()
        .seal(&mut OsRng, SAMPLE)
        .map_err(|e| format!("seal: {e}"))?;
    let opened = secret.unseal(&sealed).map_err(|e| format!("unseal: {e}"))?;
    if opened != SAMPLE {
        return Err("round trip mismatch".into());
    }
    Ok(())
}

/// Decode a base64 X25519 public key.
pub fn decode_public_key(recipient_key: &str) -> Result<PublicKey, CryptoError> {
    let bytes = STANDARD
        .decode(recipient_key.trim())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let bytes: [u8; PUBLIC_KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidKey(format!(
            "expected {PUBLIC_KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(PublicKey::from(bytes))
}

/// libsodium-compatible sealed-box [`Sealer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SodiumSealer;

impl SodiumSealer {
    /// Create a sealer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sealer for SodiumSealer {
    async fn seal(&self, plaintext: &[u8], recipient_key: &str) -> Result<String, CryptoError> {
        ready().await?;
        let key = decode_public_key(recipient_key)?;
        let sealed = key
            .seal(&mut OsRng, plaintext)
            .map_err(|e| CryptoError::OperationFailed(e.to_string()))?;
        Ok(STANDARD.encode(sealed))
    }
}
