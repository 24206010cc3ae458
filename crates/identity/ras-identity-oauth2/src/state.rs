//! OAuth2 state handling for CSRF protection.
//!
//! The state parameter is sealed with AES-256-GCM and travels through the
//! browser, so nothing is stored when a login starts. Verified nonces are
//! remembered until they expire so a captured callback cannot be replayed.

use crate::error::{OAuth2Error, OAuth2Result};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;

/// Contents of a sealed state parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2State {
    pub nonce: String,
    pub registration_id: String,
    pub issued_at: DateTime<Utc>,
}

impl OAuth2State {
    pub fn new(registration_id: impl Into<String>) -> Self {
        Self {
            nonce: Uuid::new_v4().to_string(),
            registration_id: registration_id.into(),
            issued_at: Utc::now(),
        }
    }

    /// Saturates instead of overflowing for out-of-range lifetimes.
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Seals and opens state parameters with a process-wide key.
#[derive(Clone)]
pub struct StateCodec {
    cipher: Aes256Gcm,
}

impl StateCodec {
    /// `key_hex` must be a 32 byte key written as 64 hex characters.
    pub fn from_hex_key(key_hex: &str) -> OAuth2Result<Self> {
        let key = hex::decode(key_hex.trim()).map_err(|_| {
            OAuth2Error::ConfigError("State key must be hex encoded".to_string())
        })?;
        if key.len() != 32 {
            return Err(OAuth2Error::ConfigError(
                "State key must be 32 bytes (64 hex characters)".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| OAuth2Error::ConfigError("Invalid state key".to_string()))?;

        Ok(Self { cipher })
    }

    /// Encrypts the state with a fresh random nonce; the nonce is prepended
    /// to the ciphertext and the result is URL-safe base64.
    pub fn seal(&self, state: &OAuth2State) -> OAuth2Result<String> {
        let plaintext = serde_json::to_vec(state)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|_| OAuth2Error::StateEncryptionFailed)?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Reverses [`seal`](Self::seal). Any tampering fails authentication.
    pub fn open(&self, sealed: &str) -> OAuth2Result<OAuth2State> {
        let combined = URL_SAFE_NO_PAD
            .decode(sealed.trim())
            .map_err(|_| OAuth2Error::InvalidState("not base64".to_string()))?;

        if combined.len() <= NONCE_SIZE {
            return Err(OAuth2Error::InvalidState("too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| OAuth2Error::InvalidState("decryption failed".to_string()))?;

        serde_json::from_slice(&plaintext)
            .map_err(|_| OAuth2Error::InvalidState("malformed payload".to_string()))
    }
}

/// Trait for remembering which state nonces have already been used
#[async_trait]
pub trait ConsumedStateStore: Send + Sync {
    /// Record `nonce` as used until `expires_at`. Fails with
    /// [`OAuth2Error::StateReplayed`] if it was already recorded.
    async fn consume(&self, nonce: &str, expires_at: DateTime<Utc>) -> OAuth2Result<()>;

    /// Forget nonces whose state can no longer verify anyway
    async fn cleanup_expired(&self) -> OAuth2Result<usize>;
}

/// In-memory implementation of ConsumedStateStore
pub struct InMemoryConsumedStateStore {
    consumed: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl InMemoryConsumedStateStore {
    pub fn new() -> Self {
        Self {
            consumed: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConsumedStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsumedStateStore for InMemoryConsumedStateStore {
    async fn consume(&self, nonce: &str, expires_at: DateTime<Utc>) -> OAuth2Result<()> {
        let mut consumed = self.consumed.write().await;

        if consumed.contains_key(nonce) {
            return Err(OAuth2Error::StateReplayed);
        }

        consumed.insert(nonce.to_string(), expires_at);
        Ok(())
    }

    async fn cleanup_expired(&self) -> OAuth2Result<usize> {
        let mut consumed = self.consumed.write().await;
        let now = Utc::now();

        let before = consumed.len();
        consumed.retain(|_, expires_at| *expires_at >= now);

        Ok(before - consumed.len())
    }
}
