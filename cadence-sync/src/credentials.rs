//! Credential persistence over the injected key-value store.
//!
//! One store key per field, all values JSON text, so another browsing
//! context observing a storage-change signal can re-read any single field.

use std::sync::Arc;

use cadence_core::{CredentialPair, EpochMillis, StoreError, UserProfile};
use cadence_store::KvStore;

const ACCESS_TOKEN_KEY: &str = "auth:access-token";
const REFRESH_TOKEN_KEY: &str = "auth:refresh-token";
const EXPIRES_AT_KEY: &str = "auth:expires-at";
const CACHED_USER_KEY: &str = "auth:user";

/// Reads and writes the credential pair and the cached user document.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KvStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Load the stored pair. Returns `None` unless both tokens are present
    /// and non-empty; a half-written pair reads as absent.
    pub async fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        let access = self.read_string(ACCESS_TOKEN_KEY).await?;
        let refresh = self.read_string(REFRESH_TOKEN_KEY).await?;
        let (Some(access), Some(refresh)) = (access, refresh) else {
            return Ok(None);
        };

        let expires_at = self
            .store
            .get(EXPIRES_AT_KEY)
            .await?
            .and_then(|raw| serde_json::from_str::<EpochMillis>(&raw).ok());

        Ok(CredentialPair::new(access, refresh, expires_at))
    }

    /// Persist a pair, overwriting any previous one.
    pub async fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        self.write_string(ACCESS_TOKEN_KEY, &pair.access_token).await?;
        self.write_string(REFRESH_TOKEN_KEY, &pair.refresh_token)
            .await?;
        match pair.expires_at_ms {
            Some(expires_at) => {
                self.store
                    .set(EXPIRES_AT_KEY, &expires_at.to_string())
                    .await?
            }
            None => self.store.delete(EXPIRES_AT_KEY).await?,
        }
        Ok(())
    }

    /// Remove the pair and the cached user. Idempotent.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(ACCESS_TOKEN_KEY).await?;
        self.store.delete(REFRESH_TOKEN_KEY).await?;
        self.store.delete(EXPIRES_AT_KEY).await?;
        self.store.delete(CACHED_USER_KEY).await?;
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.read_string(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        self.read_string(REFRESH_TOKEN_KEY).await
    }

    pub async fn cached_user(&self) -> Result<Option<UserProfile>, StoreError> {
        let raw = self.store.get(CACHED_USER_KEY).await?;
        Ok(raw.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    pub async fn save_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        self.store.set(CACHED_USER_KEY, &user.to_string()).await
    }

    async fn read_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let raw = self.store.get(key).await?;
        Ok(raw
            .and_then(|raw| serde_json::from_str::<String>(&raw).ok())
            .filter(|value| !value.is_empty()))
    }

    async fn write_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string(value).map_err(|err| StoreError::Write {
                key: key.to_string(),
                reason: err.to_string(),
            })?;
        self.store.set(key, &serialized).await
    }
}
