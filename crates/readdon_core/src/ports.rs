use async_trait::async_trait;

use crate::entities::{AccountCredential, AddonDescriptor, Collection, CollectionAck};
use crate::error::Error;

/// Action log tag for cache bootstrap events
pub const INIT_TAG: &str = "INIT";

/// Action log tag for batch-level events
pub const UPDATE_TAG: &str = "UPDATE";

// ============================================================================
// Remote Ports
// ============================================================================

/// Account API of the streaming service
#[async_trait]
pub trait AddonApi: Send + Sync {
    /// Log in and return a fresh auth token
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, Error>;

    /// Current addon collection of the account owning `auth_token`
    async fn fetch_collection(&self, auth_token: &str) -> Result<Collection, Error>;

    /// Overwrite the whole addon collection
    async fn replace_collection(
        &self,
        auth_token: &str,
        addons: &[AddonDescriptor],
    ) -> Result<CollectionAck, Error>;
}

/// Retrieval of addon manifests from their transport URL
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch_manifest(&self, url: &str) -> Result<AddonDescriptor, Error>;
}

// ============================================================================
// Storage Ports
// ============================================================================

/// Persistence of account credentials and cached tokens
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn load_credentials(&self) -> Result<Vec<AccountCredential>, Error>;

    /// Replace the stored table with `credentials`
    async fn save_credentials(&self, credentials: &[AccountCredential]) -> Result<(), Error>;
}

/// Persistence of the custom addon set
#[async_trait]
pub trait AddonCacheRepository: Send + Sync {
    /// `None` when no cache has been written yet
    async fn load(&self) -> Result<Option<Collection>, Error>;

    async fn save(&self, addons: &[AddonDescriptor]) -> Result<(), Error>;
}

/// Human-readable event log, one line per event
#[async_trait]
pub trait ActionLog: Send + Sync {
    /// Record `message` under `tag` (an account email, `INIT` or `UPDATE`).
    /// Logging failures are reported by the implementation, never returned.
    async fn record(&self, tag: &str, message: &str);
}

// ============================================================================
// Interaction Ports
// ============================================================================

/// Line-based source of addon URLs during cache bootstrap
pub trait UrlPrompt: Send {
    /// Next URL typed by the user, `None` once input is exhausted
    fn next_url(&mut self) -> Result<Option<String>, Error>;

    /// Show a status line to the user
    fn notify(&mut self, message: &str);
}
