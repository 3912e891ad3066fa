pub mod action_log;
pub mod addon_cache;
pub mod configuration;
pub mod credentials;
pub mod network;
pub mod stremio_api;
pub mod telemetry;

// Re-exports for convenience
pub use action_log::FileActionLog;
pub use addon_cache::JsonAddonCache;
pub use credentials::CsvCredentialStore;
pub use stremio_api::StremioApiClient;
