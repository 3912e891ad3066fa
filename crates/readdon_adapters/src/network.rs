//! Shared HTTP client configuration for the account API and addon manifests.

use std::time::Duration;

use readdon_core::config::ApiSettings;
use readdon_core::Error;
use reqwest::Client;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("readdon/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for all remote calls.
///
/// This client is configured with:
/// - Request and connect timeouts from settings
/// - A fixed readdon user agent
pub fn build_api_client(settings: &ApiSettings) -> Result<Client, Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .build()
        .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_api_client() {
        let client = build_api_client(&ApiSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("readdon/"));
    }
}
