use async_trait::async_trait;
use readdon_core::config::ApiSettings;
use readdon_core::entities::{AddonDescriptor, AddonManifest, Collection, CollectionAck};
use readdon_core::ports::{AddonApi, ManifestFetcher};
use readdon_core::Error;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::network::build_api_client;

const LOGIN_ENDPOINT: &str = "login";
const COLLECTION_GET_ENDPOINT: &str = "addonCollectionGet";
const COLLECTION_SET_ENDPOINT: &str = "addonCollectionSet";

/// Every API response is `{"result": ...}` or `{"error": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<ApiFailure>,
}

#[derive(Debug, Deserialize)]
struct ApiFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<i64>,
}

impl ApiFailure {
    fn describe(&self) -> String {
        match (&self.message, self.code) {
            (Some(msg), Some(code)) => format!("{} (code {})", msg, code),
            (Some(msg), None) => msg.clone(),
            (None, Some(code)) => format!("error code {}", code),
            (None, None) => "unspecified error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    #[serde(rename = "authKey")]
    auth_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionResult {
    addons: Option<Collection>,
}

/// Client for the Stremio account API and addon manifests
pub struct StremioApiClient {
    client: Client,
    base_url: String,
}

impl StremioApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, Error> {
        let client = build_api_client(settings)?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    /// POST a JSON payload and hand back status and raw body
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<(StatusCode, String), Error> {
        let url = self.endpoint(endpoint);
        debug!(url = %url, "posting to account API");

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} request failed: {}", endpoint, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("failed to read {} response: {}", endpoint, e)))?;
        Ok((status, body))
    }
}

/// Unwrap an API envelope. The error string is the message for the caller's
/// error variant.
fn decode<T: DeserializeOwned>(endpoint: &str, status: StatusCode, body: &str) -> Result<T, String> {
    if !status.is_success() {
        return Err(format!("{} returned status {}", endpoint, status));
    }

    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| format!("malformed {} response: {}", endpoint, e))?;

    if let Some(failure) = envelope.error {
        return Err(failure.describe());
    }

    envelope
        .result
        .ok_or_else(|| format!("{} response has no result", endpoint))
}

#[async_trait]
impl AddonApi for StremioApiClient {
    #[instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, Error> {
        let payload = json!({
            "type": "Login",
            "email": email,
            "password": password,
            "facebook": false,
        });

        let (status, body) = self.post(LOGIN_ENDPOINT, &payload).await?;
        let result: LoginResult =
            decode(LOGIN_ENDPOINT, status, &body).map_err(Error::Authentication)?;

        result
            .auth_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Authentication("login response has no authKey".to_string()))
    }

    #[instrument(skip_all)]
    async fn fetch_collection(&self, auth_token: &str) -> Result<Collection, Error> {
        let payload = json!({
            "type": "AddonCollectionGet",
            "authKey": auth_token,
            "update": true,
        });

        let (status, body) = self.post(COLLECTION_GET_ENDPOINT, &payload).await?;
        let result: CollectionResult =
            decode(COLLECTION_GET_ENDPOINT, status, &body).map_err(Error::Api)?;

        let addons = result
            .addons
            .ok_or_else(|| Error::Api("collection response has no addons".to_string()))?;
        debug!(count = addons.len(), "fetched addon collection");
        Ok(addons)
    }

    #[instrument(skip_all, fields(count = addons.len()))]
    async fn replace_collection(
        &self,
        auth_token: &str,
        addons: &[AddonDescriptor],
    ) -> Result<CollectionAck, Error> {
        let payload = json!({
            "type": "AddonCollectionSet",
            "authKey": auth_token,
            "addons": addons,
        });

        let (status, body) = self.post(COLLECTION_SET_ENDPOINT, &payload).await?;
        decode(COLLECTION_SET_ENDPOINT, status, &body).map_err(Error::Api)
    }
}

#[async_trait]
impl ManifestFetcher for StremioApiClient {
    #[instrument(skip(self))]
    async fn fetch_manifest(&self, url: &str) -> Result<AddonDescriptor, Error> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::ManifestFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::ManifestFetch(format!(
                "manifest request returned status {}",
                response.status()
            )));
        }

        let manifest = response
            .json::<AddonManifest>()
            .await
            .map_err(|e| Error::ManifestFetch(format!("invalid manifest: {}", e)))?;

        Ok(AddonDescriptor::from_manifest(url, manifest))
    }
}
