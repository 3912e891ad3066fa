use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// One row of the credential store.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredential {
    pub email: String,
    pub password: String,
    /// Cached `authKey` from a previous login, if any
    pub auth_token: Option<String>,
}

impl AccountCredential {
    pub fn new(email: String, password: String) -> Self {
        Self {
            email,
            password,
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Blank tokens read from the store count as missing.
    pub fn cached_token(&self) -> Option<&str> {
        self.auth_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredential")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("auth_token", &self.cached_token().map(|_| "<redacted>"))
            .finish()
    }
}

/// Addon manifest as served by the addon and echoed by the account API.
///
/// Only `id` is typed. `name` and every other key stay in `extra` exactly as
/// received, so writing a collection back does not alter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonManifest {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AddonManifest {
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        let mut extra = Map::new();
        if let Some(name) = name {
            extra.insert("name".to_string(), Value::String(name.to_string()));
        }
        Self {
            id: id.into(),
            extra,
        }
    }

    /// Human-readable name, when the manifest carries a string one
    pub fn name(&self) -> Option<&str> {
        self.extra.get("name").and_then(Value::as_str)
    }

    /// Flags declared by the manifest itself, defaulted when absent or malformed.
    pub fn declared_flags(&self) -> AddonFlags {
        self.extra
            .get("flags")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddonFlags {
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An entry of an account's addon collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonDescriptor {
    pub manifest: AddonManifest,
    pub transport_url: String,
    #[serde(default)]
    pub flags: AddonFlags,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AddonDescriptor {
    pub fn from_manifest(transport_url: impl Into<String>, manifest: AddonManifest) -> Self {
        let flags = manifest.declared_flags();
        Self {
            manifest,
            transport_url: transport_url.into(),
            flags,
            extra: Map::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn display_name(&self) -> &str {
        self.manifest.name().unwrap_or("Unknown")
    }
}

/// Ordered addon list of one account. Replacing it remotely is a full overwrite.
pub type Collection = Vec<AddonDescriptor>;

/// Names of the given addons, in order.
pub fn addon_names(addons: &[AddonDescriptor]) -> Vec<String> {
    addons.iter().map(|a| a.display_name().to_string()).collect()
}

/// Acknowledgement returned by the collection replace call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAck {
    #[serde(default)]
    pub success: bool,
}

/// Account processor state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStage {
    NoToken,
    Authenticating,
    Authenticated,
    Fetching,
    Filtering,
    Updating,
    Done,
    Failed,
}

impl fmt::Display for AccountStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountStage::NoToken => "no-token",
            AccountStage::Authenticating => "authenticating",
            AccountStage::Authenticated => "authenticated",
            AccountStage::Fetching => "fetching",
            AccountStage::Filtering => "filtering",
            AccountStage::Updating => "updating",
            AccountStage::Done => "done",
            AccountStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What a successful account run changed
#[derive(Debug, Clone, PartialEq)]
pub struct AccountReport {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub installed: Vec<String>,
    /// The collection that was (or, in a dry run, would have been) written
    pub collection: Collection,
    pub dry_run: bool,
}

/// Result of processing one account, successful or not.
#[derive(Debug)]
pub struct AccountOutcome {
    pub email: String,
    /// Token held at the end of processing, fresh or cached
    pub auth_token: Option<String>,
    /// Stage reached when processing stopped
    pub stage: AccountStage,
    pub result: Result<AccountReport, Error>,
}

impl AccountOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate of one batch run
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub outcomes: Vec<AccountOutcome>,
}

impl SyncSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_token_is_not_cached() {
        let cred = AccountCredential::new("a@b.c".to_string(), "pw".to_string());
        assert!(cred.cached_token().is_none());

        let cred = cred.with_token("  ");
        assert!(cred.cached_token().is_none());

        let cred = cred.with_token("abc");
        assert_eq!(cred.cached_token(), Some("abc"));
    }

    #[test]
    fn test_credential_debug_redacts_secrets() {
        let cred =
            AccountCredential::new("a@b.c".to_string(), "hunter2".to_string()).with_token("tok");
        let out = format!("{:?}", cred);
        assert!(out.contains("a@b.c"));
        assert!(!out.contains("hunter2"));
        assert!(!out.contains("tok\""));
    }

    #[test]
    fn test_descriptor_preserves_unknown_fields() {
        let raw = json!({
            "transportUrl": "https://v3-cinemeta.strem.io/manifest.json",
            "transportName": "http",
            "manifest": {
                "id": "com.linvo.cinemeta",
                "name": "Cinemeta",
                "version": "3.0.13",
                "resources": ["catalog", "meta"]
            },
            "flags": { "official": true, "protected": true, "extra": 1 }
        });

        let addon: AddonDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(addon.id(), "com.linvo.cinemeta");
        assert_eq!(addon.display_name(), "Cinemeta");
        assert!(addon.flags.official);
        assert!(addon.flags.protected);

        let back = serde_json::to_value(&addon).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_null_name_survives_round_trip() {
        let raw = json!({
            "transportUrl": "https://example.org/manifest.json",
            "manifest": { "id": "org.example", "name": null },
            "flags": { "official": false, "protected": false }
        });

        let addon: AddonDescriptor = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(addon.display_name(), "Unknown");
        assert_eq!(serde_json::to_value(&addon).unwrap(), raw);
    }

    #[test]
    fn test_manifest_new_sets_name() {
        assert_eq!(AddonManifest::new("a", Some("Alpha")).name(), Some("Alpha"));
        assert!(!AddonManifest::new("a", None).extra.contains_key("name"));
    }

    #[test]
    fn test_descriptor_defaults_missing_flags() {
        let addon: AddonDescriptor = serde_json::from_value(json!({
            "transportUrl": "https://example.org/manifest.json",
            "manifest": { "id": "org.example" }
        }))
        .unwrap();

        assert!(!addon.flags.official);
        assert!(!addon.flags.protected);
        assert_eq!(addon.display_name(), "Unknown");
    }

    #[test]
    fn test_from_manifest_copies_declared_flags() {
        let manifest: AddonManifest = serde_json::from_value(json!({
            "id": "org.example",
            "name": "Example",
            "flags": { "official": false, "protected": true }
        }))
        .unwrap();

        let addon = AddonDescriptor::from_manifest("https://example.org/manifest.json", manifest);
        assert!(addon.flags.protected);
        assert!(!addon.flags.official);
        assert_eq!(addon.transport_url, "https://example.org/manifest.json");
    }

    #[test]
    fn test_sync_summary_counts() {
        let summary = SyncSummary {
            outcomes: vec![
                AccountOutcome {
                    email: "ok@x".to_string(),
                    auth_token: Some("t".to_string()),
                    stage: AccountStage::Done,
                    result: Ok(AccountReport {
                        kept: vec![],
                        removed: vec![],
                        installed: vec![],
                        collection: vec![],
                        dry_run: false,
                    }),
                },
                AccountOutcome {
                    email: "bad@x".to_string(),
                    auth_token: None,
                    stage: AccountStage::Failed,
                    result: Err(Error::Authentication("nope".to_string())),
                },
            ],
        };

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(AccountStage::NoToken.to_string(), "no-token");
        assert_eq!(AccountStage::Failed.to_string(), "failed");
    }
}
