use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://api.strem.io/api";

/// Addons that are always kept on an account.
pub const DEFAULT_ADDONS: [&str; 4] = [
    "com.linvo.cinemeta",
    "org.stremio.opensubtitlesv3",
    "org.stremio.opensubtitles",
    "org.stremio.local",
];

/// Id substrings that mark an addon as user-owned and keep it in place.
pub const DEFAULT_KEEP_KEYWORDS: [&str; 1] = ["trakt"];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub files: FileSettings,
    pub sync: SyncSettings,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FileSettings {
    pub credentials: PathBuf,
    pub custom_addons: PathBuf,
    pub action_log: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Upper bound on accounts processed at the same time
    pub max_concurrency: usize,
    pub default_addons: Vec<String>,
    pub keep_keywords: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            files: FileSettings::default(),
            sync: SyncSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from("stremio_logins.csv"),
            custom_addons: PathBuf::from("custom_addons.json"),
            action_log: PathBuf::from("stremio_log.txt"),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            default_addons: DEFAULT_ADDONS.iter().map(|s| s.to_string()).collect(),
            keep_keywords: DEFAULT_KEEP_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SyncSettings {
    /// Concurrency limit, never below one.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(16, 16)]
    fn test_effective_concurrency(#[case] configured: usize, #[case] expected: usize) {
        let sync = SyncSettings {
            max_concurrency: configured,
            ..Default::default()
        };
        assert_eq!(sync.effective_concurrency(), expected);
    }

    #[test]
    fn test_default_file_names() {
        let files = FileSettings::default();
        assert_eq!(files.credentials, PathBuf::from("stremio_logins.csv"));
        assert_eq!(files.custom_addons, PathBuf::from("custom_addons.json"));
        assert_eq!(files.action_log, PathBuf::from("stremio_log.txt"));
    }

    #[test]
    fn test_default_sync_settings_snapshot() {
        insta::assert_yaml_snapshot!(SyncSettings::default(), @r###"
        max_concurrency: 8
        default_addons:
          - com.linvo.cinemeta
          - org.stremio.opensubtitlesv3
          - org.stremio.opensubtitles
          - org.stremio.local
        keep_keywords:
          - trakt
        "###);
    }
}
