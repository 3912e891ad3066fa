use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use readdon_core::config::{Settings, DEFAULT_API_BASE_URL};

pub fn get_configuration_with_paths(
    current_dir_path: Option<PathBuf>,
    system_config_dir_path: Option<PathBuf>,
) -> Result<Settings, config::ConfigError> {
    let config_directory = current_dir_path.unwrap_or_else(|| {
        std::env::current_dir()
            .map(|p| p.join("config"))
            .unwrap_or_else(|_| PathBuf::from("config"))
    });

    let system_config_dir = system_config_dir_path.unwrap_or_else(|| {
        ProjectDirs::from("com", "readdon", "readdon")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config"))
    });

    // List-valued settings (allow-list, keywords) fall back to the serde defaults
    let settings = Config::builder()
        .set_default("api.base_url", DEFAULT_API_BASE_URL)?
        .set_default("api.timeout_secs", 30)?
        .set_default("api.connect_timeout_secs", 10)?
        .set_default("files.credentials", "stremio_logins.csv")?
        .set_default("files.custom_addons", "custom_addons.json")?
        .set_default("files.action_log", "stremio_log.txt")?
        .set_default("sync.max_concurrency", 8)?
        .set_default("log_level", "info")?
        .add_source(File::from(system_config_dir.join("config.toml")).required(false))
        .add_source(File::from(config_directory.join("config.toml")).required(false))
        .add_source(Environment::with_prefix("READDON").separator("__"))
        .build()?;

    settings.try_deserialize::<Settings>()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    get_configuration_with_paths(None, None)
}
