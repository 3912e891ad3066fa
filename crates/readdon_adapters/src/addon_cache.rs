use std::path::{Path, PathBuf};

use async_trait::async_trait;
use readdon_core::entities::{AddonDescriptor, Collection};
use readdon_core::ports::AddonCacheRepository;
use readdon_core::Error;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, instrument};

/// JSON-file cache of the custom addon set
pub struct JsonAddonCache {
    path: PathBuf,
}

impl JsonAddonCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Pretty JSON with a four-space indent, the layout hand-edited caches use.
fn render_addons(addons: &[AddonDescriptor]) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    addons
        .serialize(&mut serializer)
        .map_err(|e| Error::File(format!("failed to serialize addon cache: {}", e)))?;
    Ok(buf)
}

#[async_trait]
impl AddonCacheRepository for JsonAddonCache {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<Collection>, Error> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("no addon cache yet");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let addons: Collection = serde_json::from_str(&content).map_err(|e| {
            Error::File(format!(
                "failed to parse addon cache {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(count = addons.len(), "loaded addon cache");
        Ok(Some(addons))
    }

    #[instrument(skip_all, fields(path = %self.path.display(), count = addons.len()))]
    async fn save(&self, addons: &[AddonDescriptor]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = render_addons(addons)?;
        fs::write(&self.path, content).await?;
        debug!("saved addon cache");
        Ok(())
    }
}
