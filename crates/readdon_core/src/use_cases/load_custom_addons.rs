use std::sync::Arc;

use tracing::{debug, instrument};

use crate::entities::{AddonDescriptor, Collection};
use crate::error::Error;
use crate::ports::{ActionLog, AddonCacheRepository, ManifestFetcher, UrlPrompt, INIT_TAG};

/// Typing this instead of a URL ends the bootstrap prompt.
pub const DONE_SENTINEL: &str = "done";

const CONFIGURE_SUFFIX: &str = "/configure";
const MANIFEST_SUFFIX: &str = "/manifest.json";

/// Point a configuration page URL at the addon's manifest instead.
pub fn normalize_manifest_url(url: &str) -> String {
    match url.strip_suffix(CONFIGURE_SUFFIX) {
        Some(base) => format!("{}{}", base, MANIFEST_SUFFIX),
        None => url.to_string(),
    }
}

/// Loads the custom addon set, building it interactively on first use.
pub struct LoadCustomAddonsUseCase<Cache, F, L>
where
    Cache: AddonCacheRepository,
    F: ManifestFetcher,
    L: ActionLog,
{
    cache: Arc<Cache>,
    fetcher: Arc<F>,
    log: Arc<L>,
}

impl<Cache, F, L> LoadCustomAddonsUseCase<Cache, F, L>
where
    Cache: AddonCacheRepository,
    F: ManifestFetcher,
    L: ActionLog,
{
    pub fn new(cache: Arc<Cache>, fetcher: Arc<F>, log: Arc<L>) -> Self {
        Self {
            cache,
            fetcher,
            log,
        }
    }

    /// Return the cached set verbatim, or prompt for URLs until the sentinel
    /// (or end of input) and persist what was collected.
    #[instrument(skip_all)]
    pub async fn execute(&self, prompt: &mut dyn UrlPrompt) -> Result<Collection, Error> {
        if let Some(addons) = self.cache.load().await? {
            debug!(count = addons.len(), "custom addon cache loaded");
            return Ok(addons);
        }

        prompt.notify(&format!(
            "No custom addons found. Enter addon URLs (type '{}' to finish):",
            DONE_SENTINEL
        ));

        let mut addons = Vec::new();
        while let Some(input) = prompt.next_url()? {
            let input = input.trim();
            if input.eq_ignore_ascii_case(DONE_SENTINEL) {
                break;
            }
            if input.is_empty() {
                prompt.notify("Invalid addon URL. Try again.");
                continue;
            }

            let url = normalize_manifest_url(input);
            if url != input {
                prompt.notify(&format!("Updated URL to: {}", url));
            }

            match self.fetch_manifest(&url).await {
                Some(addon) => {
                    prompt.notify(&format!("Added addon: {}", addon.display_name()));
                    addons.push(addon);
                }
                None => prompt.notify("Invalid addon URL. Try again."),
            }
        }

        self.cache.save(&addons).await?;
        self.log
            .record(
                INIT_TAG,
                &format!("Saved {} custom addons to cache.", addons.len()),
            )
            .await;
        Ok(addons)
    }

    /// Fetch one manifest; failures are logged and reported as `None`.
    pub async fn fetch_manifest(&self, url: &str) -> Option<AddonDescriptor> {
        match self.fetcher.fetch_manifest(url).await {
            Ok(addon) => {
                self.log
                    .record(INIT_TAG, &format!("Fetched manifest from {}.", url))
                    .await;
                Some(addon)
            }
            Err(e) => {
                self.log
                    .record(
                        INIT_TAG,
                        &format!("Failed to fetch manifest from {}. Error: {}", url, e),
                    )
                    .await;
                None
            }
        }
    }
}
