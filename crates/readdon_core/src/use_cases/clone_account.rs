use std::sync::Arc;

use tracing::{info, instrument};

use crate::entities::{addon_names, Collection};
use crate::error::Error;
use crate::filter::AddonFilter;
use crate::ports::{ActionLog, AddonApi, AddonCacheRepository};

/// Exports one account's non-default addons as the custom addon set.
pub struct CloneAccountUseCase<Api, Cache, L>
where
    Api: AddonApi,
    Cache: AddonCacheRepository,
    L: ActionLog,
{
    api: Arc<Api>,
    cache: Arc<Cache>,
    log: Arc<L>,
    filter: AddonFilter,
}

impl<Api, Cache, L> CloneAccountUseCase<Api, Cache, L>
where
    Api: AddonApi,
    Cache: AddonCacheRepository,
    L: ActionLog,
{
    pub fn new(api: Arc<Api>, cache: Arc<Cache>, log: Arc<L>, filter: AddonFilter) -> Self {
        Self {
            api,
            cache,
            log,
            filter,
        }
    }

    /// Log in, take every addon the filter would remove and overwrite the
    /// cache with them. Returns the cloned addons.
    #[instrument(skip(self, password))]
    pub async fn execute(&self, email: &str, password: &str) -> Result<Collection, Error> {
        match self.clone_addons(email, password).await {
            Ok(cloned) => Ok(cloned),
            Err(e) => {
                self.log.record(email, &format!("Error: {}", e)).await;
                Err(e)
            }
        }
    }

    async fn clone_addons(&self, email: &str, password: &str) -> Result<Collection, Error> {
        self.log.record(email, "Logging in to clone addons...").await;
        let token = self.api.authenticate(email, password).await?;

        let addons = self.api.fetch_collection(&token).await?;
        let cloned = self.filter.partition(&addons).removed;

        self.cache.save(&cloned).await?;

        info!(count = cloned.len(), "custom addon cache replaced");
        if cloned.is_empty() {
            self.log
                .record(email, "No non-default addons found. Custom addon cache cleared.")
                .await;
        } else {
            self.log
                .record(
                    email,
                    &format!(
                        "Cloned {} addons: {}.",
                        cloned.len(),
                        addon_names(&cloned).join(", ")
                    ),
                )
                .await;
        }

        Ok(cloned)
    }
}
