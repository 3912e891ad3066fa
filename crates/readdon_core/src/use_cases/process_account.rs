use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::entities::{
    addon_names, AccountCredential, AccountOutcome, AccountReport, AccountStage, AddonDescriptor,
    Collection,
};
use crate::error::Error;
use crate::filter::AddonFilter;
use crate::ports::{ActionLog, AddonApi};
use crate::use_cases::TokenJournal;

/// Brings one account's addon collection in line with the allow-list and the
/// custom addon set.
///
/// Flow:
/// 1. With a cached token, fetch the collection straight away; if that fails,
///    log in once and retry the fetch once
/// 2. Without a cached token, log in first
/// 3. Every fresh token goes through the [`TokenJournal`] before the run
///    continues
/// 4. Keep default and keyword addons, append the custom set, replace the
///    remote collection
///
/// Failures never escape: they end the run in [`AccountStage::Failed`] and are
/// returned inside the [`AccountOutcome`].
pub struct ProcessAccountUseCase<Api, L>
where
    Api: AddonApi,
    L: ActionLog,
{
    api: Arc<Api>,
    log: Arc<L>,
    filter: AddonFilter,
    dry_run: bool,
}

/// Mutable state of one account run
struct AccountRun {
    stage: AccountStage,
    token: Option<String>,
}

impl<Api, L> ProcessAccountUseCase<Api, L>
where
    Api: AddonApi,
    L: ActionLog,
{
    pub fn new(api: Arc<Api>, log: Arc<L>, filter: AddonFilter) -> Self {
        Self {
            api,
            log,
            filter,
            dry_run: false,
        }
    }

    /// Compute and log the new collection without writing it.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(skip_all, fields(email = %credential.email))]
    pub async fn execute(
        &self,
        credential: AccountCredential,
        custom: &[AddonDescriptor],
        journal: &TokenJournal,
    ) -> AccountOutcome {
        let mut run = AccountRun {
            stage: if credential.cached_token().is_some() {
                AccountStage::Authenticated
            } else {
                AccountStage::NoToken
            },
            token: credential.cached_token().map(str::to_string),
        };

        let result = self.run(&credential, custom, journal, &mut run).await;

        match &result {
            Ok(report) => {
                info!(
                    kept = report.kept.len(),
                    removed = report.removed.len(),
                    installed = report.installed.len(),
                    dry_run = report.dry_run,
                    "account processed"
                );
            }
            Err(e) => {
                warn!(stage = %run.stage, kind = %e.kind(), error = %e, "account failed");
                self.log
                    .record(&credential.email, &format!("Error: {}", e))
                    .await;
                run.stage = AccountStage::Failed;
            }
        }

        AccountOutcome {
            email: credential.email,
            auth_token: run.token,
            stage: run.stage,
            result,
        }
    }

    async fn run(
        &self,
        credential: &AccountCredential,
        custom: &[AddonDescriptor],
        journal: &TokenJournal,
        run: &mut AccountRun,
    ) -> Result<AccountReport, Error> {
        let email = credential.email.as_str();
        let (token, current) = self.authenticated_collection(credential, journal, run).await?;

        run.stage = AccountStage::Filtering;
        let partition = self.filter.partition(&current);

        let keyword_kept = self.filter.keyword_matches(&current);
        if !keyword_kept.is_empty() {
            let names: Vec<&str> = keyword_kept.iter().map(|a| a.display_name()).collect();
            self.log
                .record(
                    email,
                    &format!("Keyword addon detected and whitelisted: {:?}", names),
                )
                .await;
        }

        let mut next = partition.kept.clone();
        next.extend_from_slice(custom);

        let report = AccountReport {
            kept: addon_names(&partition.kept),
            removed: addon_names(&partition.removed),
            installed: addon_names(custom),
            collection: next,
            dry_run: self.dry_run,
        };

        if self.dry_run {
            self.log
                .record(
                    email,
                    &format!(
                        "Dry run: would keep [{}], remove [{}], install [{}].",
                        report.kept.join(", "),
                        report.removed.join(", "),
                        report.installed.join(", ")
                    ),
                )
                .await;
            run.stage = AccountStage::Done;
            return Ok(report);
        }

        run.stage = AccountStage::Updating;
        let ack = self.api.replace_collection(&token, &report.collection).await?;
        debug!(success = ack.success, "collection replaced");

        if report.removed.is_empty() {
            self.log
                .record(email, "No non-default addons to remove.")
                .await;
        } else {
            self.log
                .record(
                    email,
                    &format!("Removed non-default addons: {}.", report.removed.join(", ")),
                )
                .await;
        }

        if report.installed.is_empty() {
            self.log.record(email, "No custom addons to install.").await;
        } else {
            self.log
                .record(
                    email,
                    &format!("Installed addons: {}.", report.installed.join(", ")),
                )
                .await;
        }

        run.stage = AccountStage::Done;
        Ok(report)
    }

    /// Resolve a working token and the collection it grants access to.
    async fn authenticated_collection(
        &self,
        credential: &AccountCredential,
        journal: &TokenJournal,
        run: &mut AccountRun,
    ) -> Result<(String, Collection), Error> {
        let email = credential.email.as_str();

        if let Some(cached) = credential.cached_token() {
            run.stage = AccountStage::Fetching;
            match self.api.fetch_collection(cached).await {
                Ok(addons) => {
                    self.log
                        .record(email, "Authenticated with stored auth token.")
                        .await;
                    return Ok((cached.to_string(), addons));
                }
                Err(e) if e.warrants_reauthentication() => {
                    debug!(error = %e, "stored token rejected");
                    self.log
                        .record(email, "Stored auth token failed. Re-authenticating...")
                        .await;
                    let token = self.login(credential, journal, run).await?;
                    run.stage = AccountStage::Fetching;
                    let addons = self.api.fetch_collection(&token).await?;
                    self.log
                        .record(email, "Re-authenticated and updated auth token.")
                        .await;
                    return Ok((token, addons));
                }
                Err(e) => return Err(e),
            }
        }

        self.log.record(email, "No stored token. Logging in...").await;
        let token = self.login(credential, journal, run).await?;
        run.stage = AccountStage::Fetching;
        let addons = self.api.fetch_collection(&token).await?;
        self.log
            .record(email, "Logged in and stored new auth token.")
            .await;
        Ok((token, addons))
    }

    async fn login(
        &self,
        credential: &AccountCredential,
        journal: &TokenJournal,
        run: &mut AccountRun,
    ) -> Result<String, Error> {
        run.stage = AccountStage::Authenticating;
        let token = self
            .api
            .authenticate(&credential.email, &credential.password)
            .await?;
        run.token = Some(token.clone());
        journal.record(&credential.email, &token).await;
        run.stage = AccountStage::Authenticated;
        Ok(token)
    }
}
