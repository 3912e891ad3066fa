use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::entities::{AccountOutcome, AddonDescriptor, SyncSummary};
use crate::error::Error;
use crate::ports::{ActionLog, AddonApi, CredentialRepository, UPDATE_TAG};
use crate::use_cases::token_journal::apply_token;
use crate::use_cases::{ProcessAccountUseCase, TokenJournal};

/// Runs the account processor over every stored credential.
///
/// Accounts are processed concurrently, at most `max_concurrency` at a time.
/// Fresh tokens are written to the credential store as soon as they are
/// obtained (through a [`TokenJournal`] that owns the table), and the merged
/// table is written once more after the last account finishes.
pub struct SyncAccountsUseCase<C, Api, L>
where
    C: CredentialRepository,
    Api: AddonApi,
    L: ActionLog,
{
    credentials: Arc<C>,
    processor: ProcessAccountUseCase<Api, L>,
    log: Arc<L>,
    max_concurrency: usize,
}

impl<C, Api, L> SyncAccountsUseCase<C, Api, L>
where
    C: CredentialRepository,
    Api: AddonApi,
    L: ActionLog,
{
    pub fn new(
        credentials: Arc<C>,
        processor: ProcessAccountUseCase<Api, L>,
        log: Arc<L>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            credentials,
            processor,
            log,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Fails only when the credential store cannot be read; per-account
    /// failures are reported inside the returned summary.
    #[instrument(skip_all, fields(max_concurrency = self.max_concurrency))]
    pub async fn execute(&self, custom: &[AddonDescriptor]) -> Result<SyncSummary, Error> {
        let table = self.credentials.load_credentials().await?;

        self.log
            .record(
                UPDATE_TAG,
                &format!(
                    "Processing {} accounts with {} custom addons.",
                    table.len(),
                    custom.len()
                ),
            )
            .await;

        let (journal, rx) = TokenJournal::channel();
        let accounts = table.clone();
        let processing = async move {
            let outcomes: Vec<AccountOutcome> = stream::iter(accounts)
                .map(|credential| self.processor.execute(credential, custom, &journal))
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;
            drop(journal);
            outcomes
        };
        let persisting = TokenJournal::run(self.credentials.as_ref(), table, rx);

        let (outcomes, mut snapshot) = tokio::join!(processing, persisting);

        for outcome in &outcomes {
            if let Some(token) = &outcome.auth_token {
                apply_token(&mut snapshot, &outcome.email, token);
            }
        }

        if let Err(e) = self.credentials.save_credentials(&snapshot).await {
            warn!(error = %e, "failed to write final credential table");
            self.log
                .record(UPDATE_TAG, &format!("Failed to save auth tokens: {}", e))
                .await;
        }

        let summary = SyncSummary { outcomes };
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "batch finished"
        );
        self.log
            .record(
                UPDATE_TAG,
                &format!(
                    "Finished: {} succeeded, {} failed.",
                    summary.succeeded(),
                    summary.failed()
                ),
            )
            .await;

        Ok(summary)
    }
}
