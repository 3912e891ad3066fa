use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::entities::AccountCredential;
use crate::ports::CredentialRepository;

/// A freshly obtained token on its way to the credential store.
#[derive(Debug)]
pub struct TokenUpdate {
    pub email: String,
    pub token: String,
    /// Fired once the store has been rewritten (or the write has failed)
    pub ack: oneshot::Sender<()>,
}

/// Handle through which account processors report new tokens.
///
/// The credential table itself is owned by [`TokenJournal::run`]; processors
/// only ever send messages, so concurrent accounts never write the store.
pub struct TokenJournal {
    tx: Option<mpsc::UnboundedSender<TokenUpdate>>,
}

impl TokenJournal {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TokenUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A journal that persists nothing (single-account workflows).
    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// Report a new token and wait until it has been persisted.
    pub async fn record(&self, email: &str, token: &str) {
        let Some(tx) = &self.tx else {
            return;
        };

        let (ack, done) = oneshot::channel();
        let update = TokenUpdate {
            email: email.to_string(),
            token: token.to_string(),
            ack,
        };

        if tx.send(update).is_err() {
            warn!(email, "token journal closed, token not persisted");
            return;
        }
        let _ = done.await;
    }

    /// Apply updates to `table` and rewrite the store after each one, until
    /// every journal handle is dropped. Returns the final table.
    pub async fn run<C>(
        repo: &C,
        mut table: Vec<AccountCredential>,
        mut rx: mpsc::UnboundedReceiver<TokenUpdate>,
    ) -> Vec<AccountCredential>
    where
        C: CredentialRepository + ?Sized,
    {
        while let Some(update) = rx.recv().await {
            apply_token(&mut table, &update.email, &update.token);

            match repo.save_credentials(&table).await {
                Ok(()) => debug!(email = %update.email, "persisted new token"),
                Err(e) => warn!(email = %update.email, error = %e, "failed to persist new token"),
            }

            let _ = update.ack.send(());
        }
        table
    }
}

/// Set the token of the row keyed by `email`; unknown emails are ignored.
pub(crate) fn apply_token(table: &mut [AccountCredential], email: &str, token: &str) -> bool {
    match table.iter_mut().find(|c| c.email == email) {
        Some(row) => {
            row.auth_token = Some(token.to_string());
            true
        }
        None => false,
    }
}
