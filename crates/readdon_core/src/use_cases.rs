mod clone_account;
mod load_custom_addons;
mod process_account;
mod sync_accounts;
mod token_journal;

#[cfg(test)]
mod mocks;

pub use clone_account::CloneAccountUseCase;
pub use load_custom_addons::{normalize_manifest_url, LoadCustomAddonsUseCase, DONE_SENTINEL};
pub use process_account::ProcessAccountUseCase;
pub use sync_accounts::SyncAccountsUseCase;
pub use token_journal::{TokenJournal, TokenUpdate};
