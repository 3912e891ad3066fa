use std::path::{Path, PathBuf};

use async_trait::async_trait;
use readdon_core::entities::AccountCredential;
use readdon_core::ports::CredentialRepository;
use readdon_core::Error;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, instrument, warn};

const HEADER: [&str; 3] = ["email", "password", "auth_token"];

#[derive(Debug, Deserialize)]
struct CredentialRow {
    email: String,
    password: String,
    #[serde(default)]
    auth_token: Option<String>,
}

/// CSV-file credential store (`email,password,auth_token`)
pub struct CsvCredentialStore {
    path: PathBuf,
}

impl CsvCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse the store contents. Rows sharing an email collapse into one entry
/// that keeps the first row's position and the last row's values. Rows
/// without an email are skipped, so a later save no longer contains them.
fn parse_credentials(content: &str) -> Result<Vec<AccountCredential>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let mut credentials: Vec<AccountCredential> = Vec::new();
    for (index, row) in reader.deserialize::<CredentialRow>().enumerate() {
        let row = row.map_err(|e| {
            Error::File(format!("malformed credential row {}: {}", index + 1, e))
        })?;

        if row.email.is_empty() {
            warn!(
                row = index + 1,
                "skipping credential row without email; it is dropped on the next save"
            );
            continue;
        }

        let credential = AccountCredential {
            email: row.email,
            password: row.password,
            auth_token: row.auth_token.filter(|t| !t.is_empty()),
        };

        match credentials.iter_mut().find(|c| c.email == credential.email) {
            Some(existing) => *existing = credential,
            None => credentials.push(credential),
        }
    }
    Ok(credentials)
}

fn render_credentials(credentials: &[AccountCredential]) -> Result<Vec<u8>, Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| Error::File(format!("failed to write credential header: {}", e)))?;
    for credential in credentials {
        writer
            .write_record([
                credential.email.as_str(),
                credential.password.as_str(),
                credential.auth_token.as_deref().unwrap_or(""),
            ])
            .map_err(|e| Error::File(format!("failed to write credential row: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::File(format!("failed to flush credentials: {}", e)))
}

#[async_trait]
impl CredentialRepository for CsvCredentialStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_credentials(&self) -> Result<Vec<AccountCredential>, Error> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(Error::File(format!(
                "credential store {} not found",
                self.path.display()
            )));
        }

        let content = fs::read_to_string(&self.path).await?;
        let credentials = parse_credentials(&content)?;
        debug!(count = credentials.len(), "loaded credentials");
        Ok(credentials)
    }

    #[instrument(skip_all, fields(path = %self.path.display(), count = credentials.len()))]
    async fn save_credentials(&self, credentials: &[AccountCredential]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = render_credentials(credentials)?;

        // Write to a sibling file and rename so a crash never leaves a torn store
        let tmp_path = self.path.with_extension("csv.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!("saved credentials");
        Ok(())
    }
}
