//! In-memory port implementations shared by the use case tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::entities::{
    AccountCredential, AddonDescriptor, AddonManifest, Collection, CollectionAck,
};
use crate::error::Error;
use crate::ports::{
    ActionLog, AddonApi, AddonCacheRepository, CredentialRepository, ManifestFetcher, UrlPrompt,
};

pub fn addon(id: &str) -> AddonDescriptor {
    AddonDescriptor::from_manifest(
        format!("https://{}.example/manifest.json", id),
        AddonManifest::new(id, Some(id)),
    )
}

pub fn ids(addons: &[AddonDescriptor]) -> Vec<String> {
    addons.iter().map(|a| a.id().to_string()).collect()
}

/// Ordered record of calls across several mocks
#[derive(Clone, Default)]
pub struct Timeline(Arc<Mutex<Vec<String>>>);

impl Timeline {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }
}

struct RemoteAccount {
    password: String,
    valid_token: Option<String>,
    collection: Collection,
    logins: usize,
}

/// Account API keeping one collection per email.
///
/// Events: `authenticate:<email>`, `fetch:<token>`, `replace:<token>`.
pub struct MockApi {
    timeline: Timeline,
    accounts: Mutex<HashMap<String, RemoteAccount>>,
    failing_fetches: Mutex<HashMap<String, (usize, fn(String) -> Error)>>,
}

impl MockApi {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            accounts: Mutex::new(HashMap::new()),
            failing_fetches: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_account(self, email: &str, password: &str, collection: Collection) -> Self {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            RemoteAccount {
                password: password.to_string(),
                valid_token: None,
                collection,
                logins: 0,
            },
        );
        self
    }

    /// Mark `token` as a live session of `email`
    pub fn with_valid_token(self, email: &str, token: &str) -> Self {
        if let Some(acc) = self.accounts.lock().unwrap().get_mut(email) {
            acc.valid_token = Some(token.to_string());
        }
        self
    }

    /// Make the next `times` fetches with `token` fail even when it is valid
    pub fn failing_fetches(self, token: &str, times: usize) -> Self {
        self.failing_fetches_with(token, times, Error::Api)
    }

    /// Like [`MockApi::failing_fetches`], failing with the error built by `error`
    pub fn failing_fetches_with(
        self,
        token: &str,
        times: usize,
        error: fn(String) -> Error,
    ) -> Self {
        self.failing_fetches
            .lock()
            .unwrap()
            .insert(token.to_string(), (times, error));
        self
    }

    pub fn collection(&self, email: &str) -> Collection {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.collection.clone())
            .unwrap_or_default()
    }

    pub fn set_collection(&self, email: &str, collection: Collection) {
        if let Some(acc) = self.accounts.lock().unwrap().get_mut(email) {
            acc.collection = collection;
        }
    }

    fn owner_of(&self, token: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(_, acc)| acc.valid_token.as_deref() == Some(token))
            .map(|(email, _)| email.clone())
    }
}

#[async_trait]
impl AddonApi for MockApi {
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, Error> {
        self.timeline.push(format!("authenticate:{}", email));
        let mut accounts = self.accounts.lock().unwrap();
        let acc = accounts
            .get_mut(email)
            .filter(|acc| acc.password == password)
            .ok_or_else(|| Error::Authentication("Wrong email or password".to_string()))?;
        acc.logins += 1;
        let token = format!("{}-token-{}", email, acc.logins);
        acc.valid_token = Some(token.clone());
        Ok(token)
    }

    async fn fetch_collection(&self, auth_token: &str) -> Result<Collection, Error> {
        self.timeline.push(format!("fetch:{}", auth_token));
        {
            let mut failing = self.failing_fetches.lock().unwrap();
            if let Some((remaining, error)) = failing.get_mut(auth_token) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(error("Session does not exist".to_string()));
                }
            }
        }
        let email = self
            .owner_of(auth_token)
            .ok_or_else(|| Error::Api("Session does not exist".to_string()))?;
        Ok(self.collection(&email))
    }

    async fn replace_collection(
        &self,
        auth_token: &str,
        addons: &[AddonDescriptor],
    ) -> Result<CollectionAck, Error> {
        self.timeline.push(format!("replace:{}", auth_token));
        let email = self
            .owner_of(auth_token)
            .ok_or_else(|| Error::Api("Session does not exist".to_string()))?;
        self.set_collection(&email, addons.to_vec());
        Ok(CollectionAck { success: true })
    }
}

/// Credential store recording `save:<email>=<token>` for every saved row
/// whose token changed since the previous save.
pub struct MockCredentials {
    timeline: Timeline,
    table: Mutex<Vec<AccountCredential>>,
    saves: Mutex<usize>,
    fail_load: bool,
}

impl MockCredentials {
    pub fn new(timeline: Timeline, rows: Vec<AccountCredential>) -> Self {
        Self {
            timeline,
            table: Mutex::new(rows),
            saves: Mutex::new(0),
            fail_load: false,
        }
    }

    pub fn missing(timeline: Timeline) -> Self {
        Self {
            fail_load: true,
            ..Self::new(timeline, Vec::new())
        }
    }

    pub fn load_snapshot(&self) -> Vec<AccountCredential> {
        self.table.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn token_of(&self, email: &str) -> Option<String> {
        self.table
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email == email)
            .and_then(|c| c.auth_token.clone())
    }
}

#[async_trait]
impl CredentialRepository for MockCredentials {
    async fn load_credentials(&self) -> Result<Vec<AccountCredential>, Error> {
        if self.fail_load {
            return Err(Error::File("stremio_logins.csv not found".to_string()));
        }
        Ok(self.load_snapshot())
    }

    async fn save_credentials(&self, credentials: &[AccountCredential]) -> Result<(), Error> {
        let mut table = self.table.lock().unwrap();
        for row in credentials {
            let previous = table
                .iter()
                .find(|c| c.email == row.email)
                .and_then(|c| c.auth_token.clone());
            if previous != row.auth_token {
                if let Some(token) = &row.auth_token {
                    self.timeline.push(format!("save:{}={}", row.email, token));
                }
            }
        }
        *table = credentials.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockCache {
    stored: Mutex<Option<Collection>>,
    saves: Mutex<usize>,
}

impl MockCache {
    pub fn with(addons: Collection) -> Self {
        Self {
            stored: Mutex::new(Some(addons)),
            saves: Mutex::new(0),
        }
    }

    pub fn stored(&self) -> Option<Collection> {
        self.stored.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl AddonCacheRepository for MockCache {
    async fn load(&self) -> Result<Option<Collection>, Error> {
        Ok(self.stored())
    }

    async fn save(&self, addons: &[AddonDescriptor]) -> Result<(), Error> {
        *self.stored.lock().unwrap() = Some(addons.to_vec());
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockLog {
    lines: Mutex<Vec<String>>,
}

impl MockLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

#[async_trait]
impl ActionLog for MockLog {
    async fn record(&self, tag: &str, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("[{}] {}", tag, message));
    }
}

/// Serves manifests for known URLs, fails for everything else.
#[derive(Default)]
pub struct MockFetcher {
    manifests: HashMap<String, AddonDescriptor>,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn serving(mut self, url: &str, id: &str) -> Self {
        let mut descriptor = addon(id);
        descriptor.transport_url = url.to_string();
        self.manifests.insert(url.to_string(), descriptor);
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManifestFetcher for MockFetcher {
    async fn fetch_manifest(&self, url: &str) -> Result<AddonDescriptor, Error> {
        self.requested.lock().unwrap().push(url.to_string());
        self.manifests
            .get(url)
            .cloned()
            .ok_or_else(|| Error::ManifestFetch(format!("404 Not Found for {}", url)))
    }
}

/// Replays a fixed list of answers, then reports end of input.
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub notes: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            notes: Vec::new(),
        }
    }
}

impl UrlPrompt for ScriptedPrompt {
    fn next_url(&mut self) -> Result<Option<String>, Error> {
        Ok(self.answers.pop_front())
    }

    fn notify(&mut self, message: &str) {
        self.notes.push(message.to_string());
    }
}
