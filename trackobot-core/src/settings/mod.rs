//! Settings store
//!
//! A namespaced, persistent key → blob mapping holding the account
//! credentials, the service URL and the snapshot of the pending results queue.
//!
//! Reads go to the backing store every time and writes are applied
//! immediately, so a value written by [`SettingsStore::set`] survives a crash
//! right after the call returns.

mod sqlite;

pub use sqlite::SqliteSettings;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Keys used by the pipeline
pub mod keys {
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const WEBSERVICE_URL: &str = "webserviceUrl";
    pub const RESULTS_QUEUE: &str = "resultsQueue";
}

/// Service origin used until the user points the client elsewhere
pub const DEFAULT_WEBSERVICE_URL: &str = "https://trackobot.com";

/// Persistent string → blob store.
///
/// All mutators are called from the pipeline task; implementations only need
/// to be `Sync` so a handle can be shared with spawned HTTP tasks.
pub trait SettingsStore: Send + Sync + 'static {
    fn contains(&self, key: &str) -> Result<bool>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Read a value as UTF-8 text (lossy)
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get(key)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value.as_bytes())
    }
}

/// In-process settings store.
///
/// Used by tests, and as the fallback when the settings database cannot be
/// opened: the pipeline keeps working, but nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still a consistent map: every write is a single insert/remove
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for MemorySettings {
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.values().contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.values().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// Open the settings database, falling back to memory when that fails.
pub fn open_or_memory(path: &Path, namespace: &str) -> Arc<dyn SettingsStore> {
    match SqliteSettings::open(path, namespace) {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Could not open settings; results will only be kept in memory for this session"
            );
            Arc::new(MemorySettings::new())
        }
    }
}

/// Account credentials issued by the profile service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Stored credentials, if both parts are present and non-empty
    pub fn load<S: SettingsStore + ?Sized>(settings: &S) -> Result<Option<Self>> {
        let username = settings.get_string(keys::USERNAME)?.unwrap_or_default();
        let password = settings.get_string(keys::PASSWORD)?.unwrap_or_default();

        if username.is_empty() || password.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self { username, password }))
    }

    pub fn store<S: SettingsStore + ?Sized>(&self, settings: &S) -> Result<()> {
        settings.set_string(keys::USERNAME, &self.username)?;
        settings.set_string(keys::PASSWORD, &self.password)
    }
}

/// Whether an account has been set up.
///
/// A settings read error counts as "no account".
pub fn is_account_set_up<S: SettingsStore + ?Sized>(settings: &S) -> bool {
    match Credentials::load(settings) {
        Ok(credentials) => credentials.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read account from settings");
            false
        }
    }
}

/// Base URL of the profile service.
///
/// An absent or empty value is replaced by [`DEFAULT_WEBSERVICE_URL`] and
/// written back, so the choice is stable from then on.
pub fn service_url<S: SettingsStore + ?Sized>(settings: &S) -> Result<String> {
    match settings.get_string(keys::WEBSERVICE_URL)? {
        Some(url) if !url.is_empty() => Ok(url),
        _ => {
            settings.set_string(keys::WEBSERVICE_URL, DEFAULT_WEBSERVICE_URL)?;
            Ok(DEFAULT_WEBSERVICE_URL.to_string())
        }
    }
}

pub fn set_service_url<S: SettingsStore + ?Sized>(settings: &S, url: &str) -> Result<()> {
    settings.set_string(keys::WEBSERVICE_URL, url.trim_end_matches('/'))
}
