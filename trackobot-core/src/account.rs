//! Account lifecycle
//!
//! A first run registers an anonymous account with the profile service and
//! stores the issued credentials. The web profile is reached through a
//! one-time login link. Nothing in here touches the result queue, so shell
//! commands can use it while another process owns the backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::profile::ProfileApi;
use crate::settings::{self, Credentials, SettingsStore};

pub struct Account<S: SettingsStore + ?Sized, A: ProfileApi> {
    settings: Arc<S>,
    api: Arc<A>,
    registering: Arc<AtomicBool>,
}

impl<S: SettingsStore + ?Sized, A: ProfileApi> Clone for Account<S, A> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            api: Arc::clone(&self.api),
            registering: Arc::clone(&self.registering),
        }
    }
}

impl<S: SettingsStore + ?Sized, A: ProfileApi> Account<S, A> {
    pub fn new(settings: Arc<S>, api: Arc<A>) -> Self {
        Self {
            settings,
            api,
            registering: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether both username and password are stored
    pub fn is_set_up(&self) -> bool {
        settings::is_account_set_up(&*self.settings)
    }

    pub fn credentials(&self) -> Result<Option<Credentials>> {
        Credentials::load(&*self.settings)
    }

    /// Claim the right to register an account.
    ///
    /// Returns `None` while another registration is still outstanding. The
    /// claim is released when the returned guard is dropped.
    pub fn begin_registration(&self) -> Option<Registration> {
        if self.registering.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Registration {
            registering: Arc::clone(&self.registering),
        })
    }

    /// Register a new account and store its credentials.
    ///
    /// Nothing is stored when the service call fails.
    pub async fn register(&self) -> Result<Credentials> {
        let credentials = self.api.create_account().await?;
        credentials.store(&*self.settings)?;
        tracing::info!(username = %credentials.username, "Account created");
        Ok(credentials)
    }

    /// One-time login link for the web profile
    pub async fn profile_url(&self) -> Result<String> {
        self.api.one_time_auth().await
    }
}

/// An outstanding registration; see [`Account::begin_registration`]
#[derive(Debug)]
pub struct Registration {
    registering: Arc<AtomicBool>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registering.store(false, Ordering::Release);
    }
}
