//! Result submission pipeline
//!
//! Takes match results from the observer, fills in the turn order from the
//! coin when the observer missed it, keeps the observer health counters and
//! hands valid results to the [`ResultQueue`]. Account registration and the
//! profile link go through [`Account`] and report back as events.
//!
//! [`Pipeline::spawn`] runs everything on one task. Shell code talks to it
//! through a [`PipelineHandle`] and listens on the [`PipelineEvent`] receiver
//! returned by [`Pipeline::new`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::account::Account;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::profile::ProfileApi;
use crate::queue::{QueueEvent, QueueOptions, ResultQueue};
use crate::settings::SettingsStore;
use crate::stats::ObserverStats;
use crate::types::{GameMode, MatchResult, QueuedResult, Rejection, TurnOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub queue: QueueOptions,
    /// Track practice games (debug builds only by default)
    pub accept_practice: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            queue: QueueOptions::default(),
            accept_practice: cfg!(debug_assertions),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue: QueueOptions::from(&config.queue),
            ..Self::default()
        }
    }
}

/// Notifications for the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A new account was registered and stored
    AccountCreated,
    /// The service stored a result under this id
    ResultUploaded(i64),
    /// One-time login link for the web profile
    ProfileUrl(String),
}

/// What happened to a submitted result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Queued,
    Dropped(Rejection),
}

/// Requests accepted by [`Pipeline::run`]
#[derive(Debug, Clone)]
pub enum Command {
    Submit(MatchResult),
    ScreenSize { width: u32, height: u32 },
    EnsureAccount,
    OpenProfile,
    Shutdown,
}

pub struct Pipeline<S: SettingsStore + ?Sized, A: ProfileApi> {
    account: Account<S, A>,
    stats: Arc<ObserverStats>,
    queue: ResultQueue<S, A>,
    accept_practice: bool,
    events: mpsc::UnboundedSender<PipelineEvent>,
}

impl<S: SettingsStore + ?Sized, A: ProfileApi> Pipeline<S, A> {
    /// Build a pipeline on top of a settings store and a profile service.
    ///
    /// Results left over from a previous run are loaded right away.
    pub fn new(
        settings: Arc<S>,
        api: Arc<A>,
        options: PipelineOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let stats = Arc::new(ObserverStats::new());
        let queue = ResultQueue::new(
            Arc::clone(&settings),
            Arc::clone(&api),
            Arc::clone(&stats),
            options.queue,
        );
        let (events, events_rx) = mpsc::unbounded_channel();

        let pipeline = Self {
            account: Account::new(settings, api),
            stats,
            queue,
            accept_practice: options.accept_practice,
            events,
        };
        (pipeline, events_rx)
    }

    /// Validate a match result and queue it for upload.
    pub fn submit(&mut self, mut result: MatchResult) -> Submission {
        if result.mode == GameMode::Practice && !self.accept_practice {
            tracing::info!("Ignoring practice game");
            return Submission::Dropped(Rejection::Filtered(GameMode::Practice));
        }

        if result.order == TurnOrder::Unknown {
            if let Some(order) = result.order_from_coin() {
                tracing::info!(order = order.as_str(), "Turn order taken from the coin");
                result.order = order;
            }
        }

        match QueuedResult::try_from(&result) {
            Ok(queued) => {
                // Counted before sending so the upload reports itself
                self.stats.record_success();
                tracing::info!(
                    mode = result.mode.as_str(),
                    outcome = result.outcome.as_str(),
                    hero = result.hero.as_str(),
                    opponent = result.opponent.as_str(),
                    order = result.order.as_str(),
                    "Result recorded"
                );
                self.queue.enqueue(queued);
                Submission::Queued
            }
            Err(rejection) => {
                if let Rejection::Missing(field) = rejection {
                    self.stats.record_missing(field);
                }
                tracing::info!(%rejection, "Result not queued");
                Submission::Dropped(rejection)
            }
        }
    }

    /// Record the game window size reported with each upload
    pub fn set_screen_size(&self, width: u32, height: u32) {
        self.stats.set_screen_size(width, height);
    }

    /// Register an account unless one is already stored.
    ///
    /// Returns the registration task, if one was started. While a
    /// registration is outstanding further calls start nothing. Failures are
    /// only logged; the next call tries again.
    pub fn ensure_account_is_set_up(&self) -> Option<JoinHandle<()>> {
        if let Ok(Some(credentials)) = self.account.credentials() {
            tracing::info!(username = %credentials.username, "Account found");
            return None;
        }
        let Some(registration) = self.account.begin_registration() else {
            tracing::debug!("Account registration already in progress");
            return None;
        };

        tracing::info!("No account set up, creating one");
        let account = self.account.clone();
        let events = self.events.clone();

        Some(tokio::spawn(async move {
            let _registration = registration;
            match account.register().await {
                Ok(_) => {
                    let _ = events.send(PipelineEvent::AccountCreated);
                }
                Err(e) => tracing::error!(
                    status = e.status_code(),
                    error = %e,
                    "There was a problem creating an account"
                ),
            }
        }))
    }

    /// Ask for a one-time login link; it arrives as [`PipelineEvent::ProfileUrl`]
    pub fn open_profile(&self) -> JoinHandle<()> {
        let account = self.account.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            match account.profile_url().await {
                Ok(url) => {
                    let _ = events.send(PipelineEvent::ProfileUrl(url));
                }
                Err(e) => tracing::error!(
                    status = e.status_code(),
                    error = %e,
                    "There was a problem creating an auth token"
                ),
            }
        })
    }

    pub fn queue(&self) -> &ResultQueue<S, A> {
        &self.queue
    }

    pub fn stats(&self) -> &ObserverStats {
        &self.stats
    }

    /// Wait for the queue's next upload outcome or timer tick
    pub async fn next_queue_event(&mut self) -> QueueEvent {
        self.queue.wait().await
    }

    /// Handle an upload outcome or timer tick from the queue
    pub fn handle_queue_event(&mut self, event: QueueEvent) {
        if let Some(id) = self.queue.dispatch(event) {
            let _ = self.events.send(PipelineEvent::ResultUploaded(id));
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit(result) => {
                self.submit(result);
            }
            Command::ScreenSize { width, height } => self.set_screen_size(width, height),
            Command::EnsureAccount => {
                self.ensure_account_is_set_up();
            }
            Command::OpenProfile => {
                self.open_profile();
            }
            Command::Shutdown => {}
        }
    }

    /// Serve commands and queue events until shut down.
    ///
    /// Stops on [`Command::Shutdown`] or when every handle is gone. Pending
    /// results are saved when the pipeline is dropped on the way out.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::info!(pending = self.queue.len(), "Pipeline started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                event = self.next_queue_event() => self.handle_queue_event(event),
            }
        }
        tracing::info!(
            state = self.queue.state().as_str(),
            pending = self.queue.len(),
            in_flight = self.queue.in_flight(),
            "Pipeline stopping"
        );
    }

    /// Run the pipeline on its own task
    pub fn spawn(self) -> (PipelineHandle, JoinHandle<()>) {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(commands_rx));
        (PipelineHandle { commands }, task)
    }
}

/// Cloneable sender side of a spawned [`Pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl PipelineHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Closed)
    }

    pub fn submit(&self, result: MatchResult) -> Result<()> {
        self.send(Command::Submit(result))
    }

    pub fn set_screen_size(&self, width: u32, height: u32) -> Result<()> {
        self.send(Command::ScreenSize { width, height })
    }

    pub fn ensure_account(&self) -> Result<()> {
        self.send(Command::EnsureAccount)
    }

    pub fn open_profile(&self) -> Result<()> {
        self.send(Command::OpenProfile)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }
}
