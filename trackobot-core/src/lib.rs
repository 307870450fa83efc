//! # trackobot-core
//!
//! Core library for trackobot - uploads Hearthstone match results to a
//! Track-o-Bot web profile.
//!
//! This library provides:
//! - Domain types for match results and their wire form
//! - A persistent settings store (SQLite)
//! - The profile service HTTP client
//! - A durable, paced upload queue
//! - The pipeline tying them together
//! - Account registration and the web profile link
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Results flow in one direction:
//! - **Observer:** reports a [`MatchResult`] per finished game
//! - **Pipeline:** fixes up turn order, counts missing fields, drops what cannot be uploaded
//! - **Queue:** holds [`QueuedResult`]s until the service acknowledges them, surviving restarts
//! - **Profile client:** POSTs results with Basic auth
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trackobot_core::{settings, Config, Pipeline, PipelineOptions, WebProfile};
//!
//! # async fn example() -> trackobot_core::Result<()> {
//! let config = Config::load()?;
//! let settings = settings::open_or_memory(&Config::settings_path(), &config.settings.namespace);
//! let api = Arc::new(WebProfile::new(Arc::clone(&settings), &config.service)?);
//!
//! let (pipeline, mut events) = Pipeline::new(settings, api, PipelineOptions::from_config(&config));
//! pipeline.ensure_account_is_set_up();
//! let (handle, task) = pipeline.spawn();
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use account::Account;
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineEvent, PipelineHandle, PipelineOptions, Submission};
pub use profile::{ProfileApi, WebProfile};
pub use queue::{QueueOptions, ResultQueue};
pub use settings::{Credentials, SettingsStore, SqliteSettings};
pub use types::*;

// Public modules
pub mod account;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod profile;
pub mod queue;
pub mod settings;
pub mod stats;
pub mod types;

#[cfg(test)]
mod testing;
