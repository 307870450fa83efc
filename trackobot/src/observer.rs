//! Observer input
//!
//! The observer (the part that watches the game) writes one JSON object per
//! line:
//!
//! ```text
//! {"type": "result", "mode": "ranked", "outcome": "victory", "order": "first", "hero": "mage", "opponent": "warrior", "card_history": []}
//! {"type": "screen", "width": 1920, "height": 1080}
//! ```

use std::io::BufRead;

use anyhow::{Context, Result};
use serde::Deserialize;
use trackobot_core::{MatchResult, PipelineHandle};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObserverMessage {
    /// A finished game
    Result(MatchResult),
    /// The game window was resized
    Screen { width: u32, height: u32 },
}

/// Parse one line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<ObserverMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let message = serde_json::from_str(line).context("invalid observer message")?;
    Ok(Some(message))
}

/// Forward observer messages to the pipeline until the input ends.
///
/// Lines that do not parse are logged and skipped. Returns the number of
/// messages forwarded.
pub fn forward<R: BufRead>(reader: R, pipeline: &PipelineHandle) -> Result<usize> {
    let mut forwarded = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read observer input")?;
        let message = match parse_line(&line) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %format!("{:#}", e), "Skipping observer line");
                continue;
            }
        };

        let sent = match message {
            ObserverMessage::Result(result) => pipeline.submit(result),
            ObserverMessage::Screen { width, height } => pipeline.set_screen_size(width, height),
        };
        if sent.is_err() {
            tracing::debug!("Pipeline stopped, no longer reading observer input");
            break;
        }
        forwarded += 1;
    }

    tracing::info!(forwarded, "Observer input ended");
    Ok(forwarded)
}
