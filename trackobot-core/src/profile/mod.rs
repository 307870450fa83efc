//! Track-o-Bot web profile client
//!
//! The profile service keeps the user's match history. Three calls make up
//! the whole contract:
//!
//! | Call | Endpoint | Auth |
//! |------|----------|------|
//! | create account | `POST /users.json` | none |
//! | upload result | `POST /profile/results.json` | Basic |
//! | one-time login link | `POST /one_time_auth.json` | Basic |
//!
//! Every request carries `User-Agent: Track-o-Bot/<VERSION><PLATFORM>`.
//!
//! [`ProfileApi`] is the seam between the queue and the network;
//! [`WebProfile`] is the HTTP implementation.

mod client;
mod tls;

pub use client::WebProfile;
pub use tls::SelfSignedTolerantVerifier;

use std::future::Future;

use serde::Serialize;

use crate::error::Result;
use crate::settings::Credentials;
use crate::stats::Meta;
use crate::types::QueuedResult;

/// Client version reported to the service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platform tag appended to the version
#[cfg(target_os = "macos")]
pub const PLATFORM: &str = "Mac";
#[cfg(target_os = "windows")]
pub const PLATFORM: &str = "Win";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const PLATFORM: &str = "Linux";

/// `Track-o-Bot/<VERSION><PLATFORM>`
pub fn user_agent() -> String {
    format!("Track-o-Bot/{}{}", VERSION, PLATFORM)
}

/// Acknowledgement of an uploaded result
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    /// Id the service assigned to the result (always positive)
    pub id: i64,
    /// Full reply body
    pub response: serde_json::Value,
}

impl UploadReceipt {
    /// Parse a reply of the form `{"result": {"id": <int>, ...}}`.
    ///
    /// A missing, zero or negative id means the service did not store the
    /// result, which is reported like any other upload failure (code 0).
    pub fn from_response(response: serde_json::Value) -> Result<Self> {
        let id = response
            .get("result")
            .and_then(|result| result.get("id"))
            .and_then(|id| id.as_i64())
            .filter(|id| *id > 0)
            .ok_or_else(|| crate::error::Error::malformed_reply("response without id received"))?;

        Ok(Self { id, response })
    }
}

/// Request body for POST /profile/results.json
#[derive(Debug, Serialize)]
pub struct UploadRequest<'a> {
    pub result: &'a QueuedResult,
    #[serde(rename = "_meta")]
    pub meta: &'a Meta,
}

/// Operations the pipeline needs from the profile service.
///
/// Implementations never touch the settings store for writes; persisting
/// newly created credentials is the caller's job.
pub trait ProfileApi: Send + Sync + 'static {
    /// Register a fresh anonymous account
    fn create_account(&self) -> impl Future<Output = Result<Credentials>> + Send;

    /// Submit one result with the current observer diagnostics
    fn upload_result(
        &self,
        result: &QueuedResult,
        meta: &Meta,
    ) -> impl Future<Output = Result<UploadReceipt>> + Send;

    /// Ask for a one-time login URL for the web profile
    fn one_time_auth(&self) -> impl Future<Output = Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent() {
        let ua = user_agent();
        assert!(ua.starts_with("Track-o-Bot/"));
        assert!(ua.ends_with(PLATFORM));
        assert!(ua.contains(VERSION));
    }

    #[test]
    fn test_receipt_requires_positive_id() {
        let receipt =
            UploadReceipt::from_response(serde_json::json!({"result": {"id": 42, "win": true}}))
                .unwrap();
        assert_eq!(receipt.id, 42);

        for reply in [
            serde_json::json!({"result": {"id": 0}}),
            serde_json::json!({"result": {"id": -3}}),
            serde_json::json!({"result": {}}),
            serde_json::json!({"id": 7}),
            serde_json::json!({"result": {"id": "7"}}),
        ] {
            let err = UploadReceipt::from_response(reply).unwrap_err();
            assert_eq!(err.status_code(), 0);
        }
    }
}
