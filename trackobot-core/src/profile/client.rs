//! HTTP client for the Track-o-Bot profile service

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::settings::{self, Credentials, SettingsStore};
use crate::stats::Meta;
use crate::types::QueuedResult;

use super::{tls, user_agent, ProfileApi, UploadReceipt, UploadRequest};

/// Response from POST /one_time_auth.json
#[derive(Debug, Deserialize)]
struct OneTimeAuthResponse {
    url: String,
}

/// HTTP client for the profile service.
///
/// The base URL and credentials are read from the settings store on every
/// request, so a `set-url` or a freshly created account takes effect without
/// rebuilding the client.
pub struct WebProfile<S: ?Sized> {
    settings: Arc<S>,
    http_client: reqwest::Client,
}

impl<S: SettingsStore + ?Sized> WebProfile<S> {
    /// Create a new profile client
    ///
    /// Fails only if the HTTP client itself cannot be built.
    pub fn new(settings: Arc<S>, config: &ServiceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&user_agent())
                .map_err(|e| Error::Config(format!("invalid user agent: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .use_preconfigured_tls(tls::client_config()?)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    fn url(&self, path: &str) -> Result<String> {
        let base = settings::service_url(&*self.settings)?;
        Ok(format!("{}{}", base.trim_end_matches('/'), path))
    }

    /// POST with Basic auth and a JSON content type
    fn auth_post(&self, url: &str) -> reqwest::RequestBuilder {
        // Without an account the service rejects the request, which is
        // reported like any other failure.
        let credentials = match Credentials::load(&*self.settings) {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read credentials");
                None
            }
        }
        .unwrap_or_else(|| Credentials {
            username: String::new(),
            password: String::new(),
        });

        self.http_client
            .post(url)
            .basic_auth(credentials.username, Some(credentials.password))
            .header(CONTENT_TYPE, "application/json")
    }

    /// Turn a non-success status into [`Error::Service`], passing success through
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        Err(Error::Service {
            status: status.as_u16(),
            message: error_text,
        })
    }

    async fn parse_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| Error::malformed_reply(format!("failed to parse response: {}", e)))
    }
}

impl<S: SettingsStore + ?Sized> ProfileApi for WebProfile<S> {
    async fn create_account(&self) -> Result<Credentials> {
        let url = self.url("/users.json")?;

        let response = self.http_client.post(&url).send().await?;
        let response = Self::check_status(response).await?;
        let credentials: Credentials = Self::parse_json(response).await?;

        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(Error::malformed_reply("account reply without credentials"));
        }
        Ok(credentials)
    }

    async fn upload_result(&self, result: &QueuedResult, meta: &Meta) -> Result<UploadReceipt> {
        let url = self.url("/profile/results.json")?;
        let body = serde_json::to_vec(&UploadRequest { result, meta })?;

        let response = self.auth_post(&url).body(body).send().await?;
        let response = Self::check_status(response).await?;
        let reply: serde_json::Value = Self::parse_json(response).await?;

        UploadReceipt::from_response(reply)
    }

    async fn one_time_auth(&self) -> Result<String> {
        let url = self.url("/one_time_auth.json")?;

        let response = self.auth_post(&url).send().await?;
        let response = Self::check_status(response).await?;
        let reply: OneTimeAuthResponse = Self::parse_json(response).await?;

        Ok(reply.url)
    }
}
