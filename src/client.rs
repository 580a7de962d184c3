use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ApiError, HexError, Result};

pub(crate) const DEFAULT_BASE_URL: &str = "https://app.hex.tech/api";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Ceiling for any single retry wait, including server `Retry-After` hints.
const MAX_BACKOFF: Duration = Duration::from_secs(32);

const API_KEY_ENV: &str = "HEX_API_KEY";
const BASE_URL_ENV: &str = "HEX_API_BASE_URL";

/// Configures how a [`Client`] connects and retries.
///
/// # Example
///
/// ```no_run
/// use hex_toolkit::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> hex_toolkit::Result<()> {
/// let client = ClientBuilder::new()
///     .api_key("hxtw_abc123")
///     .base_url("https://hex.example.com/api")
///     .max_retries(5)
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    max_retries: u32,
    max_backoff: Duration,
    timeout: Duration,
    verify_ssl: bool,
}

impl ClientBuilder {
    /// Defaults: 3 retries, 30s timeout, TLS verification on.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            max_retries: DEFAULT_MAX_RETRIES,
            max_backoff: MAX_BACKOFF,
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: true,
        }
    }

    /// Bearer token sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the base URL (defaults to `https://app.hex.tech/api`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the maximum number of retries for transient errors (defaults to 3).
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Longest wait between two attempts (defaults to 32 seconds). A larger
    /// `Retry-After` from the server is clamped to this.
    pub fn max_backoff(mut self, d: Duration) -> Self {
        self.max_backoff = d;
        self
    }

    /// Set the HTTP request timeout (defaults to 30 seconds).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Disable TLS certificate verification. Only for self-hosted test instances.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Build the [`Client`].
    ///
    /// Unset values fall back to the `HEX_API_KEY` and `HEX_API_BASE_URL`
    /// environment variables, then to the defaults.
    ///
    /// Returns [`HexError::Config`] if no usable API key is available or the
    /// base URL is not an http(s) URL.
    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                HexError::Config(format!(
                    "API key is required. Pass it to ClientBuilder::api_key() \
                     or set the {API_KEY_ENV} environment variable."
                ))
            })?;

        let base_url =
            normalize_base_url(self.base_url.or_else(|| std::env::var(BASE_URL_ENV).ok()))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| HexError::Config("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .build()
            .map_err(HexError::Http)?;

        Ok(Client {
            base_url,
            auth,
            http,
            max_retries: self.max_retries,
            max_backoff: self.max_backoff,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim, default when blank, strip the trailing slash.
fn normalize_base_url(raw: Option<String>) -> Result<String> {
    let url = raw
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(HexError::Config(format!(
            "base URL must start with http:// or https://, got: {url}"
        )));
    }
    Ok(url)
}

/// The Hex API client.
///
/// Resource operations live in the `projects`, `runs` and `embedding`
/// modules as further `impl Client` blocks.
///
/// # Example
///
/// ```no_run
/// use hex_toolkit::{Client, PollOptions, PollOutcome, RunProjectRequest};
///
/// # async fn example() -> hex_toolkit::Result<()> {
/// let client = Client::new("hxtw_abc123")?;
///
/// let run = client.run_project("5a8591dd-4039-49df", &RunProjectRequest::default()).await?;
/// match client.wait_for_run(&run.project_id, &run.run_id, PollOptions::default()).await? {
///     PollOutcome::Finished(status) => println!("run ended: {}", status.status),
///     PollOutcome::Cancelled { .. } => println!("stopped waiting"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    auth: HeaderValue,
    http: reqwest::Client,
    max_retries: u32,
    max_backoff: Duration,
}

impl Client {
    /// Client for the default endpoint, authenticated with `api_key`.
    ///
    /// Use [`ClientBuilder`] to change anything else.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().api_key(api_key).build()
    }

    /// The normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Request plumbing shared by the resource modules
    // -----------------------------------------------------------------------

    /// Send a request and deserialize a JSON success body.
    pub(crate) async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.send(method, path, query, body).await?;
        response.json().await.map_err(HexError::Http)
    }

    /// Send one logical request, repeating it on transient failures.
    ///
    /// Retries are performed for:
    /// - HTTP 5xx server errors
    /// - HTTP 429 rate-limit responses (honouring a numeric `Retry-After`)
    /// - Network-level errors (connection refused, timeout, etc.)
    ///
    /// Exponential backoff is applied otherwise: 1s, 2s, 4s, ... Every wait
    /// is capped at `max_backoff`.
    /// Every non-success response is classified into an [`ApiError`].
    pub(crate) async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut last_err: Option<HexError> = None;
        let mut retry_hint: Option<u64> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = retry_delay(attempt, retry_hint.take(), self.max_backoff);
                tracing::debug!(path, attempt, ?backoff, "backing off");
                tokio::time::sleep(backoff).await;
            }

            tracing::debug!(%method, path, attempt, "sending request");

            let mut req = self
                .http
                .request(method.clone(), &url)
                .header(AUTHORIZATION, self.auth.clone());
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(b) = body {
                req = req.json(b);
            }

            let response = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(path, attempt, error = %e, "request failed, will retry");
                    last_err = Some(HexError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let status_code = status.as_u16();
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            let err = ApiError::from_response_text(status_code, &text, Some(&headers));

            if !err.is_transient() {
                return Err(err.into());
            }

            if let ApiError::RateLimit {
                retry_after: Some(secs),
                ..
            } = &err
            {
                retry_hint = Some(*secs);
            }
            tracing::warn!(path, attempt, status = status_code, "transient API error");
            last_err = Some(err.into());
        }

        // Out of attempts.
        Err(last_err.unwrap_or_else(|| {
            HexError::Config("request failed after all retries".into())
        }))
    }
}

/// Wait before retry number `attempt` (1-based): the server's hint when it
/// sent one, else `2^(attempt-1)` seconds, never more than `cap`.
fn retry_delay(attempt: u32, hint_secs: Option<u64>, cap: Duration) -> Duration {
    let wait = match hint_secs {
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_secs(1 << attempt.saturating_sub(1).min(5)),
    };
    wait.min(cap)
}
