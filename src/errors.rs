use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::{Map, Value};
use thiserror::Error;

/// Diagnostic metadata carried by every classified API error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorDetails {
    pub message: String,
    pub status_code: Option<u16>,
    /// Support correlation id returned by the API as `traceId`.
    pub trace_id: Option<String>,
    /// Parsed response body. Empty when the body was missing or not a JSON object.
    pub response: Map<String, Value>,
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (Status: {code})")?;
        }
        if let Some(ref trace_id) = self.trace_id {
            write!(f, " (Trace ID: {trace_id})")?;
        }
        Ok(())
    }
}

/// One entry of the `invalid` list in a 400/422 response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidParam {
    pub data_type: String,
    pub input_cell_type: String,
    pub param_value: String,
    pub param_name: String,
}

impl InvalidParam {
    /// Missing keys become empty strings; non-string values keep their JSON text.
    fn from_value(val: &Value) -> Self {
        let field = |key: &str| match val.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Self {
            data_type: field("dataType"),
            input_cell_type: field("inputCellType"),
            param_value: field("paramValue"),
            param_name: field("paramName"),
        }
    }
}

/// A failed API call, classified by HTTP status.
///
/// The set of variants is closed: callers can match exhaustively to decide
/// between surfacing the error and backing off.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// HTTP 401 or 403.
    #[error("{0}")]
    Authentication(ErrorDetails),

    /// HTTP 404.
    #[error("{0}")]
    NotFound(ErrorDetails),

    /// HTTP 400 or 422.
    #[error("{details}")]
    Validation {
        details: ErrorDetails,
        invalid_params: Vec<InvalidParam>,
        not_found_params: Vec<String>,
    },

    /// HTTP 429.
    #[error("{details}")]
    RateLimit {
        details: ErrorDetails,
        /// Seconds, from a numeric `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// HTTP 5xx.
    #[error("{0}")]
    Server(ErrorDetails),

    /// Any other non-success status.
    #[error("{0}")]
    Generic(ErrorDetails),
}

impl ApiError {
    pub fn details(&self) -> &ErrorDetails {
        match self {
            ApiError::Authentication(d)
            | ApiError::NotFound(d)
            | ApiError::Server(d)
            | ApiError::Generic(d) => d,
            ApiError::Validation { details, .. } | ApiError::RateLimit { details, .. } => details,
        }
    }

    pub fn message(&self) -> &str {
        &self.details().message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.details().status_code
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.details().trace_id.as_deref()
    }

    /// Rate limits and server errors may succeed if the call is repeated later.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::RateLimit { .. } | ApiError::Server(_))
    }

    /// Classify a raw response body. Text that is not a JSON object is treated
    /// as an empty body.
    pub fn from_response_text(status_code: u16, text: &str, headers: Option<&HeaderMap>) -> Self {
        let body = serde_json::from_str::<Value>(text).unwrap_or(Value::Null);
        classify_error(status_code, &body, headers)
    }
}

const DEFAULT_GENERIC_MESSAGE: &str = "API request failed";

/// Map a non-success HTTP status and its JSON body to exactly one [`ApiError`].
///
/// Pure: identical inputs always produce equal values. `headers` is only
/// consulted for the `Retry-After` hint of a 429.
pub fn classify_error(status_code: u16, body: &Value, headers: Option<&HeaderMap>) -> ApiError {
    let response = body.as_object().cloned().unwrap_or_default();
    let trace_id = response
        .get("traceId")
        .and_then(Value::as_str)
        .map(str::to_string);

    let details = |message: &str| ErrorDetails {
        message: message.to_string(),
        status_code: Some(status_code),
        trace_id: trace_id.clone(),
        response: response.clone(),
    };

    match status_code {
        401 | 403 => ApiError::Authentication(details("Authentication failed")),
        404 => ApiError::NotFound(details("Resource not found")),
        400 | 422 => {
            let invalid_params = response
                .get("invalid")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(InvalidParam::from_value).collect())
                .unwrap_or_default();

            let not_found_params = response
                .get("notFound")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            ApiError::Validation {
                details: details("Validation error"),
                invalid_params,
                not_found_params,
            }
        }
        429 => {
            let retry_after = headers
                .and_then(|h| h.get(RETRY_AFTER))
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());

            ApiError::RateLimit {
                details: details("Rate limit exceeded"),
                retry_after,
            }
        }
        500..=599 => ApiError::Server(details("Server error")),
        _ => {
            let message = response
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_GENERIC_MESSAGE);
            ApiError::Generic(details(message))
        }
    }
}

/// All errors that can occur when using the Hex SDK.
#[derive(Error, Debug)]
pub enum HexError {
    /// The API answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A transport-level HTTP error from reqwest, including response decoding.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The client could not be configured (missing API key, bad base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// A caller-supplied argument was rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Polling exceeded the optional `max_duration` guard.
    #[error("poll timed out after {0:?}")]
    Timeout(Duration),
}

impl HexError {
    /// The classified API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            HexError::Api(e) => Some(e),
            _ => None,
        }
    }
}

/// A convenience alias for `Result<T, HexError>`.
pub type Result<T> = std::result::Result<T, HexError>;
