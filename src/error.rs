//! Client errors
//!
//! Every violation of a response contract surfaces as a [`ClientError`].
//! Nothing in this crate retries; the caller decides what is recoverable.

use thiserror::Error;

/// Maximum length of a response body kept in an error (to avoid leaking sensitive data)
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Errors raised by resource, automation and catalog clients
#[derive(Debug, Error)]
pub enum ClientError {
    /// Direct get of a single record returned 404
    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    /// A lookup on a supposedly unique field matched more than one record
    #[error("Too many matches on {field}: {value} ({count} results)")]
    AmbiguousMatch {
        field: String,
        value: String,
        count: u64,
    },

    /// An accepted async action came back without the header carrying its handle
    #[error("Response from {url} is missing the expected '{header}' header")]
    MissingExpectedHeader { header: &'static str, url: String },

    /// Non-2xx response from the remote service
    #[error("Request to {url} failed with status {status}: {body}")]
    RemoteError {
        status: u16,
        url: String,
        body: String,
    },

    /// Response body does not decode into the expected structure
    #[error("Malformed response from {url}: {detail}")]
    MalformedResponse { url: String, detail: String },

    /// Operation not declared for this resource type
    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: String,
        operation: &'static str,
    },

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Caller input cannot be turned into a request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// Build a remote error, keeping only a sanitized snippet of the body
    pub fn remote(status: u16, url: impl Into<String>, body: &str) -> Self {
        Self::RemoteError {
            status,
            url: url.into(),
            body: sanitize_body(body),
        }
    }

    pub fn malformed(url: impl Into<String>, detail: impl ToString) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            detail: detail.to_string(),
        }
    }

    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteError { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Sanitize a response body for logging or error context
/// Truncates long bodies and strips control characters
pub fn sanitize_body(body: &str) -> String {
    let truncated = if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Format a client error for display on a terminal
pub fn format_client_error(error: &ClientError) -> String {
    match error {
        ClientError::RemoteError { status: 401, .. } => {
            "Authentication failed. Check the configured token.".to_string()
        }
        ClientError::RemoteError { status: 403, .. } => {
            "Permission denied for this resource.".to_string()
        }
        ClientError::RemoteError { status: 409, .. } => {
            "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        ClientError::RemoteError { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ClientError::RemoteError { status, .. } if *status >= 500 => {
            "Service temporarily unavailable. Please try again.".to_string()
        }
        ClientError::RemoteError { status, body, .. } => {
            format!("Request rejected ({status}): {body}")
        }
        ClientError::Transport(e) if e.is_timeout() => "Request timed out.".to_string(),
        ClientError::Transport(e) if e.is_connect() => {
            "Could not connect. Check the configured address.".to_string()
        }
        other => other.to_string(),
    }
}
