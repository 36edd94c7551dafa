//! HTTP transport for REST calls
//!
//! One request in, one response out. No retries and no redirect following:
//! a `Location` header on an accepted action must reach the caller untouched.

use super::response::RawResponse;
use crate::error::ClientError;
use reqwest::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, Client, Method};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication scheme sent with every request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    None,
    /// `Authorization: Token <token>`
    Token(String),
    /// `Authorization: Bearer <token>`
    Bearer(String),
}

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text {
        content_type: &'static str,
        text: String,
    },
}

/// A single REST request, before it is resolved against the base address
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL, or a path relative to the transport's base address
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(HeaderName, String)>,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_query<K: ToString, V: ToString>(mut self, pairs: &[(K, V)]) -> Self {
        self.query
            .extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_text(mut self, content_type: &'static str, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text {
            content_type,
            text: text.into(),
        });
        self
    }
}

/// HTTP client wrapper bound to one service address
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    auth: Auth,
}

impl HttpTransport {
    /// Create a transport for the service at `address`
    pub fn new(address: &str, auth: Auth, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("infractl/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        // Url::join drops the last path segment unless the base ends with '/'
        let normalized = if address.ends_with('/') {
            address.to_string()
        } else {
            format!("{}/", address)
        };
        let base = Url::parse(&normalized).map_err(|source| ClientError::InvalidUrl {
            url: address.to_string(),
            source,
        })?;

        Ok(Self { client, base, auth })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve an absolute URL or a base-relative path
    pub fn resolve(&self, url: &str) -> Result<Url, ClientError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(url.trim_start_matches('/'))
                .map_err(|source| ClientError::InvalidUrl {
                    url: url.to_string(),
                    source,
                }),
            Err(source) => Err(ClientError::InvalidUrl {
                url: url.to_string(),
                source,
            }),
        }
    }

    /// Send a request and read the full response
    ///
    /// Non-2xx statuses are returned as-is; interpreting them is up to the caller.
    pub async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let url = self.resolve(&request.url)?;
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method, url.clone());

        builder = match &self.auth {
            Auth::None => builder,
            Auth::Token(token) => builder.header(AUTHORIZATION, format!("Token {}", token)),
            Auth::Bearer(token) => builder.bearer_auth(token),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Text { content_type, text }) => {
                builder.header(CONTENT_TYPE, content_type).body(text)
            }
            None => builder,
        };

        let response = builder.send().await?;

        let status = response.status();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse::new(status, final_url, headers, body))
    }
}

/// Append path segments to a URL, ignoring a trailing empty segment on the base
///
/// Segments are percent-encoded individually, so identifiers cannot escape their slot.
pub fn extend_url(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidRequest(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
