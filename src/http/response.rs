//! Response interpretation
//!
//! Strict decode steps from a raw HTTP response into the shapes the
//! clients expect. Shape mismatches fail fast with `MalformedResponse`.

use crate::error::{sanitize_body, ClientError};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Fully read HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, url: String, headers: HeaderMap, body: String) -> Self {
        Self {
            status,
            url,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn any non-2xx status into a `RemoteError`
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            return Ok(self);
        }
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!(
            "API error: {} {} - {}",
            self.status,
            self.url,
            sanitize_body(&self.body)
        );
        Err(ClientError::remote(self.status.as_u16(), self.url, &self.body))
    }

    /// Header value as text, if present and printable
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decode a JSON body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        if self.body.trim().is_empty() {
            return Err(ClientError::malformed(&self.url, "empty response body"));
        }
        serde_json::from_str(&self.body)
            .map_err(|e| ClientError::malformed(&self.url, format!("invalid JSON: {}", e)))
    }

    /// Decode a YAML body (YAML is a superset of JSON, so JSON bodies decode too)
    pub fn yaml<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_yaml::from_str(&self.body)
            .map_err(|e| ClientError::malformed(&self.url, format!("invalid YAML: {}", e)))
    }
}

/// Read the `Location` header from a successful response
///
/// An absent header is `MissingExpectedHeader`; one that is not visible ASCII is
/// `MalformedResponse`.
pub fn read_location_header(response: RawResponse) -> Result<String, ClientError> {
    let response = response.error_for_status()?;
    let location = match response.headers.get(LOCATION) {
        Some(value) => value.to_str().map(str::to_string).map_err(|_| {
            ClientError::malformed(&response.url, "Location header is not visible ASCII")
        })?,
        None => {
            tracing::warn!("{} {} carried no Location header", response.status, response.url);
            return Err(ClientError::MissingExpectedHeader {
                header: "Location",
                url: response.url,
            });
        }
    };
    Ok(location)
}

/// Read a successful response body as JSON
pub fn read_body_as_json<T: DeserializeOwned>(response: RawResponse) -> Result<T, ClientError> {
    response.error_for_status()?.json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::Value;

    fn response(status: u16, headers: &[(&'static str, &str)], body: &str) -> RawResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        RawResponse::new(
            StatusCode::from_u16(status).unwrap(),
            "http://sp/api/x/".to_string(),
            map,
            body.to_string(),
        )
    }

    #[test]
    fn test_location_is_returned_verbatim() {
        let r = response(202, &[("location", "/api/jobs/99")], "");
        assert_eq!(read_location_header(r).unwrap(), "/api/jobs/99");
    }

    #[test]
    fn test_missing_location_is_an_error() {
        let r = response(201, &[], "{}");
        let err = read_location_header(r).unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingExpectedHeader { header: "Location", .. }
        ));
    }

    #[test]
    fn test_unreadable_location_is_malformed() {
        let mut r = response(202, &[], "");
        r.headers.insert(
            LOCATION,
            HeaderValue::from_bytes(b"/api/jobs/\xff").unwrap(),
        );
        assert!(matches!(
            read_location_header(r).unwrap_err(),
            ClientError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_error_status_wins_over_location() {
        let r = response(400, &[("location", "/api/jobs/1")], "bad object_pk");
        match read_location_header(r).unwrap_err() {
            ClientError::RemoteError { status, body, .. } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad object_pk");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_body_must_parse() {
        let r = response(200, &[], "{\"steps\": []}");
        let v: Value = read_body_as_json(r).unwrap();
        assert_eq!(v["steps"], Value::Array(vec![]));

        let r = response(200, &[], "not json");
        assert!(matches!(
            read_body_as_json::<Value>(r).unwrap_err(),
            ClientError::MalformedResponse { .. }
        ));

        let r = response(200, &[], "  ");
        assert!(matches!(
            read_body_as_json::<Value>(r).unwrap_err(),
            ClientError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_yaml_body_decodes_to_json_value() {
        let r = response(200, &[], "name: result::1.0\n");
        let v: Value = r.yaml().unwrap();
        assert_eq!(v, serde_json::json!({"name": "result::1.0"}));
    }
}
