//! List envelopes and lookup-by-field disambiguation

use crate::error::ClientError;
use serde::Deserialize;
use serde_json::Value;

/// `{count, next, previous, results}` envelope returned by list endpoints
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListEnvelope {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Value>,
}

/// Resolve a unique-field query result to zero or one record
///
/// More than one match is never silently narrowed down.
pub fn select_unique(
    envelope: ListEnvelope,
    field: &str,
    value: &str,
    url: &str,
) -> Result<Option<Value>, ClientError> {
    match envelope.count {
        0 => Ok(None),
        1 => envelope
            .results
            .into_iter()
            .next()
            .map(Some)
            .ok_or_else(|| ClientError::malformed(url, "count is 1 but results is empty")),
        count => {
            tracing::warn!("{} matches on {}={} at {}", count, field, value, url);
            Err(ClientError::AmbiguousMatch {
                field: field.to_string(),
                value: value.to_string(),
                count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: Value) -> ListEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let e = envelope(json!({"count": 0, "results": []}));
        assert_eq!(select_unique(e, "name", "x", "u").unwrap(), None);
    }

    #[test]
    fn test_single_match_is_returned() {
        let e = envelope(json!({"count": 1, "results": [{"id": 1, "name": "x"}]}));
        assert_eq!(
            select_unique(e, "name", "x", "u").unwrap(),
            Some(json!({"id": 1, "name": "x"}))
        );
    }

    #[test]
    fn test_multiple_matches_are_ambiguous() {
        let e = envelope(json!({"count": 2, "results": [{"id": 1}, {"id": 2}]}));
        match select_unique(e, "regionid", "eu-west-1", "u").unwrap_err() {
            ClientError::AmbiguousMatch {
                field,
                value,
                count,
            } => {
                assert_eq!(field, "regionid");
                assert_eq!(value, "eu-west-1");
                assert_eq!(count, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_count_without_results_is_malformed() {
        let e = envelope(json!({"count": 1, "results": []}));
        assert!(matches!(
            select_unique(e, "name", "x", "u").unwrap_err(),
            ClientError::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_envelope_requires_count_and_results() {
        assert!(serde_json::from_value::<ListEnvelope>(json!({"results": []})).is_err());
        assert!(serde_json::from_value::<ListEnvelope>(json!({"count": 0})).is_err());
        assert!(serde_json::from_value::<ListEnvelope>(json!([{"id": 1}])).is_err());
    }
}
