//! Build / dry-run / teardown protocol
//!
//! A POST asks the service to materialize or destroy infrastructure for one
//! object. Accepted requests answer with a `Location` header pointing at the
//! server-side operation; dry runs answer synchronously with a preview body.
//! Nothing here polls: the handle goes straight back to the caller.

use super::client::ResourceClient;
use super::record::require_id;
use super::registry::{get_resource, AutomationStyle, ResourceDescriptor, AUTOMATION_CONTEXTS};
use crate::error::ClientError;
use crate::http::{
    extend_url, read_body_as_json, read_location_header, ApiRequest, HttpTransport, RawResponse,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;

/// Opaque status URL of an accepted build or teardown
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for OperationHandle {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// What a build would do, returned instead of a handle on dry runs
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunPreview(Value);

impl DryRunPreview {
    pub fn document(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Result of a build request
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Accepted(OperationHandle),
    Preview(DryRunPreview),
}

#[derive(Debug, Serialize)]
struct ActionPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    object_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    object_pk: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
}

impl ActionPayload<'_> {
    fn to_value(&self) -> Value {
        // A struct of strings and bools always serializes
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Interpret a build response: preview body on dry runs, Location header otherwise
pub fn interpret_build(response: RawResponse, dry_run: bool) -> Result<BuildOutcome, ClientError> {
    if dry_run {
        read_body_as_json(response).map(|v| BuildOutcome::Preview(DryRunPreview(v)))
    } else {
        read_location_header(response).map(|l| BuildOutcome::Accepted(OperationHandle(l)))
    }
}

/// Interpret a teardown response; there is no dry-run variant
pub fn interpret_teardown(response: RawResponse) -> Result<OperationHandle, ClientError> {
    read_location_header(response).map(OperationHandle)
}

fn expect_handle(outcome: BuildOutcome, url: &str) -> Result<OperationHandle, ClientError> {
    match outcome {
        BuildOutcome::Accepted(handle) => Ok(handle),
        BuildOutcome::Preview(_) => Err(ClientError::malformed(url, "expected an operation handle")),
    }
}

fn expect_preview(outcome: BuildOutcome, url: &str) -> Result<DryRunPreview, ClientError> {
    match outcome {
        BuildOutcome::Preview(preview) => Ok(preview),
        BuildOutcome::Accepted(_) => Err(ClientError::malformed(url, "expected a dry-run preview")),
    }
}

/// Shared build/teardown endpoint on the automation-contexts collection
///
/// Every resource declaring shared automation delegates here with its own
/// object type token.
#[derive(Debug, Clone)]
pub struct OperationProtocol {
    transport: HttpTransport,
    contexts_url: Url,
}

impl OperationProtocol {
    pub fn new(transport: HttpTransport, contexts: &ResourceDescriptor) -> Result<Self, ClientError> {
        let contexts_url = transport.resolve(&contexts.api_path())?;
        Ok(Self {
            transport,
            contexts_url,
        })
    }

    /// Protocol bound to the registered automation-contexts collection
    pub fn from_registry(transport: HttpTransport) -> Result<Self, ClientError> {
        let contexts = get_resource(AUTOMATION_CONTEXTS)
            .ok_or_else(|| ClientError::UnknownResource(AUTOMATION_CONTEXTS.to_string()))?;
        Self::new(transport, contexts)
    }

    fn action_url(&self, action: &str) -> Result<Url, ClientError> {
        extend_url(&self.contexts_url, &[action, ""])
    }

    /// POST `{contexts}/build/` with `{object_type, object_pk, dry_run}`
    pub async fn request_build(
        &self,
        object_type: &str,
        object_pk: &str,
        dry_run: bool,
    ) -> Result<BuildOutcome, ClientError> {
        let object_pk = require_id(object_pk, object_type)?;
        let url = self.action_url("build")?;
        let payload = ActionPayload {
            object_type: Some(object_type),
            object_pk: Some(object_pk),
            dry_run: Some(dry_run),
        };
        let response = self
            .transport
            .send(ApiRequest::post(url.as_str()).with_json(payload.to_value()))
            .await?;
        let outcome = interpret_build(response, dry_run)?;
        if let BuildOutcome::Accepted(handle) = &outcome {
            tracing::info!("Build of {} {} accepted: {}", object_type, object_pk, handle);
        }
        Ok(outcome)
    }

    pub async fn build(&self, object_type: &str, object_pk: &str) -> Result<OperationHandle, ClientError> {
        let outcome = self.request_build(object_type, object_pk, false).await?;
        expect_handle(outcome, self.contexts_url.as_str())
    }

    pub async fn build_dry_run(&self, object_type: &str, object_pk: &str) -> Result<DryRunPreview, ClientError> {
        let outcome = self.request_build(object_type, object_pk, true).await?;
        expect_preview(outcome, self.contexts_url.as_str())
    }

    /// POST `{contexts}/teardown/` with `{object_type, object_pk}`
    pub async fn teardown(&self, object_type: &str, object_pk: &str) -> Result<OperationHandle, ClientError> {
        let object_pk = require_id(object_pk, object_type)?;
        let url = self.action_url("teardown")?;
        let payload = ActionPayload {
            object_type: Some(object_type),
            object_pk: Some(object_pk),
            dry_run: None,
        };
        let response = self
            .transport
            .send(ApiRequest::post(url.as_str()).with_json(payload.to_value()))
            .await?;
        let handle = interpret_teardown(response)?;
        tracing::info!("Teardown of {} {} accepted: {}", object_type, object_pk, handle);
        Ok(handle)
    }
}

/// Build/teardown capability attached to one resource client
#[derive(Debug)]
pub enum Automation<'a> {
    /// Delegates to the shared protocol with the resolved object type
    Shared {
        protocol: OperationProtocol,
        object_type: String,
    },
    /// Posts to the resource's own `{id}/build/` and `{id}/teardown/`
    PerObject { resource: &'a ResourceClient },
}

impl<'a> Automation<'a> {
    /// Resolve the capability declared by a resource
    pub(crate) fn resolve(
        resource: &'a ResourceClient,
        protocol: Option<&OperationProtocol>,
    ) -> Result<Self, ClientError> {
        let descriptor = resource.descriptor();
        match descriptor.automation {
            Some(AutomationStyle::Shared) => {
                let protocol = match protocol {
                    Some(p) => p.clone(),
                    None => OperationProtocol::from_registry(resource.transport().clone())?,
                };
                Ok(Automation::Shared {
                    protocol,
                    object_type: descriptor.object_type().to_string(),
                })
            }
            Some(AutomationStyle::PerObject) => Ok(Automation::PerObject { resource }),
            None => Err(ClientError::Unsupported {
                resource: descriptor.display_name.clone(),
                operation: "build/teardown",
            }),
        }
    }

    /// Object type sent in shared payloads; `None` when implied by the endpoint
    pub fn object_type(&self) -> Option<&str> {
        match self {
            Automation::Shared { object_type, .. } => Some(object_type),
            Automation::PerObject { .. } => None,
        }
    }

    pub async fn request_build(&self, id: &str, dry_run: bool) -> Result<BuildOutcome, ClientError> {
        match self {
            Automation::Shared {
                protocol,
                object_type,
            } => protocol.request_build(object_type, id, dry_run).await,
            Automation::PerObject { resource } => {
                // The per-object endpoint takes an empty body and has no preview mode
                if dry_run {
                    return Err(ClientError::Unsupported {
                        resource: resource.descriptor().display_name.clone(),
                        operation: "build dry run",
                    });
                }
                let url = resource.item_action_url(id, "build")?;
                let response = resource
                    .transport()
                    .send(ApiRequest::post(url.as_str()).with_json(Value::Object(Default::default())))
                    .await?;
                let outcome = interpret_build(response, false)?;
                if let BuildOutcome::Accepted(handle) = &outcome {
                    tracing::info!(
                        "Build of {} {} accepted: {}",
                        resource.descriptor().endpoint,
                        id,
                        handle
                    );
                }
                Ok(outcome)
            }
        }
    }

    pub async fn build(&self, id: &str) -> Result<OperationHandle, ClientError> {
        let outcome = self.request_build(id, false).await?;
        expect_handle(outcome, id)
    }

    pub async fn build_dry_run(&self, id: &str) -> Result<DryRunPreview, ClientError> {
        let outcome = self.request_build(id, true).await?;
        expect_preview(outcome, id)
    }

    pub async fn teardown(&self, id: &str) -> Result<OperationHandle, ClientError> {
        match self {
            Automation::Shared {
                protocol,
                object_type,
            } => protocol.teardown(object_type, id).await,
            Automation::PerObject { resource } => {
                let url = resource.item_action_url(id, "teardown")?;
                let response = resource
                    .transport()
                    .send(ApiRequest::post(url.as_str()).with_json(Value::Object(Default::default())))
                    .await?;
                let handle = interpret_teardown(response)?;
                tracing::info!(
                    "Teardown of {} {} accepted: {}",
                    resource.descriptor().endpoint,
                    id,
                    handle
                );
                Ok(handle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;
    use serde_json::json;

    fn response(status: u16, location: Option<&str>, body: &str) -> RawResponse {
        let mut headers = HeaderMap::new();
        if let Some(l) = location {
            headers.insert("location", HeaderValue::from_str(l).unwrap());
        }
        RawResponse::new(
            StatusCode::from_u16(status).unwrap(),
            "http://sp/api/plugins/nfvi-automation/automation-contexts/build/".to_string(),
            headers,
            body.to_string(),
        )
    }

    #[test]
    fn test_dry_run_returns_body_not_location() {
        let r = response(200, Some("/api/jobs/1"), r#"{"actions": ["create vm"]}"#);
        let outcome = interpret_build(r, true).unwrap();
        assert_eq!(
            outcome,
            BuildOutcome::Preview(DryRunPreview(json!({"actions": ["create vm"]})))
        );
    }

    #[test]
    fn test_build_returns_location() {
        let r = response(201, Some("/api/jobs/99"), "");
        match interpret_build(r, false).unwrap() {
            BuildOutcome::Accepted(handle) => assert_eq!(handle, "/api/jobs/99"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_teardown_without_location_fails() {
        let r = response(202, None, "");
        assert!(matches!(
            interpret_teardown(r).unwrap_err(),
            ClientError::MissingExpectedHeader { .. }
        ));
    }

    #[test]
    fn test_payload_omits_unset_fields() {
        let shared = ActionPayload {
            object_type: Some("virtualization.cluster"),
            object_pk: Some("42"),
            dry_run: Some(false),
        };
        assert_eq!(
            shared.to_value(),
            json!({"object_type": "virtualization.cluster", "object_pk": "42", "dry_run": false})
        );

        let teardown = ActionPayload {
            object_type: Some("virtualization.cluster"),
            object_pk: Some("42"),
            dry_run: None,
        };
        assert_eq!(
            teardown.to_value(),
            json!({"object_type": "virtualization.cluster", "object_pk": "42"})
        );
    }
}
