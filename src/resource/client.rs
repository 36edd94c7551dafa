//! Generic resource client
//!
//! One client per collection, configured by a [`ResourceDescriptor`]. Records
//! are normalized on the way out and on the way in; nothing is cached.

use super::automation::{Automation, DryRunPreview, OperationHandle, OperationProtocol};
use super::lookup::{select_unique, ListEnvelope};
use super::record::{normalize_record, record_id, require_id, Direction, Record};
use super::registry::{Operation, ResourceDescriptor};
use crate::error::ClientError;
use crate::http::{extend_url, ApiRequest, HttpTransport, RawResponse};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

/// One page of a list query
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Record>,
}

/// CRUD, lookups and automation against one REST collection
#[derive(Debug, Clone)]
pub struct ResourceClient {
    transport: HttpTransport,
    descriptor: ResourceDescriptor,
    collection_url: Url,
    protocol: Option<OperationProtocol>,
}

impl ResourceClient {
    pub fn new(transport: HttpTransport, descriptor: ResourceDescriptor) -> Result<Self, ClientError> {
        let collection_url = transport.resolve(&descriptor.api_path())?;
        Ok(Self {
            transport,
            descriptor,
            collection_url,
            protocol: None,
        })
    }

    /// Use this protocol for shared build/teardown instead of the registry default
    pub fn with_operation_protocol(mut self, protocol: OperationProtocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Collection URL, without trailing slash
    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn list_url(&self) -> Result<Url, ClientError> {
        extend_url(&self.collection_url, &[""])
    }

    fn item_url(&self, id: &str) -> Result<Url, ClientError> {
        let id = require_id(id, &self.descriptor.display_name)?;
        extend_url(&self.collection_url, &[id, ""])
    }

    /// `{collection}/{id}/{action}/`
    pub(crate) fn item_action_url(&self, id: &str, action: &str) -> Result<Url, ClientError> {
        let id = require_id(id, &self.descriptor.display_name)?;
        extend_url(&self.collection_url, &[id, action, ""])
    }

    fn ensure(&self, operation: Operation) -> Result<(), ClientError> {
        if self.descriptor.supports(operation) {
            Ok(())
        } else {
            Err(ClientError::Unsupported {
                resource: self.descriptor.display_name.clone(),
                operation: operation.as_str(),
            })
        }
    }

    fn outbound(&self, record: Record) -> Value {
        Value::Object(normalize_record(
            record,
            &self.descriptor.relation_fields,
            Direction::Outbound,
        ))
    }

    fn inbound(&self, value: Value, url: &str) -> Result<Record, ClientError> {
        match value {
            Value::Object(record) => Ok(normalize_record(
                record,
                &self.descriptor.relation_fields,
                Direction::Inbound,
            )),
            other => Err(ClientError::malformed(
                url,
                format!("expected a record, got {}", json_kind(&other)),
            )),
        }
    }

    /// GET `{collection}/{id}/`
    pub async fn get(&self, id: &str) -> Result<Record, ClientError> {
        self.ensure(Operation::Get)?;
        let url = self.item_url(id)?;
        let response = self.transport.send(ApiRequest::get(url.as_str())).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                resource: self.descriptor.display_name.clone(),
                id: id.to_string(),
            });
        }
        let response = response.error_for_status()?;
        self.inbound(response.json()?, &response.url)
    }

    /// GET `{collection}/?{filters}`, one page only
    pub async fn list_page(&self, filters: &[(&str, &str)]) -> Result<Page, ClientError> {
        self.ensure(Operation::List)?;
        let envelope = self.query(filters).await?;
        let url = self.collection_url.as_str();
        let results = envelope
            .results
            .into_iter()
            .map(|item| self.inbound(item, url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            count: envelope.count,
            next: envelope.next,
            previous: envelope.previous,
            results,
        })
    }

    /// Records of the first page matching `filters`
    pub async fn list(&self, filters: &[(&str, &str)]) -> Result<Vec<Record>, ClientError> {
        Ok(self.list_page(filters).await?.results)
    }

    async fn query(&self, filters: &[(&str, &str)]) -> Result<ListEnvelope, ClientError> {
        let url = self.list_url()?;
        let response = self
            .transport
            .send(ApiRequest::get(url.as_str()).with_query(filters))
            .await?
            .error_for_status()?;
        response.json()
    }

    /// POST `{collection}/`
    pub async fn create(&self, record: Record) -> Result<Record, ClientError> {
        self.ensure(Operation::Create)?;
        let url = self.list_url()?;
        let response = self
            .transport
            .send(ApiRequest::post(url.as_str()).with_json(self.outbound(record)))
            .await?
            .error_for_status()?;
        self.inbound(response.json()?, &response.url)
    }

    /// PATCH `{collection}/{id}/`, the id taken from the record
    pub async fn update(&self, record: Record) -> Result<Record, ClientError> {
        self.ensure(Operation::Update)?;
        let id = record_id(&record).ok_or_else(|| {
            ClientError::InvalidRequest(format!(
                "{} record has no 'id' to update",
                self.descriptor.display_name
            ))
        })?;
        let url = self.item_url(&id)?;
        let response = self
            .transport
            .send(ApiRequest::new(Method::PATCH, url.as_str()).with_json(self.outbound(record)))
            .await?
            .error_for_status()?;
        self.inbound(response.json()?, &response.url)
    }

    /// DELETE `{collection}/{id}/`
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.ensure(Operation::Delete)?;
        let url = self.item_url(id)?;
        self.transport
            .send(ApiRequest::new(Method::DELETE, url.as_str()))
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Raw HTTP call for non-CRUD endpoints
    ///
    /// The response is returned whatever its status.
    pub async fn make_direct_http_call(
        &self,
        method: Method,
        override_url: &str,
        data: Option<Value>,
    ) -> Result<RawResponse, ClientError> {
        let mut request = ApiRequest::new(method, override_url);
        if let Some(data) = data {
            request = request.with_json(data);
        }
        self.transport.send(request).await
    }

    /// Exact-match lookup on a unique field: zero or one record, never more
    pub async fn find_unique(&self, field: &str, value: &str) -> Result<Option<Record>, ClientError> {
        self.ensure(Operation::List)?;
        if !self.descriptor.unique_lookups.iter().any(|f| f == field) {
            tracing::debug!(
                "{} is not a declared unique lookup on {}",
                field,
                self.descriptor.endpoint
            );
        }
        let envelope = self.query(&[(field, value)]).await?;
        let url = self.collection_url.as_str();
        select_unique(envelope, field, value, url)?
            .map(|item| self.inbound(item, url))
            .transpose()
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Record>, ClientError> {
        self.find_unique("name", name).await
    }

    /// Every record matching a named filter (first page)
    pub async fn filter_by(&self, alias: &str, value: &str) -> Result<Vec<Record>, ClientError> {
        let param = self.descriptor.filter_param(alias);
        self.list(&[(param, value)]).await
    }

    /// Build/teardown capability of this resource
    pub fn automation(&self) -> Result<Automation<'_>, ClientError> {
        Automation::resolve(self, self.protocol.as_ref())
    }

    pub async fn build(&self, id: &str) -> Result<OperationHandle, ClientError> {
        self.automation()?.build(id).await
    }

    pub async fn build_dry_run(&self, id: &str) -> Result<DryRunPreview, ClientError> {
        self.automation()?.build_dry_run(id).await
    }

    pub async fn teardown(&self, id: &str) -> Result<OperationHandle, ClientError> {
        self.automation()?.teardown(id).await
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
