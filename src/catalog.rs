//! Descriptor templates on the catalog service
//!
//! Templates travel as YAML; responses are accepted as YAML or JSON.

use crate::error::ClientError;
use crate::http::{extend_url, ApiRequest, HttpTransport};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde_json::Value;
use url::Url;

const TEMPLATES_ENDPOINT: &str = "api/catalog/descriptorTemplates";
const YAML: &str = "application/yaml";
const YAML_OR_JSON: &str = "application/yaml,application/json";
const TEXT: &str = "text/plain";

/// Descriptor templates collection
#[derive(Debug, Clone)]
pub struct DescriptorTemplates {
    transport: HttpTransport,
    collection_url: Url,
}

impl DescriptorTemplates {
    pub fn new(transport: HttpTransport) -> Result<Self, ClientError> {
        let collection_url = transport.resolve(TEMPLATES_ENDPOINT)?;
        Ok(Self {
            transport,
            collection_url,
        })
    }

    fn template_url(&self, name: &str) -> Result<Url, ClientError> {
        extend_url(&self.collection_url, &[name])
    }

    /// List every template
    pub async fn all(&self) -> Result<Vec<Value>, ClientError> {
        let response = self
            .transport
            .send(ApiRequest::get(self.collection_url.as_str()).with_header(ACCEPT, YAML_OR_JSON))
            .await?
            .error_for_status()?;
        response.yaml()
    }

    pub async fn get(&self, name: &str) -> Result<Value, ClientError> {
        let url = self.template_url(name)?;
        let response = self
            .transport
            .send(ApiRequest::get(url.as_str()).with_header(ACCEPT, YAML_OR_JSON))
            .await?
            .error_for_status()?;
        response.yaml()
    }

    pub async fn create(&self, template: &Value) -> Result<(), ClientError> {
        let body = to_yaml(template)?;
        self.transport
            .send(ApiRequest::post(self.collection_url.as_str()).with_text(YAML, body))
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// PUT the template under its own `name`
    pub async fn update(&self, template: &Value) -> Result<(), ClientError> {
        let name = template
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::InvalidRequest("descriptor template has no 'name'".to_string()))?;
        let url = self.template_url(name)?;
        let body = to_yaml(template)?;
        self.transport
            .send(ApiRequest::new(Method::PUT, url.as_str()).with_text(YAML, body))
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<(), ClientError> {
        let url = self.template_url(name)?;
        self.transport
            .send(ApiRequest::new(Method::DELETE, url.as_str()))
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Render a template into a descriptor document
    pub async fn render(&self, name: &str, render_request: &Value) -> Result<Value, ClientError> {
        let url = extend_url(&self.collection_url, &[name, "render"])?;
        let body = to_yaml(render_request)?;
        let response = self
            .transport
            .send(
                ApiRequest::post(url.as_str())
                    .with_header(ACCEPT, YAML)
                    .with_text(YAML, body),
            )
            .await?
            .error_for_status()?;
        response.yaml()
    }

    /// Render a template and return the service's text verbatim
    pub async fn render_raw(&self, name: &str, render_request: &Value) -> Result<String, ClientError> {
        let url = extend_url(&self.collection_url, &[name, "render-raw"])?;
        let body = to_yaml(render_request)?;
        let response = self
            .transport
            .send(
                ApiRequest::post(url.as_str())
                    .with_header(ACCEPT, TEXT)
                    .with_text(YAML, body),
            )
            .await?
            .error_for_status()?;
        Ok(response.body)
    }
}

fn to_yaml(value: &Value) -> Result<String, ClientError> {
    serde_yaml::to_string(value)
        .map_err(|e| ClientError::InvalidRequest(format!("cannot encode YAML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Auth, DEFAULT_TIMEOUT};
    use serde_json::json;

    #[test]
    fn test_template_urls() {
        let transport = HttpTransport::new("http://kami.example.com", Auth::None, DEFAULT_TIMEOUT).unwrap();
        let templates = DescriptorTemplates::new(transport).unwrap();
        assert_eq!(
            templates.template_url("assembly-template::Test::1.0").unwrap().as_str(),
            "http://kami.example.com/api/catalog/descriptorTemplates/assembly-template::Test::1.0"
        );
    }

    #[test]
    fn test_yaml_encoding() {
        let yaml = to_yaml(&json!({"properties": {"propA": "valueA"}})).unwrap();
        assert_eq!(yaml, "properties:\n  propA: valueA\n");
    }
}
