//! Resource Registry - Load resource descriptors from JSON
//!
//! Every resource collection is described by data, not by a type: its
//! endpoint chain, relation fields, automation object type and the lookups
//! it supports. Definitions are embedded at compile time.

use super::record::RelationField;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/virtualization.json"),
    include_str!("../resources/automation.json"),
];

/// Registry key of the shared automation-contexts collection
pub const AUTOMATION_CONTEXTS: &str = "plugins.nfvi-automation.automation_contexts";

/// CRUD verbs a collection accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Get,
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::List,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::List => "list",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

fn default_operations() -> Vec<Operation> {
    Operation::ALL.to_vec()
}

/// How a resource reaches the build/teardown actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationStyle {
    /// `POST {automation_contexts}/build/` with `{object_type, object_pk, dry_run}`
    Shared,
    /// `POST {collection}/{id}/build/`, object type implied by the endpoint
    PerObject,
}

/// Resource collection descriptor
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDescriptor {
    /// Dotted endpoint chain, e.g. `virtualization.clusters` (the registry key)
    #[serde(skip)]
    pub endpoint: String,
    pub display_name: String,
    #[serde(default)]
    pub relation_fields: Vec<RelationField>,
    /// Object type token for shared automation; see [`ResourceDescriptor::object_type`]
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub automation: Option<AutomationStyle>,
    /// Fields supporting exact unique lookup
    #[serde(default)]
    pub unique_lookups: Vec<String>,
    /// Multi-result lookups: alias -> query parameter
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default = "default_operations")]
    pub operations: Vec<Operation>,
}

impl ResourceDescriptor {
    /// Descriptor for a plain CRUD collection
    pub fn new(endpoint: &str, display_name: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            display_name: display_name.to_string(),
            relation_fields: Vec::new(),
            object_type: None,
            automation: None,
            unique_lookups: Vec::new(),
            filters: BTreeMap::new(),
            operations: default_operations(),
        }
    }

    pub fn with_relation_fields(mut self, fields: Vec<RelationField>) -> Self {
        self.relation_fields = fields;
        self
    }

    pub fn with_object_type(mut self, object_type: &str) -> Self {
        self.object_type = Some(object_type.to_string());
        self
    }

    pub fn with_automation(mut self, style: AutomationStyle) -> Self {
        self.automation = Some(style);
        self
    }

    pub fn with_operations(mut self, operations: &[Operation]) -> Self {
        self.operations = operations.to_vec();
        self
    }

    pub fn with_filter(mut self, alias: &str, param: &str) -> Self {
        self.filters.insert(alias.to_string(), param.to_string());
        self
    }

    /// Object type sent in shared build/teardown payloads
    ///
    /// Falls back to the endpoint chain when no explicit token is declared.
    pub fn object_type(&self) -> &str {
        self.object_type.as_deref().unwrap_or(&self.endpoint)
    }

    /// REST path of the collection, without trailing slash
    ///
    /// `virtualization.cluster_groups` -> `api/virtualization/cluster-groups`
    pub fn api_path(&self) -> String {
        let mut segments: Vec<String> = self.endpoint.split('.').map(str::to_string).collect();
        if let Some(last) = segments.last_mut() {
            *last = last.replace('_', "-");
        }
        format!("api/{}", segments.join("/"))
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.operations.contains(&operation)
    }

    /// Query parameter behind a filter alias (the alias itself when undeclared)
    pub fn filter_param<'a>(&'a self, alias: &'a str) -> &'a str {
        self.filters.get(alias).map(String::as_str).unwrap_or(alias)
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDescriptor>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        for (key, descriptor) in final_config.resources.iter_mut() {
            descriptor.endpoint = key.clone();
        }

        final_config
    })
}

/// Get a resource descriptor by endpoint chain
pub fn get_resource(key: &str) -> Option<&'static ResourceDescriptor> {
    get_registry().resources.get(key)
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resources"
        );
    }

    #[test]
    fn test_endpoint_is_filled_from_key() {
        for key in get_all_resource_keys() {
            assert_eq!(get_resource(key).unwrap().endpoint, key);
        }
    }

    #[test]
    fn test_clusters_resource_exists() {
        let resource = get_resource("virtualization.clusters").expect("clusters should exist");
        assert_eq!(resource.display_name, "Clusters");
        assert_eq!(resource.object_type(), "virtualization.cluster");
        assert_eq!(resource.automation, Some(AutomationStyle::Shared));
        let names: Vec<&str> = resource
            .relation_fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["type", "group", "tenant", "site"]);
    }

    #[test]
    fn test_object_type_defaults_to_endpoint() {
        let vpcs = get_resource("virtualization.vpcs").unwrap();
        assert!(vpcs.object_type.is_none());
        assert_eq!(vpcs.object_type(), "virtualization.vpcs");

        let custom = ResourceDescriptor::new("dcim.sites", "Sites");
        assert_eq!(custom.object_type(), "dcim.sites");
        assert_eq!(custom.with_object_type("dcim.site").object_type(), "dcim.site");
    }

    #[test]
    fn test_api_path_derivation() {
        let d = ResourceDescriptor::new("virtualization.cluster_groups", "Cluster Groups");
        assert_eq!(d.api_path(), "api/virtualization/cluster-groups");

        let d = get_resource(AUTOMATION_CONTEXTS).unwrap();
        assert_eq!(d.api_path(), "api/plugins/nfvi-automation/automation-contexts");
    }

    #[test]
    fn test_process_collection_is_read_and_delete_only() {
        let d = get_resource("plugins.nfvi-automation.automation_context_processes").unwrap();
        assert!(d.supports(Operation::Get));
        assert!(d.supports(Operation::List));
        assert!(d.supports(Operation::Delete));
        assert!(!d.supports(Operation::Create));
        assert!(!d.supports(Operation::Update));
    }

    #[test]
    fn test_filter_aliases() {
        let vpcs = get_resource("virtualization.vpcs").unwrap();
        assert_eq!(vpcs.filter_param("cloud_provider_id"), "cloud_account_id");
        assert_eq!(vpcs.filter_param("status"), "status");
    }

    #[test]
    fn test_get_all_resource_keys_sorted() {
        let keys = get_all_resource_keys();
        assert!(keys.contains(&"virtualization.virtual_machines"));
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }
}
