//! Service clients
//!
//! Entry points for the two remote services: the inventory service (resource
//! collections and automation) and the catalog service (descriptor templates).

use crate::catalog::DescriptorTemplates;
use crate::error::ClientError;
use crate::http::{Auth, HttpTransport};
use crate::resource::{get_resource, OperationProtocol, ResourceClient, ResourceDescriptor};
use std::time::Duration;

/// Client for the inventory service
#[derive(Debug, Clone)]
pub struct InventoryClient {
    transport: HttpTransport,
    protocol: OperationProtocol,
}

impl InventoryClient {
    /// Create a client using `Authorization: Token` when a token is given
    pub fn new(address: &str, token: Option<&str>, timeout: Duration) -> Result<Self, ClientError> {
        let auth = token.map(|t| Auth::Token(t.to_string())).unwrap_or_default();
        Self::from_transport(HttpTransport::new(address, auth, timeout)?)
    }

    pub fn from_transport(transport: HttpTransport) -> Result<Self, ClientError> {
        let protocol = OperationProtocol::from_registry(transport.clone())?;
        Ok(Self {
            transport,
            protocol,
        })
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Shared build/teardown protocol (automation contexts)
    pub fn operations(&self) -> &OperationProtocol {
        &self.protocol
    }

    /// Client for a registered collection, e.g. `virtualization.clusters`
    pub fn resource(&self, key: &str) -> Result<ResourceClient, ClientError> {
        let descriptor = get_resource(key).ok_or_else(|| ClientError::UnknownResource(key.to_string()))?;
        self.with_descriptor(descriptor.clone())
    }

    /// Client for a collection described by the caller
    pub fn with_descriptor(&self, descriptor: ResourceDescriptor) -> Result<ResourceClient, ClientError> {
        Ok(ResourceClient::new(self.transport.clone(), descriptor)?
            .with_operation_protocol(self.protocol.clone()))
    }

    pub fn virtualization(&self) -> VirtualizationGroup<'_> {
        VirtualizationGroup { client: self }
    }

    pub fn automation(&self) -> AutomationGroup<'_> {
        AutomationGroup { client: self }
    }
}

/// Virtualization collections
pub struct VirtualizationGroup<'a> {
    client: &'a InventoryClient,
}

impl VirtualizationGroup<'_> {
    pub fn resource(&self, name: &str) -> Result<ResourceClient, ClientError> {
        self.client.resource(&format!("virtualization.{}", name))
    }

    pub fn cluster_groups(&self) -> Result<ResourceClient, ClientError> {
        self.resource("cluster_groups")
    }

    pub fn cluster_types(&self) -> Result<ResourceClient, ClientError> {
        self.resource("cluster_types")
    }

    pub fn clusters(&self) -> Result<ResourceClient, ClientError> {
        self.resource("clusters")
    }

    pub fn interfaces(&self) -> Result<ResourceClient, ClientError> {
        self.resource("interfaces")
    }

    pub fn virtual_machines(&self) -> Result<ResourceClient, ClientError> {
        self.resource("virtual_machines")
    }

    pub fn cloud_account_types(&self) -> Result<ResourceClient, ClientError> {
        self.resource("cloudaccounttypes")
    }

    pub fn cloud_accounts(&self) -> Result<ResourceClient, ClientError> {
        self.resource("cloudaccounts")
    }

    pub fn azure_subscriptions(&self) -> Result<ResourceClient, ClientError> {
        self.resource("azuresubscriptions")
    }

    pub fn azure_locations(&self) -> Result<ResourceClient, ClientError> {
        self.resource("azurelocations")
    }

    pub fn vpcs(&self) -> Result<ResourceClient, ClientError> {
        self.resource("vpcs")
    }

    pub fn vnets(&self) -> Result<ResourceClient, ClientError> {
        self.resource("vnets")
    }

    pub fn aws_regions(&self) -> Result<ResourceClient, ClientError> {
        self.resource("awsregions")
    }

    pub fn aws_transit_gateways(&self) -> Result<ResourceClient, ClientError> {
        self.resource("awstgws")
    }

    pub fn aws_transit_gateway_peerings(&self) -> Result<ResourceClient, ClientError> {
        self.resource("awstgwpeerings")
    }
}

/// Automation plugin collections
pub struct AutomationGroup<'a> {
    client: &'a InventoryClient,
}

impl AutomationGroup<'_> {
    pub fn automation_contexts(&self) -> Result<ResourceClient, ClientError> {
        self.client.resource(crate::resource::AUTOMATION_CONTEXTS)
    }

    pub fn automation_context_processes(&self) -> Result<ResourceClient, ClientError> {
        self.client
            .resource("plugins.nfvi-automation.automation_context_processes")
    }

    /// Build/teardown with an explicit object type
    pub fn protocol(&self) -> &OperationProtocol {
        self.client.operations()
    }
}

/// Client for the catalog service
#[derive(Debug, Clone)]
pub struct CatalogClient {
    transport: HttpTransport,
}

impl CatalogClient {
    /// Create a client using `Authorization: Bearer` when a token is given
    pub fn new(address: &str, token: Option<&str>, timeout: Duration) -> Result<Self, ClientError> {
        let auth = token.map(|t| Auth::Bearer(t.to_string())).unwrap_or_default();
        Ok(Self {
            transport: HttpTransport::new(address, auth, timeout)?,
        })
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn descriptor_templates(&self) -> Result<DescriptorTemplates, ClientError> {
        DescriptorTemplates::new(self.transport.clone())
    }
}
