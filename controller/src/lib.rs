#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

//! The control-plane core of the mesh configuration controller: resolves a
//! proxy's identity, reads the catalog's merged policy snapshot, and
//! synthesizes the proxy's cluster, route, and listener resources.
//!
//! The Kubernetes watch machinery, certificate issuance, and the discovery
//! transport are external collaborators behind the [`MeshCatalog`] and
//! [`Configurator`] traits and the [`DiscoveryResponse`] envelope.

use std::sync::Arc;

pub use mesh_controller_core::{
    trafficpolicy, Configurator, MeshCatalog, MeshConfig, ProxyCredential, ServiceIdentity,
    ServiceRef,
};
pub use mesh_controller_xds as xds;
pub use mesh_controller_xds::{DiscoveryResponse, Proxy, ResourceType, ResponseError};

use tracing::info;

/// The discovery entry point handed to the transport collaborator: one
/// response builder per resource type, dispatched on the request's
/// discriminator.
///
/// Requests from distinct proxies may be served in parallel; synthesis is
/// stateless over the catalog's published snapshot.
#[derive(Clone)]
pub struct Controller {
    catalog: Arc<dyn MeshCatalog>,
    config: Arc<dyn Configurator>,
}

// === impl Controller ===

impl Controller {
    pub fn new(catalog: Arc<dyn MeshCatalog>, config: Arc<dyn Configurator>) -> Self {
        Self { catalog, config }
    }

    /// Synthesizes one discovery response for `proxy`. All-or-nothing: any
    /// identity, catalog, or marshaling failure yields an error and no
    /// resources; retry policy belongs to the transport.
    pub fn build_response(
        &self,
        proxy: &Proxy,
        resource_type: ResourceType,
    ) -> Result<DiscoveryResponse, ResponseError> {
        let response = match resource_type {
            ResourceType::Cluster => {
                xds::cds::build_response(&*self.catalog, &*self.config, proxy)?
            }
            ResourceType::Route => xds::rds::build_response(&*self.catalog, proxy)?,
            ResourceType::Listener => {
                xds::lds::build_response(&*self.catalog, &*self.config, proxy)?
            }
        };
        info!(
            credential = %proxy.credential(),
            %resource_type,
            resources = response.resources.len(),
            "synthesized discovery response"
        );
        Ok(response)
    }
}
