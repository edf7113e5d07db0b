//! Assembles the listener discovery response for one proxy.

use mesh_controller_core::{Configurator, MeshCatalog};
use tracing::{debug, error};

use crate::listener::{build_inbound_listener, build_outbound_listener};
use crate::{marshal_any, DiscoveryResponse, Proxy, ResourceType, ResponseError};

/// Builds the proxy's two fixed listeners: outbound first, then inbound
/// carrying the proxy's resolved certificate identity.
pub fn build_response(
    catalog: &dyn MeshCatalog,
    cfg: &dyn Configurator,
    proxy: &Proxy,
) -> Result<DiscoveryResponse, ResponseError> {
    let identity = catalog
        .resolve_identity(proxy.credential())
        .map_err(|e| {
            error!(credential = %proxy.credential(), "failed to resolve proxy identity");
            ResponseError::IdentityResolution(e)
        })?;
    debug!(%identity, "building listeners");

    let listeners = [
        build_outbound_listener(cfg),
        build_inbound_listener(cfg, &identity),
    ];

    let resources = listeners
        .iter()
        .map(|listener| marshal_any(ResourceType::Listener, listener))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DiscoveryResponse {
        type_url: ResourceType::Listener,
        resources,
    })
}
