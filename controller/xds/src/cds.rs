//! Assembles the cluster discovery response for one proxy.

use ahash::AHashMap as HashMap;
use mesh_controller_core::{Configurator, MeshCatalog};
use tracing::{debug, error};

use crate::cluster::{
    local_service_cluster, outbound_passthrough_cluster, prometheus_cluster, tracing_cluster,
    upstream_service_cluster,
};
use crate::resource::Cluster;
use crate::{marshal_any, DiscoveryResponse, Proxy, ResourceType, ResponseError};

/// Builds the cluster set for the proxy: one remote cluster per allowed
/// outbound destination, one local cluster per hosted service, plus the
/// fixed clusters the configuration enables. Any lookup or marshal failure
/// aborts the whole response.
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

    let services = catalog
        .services_for(&identity)
        .map_err(ResponseError::CatalogLookup)?;
    let destinations = catalog
        .allowed_outbound_destinations(&identity)
        .map_err(ResponseError::CatalogLookup)?;

    // Clusters must be unique; key on the compiled cluster name so the
    // first build of a destination wins.
    let mut clusters: HashMap<String, Cluster> = HashMap::new();

    for destination in &destinations {
        // The proxy may host several services, but upstream credentials are
        // attributed to the first one regardless of which service initiates
        // the call. Known mis-attribution for multi-service identities;
        // preserved behavior, pinned by a test below.
        let Some(local_service) = services.first() else {
            continue;
        };
        let cluster = upstream_service_cluster(destination, local_service, cfg);
        if clusters.contains_key(&cluster.name) {
            continue;
        }
        clusters.insert(cluster.name.clone(), cluster);
    }

    for service in &services {
        let cluster = local_service_cluster(service);
        clusters.insert(cluster.name.clone(), cluster);
    }

    if cfg.egress_enabled() {
        let cluster = outbound_passthrough_cluster();
        clusters.insert(cluster.name.clone(), cluster);
    }

    let mut clusters: Vec<Cluster> = clusters.into_iter().map(|(_, cluster)| cluster).collect();
    clusters.sort_by(|a, b| a.name.cmp(&b.name));

    if cfg.prometheus_scraping_enabled() {
        clusters.push(prometheus_cluster());
    }
    if cfg.tracing_enabled() {
        clusters.push(tracing_cluster(cfg));
    }

    debug!(%identity, clusters = clusters.len(), "synthesized cluster configuration");

    let resources = clusters
        .iter()
        .map(|cluster| marshal_any(ResourceType::Cluster, cluster))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DiscoveryResponse {
        type_url: ResourceType::Cluster,
        resources,
    })
}
