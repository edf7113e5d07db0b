use anyhow::Result;

use crate::{
    identity::{ProxyCredential, ServiceIdentity, ServiceRef},
    trafficpolicy::{InboundTrafficPolicy, OutboundTrafficPolicy},
};

/// Models the mesh catalog: the upstream-refreshed view of services,
/// identities, and merged traffic policies that response synthesis reads.
///
/// Lookups are synchronous; implementations serve from already-resident
/// data and never block on network I/O. Implementations own the merge path
/// for their policy collections and must serialize it (see
/// [`crate::trafficpolicy::merge_inbound_policies`]); once a policy
/// snapshot is handed out here it is treated as immutable.
pub trait MeshCatalog: Send + Sync {
    /// Maps a proxy's connection credential to its mesh identity.
    fn resolve_identity(&self, credential: &ProxyCredential) -> Result<ServiceIdentity>;

    /// The services hosted by workloads with the given identity.
    fn services_for(&self, identity: &ServiceIdentity) -> Result<Vec<ServiceRef>>;

    /// The destination services the given identity may call.
    fn allowed_outbound_destinations(&self, identity: &ServiceIdentity)
        -> Result<Vec<ServiceRef>>;

    /// The merged inbound and outbound traffic policies for the given
    /// identity.
    fn traffic_policies_for(
        &self,
        identity: &ServiceIdentity,
    ) -> Result<(Vec<InboundTrafficPolicy>, Vec<OutboundTrafficPolicy>)>;
}
