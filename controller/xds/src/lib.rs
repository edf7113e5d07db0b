#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod cds;
pub mod cluster;
pub mod lds;
pub mod listener;
pub mod rds;
pub mod resource;
pub mod route;

#[cfg(test)]
mod test_util;

use std::fmt;

use mesh_controller_core::ProxyCredential;
use serde::Serialize;

/// Suffix appended to a destination's cluster name to form the local copy
/// of the cluster that accepts its inbound traffic. Part of the wire
/// contract with the proxy.
pub const LOCAL_CLUSTER_SUFFIX: &str = "-local";

/// Discriminates the discovery resource families a proxy may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Cluster,
    Route,
    Listener,
}

/// A marshaled wire resource tagged with its schema type URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

/// The envelope returned to the transport collaborator: the resource-type
/// discriminator and the ordered, opaque resources of one response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryResponse {
    pub type_url: ResourceType,
    pub resources: Vec<Any>,
}

/// A proxy that has presented a discovery request, known only by its
/// connection credential until the catalog resolves it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proxy {
    credential: ProxyCredential,
}

/// Failure of one discovery response. Every variant is fatal to the whole
/// response; no partial resource list is ever returned and nothing is
/// retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("failed to resolve proxy identity")]
    IdentityResolution(#[source] anyhow::Error),

    #[error("catalog lookup failed")]
    CatalogLookup(#[source] anyhow::Error),

    #[error("failed to marshal {kind} resource")]
    Marshal {
        kind: ResourceType,
        #[source]
        source: serde_json::Error,
    },
}

// === impl ResourceType ===

impl ResourceType {
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::Cluster => "type.googleapis.com/envoy.config.cluster.v3.Cluster",
            Self::Route => "type.googleapis.com/envoy.config.route.v3.RouteConfiguration",
            Self::Listener => "type.googleapis.com/envoy.config.listener.v3.Listener",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => "cluster".fmt(f),
            Self::Route => "route".fmt(f),
            Self::Listener => "listener".fmt(f),
        }
    }
}

// === impl Proxy ===

impl Proxy {
    pub fn new(credential: impl Into<ProxyCredential>) -> Self {
        Self {
            credential: credential.into(),
        }
    }

    pub fn credential(&self) -> &ProxyCredential {
        &self.credential
    }
}

/// Marshals a synthesized resource into the opaque envelope entry for
/// `kind`.
pub(crate) fn marshal_any<T: Serialize>(kind: ResourceType, resource: &T) -> Result<Any, ResponseError> {
    let value = serde_json::to_vec(resource)
        .map_err(|source| ResponseError::Marshal { kind, source })?;
    Ok(Any {
        type_url: kind.type_url().to_string(),
        value,
    })
}
