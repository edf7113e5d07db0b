//! Builds the proxy cluster resources: a local cluster per hosted service,
//! a remote cluster per allowed outbound destination, and the fixed
//! egress/metrics/tracing clusters.

use mesh_controller_core::{Configurator, ServiceRef};

use crate::resource::{
    CircuitBreakers, Cluster, ClusterLoadAssignment, ConfigSource, DiscoveryType,
    EdsClusterConfig, LbPolicy, Thresholds, TransportSocket,
};
use crate::LOCAL_CLUSTER_SUFFIX;

/// Pass-through cluster carrying traffic that leaves the mesh.
pub const PASSTHROUGH_CLUSTER_NAME: &str = "passthrough-outbound";

/// Cluster exposing the proxy's metrics endpoint for scraping.
pub const METRICS_CLUSTER_NAME: &str = "envoy-metrics-cluster";

/// Cluster carrying spans to the tracing collector.
pub const TRACING_CLUSTER_NAME: &str = "envoy-tracing-cluster";

const LOCALHOST: &str = "127.0.0.1";

/// Admin port the metrics cluster scrapes.
pub const PROXY_ADMIN_PORT: u16 = 15000;

/// Well-known port the workload's application listens on locally.
pub const LOCAL_APP_PORT: u16 = 8080;

const CONNECT_TIMEOUT_MS: u64 = 1_000;

// Backpressure thresholds applied uniformly to upstream clusters when the
// feature is enabled.
const BACKPRESSURE_MAX_CONNECTIONS: u32 = 1_024;
const BACKPRESSURE_MAX_REQUESTS: u32 = 1_024;

/// The name of the local copy of a service's cluster, which accepts its
/// inbound traffic.
pub fn local_cluster_name(service: &ServiceRef) -> String {
    format!("{service}{LOCAL_CLUSTER_SUFFIX}")
}

/// Builds the remote cluster for an allowed outbound destination. The
/// upstream credential is attributed to `local_service`.
///
/// Known limitation: callers pass the first service in the proxy's own
/// service list as `local_service` regardless of which service actually
/// initiates the call, so multi-service identities mis-attribute the
/// upstream credential. Single-service identities are unaffected.
pub fn upstream_service_cluster(
    destination: &ServiceRef,
    local_service: &ServiceRef,
    cfg: &dyn Configurator,
) -> Cluster {
    Cluster {
        name: destination.cluster_name().to_string(),
        alt_stat_name: None,
        r#type: DiscoveryType::Eds,
        lb_policy: LbPolicy::RoundRobin,
        connect_timeout_ms: CONNECT_TIMEOUT_MS,
        eds_cluster_config: Some(EdsClusterConfig {
            eds_config: ConfigSource::default(),
        }),
        load_assignment: None,
        transport_socket: Some(TransportSocket::upstream(local_service.to_string())),
        circuit_breakers: cfg.backpressure_enabled().then(|| CircuitBreakers {
            thresholds: vec![Thresholds {
                max_connections: BACKPRESSURE_MAX_CONNECTIONS,
                max_requests: BACKPRESSURE_MAX_REQUESTS,
            }],
        }),
    }
}

/// Builds the local cluster accepting inbound traffic for a service the
/// proxy hosts.
pub fn local_service_cluster(service: &ServiceRef) -> Cluster {
    let name = local_cluster_name(service);
    Cluster {
        alt_stat_name: None,
        r#type: DiscoveryType::Static,
        lb_policy: LbPolicy::RoundRobin,
        connect_timeout_ms: CONNECT_TIMEOUT_MS,
        eds_cluster_config: None,
        load_assignment: Some(ClusterLoadAssignment::single_endpoint(
            name.clone(),
            LOCALHOST,
            LOCAL_APP_PORT,
        )),
        transport_socket: None,
        circuit_breakers: None,
        name,
    }
}

/// Builds the fixed pass-through cluster for egress traffic.
pub fn outbound_passthrough_cluster() -> Cluster {
    Cluster {
        name: PASSTHROUGH_CLUSTER_NAME.to_string(),
        alt_stat_name: None,
        r#type: DiscoveryType::OriginalDst,
        lb_policy: LbPolicy::ClusterProvided,
        connect_timeout_ms: CONNECT_TIMEOUT_MS,
        eds_cluster_config: None,
        load_assignment: None,
        transport_socket: None,
        circuit_breakers: None,
    }
}

/// Builds the fixed cluster exposing the proxy's metrics endpoint.
pub fn prometheus_cluster() -> Cluster {
    Cluster {
        name: METRICS_CLUSTER_NAME.to_string(),
        alt_stat_name: Some(METRICS_CLUSTER_NAME.to_string()),
        r#type: DiscoveryType::Static,
        lb_policy: LbPolicy::RoundRobin,
        connect_timeout_ms: CONNECT_TIMEOUT_MS,
        eds_cluster_config: None,
        load_assignment: Some(ClusterLoadAssignment::single_endpoint(
            METRICS_CLUSTER_NAME,
            LOCALHOST,
            PROXY_ADMIN_PORT,
        )),
        transport_socket: None,
        circuit_breakers: None,
    }
}

/// Builds the fixed cluster for the tracing collector configured in `cfg`.
pub fn tracing_cluster(cfg: &dyn Configurator) -> Cluster {
    Cluster {
        name: TRACING_CLUSTER_NAME.to_string(),
        alt_stat_name: Some(TRACING_CLUSTER_NAME.to_string()),
        r#type: DiscoveryType::Static,
        lb_policy: LbPolicy::RoundRobin,
        connect_timeout_ms: CONNECT_TIMEOUT_MS,
        eds_cluster_config: None,
        load_assignment: Some(ClusterLoadAssignment::single_endpoint(
            TRACING_CLUSTER_NAME,
            cfg.tracing_address(),
            cfg.tracing_port(),
        )),
        transport_socket: None,
        circuit_breakers: None,
    }
}
