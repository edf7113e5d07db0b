//! Serde mirrors of the proxy's wire-configuration schema. The schema
//! itself is an external, fixed contract; these types exist so synthesized
//! resources can be marshaled into the opaque discovery envelope.

use serde::Serialize;

// --- routes ---

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteConfiguration {
    pub name: String,
    pub validate_clusters: bool,
    pub virtual_hosts: Vec<VirtualHost>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    pub routes: Vec<Route>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Route {
    pub r#match: RouteMatch,
    pub route: RouteAction,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteMatch {
    pub safe_regex: RegexMatcher,
    pub headers: Vec<HeaderMatcher>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RegexMatcher {
    pub regex: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HeaderMatcher {
    pub name: String,
    pub safe_regex_match: RegexMatcher,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteAction {
    pub weighted_clusters: WeightedClusters,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WeightedClusters {
    pub clusters: Vec<ClusterWeight>,
    pub total_weight: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ClusterWeight {
    pub name: String,
    pub weight: u32,
}

// --- clusters ---

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cluster {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_stat_name: Option<String>,
    pub r#type: DiscoveryType,
    pub lb_policy: LbPolicy,
    pub connect_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eds_cluster_config: Option<EdsClusterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_assignment: Option<ClusterLoadAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_socket: Option<TransportSocket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breakers: Option<CircuitBreakers>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryType {
    Eds,
    Static,
    OriginalDst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LbPolicy {
    RoundRobin,
    ClusterProvided,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EdsClusterConfig {
    pub eds_config: ConfigSource,
}

/// Resources referenced by name are resolved over the aggregated discovery
/// stream, never inlined.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    pub ads: Ads,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Ads {}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClusterLoadAssignment {
    pub cluster_name: String,
    pub endpoints: Vec<LocalityLbEndpoints>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LocalityLbEndpoints {
    pub lb_endpoints: Vec<LbEndpoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LbEndpoint {
    pub address: Address,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Address {
    pub socket_address: SocketAddress,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SocketAddress {
    pub address: String,
    pub port_value: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CircuitBreakers {
    pub thresholds: Vec<Thresholds>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Thresholds {
    pub max_connections: u32,
    pub max_requests: u32,
}

/// Transport-level credential material carried by a filter chain or an
/// upstream cluster.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransportSocket {
    pub name: String,
    pub certificate_name: String,
    pub require_client_certificate: bool,
}

// --- listeners ---

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listener {
    pub name: String,
    pub address: Address,
    pub filter_chains: Vec<FilterChain>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FilterChain {
    pub filters: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_socket: Option<TransportSocket>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filter {
    pub name: String,
    pub typed_config: HttpConnectionManager,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HttpConnectionManager {
    pub stat_prefix: String,
    pub rds: Rds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracing: Option<HcmTracing>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rds {
    pub route_config_name: String,
    pub config_source: ConfigSource,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HcmTracing {
    pub collector_cluster: String,
    pub collector_endpoint: String,
}

// === impl Address ===

impl Address {
    /// A socket address binding, e.g. `0.0.0.0:15001`.
    pub fn socket(address: impl Into<String>, port_value: u16) -> Self {
        Self {
            socket_address: SocketAddress {
                address: address.into(),
                port_value,
            },
        }
    }
}

// === impl ClusterLoadAssignment ===

impl ClusterLoadAssignment {
    /// A single-endpoint assignment in one locality.
    pub fn single_endpoint(
        cluster_name: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            endpoints: vec![LocalityLbEndpoints {
                lb_endpoints: vec![LbEndpoint {
                    address: Address::socket(address, port),
                }],
            }],
        }
    }
}

// === impl TransportSocket ===

pub(crate) const TLS_TRANSPORT_SOCKET: &str = "tls";

impl TransportSocket {
    /// Credential material presented to downstream peers: the inbound
    /// listener authenticates itself and requires client certificates.
    pub fn downstream(certificate_name: impl Into<String>) -> Self {
        Self {
            name: TLS_TRANSPORT_SOCKET.to_string(),
            certificate_name: certificate_name.into(),
            require_client_certificate: true,
        }
    }

    /// Credential material presented to an upstream destination.
    pub fn upstream(certificate_name: impl Into<String>) -> Self {
        Self {
            name: TLS_TRANSPORT_SOCKET.to_string(),
            certificate_name: certificate_name.into(),
            require_client_certificate: false,
        }
    }
}
