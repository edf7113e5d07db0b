//! Builds the two fixed proxy listeners. All routing granularity lives in
//! the route and cluster layers, so the listener count stays constant
//! regardless of mesh size.

use mesh_controller_core::{Configurator, ServiceIdentity};

use crate::cluster::TRACING_CLUSTER_NAME;
use crate::resource::{
    Address, Filter, FilterChain, HcmTracing, HttpConnectionManager, Listener, Rds,
    TransportSocket,
};
use crate::route::{INBOUND_ROUTE_CONFIG_NAME, OUTBOUND_ROUTE_CONFIG_NAME};

pub const OUTBOUND_LISTENER_NAME: &str = "outbound_listener";
pub const INBOUND_LISTENER_NAME: &str = "inbound_listener";

pub const WILDCARD_IP_ADDR: &str = "0.0.0.0";
pub const OUTBOUND_LISTENER_PORT: u16 = 15001;
pub const INBOUND_LISTENER_PORT: u16 = 15003;

const HTTP_CONNECTION_MANAGER: &str = "http_connection_manager";

/// The listener for traffic the workload originates.
pub fn build_outbound_listener(cfg: &dyn Configurator) -> Listener {
    Listener {
        name: OUTBOUND_LISTENER_NAME.to_string(),
        address: Address::socket(WILDCARD_IP_ADDR, OUTBOUND_LISTENER_PORT),
        filter_chains: vec![FilterChain {
            filters: vec![http_connection_manager_filter(
                OUTBOUND_ROUTE_CONFIG_NAME,
                cfg,
            )],
            transport_socket: None,
        }],
    }
}

/// The listener for traffic addressed to the workload. Its filter chain
/// carries the proxy's own certificate identity so downstream peers can
/// authenticate it.
pub fn build_inbound_listener(cfg: &dyn Configurator, identity: &ServiceIdentity) -> Listener {
    Listener {
        name: INBOUND_LISTENER_NAME.to_string(),
        address: Address::socket(WILDCARD_IP_ADDR, INBOUND_LISTENER_PORT),
        filter_chains: vec![FilterChain {
            filters: vec![http_connection_manager_filter(
                INBOUND_ROUTE_CONFIG_NAME,
                cfg,
            )],
            transport_socket: Some(TransportSocket::downstream(identity.to_string())),
        }],
    }
}

/// A connection-manager filter referencing its route configuration by name;
/// the proxy resolves the configuration in a second discovery round-trip.
fn http_connection_manager_filter(route_config_name: &str, cfg: &dyn Configurator) -> Filter {
    Filter {
        name: HTTP_CONNECTION_MANAGER.to_string(),
        typed_config: HttpConnectionManager {
            stat_prefix: route_config_name.to_string(),
            rds: Rds {
                route_config_name: route_config_name.to_string(),
                config_source: Default::default(),
            },
            tracing: cfg.tracing_enabled().then(|| HcmTracing {
                collector_cluster: TRACING_CLUSTER_NAME.to_string(),
                collector_endpoint: cfg.tracing_endpoint(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_controller_core::MeshConfig;

    fn bookstore() -> ServiceIdentity {
        ServiceIdentity::new("default", "bookstore")
    }

    #[test]
    fn outbound_listener_references_outbound_routes() {
        let listener = build_outbound_listener(&MeshConfig::default());
        assert_eq!(listener.name, OUTBOUND_LISTENER_NAME);
        assert_eq!(listener.address.socket_address.port_value, OUTBOUND_LISTENER_PORT);
        assert_eq!(listener.filter_chains.len(), 1);
        assert!(listener.filter_chains[0].transport_socket.is_none());

        let hcm = &listener.filter_chains[0].filters[0].typed_config;
        assert_eq!(hcm.rds.route_config_name, OUTBOUND_ROUTE_CONFIG_NAME);
        assert!(hcm.tracing.is_none());
    }

    #[test]
    fn inbound_listener_carries_proxy_credential() {
        let listener = build_inbound_listener(&MeshConfig::default(), &bookstore());
        assert_eq!(listener.name, INBOUND_LISTENER_NAME);
        assert_eq!(listener.address.socket_address.port_value, INBOUND_LISTENER_PORT);

        let socket = listener.filter_chains[0]
            .transport_socket
            .as_ref()
            .expect("inbound transport socket");
        assert_eq!(socket.certificate_name, "default/bookstore");
        assert!(socket.require_client_certificate);

        let hcm = &listener.filter_chains[0].filters[0].typed_config;
        assert_eq!(hcm.rds.route_config_name, INBOUND_ROUTE_CONFIG_NAME);
    }

    #[test]
    fn tracing_wires_the_connection_manager() {
        let cfg = MeshConfig {
            tracing: true,
            ..MeshConfig::default()
        };
        let listener = build_outbound_listener(&cfg);
        let tracing = listener.filter_chains[0].filters[0]
            .typed_config
            .tracing
            .as_ref()
            .expect("tracing config");
        assert_eq!(tracing.collector_cluster, TRACING_CLUSTER_NAME);
        assert_eq!(tracing.collector_endpoint, "/api/v2/spans");
    }
}
