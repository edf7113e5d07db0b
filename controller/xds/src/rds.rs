//! Assembles the route discovery response for one proxy.

use mesh_controller_core::MeshCatalog;
use tracing::{debug, error};

use crate::route::build_route_configuration;
use crate::{marshal_any, DiscoveryResponse, Proxy, ResourceType, ResponseError};

/// Compiles the proxy's merged traffic policies into its inbound and
/// outbound route configurations. A direction with no policies contributes
/// no resource; lookup or marshal failure aborts the whole response.
pub fn build_response(
    catalog: &dyn MeshCatalog,
    proxy: &Proxy,
) -> Result<DiscoveryResponse, ResponseError> {
    let identity = catalog
        .resolve_identity(proxy.credential())
        .map_err(|e| {
            error!(credential = %proxy.credential(), "failed to resolve proxy identity");
            ResponseError::IdentityResolution(e)
        })?;

    let (inbound, outbound) = catalog
        .traffic_policies_for(&identity)
        .map_err(ResponseError::CatalogLookup)?;
    debug!(
        %identity,
        inbound = inbound.len(),
        outbound = outbound.len(),
        "building route configuration"
    );

    let resources = build_route_configuration(&inbound, &outbound)
        .iter()
        .map(|config| marshal_any(ResourceType::Route, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DiscoveryResponse {
        type_url: ResourceType::Route,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{INBOUND_ROUTE_CONFIG_NAME, OUTBOUND_ROUTE_CONFIG_NAME};
    use crate::test_util::FakeCatalog;
    use mesh_controller_core::trafficpolicy::{
        HttpRouteMatch, InboundTrafficPolicy, OutboundTrafficPolicy, WeightedCluster,
    };
    use mesh_controller_core::ServiceIdentity;

    fn proxy() -> Proxy {
        Proxy::new("proxy-cert-cn")
    }

    fn inbound_policy() -> InboundTrafficPolicy {
        let mut policy =
            InboundTrafficPolicy::new("bookstore", vec!["bookstore.default".to_string()]);
        policy.add_rule(
            HttpRouteMatch {
                path_regex: "/buy".to_string(),
                methods: vec!["GET".to_string()],
                headers: Default::default(),
            },
            WeightedCluster::new("default/bookstore", 100),
            ServiceIdentity::new("default", "bookbuyer"),
        );
        policy
    }

    fn config_names(response: &DiscoveryResponse) -> Vec<String> {
        response
            .resources
            .iter()
            .map(|any| {
                let value: serde_json::Value = serde_json::from_slice(&any.value).unwrap();
                value["name"].as_str().unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn inbound_only_yields_one_config() {
        let catalog = FakeCatalog {
            identity: Some(ServiceIdentity::new("default", "bookstore")),
            inbound: vec![inbound_policy()],
            ..FakeCatalog::default()
        };

        let response = build_response(&catalog, &proxy()).expect("response");
        assert_eq!(response.type_url, ResourceType::Route);
        assert_eq!(config_names(&response), vec![INBOUND_ROUTE_CONFIG_NAME]);
    }

    #[test]
    fn both_directions_yield_both_configs() {
        let mut outbound =
            OutboundTrafficPolicy::new("bookstore", vec!["bookstore.default".to_string()]);
        outbound.add_route(
            HttpRouteMatch::default(),
            WeightedCluster::new("default/bookstore-v1", 100),
        );

        let catalog = FakeCatalog {
            identity: Some(ServiceIdentity::new("default", "bookbuyer")),
            inbound: vec![inbound_policy()],
            outbound: vec![outbound],
            ..FakeCatalog::default()
        };

        let response = build_response(&catalog, &proxy()).expect("response");
        assert_eq!(
            config_names(&response),
            vec![INBOUND_ROUTE_CONFIG_NAME, OUTBOUND_ROUTE_CONFIG_NAME]
        );
    }

    #[test]
    fn no_policies_yield_an_empty_resource_list() {
        let catalog = FakeCatalog {
            identity: Some(ServiceIdentity::new("default", "bookbuyer")),
            ..FakeCatalog::default()
        };

        let response = build_response(&catalog, &proxy()).expect("response");
        assert!(response.resources.is_empty());
    }

    #[test]
    fn unknown_credential_aborts_the_response() {
        let err = build_response(&FakeCatalog::default(), &proxy()).unwrap_err();
        assert!(matches!(err, ResponseError::IdentityResolution(_)));
    }

    #[test]
    fn catalog_failure_aborts_the_response() {
        let catalog = FakeCatalog {
            identity: Some(ServiceIdentity::new("default", "bookbuyer")),
            fail_lookups: true,
            ..FakeCatalog::default()
        };
        let err = build_response(&catalog, &proxy()).unwrap_err();
        assert!(matches!(err, ResponseError::CatalogLookup(_)));
    }
}
