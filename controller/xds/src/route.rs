//! Compiles inbound and outbound traffic policies into proxy route
//! configurations.

use std::collections::BTreeMap;

use mesh_controller_core::trafficpolicy::{
    InboundTrafficPolicy, OutboundTrafficPolicy, Rule, RouteWeightedClusters, WeightedCluster,
};
use mesh_controller_core::ElementSet;
use tracing::debug;

use crate::resource::{
    ClusterWeight, HeaderMatcher, RegexMatcher, Route, RouteAction, RouteConfiguration,
    RouteMatch, VirtualHost, WeightedClusters,
};
use crate::LOCAL_CLUSTER_SUFFIX;

/// Name under which the proxy requests its inbound route configuration.
pub const INBOUND_ROUTE_CONFIG_NAME: &str = "RDS_Inbound";

/// Name under which the proxy requests its outbound route configuration.
pub const OUTBOUND_ROUTE_CONFIG_NAME: &str = "RDS_Outbound";

const INBOUND_VIRTUAL_HOST_PREFIX: &str = "inbound_virtualHost";
const OUTBOUND_VIRTUAL_HOST_PREFIX: &str = "outbound_virtualHost";

/// Pseudo-header carrying the request method.
pub const METHOD_HEADER_KEY: &str = ":method";

/// Host matching is carried by virtual-host domains; an explicit `host`
/// header matcher would duplicate it and is skipped.
const HTTP_HOST_HEADER: &str = "host";

/// The wildcard HTTP method.
pub const WILDCARD_HTTP_METHOD: &str = "*";

/// Regex matching any path or method.
pub const REGEX_MATCH_ALL: &str = ".*";

/// Inbound routes terminate at a single local cluster, so their weight
/// total is fixed rather than split-derived.
const INBOUND_TOTAL_WEIGHT: u32 = 100;

/// The direction a route applies to. Inbound routes terminate at the local
/// copy of a cluster; outbound routes reference the remote copy unmodified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Builds the route configurations implementing `inbound` and `outbound`
/// policies. A direction with no policies produces no configuration at all,
/// not an empty one: the proxy treats the resource's absence as "nothing to
/// route".
pub fn build_route_configuration(
    inbound: &[InboundTrafficPolicy],
    outbound: &[OutboundTrafficPolicy],
) -> Vec<RouteConfiguration> {
    let mut configs = Vec::new();

    if !inbound.is_empty() {
        let mut config = route_configuration_stub(INBOUND_ROUTE_CONFIG_NAME);
        for policy in inbound {
            let mut virtual_host =
                virtual_host_stub(INBOUND_VIRTUAL_HOST_PREFIX, &policy.name, &policy.hostnames);
            virtual_host.routes = build_inbound_routes(&policy.rules);
            config.virtual_hosts.push(virtual_host);
        }
        configs.push(config);
    }

    if !outbound.is_empty() {
        let mut config = route_configuration_stub(OUTBOUND_ROUTE_CONFIG_NAME);
        for policy in outbound {
            debug!(policy = %policy.name, "building outbound routes");
            let mut virtual_host =
                virtual_host_stub(OUTBOUND_VIRTUAL_HOST_PREFIX, &policy.name, &policy.hostnames);
            virtual_host.routes = build_outbound_routes(&policy.routes);
            config.virtual_hosts.push(virtual_host);
        }
        configs.push(config);
    }

    configs
}

fn route_configuration_stub(name: &str) -> RouteConfiguration {
    RouteConfiguration {
        name: name.to_string(),
        validate_clusters: true,
        virtual_hosts: Vec::new(),
    }
}

fn virtual_host_stub(prefix: &str, name: &str, domains: &[String]) -> VirtualHost {
    VirtualHost {
        name: format!("{prefix}|{name}"),
        domains: domains.to_vec(),
        routes: Vec::new(),
    }
}

/// One wire route per sanitized method of each rule: the wire protocol
/// matches a single method per route entry, so a rule with methods
/// `["GET", "POST"]` fans out into two entries.
fn build_inbound_routes(rules: &[Rule]) -> Vec<Route> {
    let mut routes = Vec::new();
    for rule in rules {
        let matcher = &rule.route.route;
        for method in sanitize_http_methods(&matcher.methods) {
            routes.push(build_route(
                &matcher.path_regex,
                &method,
                &matcher.headers,
                &rule.route.weighted_clusters,
                INBOUND_TOTAL_WEIGHT,
                Direction::Inbound,
            ));
        }
    }
    routes
}

/// Outbound routing is by destination weight, not by path: each route
/// matches all paths and methods, with the policy-level weight total
/// computed before the route is built.
fn build_outbound_routes(routes: &[RouteWeightedClusters]) -> Vec<Route> {
    let empty_headers = BTreeMap::new();
    routes
        .iter()
        .map(|route| {
            build_route(
                REGEX_MATCH_ALL,
                WILDCARD_HTTP_METHOD,
                &empty_headers,
                &route.weighted_clusters,
                route.total_clusters_weight(),
                Direction::Outbound,
            )
        })
        .collect()
}

fn build_route(
    path_regex: &str,
    method: &str,
    headers: &BTreeMap<String, String>,
    weighted_clusters: &ElementSet<WeightedCluster>,
    total_weight: u32,
    direction: Direction,
) -> Route {
    Route {
        r#match: RouteMatch {
            safe_regex: RegexMatcher {
                regex: path_regex.to_string(),
            },
            headers: header_matchers(method, headers),
        },
        route: RouteAction {
            weighted_clusters: build_weighted_clusters(weighted_clusters, total_weight, direction),
        },
    }
}

/// Compiles the weighted-cluster set of one route. Inbound cluster names
/// carry the local suffix; outbound names pass through unmodified, and the
/// outbound total is the pre-computed policy-level sum. Entries are sorted
/// by name then weight so repeated synthesis over the same set is
/// byte-identical.
fn build_weighted_clusters(
    weighted_clusters: &ElementSet<WeightedCluster>,
    total_weight: u32,
    direction: Direction,
) -> WeightedClusters {
    let mut clusters = Vec::with_capacity(weighted_clusters.len());
    let mut total = 0;
    for wc in weighted_clusters.iter() {
        let name = match direction {
            Direction::Inbound => format!("{}{}", wc.cluster_name, LOCAL_CLUSTER_SUFFIX),
            Direction::Outbound => wc.cluster_name.to_string(),
        };
        total += wc.weight;
        clusters.push(ClusterWeight {
            name,
            weight: wc.weight,
        });
    }
    if direction == Direction::Outbound {
        total = total_weight;
    }
    clusters.sort();
    WeightedClusters {
        clusters,
        total_weight: total,
    }
}

/// The `:method` matcher always leads, followed by the rule's custom header
/// matchers in map order. The `host` header is skipped.
fn header_matchers(method: &str, headers: &BTreeMap<String, String>) -> Vec<HeaderMatcher> {
    let mut matchers = vec![HeaderMatcher {
        name: METHOD_HEADER_KEY.to_string(),
        safe_regex_match: RegexMatcher {
            regex: method_regex(method),
        },
    }];

    for (name, value) in headers {
        if name == HTTP_HOST_HEADER {
            continue;
        }
        matchers.push(HeaderMatcher {
            name: name.clone(),
            safe_regex_match: RegexMatcher {
                regex: value.clone(),
            },
        });
    }
    matchers
}

fn method_regex(method: &str) -> String {
    if method == WILDCARD_HTTP_METHOD {
        REGEX_MATCH_ALL.to_string()
    } else {
        method.to_string()
    }
}

/// De-duplicates a method list, preserving first-occurrence order and
/// dropping empty entries. A wildcard anywhere collapses the whole list to
/// exactly `["*"]`.
pub fn sanitize_http_methods(methods: &[String]) -> Vec<String> {
    let mut sanitized: Vec<String> = Vec::new();
    for method in methods {
        if method.is_empty() {
            continue;
        }
        if method == WILDCARD_HTTP_METHOD {
            return vec![WILDCARD_HTTP_METHOD.to_string()];
        }
        if !sanitized.contains(method) {
            sanitized.push(method.clone());
        }
    }
    sanitized
}
