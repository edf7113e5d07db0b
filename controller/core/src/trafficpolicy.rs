use std::collections::BTreeMap;

use ahash::AHashMap as HashMap;
use tracing::debug;

use crate::{
    identity::{ClusterName, ServiceIdentity},
    set::{Element, ElementSet},
};

/// An HTTP route matcher: a path regex, the methods it applies to (possibly
/// including the wildcard `*`), and header name → regex-or-literal matchers.
///
/// Path and header regexes are opaque to the control plane; they are
/// compiled by the proxy's regex engine, not here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRouteMatch {
    pub path_regex: String,
    pub methods: Vec<String>,
    pub headers: BTreeMap<String, String>,
}

/// A (cluster name, weight) pair used for traffic splitting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WeightedCluster {
    pub cluster_name: ClusterName,
    pub weight: u32,
}

/// A route and the weighted clusters it fans out to, valid for a set of
/// virtual-host hostnames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteWeightedClusters {
    pub route: HttpRouteMatch,
    pub weighted_clusters: ElementSet<WeightedCluster>,
    pub hostnames: ElementSet<String>,
}

/// A routing rule a destination accepts, guarded by the set of client
/// identities allowed to invoke it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub route: RouteWeightedClusters,
    pub allowed_clients: ElementSet<ServiceIdentity>,
}

/// The accept-side view of allowed traffic for one destination, grouped by
/// virtual-host hostnames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundTrafficPolicy {
    pub name: String,
    pub hostnames: Vec<String>,
    pub rules: Vec<Rule>,
}

/// The call-side view of allowed traffic for one source, grouped by
/// virtual-host hostnames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundTrafficPolicy {
    pub name: String,
    pub hostnames: Vec<String>,
    pub routes: Vec<RouteWeightedClusters>,
}

// === impl WeightedCluster ===

impl WeightedCluster {
    pub fn new(cluster_name: impl Into<ClusterName>, weight: u32) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            weight,
        }
    }
}

impl Element for WeightedCluster {
    type Key = (ClusterName, u32);

    fn key(&self) -> Self::Key {
        (self.cluster_name.clone(), self.weight)
    }
}

// === impl RouteWeightedClusters ===

impl RouteWeightedClusters {
    /// The sum of the member cluster weights. Recomputed on every call so it
    /// always reflects the current cluster set.
    pub fn total_clusters_weight(&self) -> u32 {
        self.weighted_clusters.iter().map(|wc| wc.weight).sum()
    }
}

// === impl InboundTrafficPolicy ===

impl InboundTrafficPolicy {
    pub fn new(name: impl Into<String>, hostnames: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hostnames,
            rules: Vec::new(),
        }
    }

    /// Adds a rule allowing `client` to invoke `route` against
    /// `weighted_cluster`. If a structurally equal route is already present,
    /// the client is unioned into the existing rule's allowed set instead.
    pub fn add_rule(
        &mut self,
        route: HttpRouteMatch,
        weighted_cluster: WeightedCluster,
        client: ServiceIdentity,
    ) {
        let route = RouteWeightedClusters {
            route,
            weighted_clusters: std::iter::once(weighted_cluster).collect(),
            hostnames: ElementSet::new(),
        };
        for rule in &mut self.rules {
            if rule.route == route {
                rule.allowed_clients.insert(client);
                return;
            }
        }
        self.rules.push(Rule {
            route,
            allowed_clients: std::iter::once(client).collect(),
        });
    }
}

// === impl OutboundTrafficPolicy ===

impl OutboundTrafficPolicy {
    pub fn new(name: impl Into<String>, hostnames: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hostnames,
            routes: Vec::new(),
        }
    }

    /// Adds a route fanning out to `weighted_cluster`. Adding a route whose
    /// matcher is already present is a no-op: the first writer wins.
    pub fn add_route(&mut self, route: HttpRouteMatch, weighted_cluster: WeightedCluster) {
        for existing in &self.routes {
            if existing.route == route {
                debug!(policy = %self.name, path = %route.path_regex, "ignoring duplicate route");
                return;
            }
        }
        self.routes.push(RouteWeightedClusters {
            route,
            weighted_clusters: std::iter::once(weighted_cluster).collect(),
            hostnames: ElementSet::new(),
        });
    }
}

/// Folds `incoming` inbound policies into `existing` without duplicating
/// virtual hosts, routes, or allowed clients. Policies are identified by
/// exact (order-sensitive) equality of their hostname lists; matched
/// policies are merged rule-by-rule, unmatched policies are appended.
///
/// The input vector is consumed and returned; the caller is responsible for
/// serializing merges against a given collection.
pub fn merge_inbound_policies(
    mut existing: Vec<InboundTrafficPolicy>,
    incoming: impl IntoIterator<Item = InboundTrafficPolicy>,
) -> Vec<InboundTrafficPolicy> {
    for policy in incoming {
        match existing.iter_mut().find(|e| e.hostnames == policy.hostnames) {
            Some(matched) => merge_rules(&mut matched.rules, policy.rules),
            None => existing.push(policy),
        }
    }
    existing
}

/// Folds `incoming` outbound policies into `existing`, appending policies
/// with unmatched hostname lists and merging routes (first-writer-wins) into
/// matched ones.
pub fn merge_outbound_policies(
    mut existing: Vec<OutboundTrafficPolicy>,
    incoming: impl IntoIterator<Item = OutboundTrafficPolicy>,
) -> Vec<OutboundTrafficPolicy> {
    for policy in incoming {
        match existing.iter_mut().find(|e| e.hostnames == policy.hostnames) {
            Some(matched) => merge_routes(&mut matched.routes, policy.routes),
            None => existing.push(policy),
        }
    }
    existing
}

fn merge_rules(original: &mut Vec<Rule>, latest: Vec<Rule>) {
    for rule in latest {
        match original.iter_mut().find(|o| o.route == rule.route) {
            Some(matched) => matched.allowed_clients.union(rule.allowed_clients),
            None => original.push(rule),
        }
    }
}

fn merge_routes(original: &mut Vec<RouteWeightedClusters>, latest: Vec<RouteWeightedClusters>) {
    // A route matcher already present wins; the incoming duplicate is
    // dropped, unlike the inbound merge which unions clients.
    for route in latest {
        if original.iter().any(|o| o.route == route.route) {
            debug!(path = %route.route.path_regex, "ignoring duplicate outbound route");
            continue;
        }
        original.push(route);
    }
}

/// Per-host route aggregation used while observing policy sources: maps a
/// service host to its routes, keyed by path regex.
pub type RoutesPerHost = HashMap<String, HashMap<String, RouteWeightedClusters>>;

/// Folds a (route, weighted cluster, hostname) observation into
/// `routes_per_host`. An existing path entry absorbs the cluster, methods,
/// headers, and hostname; an unseen path creates a fresh entry.
pub fn aggregate_routes_by_host(
    routes_per_host: &mut RoutesPerHost,
    route: HttpRouteMatch,
    weighted_cluster: WeightedCluster,
    hostname: &str,
) {
    let host = service_from_hostname(hostname);
    let routes = routes_per_host.entry(host.to_string()).or_default();
    match routes.get_mut(&route.path_regex) {
        Some(existing) => {
            existing.weighted_clusters.insert(weighted_cluster);
            existing.route.methods.extend(route.methods);
            existing.route.headers.extend(route.headers);
            existing.hostnames.insert(hostname.to_string());
        }
        None => {
            let path = route.path_regex.clone();
            routes.insert(
                path,
                RouteWeightedClusters {
                    route,
                    weighted_clusters: std::iter::once(weighted_cluster).collect(),
                    hostnames: std::iter::once(hostname.to_string()).collect(),
                },
            );
        }
    }
}

/// Extracts the service name from a fully-qualified hostname, e.g.
/// `bookstore.default.svc.cluster.local` → `bookstore`.
pub fn service_from_hostname(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    fn buy_route() -> HttpRouteMatch {
        HttpRouteMatch {
            path_regex: "/buy".to_string(),
            methods: vec!["GET".to_string()],
            headers: btreemap! {
                "user-agent".to_string() => "something".to_string(),
            },
        }
    }

    fn sell_route() -> HttpRouteMatch {
        HttpRouteMatch {
            path_regex: "/sell".to_string(),
            methods: vec!["GET".to_string()],
            headers: BTreeMap::new(),
        }
    }

    fn bookbuyer() -> ServiceIdentity {
        ServiceIdentity::new("default", "bookbuyer")
    }

    #[test]
    fn total_clusters_weight_sums_members() {
        let route = RouteWeightedClusters {
            route: buy_route(),
            weighted_clusters: vec![
                WeightedCluster::new("default/bookstore-v1", 60),
                WeightedCluster::new("default/bookstore-v2", 40),
            ]
            .into_iter()
            .collect(),
            hostnames: ElementSet::new(),
        };
        assert_eq!(route.total_clusters_weight(), 100);
    }

    #[test]
    fn add_rule_unions_clients_on_equal_route() {
        let mut policy = InboundTrafficPolicy::new("bookstore", vec!["bookstore".to_string()]);
        let cluster = WeightedCluster::new("default/bookstore", 100);

        policy.add_rule(buy_route(), cluster.clone(), bookbuyer());
        policy.add_rule(
            buy_route(),
            cluster.clone(),
            ServiceIdentity::new("default", "bookthief"),
        );
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.rules[0].allowed_clients.len(), 2);

        policy.add_rule(sell_route(), cluster, bookbuyer());
        assert_eq!(policy.rules.len(), 2);
    }

    #[test]
    fn add_route_is_first_writer_wins() {
        let mut policy = OutboundTrafficPolicy::new("bookstore", vec!["bookstore".to_string()]);
        let v1 = WeightedCluster::new("default/bookstore-v1", 100);

        policy.add_route(buy_route(), v1.clone());
        assert_eq!(policy.routes.len(), 1);

        // A duplicate matcher is dropped even with a different cluster.
        policy.add_route(buy_route(), WeightedCluster::new("default/bookstore-v2", 100));
        assert_eq!(policy.routes.len(), 1);
        assert_eq!(
            policy.routes[0].weighted_clusters,
            std::iter::once(v1.clone()).collect()
        );

        policy.add_route(sell_route(), v1);
        assert_eq!(policy.routes.len(), 2);
    }

    #[test]
    fn merge_inbound_unions_rules_for_equal_hostnames() {
        let cluster = WeightedCluster::new("default/bookstore", 100);

        let mut a = InboundTrafficPolicy::new("a", vec!["a.local".to_string()]);
        a.add_rule(buy_route(), cluster.clone(), bookbuyer());

        let mut b = InboundTrafficPolicy::new("b", vec!["a.local".to_string()]);
        b.add_rule(sell_route(), cluster, bookbuyer());

        let merged = merge_inbound_policies(vec![a], vec![b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].hostnames, vec!["a.local".to_string()]);
        assert_eq!(merged[0].rules.len(), 2);
    }

    #[test]
    fn merge_inbound_appends_distinct_hostnames() {
        let a = InboundTrafficPolicy::new("a", vec!["a.local".to_string()]);
        let b = InboundTrafficPolicy::new("b", vec!["b.local".to_string()]);

        let merged = merge_inbound_policies(vec![a], vec![b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_inbound_is_idempotent() {
        let cluster = WeightedCluster::new("default/bookstore", 100);
        let mut source = InboundTrafficPolicy::new("a", vec!["a.local".to_string()]);
        source.add_rule(buy_route(), cluster, bookbuyer());

        let merged = merge_inbound_policies(Vec::new(), vec![source.clone()]);
        let remerged = merge_inbound_policies(merged.clone(), vec![source]);
        assert_eq!(remerged, merged);
        assert_eq!(remerged[0].rules.len(), 1);
        assert_eq!(remerged[0].rules[0].allowed_clients.len(), 1);
    }

    #[test]
    fn merge_outbound_drops_duplicate_routes() {
        let v1 = WeightedCluster::new("default/bookstore-v1", 100);

        let mut a = OutboundTrafficPolicy::new("a", vec!["bookstore".to_string()]);
        a.add_route(buy_route(), v1.clone());

        let mut b = OutboundTrafficPolicy::new("b", vec!["bookstore".to_string()]);
        b.add_route(buy_route(), WeightedCluster::new("default/bookstore-v2", 100));
        b.add_route(sell_route(), v1.clone());

        let merged = merge_outbound_policies(vec![a], vec![b]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].routes.len(), 2);
        // The pre-existing /buy route kept its original cluster.
        assert_eq!(
            merged[0].routes[0].weighted_clusters,
            std::iter::once(v1).collect()
        );
    }

    #[test]
    fn merge_handles_empty_hostnames_as_ordinary_key() {
        let a = InboundTrafficPolicy::new("a", Vec::new());
        let b = InboundTrafficPolicy::new("b", Vec::new());

        // Two policies with empty hostname lists share a merge key.
        let merged = merge_inbound_policies(vec![a], vec![b]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn aggregate_routes_by_host_merges_on_path_hit() {
        let mut routes_per_host = RoutesPerHost::default();
        let hostname = "bookstore.default.svc.cluster.local";

        aggregate_routes_by_host(
            &mut routes_per_host,
            buy_route(),
            WeightedCluster::new("default/bookstore-v1", 60),
            hostname,
        );
        aggregate_routes_by_host(
            &mut routes_per_host,
            buy_route(),
            WeightedCluster::new("default/bookstore-v2", 40),
            "bookstore.default",
        );

        let routes = &routes_per_host["bookstore"];
        assert_eq!(routes.len(), 1);
        let entry = &routes["/buy"];
        assert_eq!(entry.weighted_clusters.len(), 2);
        assert_eq!(entry.hostnames.len(), 2);
        assert_eq!(entry.total_clusters_weight(), 100);

        aggregate_routes_by_host(
            &mut routes_per_host,
            sell_route(),
            WeightedCluster::new("default/bookstore-v1", 100),
            hostname,
        );
        assert_eq!(routes_per_host["bookstore"].len(), 2);
    }

    #[test]
    fn service_from_hostname_takes_leading_label() {
        assert_eq!(
            service_from_hostname("bookstore.default.svc.cluster.local"),
            "bookstore"
        );
        assert_eq!(service_from_hostname("bookstore"), "bookstore");
    }
}
