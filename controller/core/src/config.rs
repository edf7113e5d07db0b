/// Models the mesh configuration collaborator: feature flags and tracing
/// endpoint parameters consulted during response synthesis.
pub trait Configurator: Send + Sync {
    /// Whether traffic is allowed to leave the mesh through a pass-through
    /// cluster.
    fn egress_enabled(&self) -> bool;

    /// Whether a cluster for scraping the proxy's metrics endpoint is
    /// synthesized.
    fn prometheus_scraping_enabled(&self) -> bool;

    /// Whether distributed-tracing wiring (collector cluster and connection
    /// manager tracing config) is synthesized.
    fn tracing_enabled(&self) -> bool;

    /// Whether upstream clusters carry circuit-breaker thresholds.
    fn backpressure_enabled(&self) -> bool;

    /// Hostname of the tracing collector.
    fn tracing_address(&self) -> String;

    /// Port of the tracing collector.
    fn tracing_port(&self) -> u16;

    /// URL path spans are reported to on the collector.
    fn tracing_endpoint(&self) -> String;
}

/// Plain-value mesh configuration.
#[derive(Clone, Debug)]
pub struct MeshConfig {
    pub egress: bool,
    pub prometheus_scraping: bool,
    pub tracing: bool,
    pub backpressure: bool,
    pub tracing_address: String,
    pub tracing_port: u16,
    pub tracing_endpoint: String,
}

// === impl MeshConfig ===

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            egress: false,
            prometheus_scraping: false,
            tracing: false,
            backpressure: false,
            tracing_address: "jaeger".to_string(),
            tracing_port: 9411,
            tracing_endpoint: "/api/v2/spans".to_string(),
        }
    }
}

impl Configurator for MeshConfig {
    fn egress_enabled(&self) -> bool {
        self.egress
    }

    fn prometheus_scraping_enabled(&self) -> bool {
        self.prometheus_scraping
    }

    fn tracing_enabled(&self) -> bool {
        self.tracing
    }

    fn backpressure_enabled(&self) -> bool {
        self.backpressure
    }

    fn tracing_address(&self) -> String {
        self.tracing_address.clone()
    }

    fn tracing_port(&self) -> u16 {
        self.tracing_port
    }

    fn tracing_endpoint(&self) -> String {
        self.tracing_endpoint.clone()
    }
}
