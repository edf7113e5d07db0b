use anyhow::{bail, Result};
use mesh_controller_core::trafficpolicy::{InboundTrafficPolicy, OutboundTrafficPolicy};
use mesh_controller_core::{MeshCatalog, ProxyCredential, ServiceIdentity, ServiceRef};

/// A canned catalog for assembler tests. `identity: None` fails identity
/// resolution; `fail_lookups` fails every other lookup.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub identity: Option<ServiceIdentity>,
    pub services: Vec<ServiceRef>,
    pub destinations: Vec<ServiceRef>,
    pub inbound: Vec<InboundTrafficPolicy>,
    pub outbound: Vec<OutboundTrafficPolicy>,
    pub fail_lookups: bool,
}

impl MeshCatalog for FakeCatalog {
    fn resolve_identity(&self, credential: &ProxyCredential) -> Result<ServiceIdentity> {
        match &self.identity {
            Some(identity) => Ok(identity.clone()),
            None => bail!("unknown credential {credential}"),
        }
    }

    fn services_for(&self, _: &ServiceIdentity) -> Result<Vec<ServiceRef>> {
        if self.fail_lookups {
            bail!("services unavailable");
        }
        Ok(self.services.clone())
    }

    fn allowed_outbound_destinations(&self, _: &ServiceIdentity) -> Result<Vec<ServiceRef>> {
        if self.fail_lookups {
            bail!("destinations unavailable");
        }
        Ok(self.destinations.clone())
    }

    fn traffic_policies_for(
        &self,
        _: &ServiceIdentity,
    ) -> Result<(Vec<InboundTrafficPolicy>, Vec<OutboundTrafficPolicy>)> {
        if self.fail_lookups {
            bail!("policies unavailable");
        }
        Ok((self.inbound.clone(), self.outbound.clone()))
    }
}
