use std::fmt;

use crate::set::Element;

/// The logical name of an upstream cluster, as referenced by routes.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterName(String);

/// The verifiable identity of a mesh workload (a service account).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceIdentity {
    pub namespace: String,
    pub name: String,
}

/// A reference to a service participating in the mesh. Its `Display`
/// rendering is the logical cluster name for the service.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

/// The opaque connection credential presented by a proxy, typically the
/// common name of its client certificate. Resolved to a [`ServiceIdentity`]
/// by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyCredential(String);

// === impl ClusterName ===

impl ClusterName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClusterName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for ClusterName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// === impl ServiceIdentity ===

impl ServiceIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl Element for ServiceIdentity {
    type Key = Self;

    fn key(&self) -> Self::Key {
        self.clone()
    }
}

// === impl ServiceRef ===

impl ServiceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The logical cluster name for this service.
    pub fn cluster_name(&self) -> ClusterName {
        ClusterName::from(self.to_string())
    }
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl ProxyCredential ===

impl ProxyCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProxyCredential {
    fn from(cn: String) -> Self {
        Self(cn)
    }
}

impl From<&str> for ProxyCredential {
    fn from(cn: &str) -> Self {
        Self(cn.to_string())
    }
}

impl fmt::Display for ProxyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
