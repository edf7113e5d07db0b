#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
mod identity;
mod set;
pub mod trafficpolicy;

pub use self::{
    catalog::MeshCatalog,
    config::{Configurator, MeshConfig},
    identity::{ClusterName, ProxyCredential, ServiceIdentity, ServiceRef},
    set::{Element, ElementSet},
};
