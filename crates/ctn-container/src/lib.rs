//! # ctn-container
//!
//! The runtime half of ctn: the service model compiled namespaces are made
//! of, and the [`Container`](container::Container) that turns service names
//! into instances on request.
//!
//! Handles:
//! - **Service**: definitions, typed constructor arguments and construction actions.
//! - **Container**: per-name resolution strategies and the shared-instance cache.
//! - **Provider**: plugins that resolve several names behind one call.
//! - **Registry**: construction of logical class names without reflection.
//! - **Metadata**: the name/key side table of tagged data arrays.

pub mod container;
pub mod metadata;
pub mod provider;
pub mod registry;
pub mod service;

pub use container::{Container, Instance, ResolverType};
pub use provider::ServiceProvider;
pub use registry::ClassRegistry;
pub use service::{Argument, ArgumentKind, Arguments, Resolved, ServiceArguments, ServiceDefinition};
