//! Fluent API for turning a compiled namespace into a container.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use ctn_common::error::{CtnError, Result};
use ctn_common::types::Value;
use ctn_compiler::Namespace;
use ctn_compiler::graph::ServiceGraph;
use ctn_container::{Argument, ClassRegistry, Container, ServiceDefinition, ServiceProvider};

/// Builder for configuring a container before use.
pub struct ContainerBuilder {
    namespace: Namespace,
    registry: ClassRegistry,
    providers: Vec<Rc<dyn ServiceProvider>>,
    validate: bool,
}

impl ContainerBuilder {
    /// Creates a builder over a compiled namespace.
    #[must_use]
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            registry: ClassRegistry::new(),
            providers: Vec::new(),
            validate: true,
        }
    }

    /// Sets the registry used to construct classes named by definitions.
    #[must_use]
    pub fn registry(mut self, registry: ClassRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds a provider for services the namespace does not define.
    ///
    /// Providers are registered before definitions are bound, so a
    /// definition of the same name wins.
    #[must_use]
    pub fn provider(mut self, provider: Rc<dyn ServiceProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Sets whether references are checked before binding (default on).
    #[must_use]
    pub const fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Builds the container.
    ///
    /// # Errors
    ///
    /// Returns an error if validation is on and a service depends on an
    /// undefined service or parameter, or the services form a cycle. Binding
    /// fails for a class the registry cannot construct.
    pub fn build(self) -> Result<Container> {
        let namespace = &self.namespace;
        if self.validate {
            check(namespace, &self.providers)?;
        }

        let container = Container::with_parameters(
            namespace
                .parameters()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        for provider in self.providers {
            container.register(provider)?;
        }

        let registry = Rc::new(self.registry);
        for (name, definition) in namespace.services() {
            container.bind(name, definition.clone(), &registry)?;
            for (key, items) in definition.metadata() {
                for data in items {
                    container.add_metadata(name, key, Value::Array(data.clone()))?;
                }
            }
        }
        for (name, target) in namespace.aliases() {
            container.alias(name, target)?;
        }

        tracing::info!(
            services = namespace.services().len(),
            aliases = namespace.aliases().len(),
            parameters = namespace.parameters().len(),
            "built container"
        );
        Ok(container)
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("namespace", &self.namespace)
            .field("registry", &self.registry)
            .field("providers", &self.providers.len())
            .field("validate", &self.validate)
            .finish()
    }
}

fn check(namespace: &Namespace, providers: &[Rc<dyn ServiceProvider>]) -> Result<()> {
    let provided: BTreeSet<String> = providers.iter().flat_map(|p| p.provides()).collect();
    let graph = ServiceGraph::from_namespace(namespace);
    if let Some((dependent, dependency)) = graph
        .missing()
        .iter()
        .find(|(_, dependency)| !provided.contains(dependency))
    {
        return Err(CtnError::resolution(
            dependent.as_str(),
            format!("depends on undefined service \"{dependency}\""),
        ));
    }
    for (name, definition) in namespace.services() {
        if let Some(parameter) =
            parameter_references(definition).find(|p| !namespace.has_parameter(p))
        {
            return Err(CtnError::resolution(
                name.as_str(),
                format!("references undefined parameter \"{parameter}\""),
            ));
        }
    }
    let order = graph.resolve_order()?;
    tracing::debug!(services = order.len(), "validated service graph");
    Ok(())
}

/// Names of the parameters a definition's constructor and calls refer to.
pub fn parameter_references(definition: &ServiceDefinition) -> impl Iterator<Item = &str> {
    definition
        .arguments()
        .as_slice()
        .iter()
        .chain(definition.calls().iter().flat_map(|(_, args)| args.as_slice()))
        .filter_map(|argument| match argument {
            Argument::Parameter(name) => Some(name.as_str()),
            _ => None,
        })
}
