//! Resolution engine.
//!
//! Every known service name carries exactly one [`ResolverType`] together
//! with the data that strategy needs. Instances produced by non-factory
//! strategies live in the shared cache; presence there is what "resolved"
//! means.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use ctn_common::constants::SELF_SERVICE;
use ctn_common::error::{CtnError, Result};
use ctn_common::types::Value;
use serde::Serialize;

use crate::metadata::MetaData;
use crate::provider::ServiceProvider;
use crate::registry::ClassRegistry;
use crate::service::ServiceDefinition;

/// A produced service instance.
pub type Instance = Rc<dyn Any>;

type Factory = Rc<dyn Fn(&Container) -> Result<Instance>>;

/// How the container produces a given service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverType {
    /// Calls a defined method by name; the result is not cached.
    Method,
    /// Delegates to a registered [`ServiceProvider`].
    Provider,
    /// Calls a factory on every request.
    Factory,
    /// Calls a factory once and caches the result.
    Shared,
    /// Returns a value that was set directly.
    Setter,
}

#[derive(Clone)]
enum Binding {
    Method(String),
    Provider(Rc<dyn ServiceProvider>),
    Factory(Factory),
    Shared(Factory),
    Setter,
}

impl Binding {
    const fn resolver_type(&self) -> ResolverType {
        match self {
            Self::Method(_) => ResolverType::Method,
            Self::Provider(_) => ResolverType::Provider,
            Self::Factory(_) => ResolverType::Factory,
            Self::Shared(_) => ResolverType::Shared,
            Self::Setter => ResolverType::Setter,
        }
    }
}

#[derive(Default)]
struct State {
    parameters: HashMap<String, Value>,
    bindings: HashMap<String, Binding>,
    aliases: HashMap<String, String>,
    methods: HashMap<String, Factory>,
    shared: HashMap<String, Instance>,
    metadata: MetaData,
    resolving: Vec<String>,
}

impl State {
    /// Follows the alias chain starting at `name` to its final target.
    fn resolve_alias(&self, name: &str) -> Result<String> {
        let mut current = name;
        let mut seen = HashSet::new();
        while let Some(target) = self.aliases.get(current) {
            if !seen.insert(current) {
                return Err(CtnError::resolution(
                    name,
                    format!("alias cycle through \"{current}\""),
                ));
            }
            current = target.as_str();
        }
        Ok(current.to_string())
    }

    /// Drops every trace of `name` as a concrete binding or alias.
    fn unbind(&mut self, name: &str) -> bool {
        let had_binding = self.bindings.remove(name).is_some();
        let had_alias = self.aliases.remove(name).is_some();
        let had_instance = self.shared.remove(name).is_some();
        had_binding || had_alias || had_instance
    }
}

/// The runtime service container.
///
/// Not designed for concurrent use: binding calls must not interleave with
/// [`get`](Self::get) on the same container. Factories and providers receive
/// the container and may resolve further services while they run.
pub struct Container {
    state: Rc<RefCell<State>>,
}

impl Container {
    /// Creates an empty container. Only the self-reference is resolvable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::default())),
        }
    }

    /// Creates a container preloaded with parameters.
    #[must_use]
    pub fn with_parameters(parameters: impl IntoIterator<Item = (String, Value)>) -> Self {
        let container = Self::new();
        container.state.borrow_mut().parameters.extend(parameters);
        container
    }

    /// Whether two handles refer to the same container.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    fn self_instance(&self) -> Instance {
        Rc::new(Self {
            state: Rc::clone(&self.state),
        })
    }

    // ── Parameters ──────────────────────────────────────────────────

    /// Whether the parameter `name` is set.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.state.borrow().parameters.contains_key(name)
    }

    /// Returns the parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is not set.
    pub fn parameter(&self, name: &str) -> Result<Value> {
        self.state
            .borrow()
            .parameters
            .get(name)
            .cloned()
            .ok_or_else(|| CtnError::NotFound {
                kind: "parameter",
                id: name.to_string(),
            })
    }

    /// Returns the parameter `name`, or `default` when it is not set.
    #[must_use]
    pub fn parameter_or(&self, name: &str, default: Value) -> Value {
        self.state
            .borrow()
            .parameters
            .get(name)
            .cloned()
            .unwrap_or(default)
    }

    /// Sets the parameter `name`, replacing any previous value.
    pub fn set_parameter(&self, name: impl Into<String>, value: impl Into<Value>) {
        let _ = self
            .state
            .borrow_mut()
            .parameters
            .insert(name.into(), value.into());
    }

    /// All parameters, sorted by name.
    #[must_use]
    pub fn parameters(&self) -> BTreeMap<String, Value> {
        self.state
            .borrow()
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // ── Binding ─────────────────────────────────────────────────────

    fn install(&self, name: &str, binding: Binding) -> Result<()> {
        if name == SELF_SERVICE {
            return Err(CtnError::semantic(format!(
                "\"{SELF_SERVICE}\" is reserved for the container itself"
            )));
        }
        tracing::debug!(name, resolver = ?binding.resolver_type(), "binding service");
        let mut state = self.state.borrow_mut();
        let _ = state.unbind(name);
        let _ = state.bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Binds `name` to a class definition constructed through `registry`.
    ///
    /// Shared definitions resolve once and are cached; others produce a new
    /// instance per request.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved or the definition's class is
    /// not registered.
    pub fn bind(
        &self,
        name: &str,
        definition: ServiceDefinition,
        registry: &Rc<ClassRegistry>,
    ) -> Result<()> {
        if !registry.has_class(definition.class()) {
            return Err(CtnError::NotFound {
                kind: "class",
                id: definition.class().to_string(),
            });
        }
        let shared = definition.is_shared();
        let registry = Rc::clone(registry);
        let factory: Factory = Rc::new(move |c: &Self| registry.instantiate(&definition, c));
        self.install(
            name,
            if shared {
                Binding::Shared(factory)
            } else {
                Binding::Factory(factory)
            },
        )
    }

    /// Binds `name` to a factory that runs on every request.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved.
    pub fn bind_factory<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(&Self) -> Result<Instance> + 'static,
    {
        self.install(name, Binding::Factory(Rc::new(factory)))
    }

    /// Binds `name` to a factory whose first result is cached and reused.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved.
    pub fn bind_factory_shared<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(&Self) -> Result<Instance> + 'static,
    {
        self.install(name, Binding::Shared(Rc::new(factory)))
    }

    /// Defines a named method that [`bind_method`](Self::bind_method)
    /// bindings can dispatch to.
    pub fn define_method<F>(&self, method: impl Into<String>, body: F)
    where
        F: Fn(&Self) -> Result<Instance> + 'static,
    {
        let _ = self
            .state
            .borrow_mut()
            .methods
            .insert(method.into(), Rc::new(body));
    }

    /// Binds `name` to the method `method`. The method need not be defined
    /// yet; resolving fails while it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved.
    pub fn bind_method(&self, name: &str, method: impl Into<String>) -> Result<()> {
        self.install(name, Binding::Method(method.into()))
    }

    /// Sets an already-built instance for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved.
    pub fn set(&self, name: &str, instance: Instance) -> Result<()> {
        self.install(name, Binding::Setter)?;
        let _ = self
            .state
            .borrow_mut()
            .shared
            .insert(name.to_string(), instance);
        Ok(())
    }

    /// Sets a plain value for `name`; see [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved.
    pub fn set_value<T: Any>(&self, name: &str, value: T) -> Result<()> {
        self.set(name, Rc::new(value))
    }

    /// Binds every name `provider` declares to the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider declares the reserved name; no name
    /// is bound in that case.
    pub fn register(&self, provider: Rc<dyn ServiceProvider>) -> Result<()> {
        let names = provider.provides();
        if names.iter().any(|n| n == SELF_SERVICE) {
            return Err(CtnError::semantic(format!(
                "a provider cannot supply the reserved service \"{SELF_SERVICE}\""
            )));
        }
        tracing::debug!(count = names.len(), "registering provider");
        for name in names {
            self.install(&name, Binding::Provider(Rc::clone(&provider)))?;
        }
        Ok(())
    }

    /// Makes `name` resolve to whatever `target` resolves to.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is reserved, aliases itself, or would
    /// close an alias cycle.
    pub fn alias(&self, name: &str, target: &str) -> Result<()> {
        if name == SELF_SERVICE {
            return Err(CtnError::semantic(format!(
                "\"{SELF_SERVICE}\" is reserved for the container itself"
            )));
        }
        let mut state = self.state.borrow_mut();
        if state.resolve_alias(target)? == name {
            return Err(CtnError::semantic(format!(
                "alias \"{name}\" -> \"{target}\" would form a cycle"
            )));
        }
        let _ = state.unbind(name);
        let _ = state.aliases.insert(name.to_string(), target.to_string());
        Ok(())
    }

    // ── Resolution ──────────────────────────────────────────────────

    /// Returns the service `name`, constructing it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown, its strategy cannot produce
    /// a value, or construction fails. A failure leaves the container usable
    /// for other names.
    pub fn get(&self, name: &str) -> Result<Instance> {
        if name == SELF_SERVICE {
            return Ok(self.self_instance());
        }

        let (target, binding) = {
            let state = self.state.borrow();
            let target = state.resolve_alias(name)?;
            if target == SELF_SERVICE {
                return Ok(self.self_instance());
            }
            let binding = state
                .bindings
                .get(&target)
                .cloned()
                .ok_or_else(|| CtnError::NotFound {
                    kind: "service",
                    id: name.to_string(),
                })?;
            if !matches!(binding, Binding::Factory(_)) {
                if let Some(instance) = state.shared.get(&target) {
                    return Ok(Rc::clone(instance));
                }
            }
            (target, binding)
        };

        let _guard = ResolvingGuard::enter(self, &target)?;
        tracing::debug!(name = %target, resolver = ?binding.resolver_type(), "resolving service");

        match binding {
            Binding::Method(method) => {
                let body = self
                    .state
                    .borrow()
                    .methods
                    .get(&method)
                    .cloned()
                    .ok_or_else(|| {
                        CtnError::resolution(&target, format!("method \"{method}\" is not defined"))
                    })?;
                body(self)
            }
            Binding::Provider(provider) => {
                let (instance, shared) = provider.resolve(&target, self)?;
                if shared {
                    self.cache(&target, &instance);
                }
                Ok(instance)
            }
            Binding::Factory(factory) => factory(self),
            Binding::Shared(factory) => {
                let instance = factory(self)?;
                self.cache(&target, &instance);
                Ok(instance)
            }
            Binding::Setter => Err(CtnError::resolution(
                &target,
                "its value was released and there is no factory to rebuild it",
            )),
        }
    }

    /// Returns the service `name` downcast to `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails or the instance is not a `T`.
    pub fn get_as<T: Any>(&self, name: &str) -> Result<Rc<T>> {
        self.get(name)?.downcast::<T>().map_err(|_| {
            CtnError::resolution(
                name,
                format!("instance is not a {}", std::any::type_name::<T>()),
            )
        })
    }

    fn cache(&self, name: &str, instance: &Instance) {
        let _ = self
            .state
            .borrow_mut()
            .shared
            .insert(name.to_string(), Rc::clone(instance));
    }

    /// Whether `name` (or the service it aliases) can be resolved.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        if name == SELF_SERVICE {
            return true;
        }
        let state = self.state.borrow();
        state
            .resolve_alias(name)
            .is_ok_and(|t| t == SELF_SERVICE || state.bindings.contains_key(&t))
    }

    /// Whether `name` currently has a cached instance.
    ///
    /// Always true for the self-reference and always false for factories.
    #[must_use]
    pub fn is_resolved(&self, name: &str) -> bool {
        if name == SELF_SERVICE {
            return true;
        }
        let state = self.state.borrow();
        let Ok(target) = state.resolve_alias(name) else {
            return false;
        };
        if target == SELF_SERVICE {
            return true;
        }
        match state.bindings.get(&target) {
            Some(Binding::Factory(_)) | None => false,
            Some(_) => state.shared.contains_key(&target),
        }
    }

    /// Drops the cached instance of `name`, keeping its binding.
    ///
    /// Returns whether an instance was cached.
    pub fn release(&self, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Ok(target) = state.resolve_alias(name) else {
            return false;
        };
        let released = state.shared.remove(&target).is_some();
        if released {
            tracing::debug!(name = %target, "released shared instance");
        }
        released
    }

    /// Removes `name` entirely: binding, alias and cached instance.
    ///
    /// Removing an alias does not touch its target. Metadata is kept.
    /// Returns whether anything was removed; the self-reference is never
    /// removed.
    pub fn remove(&self, name: &str) -> bool {
        if name == SELF_SERVICE {
            return false;
        }
        self.state.borrow_mut().unbind(name)
    }

    /// The resolution strategy bound to `name`, after alias rewriting.
    #[must_use]
    pub fn resolver_type(&self, name: &str) -> Option<ResolverType> {
        let state = self.state.borrow();
        let target = state.resolve_alias(name).ok()?;
        state.bindings.get(&target).map(Binding::resolver_type)
    }

    /// Every resolvable name (bindings, aliases and the self-reference), sorted.
    #[must_use]
    pub fn available(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut names: Vec<String> = state
            .bindings
            .keys()
            .chain(state.aliases.keys())
            .cloned()
            .chain(std::iter::once(SELF_SERVICE.to_string()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Snapshot of every concrete binding and its strategy.
    #[must_use]
    pub fn bindings(&self) -> BTreeMap<String, ResolverType> {
        self.state
            .borrow()
            .bindings
            .iter()
            .map(|(name, b)| (name.clone(), b.resolver_type()))
            .collect()
    }

    /// Snapshot of every alias and its direct target.
    #[must_use]
    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.state
            .borrow()
            .aliases
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // ── Metadata ────────────────────────────────────────────────────

    /// Appends a data array to the metadata of `name` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not an array.
    pub fn add_metadata(&self, name: &str, key: &str, data: Value) -> Result<()> {
        self.state.borrow_mut().metadata.add(name, key, data)
    }

    /// Replaces the metadata list of `name` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if any item is not an array.
    pub fn set_metadata(&self, name: &str, key: &str, data: Vec<Value>) -> Result<()> {
        self.state.borrow_mut().metadata.set(name, key, data)
    }

    /// All metadata attached directly to `name`.
    #[must_use]
    pub fn metadata(&self, name: &str) -> BTreeMap<String, Vec<Value>> {
        self.state.borrow().metadata.for_name(name)
    }

    /// Metadata attached directly to `name` under `key`.
    #[must_use]
    pub fn metadata_for(&self, name: &str, key: &str) -> Vec<Value> {
        self.state.borrow().metadata.get(name, key)
    }

    /// Every service name carrying metadata under `key`.
    #[must_use]
    pub fn service_names_with_metadata(&self, key: &str) -> Vec<(String, Vec<Value>)> {
        self.state.borrow().metadata.names_with(key)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Container")
                .field("parameters", &state.parameters.len())
                .field("bindings", &state.bindings.len())
                .field("aliases", &state.aliases.len())
                .field("resolved", &state.shared.len())
                .finish(),
            Err(_) => f.write_str("Container { <busy> }"),
        }
    }
}

/// Marks a service as under construction for the guard's lifetime.
struct ResolvingGuard<'c> {
    container: &'c Container,
}

impl<'c> ResolvingGuard<'c> {
    fn enter(container: &'c Container, name: &str) -> Result<Self> {
        let mut state = container.state.borrow_mut();
        if state.resolving.iter().any(|n| n == name) {
            let mut chain = state.resolving.clone();
            chain.push(name.to_string());
            return Err(CtnError::resolution(
                name,
                format!("circular dependency {}", chain.join(" -> ")),
            ));
        }
        state.resolving.push(name.to_string());
        Ok(Self { container })
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        let _ = self.container.state.borrow_mut().resolving.pop();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug)]
    struct Connection {
        id: usize,
    }

    fn counter_factory(
        counter: &Rc<Cell<usize>>,
    ) -> impl Fn(&Container) -> Result<Instance> + 'static {
        let counter = Rc::clone(counter);
        move |_| {
            counter.set(counter.get() + 1);
            Ok(Rc::new(Connection { id: counter.get() }) as Instance)
        }
    }

    #[test]
    fn self_reference_without_bindings() {
        let container = Container::new();
        let me = container
            .get_as::<Container>(SELF_SERVICE)
            .expect("self reference");
        assert!(me.ptr_eq(&container));
        assert!(container.has(SELF_SERVICE));
        assert!(container.is_resolved(SELF_SERVICE));
    }

    #[test]
    fn self_reference_cannot_be_rebound() {
        let container = Container::new();
        assert!(container.set_value(SELF_SERVICE, 1_u8).is_err());
        assert!(
            container
                .bind_factory(SELF_SERVICE, |c| c.get("x"))
                .is_err()
        );
        assert!(container.alias(SELF_SERVICE, "x").is_err());
        assert!(!container.remove(SELF_SERVICE));
        assert!(container.get_as::<Container>(SELF_SERVICE).is_ok());
    }

    #[test]
    fn unknown_service_fails() {
        let container = Container::new();
        let err = container.get("nope").unwrap_err();
        assert!(matches!(err, CtnError::NotFound { kind: "service", .. }));
    }

    #[test]
    fn shared_factory_returns_identical_instance() {
        let container = Container::new();
        let counter = Rc::new(Cell::new(0));
        container
            .bind_factory_shared("d8", counter_factory(&counter))
            .expect("bind");
        let a = container.get("d8").expect("first");
        let b = container.get("d8").expect("second");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(counter.get(), 1);
        assert_eq!(container.resolver_type("d8"), Some(ResolverType::Shared));
    }

    #[test]
    fn factory_returns_distinct_instances() {
        let container = Container::new();
        let counter = Rc::new(Cell::new(0));
        container
            .bind_factory("d9", counter_factory(&counter))
            .expect("bind");
        let a = container.get_as::<Connection>("d9").expect("first");
        let b = container.get_as::<Connection>("d9").expect("second");
        assert!(!Rc::ptr_eq(&a, &b));
        assert_eq!((a.id, b.id), (1, 2));
        assert!(!container.is_resolved("d9"));
    }

    #[test]
    fn release_forces_reconstruction() {
        let container = Container::new();
        let counter = Rc::new(Cell::new(0));
        container
            .bind_factory_shared("db", counter_factory(&counter))
            .expect("bind");
        let first = container.get("db").expect("first");
        assert!(container.is_resolved("db"));

        assert!(container.release("db"));
        assert!(!container.is_resolved("db"));
        assert!(!container.release("db"));

        let second = container.get("db").expect("second");
        assert!(container.is_resolved("db"));
        assert!(!Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn rebind_clears_stale_instance() {
        let container = Container::new();
        container.set_value("value", 1_i32).expect("set");
        assert!(container.is_resolved("value"));
        container
            .bind_factory_shared("value", |_| Ok(Rc::new(2_i32) as Instance))
            .expect("rebind");
        assert!(!container.is_resolved("value"));
        assert_eq!(*container.get_as::<i32>("value").expect("get"), 2);
    }

    #[test]
    fn setter_value_is_returned_until_released() {
        let container = Container::new();
        container.set_value("answer", 42_i64).expect("set");
        assert_eq!(container.resolver_type("answer"), Some(ResolverType::Setter));
        assert_eq!(*container.get_as::<i64>("answer").expect("get"), 42);
        assert!(container.release("answer"));
        let err = container.get("answer").unwrap_err();
        assert!(matches!(err, CtnError::Resolution { .. }));
    }

    #[test]
    fn wrong_type_request_leaves_service_usable() {
        let container = Container::new();
        container.set_value("port", 8_u8).expect("set");
        let err = container.get_as::<String>("port").unwrap_err();
        assert!(
            matches!(err, CtnError::Resolution { ref service, .. } if service == "port"),
            "got: {err}"
        );
        assert!(container.is_resolved("port"));
        assert_eq!(*container.get_as::<u8>("port").expect("typed get"), 8);
        assert!(container.get("port").is_ok());
    }

    #[test]
    fn method_binding_is_not_cached() {
        let container = Container::new();
        let counter = Rc::new(Cell::new(0));
        container.define_method("resolveConnection", counter_factory(&counter));
        container
            .bind_method("connection", "resolveConnection")
            .expect("bind");
        let a = container.get("connection").expect("first");
        let b = container.get("connection").expect("second");
        assert!(!Rc::ptr_eq(&a, &b));
        assert!(!container.is_resolved("connection"));
    }

    #[test]
    fn method_binding_without_definition_fails() {
        let container = Container::new();
        container.bind_method("ghost", "resolveGhost").expect("bind");
        let err = container.get("ghost").unwrap_err();
        assert!(err.to_string().contains("resolveGhost"), "got: {err}");
        assert!(container.has("ghost"));
    }

    struct PoolProvider {
        built: Cell<usize>,
    }

    impl ServiceProvider for PoolProvider {
        fn provides(&self) -> Vec<String> {
            vec!["pool.shared".into(), "pool.fresh".into(), "pool.broken".into()]
        }

        fn resolve(&self, name: &str, _container: &Container) -> Result<(Instance, bool)> {
            self.built.set(self.built.get() + 1);
            match name {
                "pool.shared" => Ok((
                    Rc::new(Connection {
                        id: self.built.get(),
                    }) as Instance,
                    true,
                )),
                "pool.fresh" => Ok((
                    Rc::new(Connection {
                        id: self.built.get(),
                    }) as Instance,
                    false,
                )),
                other => Err(CtnError::resolution(other, "provider cannot build it")),
            }
        }
    }

    #[test]
    fn provider_caches_only_shared_results() {
        let container = Container::new();
        let provider = Rc::new(PoolProvider {
            built: Cell::new(0),
        });
        container.register(provider).expect("register");

        let a = container.get("pool.shared").expect("shared");
        let b = container.get("pool.shared").expect("shared again");
        assert!(Rc::ptr_eq(&a, &b));
        assert!(container.is_resolved("pool.shared"));

        let c = container.get("pool.fresh").expect("fresh");
        let d = container.get("pool.fresh").expect("fresh again");
        assert!(!Rc::ptr_eq(&c, &d));
        assert!(!container.is_resolved("pool.fresh"));

        assert_eq!(
            container.resolver_type("pool.broken"),
            Some(ResolverType::Provider)
        );
        assert!(container.get("pool.broken").is_err());
        assert!(container.get("pool.shared").is_ok());
    }

    #[test]
    fn alias_chain_resolves_to_final_target() {
        let container = Container::new();
        container.set_value("c", String::from("concrete")).expect("set");
        container.alias("b", "c").expect("alias b");
        container.alias("a", "b").expect("alias a");

        let a = container.get("a").expect("a");
        let c = container.get("c").expect("c");
        assert!(Rc::ptr_eq(&a, &c));

        assert!(container.remove("b"));
        assert!(container.get("c").is_ok());
        assert!(container.get("a").is_err());
        assert!(!container.has("a"));
    }

    #[test]
    fn alias_cycle_is_rejected() {
        let container = Container::new();
        container.alias("a", "b").expect("alias a");
        container.alias("b", "c").expect("alias b");
        let err = container.alias("c", "a").unwrap_err();
        assert!(err.to_string().contains("cycle"), "got: {err}");
    }

    #[test]
    fn alias_to_container_yields_self() {
        let container = Container::new();
        container.alias("app", SELF_SERVICE).expect("alias");
        let me = container.get_as::<Container>("app").expect("self");
        assert!(me.ptr_eq(&container));
    }

    #[test]
    fn alias_metadata_is_separate_from_target() {
        let container = Container::new();
        container.set_value("target", 1_u8).expect("set");
        container.alias("alias", "target").expect("alias");
        container
            .add_metadata("alias", "tag", Value::Array(Default::default()))
            .expect("meta");
        assert!(container.metadata("target").is_empty());
        assert_eq!(container.metadata_for("alias", "tag").len(), 1);
    }

    #[test]
    fn add_metadata_rejects_non_array() {
        let container = Container::new();
        assert!(container.add_metadata("svc", "tag", Value::Int(1)).is_err());
    }

    #[test]
    fn remove_erases_binding_and_instance() {
        let container = Container::new();
        container.set_value("tmp", 1_u8).expect("set");
        assert!(container.remove("tmp"));
        assert!(!container.has("tmp"));
        assert!(!container.is_resolved("tmp"));
        assert!(!container.remove("tmp"));
    }

    #[test]
    fn circular_dependency_is_reported() {
        let container = Container::new();
        container
            .bind_factory_shared("a", |c| c.get("b"))
            .expect("bind a");
        container
            .bind_factory_shared("b", |c| c.get("a"))
            .expect("bind b");
        let err = container.get("a").unwrap_err();
        assert!(err.to_string().contains("circular dependency"), "got: {err}");

        container
            .bind_factory_shared("b", |_| Ok(Rc::new(0_u8) as Instance))
            .expect("rebind b");
        assert!(container.get("a").is_ok());
    }

    #[test]
    fn factories_may_resolve_dependencies() {
        let container = Container::new();
        container.set_parameter("dsn", "sqlite::memory:");
        container
            .bind_factory_shared("repo", |c| {
                let dsn = c.parameter("dsn")?;
                Ok(Rc::new(dsn.as_str().unwrap_or_default().to_string()) as Instance)
            })
            .expect("bind");
        let repo = container.get_as::<String>("repo").expect("repo");
        assert_eq!(repo.as_str(), "sqlite::memory:");
    }

    #[test]
    fn parameters_with_defaults() {
        let container =
            Container::with_parameters([("env".to_string(), Value::from("prod"))]);
        assert!(container.has_parameter("env"));
        assert_eq!(container.parameter("env").expect("env"), Value::from("prod"));
        assert!(container.parameter("missing").is_err());
        assert_eq!(container.parameter_or("missing", Value::Null), Value::Null);
    }

    #[test]
    fn available_lists_all_names() {
        let container = Container::new();
        container.set_value("b", 1_u8).expect("set");
        container.alias("a", "b").expect("alias");
        assert_eq!(container.available(), vec!["a", "b", SELF_SERVICE]);
        assert_eq!(container.bindings().len(), 1);
        assert_eq!(container.aliases().get("a").map(String::as_str), Some("b"));
    }
}
