//! Service definitions and their typed arguments.
//!
//! A [`ServiceDefinition`] names the logical class to build, the
//! constructor [`ServiceArguments`], the construction actions to run on the
//! fresh instance, and the metadata attached to the service.

use std::any::Any;
use std::rc::Rc;

use ctn_common::constants::{DEPENDENCY_SIGIL, PARAMETER_SIGIL};
use ctn_common::error::{CtnError, Result};
use ctn_common::types::{KeyedArray, Value};
use serde::Serialize;

use crate::container::{Container, Instance};

/// How an argument obtains its value at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    /// Passed through unchanged.
    Raw,
    /// Looked up in the container's parameter table.
    Parameter,
    /// Fetched (and possibly constructed) from the container.
    Dependency,
}

/// A single constructor or method-call argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Argument {
    /// A literal value.
    Raw(Value),
    /// Name of a container parameter, without sigil.
    Parameter(String),
    /// Name of another service, without sigil.
    Dependency(String),
}

impl Argument {
    /// Classifies a plain value: `"@name"` is a dependency, `":name"` a
    /// parameter, anything else raw.
    #[must_use]
    pub fn classify(value: Value) -> Self {
        if let Value::String(s) = &value {
            if let Some(name) = s.strip_prefix(DEPENDENCY_SIGIL) {
                return Self::Dependency(name.to_string());
            }
            if let Some(name) = s.strip_prefix(PARAMETER_SIGIL) {
                return Self::Parameter(name.to_string());
            }
        }
        Self::Raw(value)
    }

    /// The resolution kind of this argument.
    #[must_use]
    pub const fn kind(&self) -> ArgumentKind {
        match self {
            Self::Raw(_) => ArgumentKind::Raw,
            Self::Parameter(_) => ArgumentKind::Parameter,
            Self::Dependency(_) => ArgumentKind::Dependency,
        }
    }

    fn resolve(&self, container: &Container) -> Result<Resolved> {
        match self {
            Self::Raw(value) => Ok(Resolved::Value(value.clone())),
            Self::Parameter(name) => container.parameter(name).map(Resolved::Value),
            Self::Dependency(name) => container.get(name).map(Resolved::Service),
        }
    }
}

/// Ordered list of typed arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ServiceArguments {
    arguments: Vec<Argument>,
}

impl ServiceArguments {
    /// Creates an empty argument list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arguments: Vec::new(),
        }
    }

    /// Builds arguments from plain values, classifying each by its sigil.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            arguments: values.into_iter().map(Argument::classify).collect(),
        }
    }

    /// Appends an argument.
    pub fn push(&mut self, argument: Argument) {
        self.arguments.push(argument);
    }

    /// Appends a raw value.
    #[must_use]
    pub fn raw(mut self, value: impl Into<Value>) -> Self {
        self.arguments.push(Argument::Raw(value.into()));
        self
    }

    /// Appends a parameter reference.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.arguments.push(Argument::Parameter(name.into()));
        self
    }

    /// Appends a service reference.
    #[must_use]
    pub fn dependency(mut self, name: impl Into<String>) -> Self {
        self.arguments.push(Argument::Dependency(name.into()));
        self
    }

    /// The arguments in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Argument] {
        &self.arguments
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Names of every service this argument list depends on.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().filter_map(|a| match a {
            Argument::Dependency(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Resolves every argument against `container`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced parameter is missing or a referenced
    /// service cannot be resolved.
    pub fn resolve(&self, container: &Container) -> Result<Arguments> {
        let values = self
            .arguments
            .iter()
            .map(|a| a.resolve(container))
            .collect::<Result<Vec<_>>>()?;
        Ok(Arguments::new(values))
    }
}

/// A resolved argument value.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A raw value or a parameter's value.
    Value(Value),
    /// A service instance.
    Service(Instance),
}

/// Resolved arguments handed to constructors and construction actions.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Resolved>,
}

impl Arguments {
    /// Wraps resolved values.
    #[must_use]
    pub const fn new(values: Vec<Resolved>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer arguments were given.
    pub fn get(&self, index: usize) -> Result<&Resolved> {
        self.values
            .get(index)
            .ok_or_else(|| CtnError::logic(format!("argument {index} was not given")))
    }

    /// Returns the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or is a service.
    pub fn value(&self, index: usize) -> Result<&Value> {
        match self.get(index)? {
            Resolved::Value(v) => Ok(v),
            Resolved::Service(_) => Err(CtnError::logic(format!(
                "argument {index} is a service, expected a value"
            ))),
        }
    }

    /// Returns the string at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or not a string.
    pub fn string(&self, index: usize) -> Result<&str> {
        let value = self.value(index)?;
        value.as_str().ok_or_else(|| mismatch(index, "string", value))
    }

    /// Returns the integer at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or not an integer.
    pub fn int(&self, index: usize) -> Result<i64> {
        let value = self.value(index)?;
        value.as_int().ok_or_else(|| mismatch(index, "int", value))
    }

    /// Returns the number at `index` as `f64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or not a number.
    pub fn float(&self, index: usize) -> Result<f64> {
        let value = self.value(index)?;
        value.as_float().ok_or_else(|| mismatch(index, "float", value))
    }

    /// Returns the boolean at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing or not a boolean.
    pub fn bool(&self, index: usize) -> Result<bool> {
        let value = self.value(index)?;
        value.as_bool().ok_or_else(|| mismatch(index, "bool", value))
    }

    /// Returns the service at `index`, downcast to `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument is missing, is a value, or holds a
    /// service of another type.
    pub fn service<T: Any>(&self, index: usize) -> Result<Rc<T>> {
        match self.get(index)? {
            Resolved::Service(instance) => Rc::clone(instance).downcast::<T>().map_err(|_| {
                CtnError::logic(format!(
                    "argument {index} is not a {}",
                    std::any::type_name::<T>()
                ))
            }),
            Resolved::Value(v) => Err(mismatch(index, "service", v)),
        }
    }

    /// Consumes the wrapper, returning the resolved values.
    #[must_use]
    pub fn into_vec(self) -> Vec<Resolved> {
        self.values
    }
}

fn mismatch(index: usize, expected: &str, found: &Value) -> CtnError {
    CtnError::logic(format!(
        "argument {index} is a {}, expected {expected}",
        found.type_name()
    ))
}

/// Blueprint for constructing one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDefinition {
    class: String,
    arguments: ServiceArguments,
    calls: Vec<(String, ServiceArguments)>,
    metadata: Vec<(String, Vec<KeyedArray<Value>>)>,
    shared: bool,
}

impl ServiceDefinition {
    /// Creates a shared definition for `class` with no arguments.
    #[must_use]
    pub fn for_class(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            arguments: ServiceArguments::new(),
            calls: Vec::new(),
            metadata: Vec::new(),
            shared: true,
        }
    }

    /// Sets the constructor arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: ServiceArguments) -> Self {
        self.arguments = arguments;
        self
    }

    /// Sets whether the container should reuse the first instance.
    #[must_use]
    pub const fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Logical class name.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Replaces the logical class name.
    pub fn set_class(&mut self, class: impl Into<String>) {
        self.class = class.into();
    }

    /// Constructor arguments.
    #[must_use]
    pub const fn arguments(&self) -> &ServiceArguments {
        &self.arguments
    }

    /// Replaces the constructor arguments.
    pub fn set_arguments(&mut self, arguments: ServiceArguments) {
        self.arguments = arguments;
    }

    /// Adds a construction action.
    ///
    /// Calls run in insertion order. Adding a call under a name that is
    /// already present replaces that call where it stands.
    pub fn add_call(&mut self, method: impl Into<String>, arguments: ServiceArguments) {
        let method = method.into();
        if let Some(slot) = self.calls.iter_mut().find(|(m, _)| *m == method) {
            slot.1 = arguments;
        } else {
            self.calls.push((method, arguments));
        }
    }

    /// Construction actions in call order.
    #[must_use]
    pub fn calls(&self) -> &[(String, ServiceArguments)] {
        &self.calls
    }

    /// Appends a data array under a metadata key.
    pub fn add_metadata(&mut self, key: impl Into<String>, data: KeyedArray<Value>) {
        let key = key.into();
        if let Some(slot) = self.metadata.iter_mut().find(|(k, _)| *k == key) {
            slot.1.push(data);
        } else {
            self.metadata.push((key, vec![data]));
        }
    }

    /// Metadata entries, grouped by key in first-seen order.
    #[must_use]
    pub fn metadata(&self) -> &[(String, Vec<KeyedArray<Value>>)] {
        &self.metadata
    }

    /// Data arrays stored under `key`.
    #[must_use]
    pub fn metadata_for(&self, key: &str) -> &[KeyedArray<Value>] {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map_or(&[][..], |(_, data)| data.as_slice())
    }

    /// Whether the container should reuse the first instance.
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        self.shared
    }

    /// Names of every service this definition depends on, constructor first.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .dependencies()
            .chain(self.calls.iter().flat_map(|(_, args)| args.dependencies()))
    }
}
