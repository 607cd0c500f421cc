//! Construction of logical class names.
//!
//! ctn sources name classes as strings (`Acme\Log`). The registry maps each
//! logical name to a constructor and each `(class, method)` pair to a
//! construction action, populated at startup by the host program.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use ctn_common::error::{CtnError, Result};

use crate::container::{Container, Instance};
use crate::service::{Arguments, ServiceDefinition};

type Constructor = Box<dyn Fn(Arguments) -> Result<Box<dyn Any>>>;
type MethodCall = Box<dyn Fn(&mut dyn Any, Arguments) -> Result<()>>;

/// Table of constructors and construction actions keyed by logical name.
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Constructor>,
    methods: HashMap<(String, String), MethodCall>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor for `class`.
    ///
    /// Registering the same name twice replaces the earlier constructor.
    pub fn class<T, F>(&mut self, class: impl Into<String>, constructor: F) -> &mut Self
    where
        T: Any,
        F: Fn(Arguments) -> Result<T> + 'static,
    {
        let boxed: Constructor =
            Box::new(move |args| constructor(args).map(|t| Box::new(t) as Box<dyn Any>));
        let _ = self.classes.insert(class.into(), boxed);
        self
    }

    /// Registers a construction action `method` on instances of `class`.
    pub fn method<T, F>(
        &mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        action: F,
    ) -> &mut Self
    where
        T: Any,
        F: Fn(&mut T, Arguments) -> Result<()> + 'static,
    {
        let class = class.into();
        let method = method.into();
        let label = format!("{class}::{method}");
        let boxed: MethodCall = Box::new(move |target, args| {
            let target = target.downcast_mut::<T>().ok_or_else(|| CtnError::Construction {
                class: label.clone(),
                message: format!("instance is not a {}", std::any::type_name::<T>()),
            })?;
            action(target, args)
        });
        let _ = self.methods.insert((class, method), boxed);
        self
    }

    /// Whether a constructor is registered for `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Whether `method` is registered for `class`.
    #[must_use]
    pub fn has_method(&self, class: &str, method: &str) -> bool {
        self.methods
            .contains_key(&(class.to_string(), method.to_string()))
    }

    /// Runs the constructor registered for `class`.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is unknown or the constructor fails.
    pub fn construct(&self, class: &str, args: Arguments) -> Result<Box<dyn Any>> {
        let constructor = self.classes.get(class).ok_or_else(|| CtnError::NotFound {
            kind: "class",
            id: class.to_string(),
        })?;
        constructor(args).map_err(|e| wrap(class, e))
    }

    /// Runs the construction action `method` on `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the method is unknown for `class` or fails.
    pub fn call(
        &self,
        class: &str,
        method: &str,
        target: &mut dyn Any,
        args: Arguments,
    ) -> Result<()> {
        let action = self
            .methods
            .get(&(class.to_string(), method.to_string()))
            .ok_or_else(|| CtnError::NotFound {
                kind: "method",
                id: format!("{class}::{method}"),
            })?;
        action(target, args).map_err(|e| wrap(class, e))
    }

    /// Builds a full instance from a definition: resolves and applies the
    /// constructor arguments, then runs every construction action in order.
    ///
    /// # Errors
    ///
    /// Returns an error if any argument cannot be resolved, or if the
    /// constructor or a construction action fails.
    pub fn instantiate(
        &self,
        definition: &ServiceDefinition,
        container: &Container,
    ) -> Result<Instance> {
        let class = definition.class();
        let args = definition.arguments().resolve(container)?;
        let mut object = self.construct(class, args)?;
        for (method, arguments) in definition.calls() {
            let args = arguments.resolve(container)?;
            self.call(class, method, &mut *object, args)?;
        }
        tracing::debug!(class, "instance constructed");
        Ok(Rc::from(object))
    }
}

/// Attributes constructor failures to the class unless they already name one.
fn wrap(class: &str, err: CtnError) -> CtnError {
    match err {
        CtnError::Construction { .. } | CtnError::NotFound { .. } | CtnError::Resolution { .. } => {
            err
        }
        other => CtnError::Construction {
            class: class.to_string(),
            message: other.to_string(),
        },
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<&String> = self.classes.keys().collect();
        classes.sort();
        f.debug_struct("ClassRegistry")
            .field("classes", &classes)
            .field("methods", &self.methods.len())
            .finish()
    }
}
