//! Provider plugins.

use ctn_common::error::Result;

use crate::container::{Container, Instance};

/// A plugin able to produce several services behind one resolution call.
///
/// [`Container::register`](crate::Container::register) binds every name
/// returned by [`provides`](Self::provides) to the provider.
pub trait ServiceProvider {
    /// Names of the services this provider can produce.
    fn provides(&self) -> Vec<String>;

    /// Produces the service `name`.
    ///
    /// Returns the instance together with whether the container should
    /// cache it as a shared instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce `name`, including a
    /// name it declared in [`provides`](Self::provides) but cannot build.
    fn resolve(&self, name: &str, container: &Container) -> Result<(Instance, bool)>;
}
