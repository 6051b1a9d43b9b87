//! Service module system for modular registration.
//!
//! This module provides traits and functionality for organizing service
//! registrations into reusable modules.

use crate::collection::ServiceCollection;
use crate::error::DiResult;

/// A reusable group of registrations.
///
/// # Example
///
/// ```rust
/// use flex_inject::{
///     Constructor, DiResult, Injectable, Resolver, ServiceCollection, ServiceCollectionExt, ServiceModule,
/// };
///
/// struct UserConfig;
/// impl Injectable for UserConfig {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| UserConfig)]
///     }
/// }
///
/// struct UserModule;
///
/// impl ServiceModule for UserModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services.add_singleton::<UserConfig, UserConfig>();
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let container = ServiceCollection::new().add_module(UserModule)?.build()?;
/// let _config = container.resolve::<UserConfig>()?;
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Records this module's registrations into `services`.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Module registration for [`ServiceCollection`].
pub trait ServiceCollectionExt {
    /// Adds a module by value, for chaining off `ServiceCollection::new()`.
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;

    /// Adds a module in place.
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        module.register_services(&mut self)?;
        Ok(self)
    }

    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_services(self)?;
        Ok(self)
    }
}
