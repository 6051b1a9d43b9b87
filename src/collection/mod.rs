//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type, which records
//! registrations and policies and builds a [`Container`] from them.

use std::sync::Arc;

use crate::descriptors::ServiceDescriptor;
use crate::error::DiResult;
use crate::injectable::Injectable;
use crate::key::{InjectionKey, ServiceType};
use crate::lifetime::Lifetime;
use crate::policy::ResolutionPolicy;
use crate::provider::{Container, Resolution};

pub mod module_system;
pub use module_system::*;

type Deferred = Box<dyn FnOnce(&Container) -> DiResult<()> + Send>;

/// Deferred builder for a [`Container`].
///
/// Registrations are recorded in order and replayed by
/// [`build`](Self::build), which is where duplicate keys and interface
/// mismatches surface. Nothing can be resolved before the container exists.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{Constructor, Injectable, Interfaces, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Service: Send + Sync {}
/// struct ServiceImplementation;
/// impl Service for ServiceImplementation {}
/// impl Injectable for ServiceImplementation {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| ServiceImplementation)]
///     }
///     fn interfaces(interfaces: &mut Interfaces<Self>) {
///         interfaces.provide::<dyn Service>(|this| this as Arc<dyn Service>);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<dyn Service, ServiceImplementation>();
///
/// let container = services.build().unwrap();
/// let a = container.resolve::<dyn Service>().unwrap();
/// let b = container.resolve::<dyn Service>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
    registrations: Vec<Deferred>,
    policies: Vec<Arc<dyn ResolutionPolicy>>,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Implementation Registrations -----

    /// Records `I` as the implementation of `S` under the unqualified key.
    pub fn add<S, I>(&mut self, lifetime: Lifetime) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.add_qualified::<S, I>(lifetime, None, None)
    }

    /// Records `I` as the implementation of `S` under an optional name and tag.
    pub fn add_qualified<S, I>(&mut self, lifetime: Lifetime, name: Option<&str>, tag: Option<&str>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        let key = InjectionKey::new(ServiceType::of::<S>(), name, tag);
        self.descriptors
            .push(ServiceDescriptor::new(key.clone(), lifetime, std::any::type_name::<I>()));
        self.registrations.push(Box::new(move |container: &Container| {
            container.register_implementation::<I>(key, lifetime)
        }));
        self
    }

    pub fn add_transient<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.add::<S, I>(Lifetime::Transient)
    }

    pub fn add_scoped<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.add::<S, I>(Lifetime::Scoped)
    }

    pub fn add_singleton<S, I>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.add::<S, I>(Lifetime::Singleton)
    }

    // ----- Factory and Instance Registrations -----

    /// Records a factory for `S` under the unqualified key.
    ///
    /// See [`Container::register_factory`].
    pub fn add_factory<S, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolution<'_>) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        self.add_factory_qualified::<S, F>(lifetime, None, None, factory)
    }

    /// Records a factory for `S` under an optional name and tag.
    pub fn add_factory_qualified<S, F>(
        &mut self,
        lifetime: Lifetime,
        name: Option<&str>,
        tag: Option<&str>,
        factory: F,
    ) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolution<'_>) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        let key = InjectionKey::new(ServiceType::of::<S>(), name, tag);
        self.descriptors
            .push(ServiceDescriptor::new(key.clone(), lifetime, "<factory>"));
        self.registrations.push(Box::new(move |container: &Container| {
            container.register_factory_qualified::<S, F>(lifetime, key.name(), key.tag(), factory)
        }));
        self
    }

    /// Records a pre-built singleton for `S`.
    ///
    /// A `None` instance fails the [`build`](Self::build) with
    /// [`DiError::NullSingletonInstance`](crate::DiError::NullSingletonInstance).
    pub fn add_instance<S>(&mut self, instance: Option<Arc<S>>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.add_instance_qualified::<S>(None, None, instance)
    }

    /// Records a pre-built singleton for `S` under an optional name and tag.
    pub fn add_instance_qualified<S>(&mut self, name: Option<&str>, tag: Option<&str>, instance: Option<Arc<S>>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = InjectionKey::new(ServiceType::of::<S>(), name, tag);
        self.descriptors
            .push(ServiceDescriptor::new(key.clone(), Lifetime::Singleton, std::any::type_name::<S>()));
        self.registrations.push(Box::new(move |container: &Container| {
            container.register_instance_qualified::<S>(key.name(), key.tag(), instance)
        }));
        self
    }

    // ----- Policies -----

    /// Appends a resolution policy; policies keep the order they were added in.
    pub fn add_policy<P: ResolutionPolicy>(&mut self, policy: P) -> &mut Self {
        self.policies.push(Arc::new(policy));
        self
    }

    // ----- Introspection -----

    /// Descriptors of everything recorded so far, in order.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Number of recorded registrations.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // ----- Build -----

    /// Builds a container with every recorded registration and policy.
    ///
    /// # Errors
    ///
    /// The first registration error in recording order:
    /// [`DiError::AlreadyRegistered`](crate::DiError::AlreadyRegistered),
    /// [`DiError::TypeMismatch`](crate::DiError::TypeMismatch) or
    /// [`DiError::NullSingletonInstance`](crate::DiError::NullSingletonInstance).
    pub fn build(self) -> DiResult<Container> {
        let container = Container::new();
        for policy in self.policies {
            container.add_policy_arc(policy);
        }
        for register in self.registrations {
            register(&container)?;
        }
        tracing::debug!(registrations = self.descriptors.len(), "container built");
        Ok(container)
    }
}
