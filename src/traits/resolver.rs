//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::key::InjectionKey;

/// Core resolver trait for object-safe service resolution.
///
/// Resolves a full [`InjectionKey`] into a type-erased [`Instance`]. The
/// policy chain, the registry, lifetime dispatch and cycle detection all sit
/// behind this one method.
///
/// Most users should use the [`Resolver`] trait instead, which provides typed
/// generic methods built on top of this trait.
pub trait ResolverCore {
    /// Resolves a key to an instance.
    ///
    /// # Returns
    ///
    /// * `Ok(Instance)` - The resolved service, holding an `Arc<S>`
    /// * `Err(DiError)` - Resolution error (unregistered, circular, no scope, ...)
    fn resolve_key(&self, key: &InjectionKey) -> DiResult<Instance>;
}

/// High-level resolver interface with typed resolution methods.
///
/// Implemented for everything that implements [`ResolverCore`]: the
/// [`Container`](crate::Container), a [`ScopeHandle`](crate::ScopeHandle) and
/// the in-flight [`Resolution`](crate::Resolution) handed to factories and
/// policies.
///
/// # Examples
///
/// ```
/// use flex_inject::{Container, Constructor, Injectable, Interfaces, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".to_string() }
/// }
///
/// impl Injectable for English {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| English)]
///     }
///
///     fn interfaces(interfaces: &mut Interfaces<Self>) {
///         interfaces.provide::<dyn Greeter>(|this| this as Arc<dyn Greeter>);
///     }
/// }
///
/// let container = Container::new();
/// container.register_qualified::<dyn Greeter, English>(Lifetime::Transient, Some("en"), None).unwrap();
///
/// let greeter = container.resolve_named::<dyn Greeter>("en").unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// assert!(container.try_resolve::<dyn Greeter>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the unqualified registration of `S`.
    fn resolve<S>(&self) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve_as::<S>(&InjectionKey::of::<S>())
    }

    /// Resolves `S` registered under `name` with no tag.
    fn resolve_named<S>(&self, name: &str) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve_as::<S>(&InjectionKey::of::<S>().named(name))
    }

    /// Resolves `S` registered under `tag` with no name.
    fn resolve_tagged<S>(&self, tag: &str) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve_as::<S>(&InjectionKey::of::<S>().tagged(tag))
    }

    /// Resolves `S` with an explicit name/tag pair, either of which may be absent.
    fn resolve_qualified<S>(&self, name: Option<&str>, tag: Option<&str>) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = InjectionKey::new(crate::key::ServiceType::of::<S>(), name, tag);
        self.resolve_as::<S>(&key)
    }

    /// Resolves `key` and downcasts the result to `Arc<S>`.
    ///
    /// The key's service type should be `S`; an instance of any other type
    /// yields [`DiError::TypeMismatch`].
    fn resolve_as<S>(&self, key: &InjectionKey) -> DiResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let instance = self.resolve_key(key)?;
        instance.downcast::<S>().ok_or(DiError::TypeMismatch {
            service: std::any::type_name::<S>(),
            implementation: instance.type_name(),
        })
    }

    /// Like [`resolve`](Self::resolve), but a missing registration for `S`
    /// itself yields `Ok(None)`.
    ///
    /// A missing *dependency* of `S` is still an error.
    fn try_resolve<S>(&self) -> DiResult<Option<Arc<S>>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = InjectionKey::of::<S>();
        match self.resolve_as::<S>(&key) {
            Ok(service) => Ok(Some(service)),
            Err(DiError::UnregisteredService(missing)) if missing == key => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolves `S`, panicking on failure.
    ///
    /// Use this when wiring an application where a missing registration is a
    /// configuration bug.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved.
    fn resolve_required<S>(&self) -> Arc<S>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<S>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<S>(), e))
    }
}

impl<T: ResolverCore + ?Sized> Resolver for T {}
