//! The container: registration, resolution and disposal.
//!
//! This module contains the [`Container`] type together with the scope
//! handles and the in-flight resolution context it hands out.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{DiError, DiResult};
use crate::injectable::{Injectable, Interfaces};
use crate::instance::{DisposerHandle, Instance, Produced};
use crate::internal::{with_call_chain, DisposeBag};
use crate::key::{InjectionKey, ServiceType};
use crate::lifetime::Lifetime;
use crate::policy::ResolutionPolicy;
use crate::registration::{Activator, Registration, Registry};
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;

pub use context::Resolution;
pub(crate) use scope::Scope;
pub use scope::ScopeHandle;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// The dependency injection container.
///
/// Holds the registry, the ordered policy chain and every singleton it has
/// created. Clones are cheap and share all of that state.
///
/// Resolution runs the policy chain first, then the registry; a registry hit
/// is dispatched on the registration's [`Lifetime`]. Scoped services are
/// cached in the current scope of the calling call chain (see
/// [`open_scope`](Self::open_scope)), or in the scope a [`ScopeHandle`] is
/// bound to when resolving through the handle.
///
/// # Thread Safety
///
/// `Container` is `Send + Sync`. Registration and resolution may happen from
/// any thread; a registration must complete before it is resolved.
///
/// # Examples
///
/// ```
/// use flex_inject::{Constructor, Container, DiError, Injectable, Interfaces, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Sample: Send + Sync {}
/// struct SampleImpl;
/// impl Sample for SampleImpl {}
/// impl Injectable for SampleImpl {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| SampleImpl)]
///     }
///     fn interfaces(interfaces: &mut Interfaces<Self>) {
///         interfaces.provide::<dyn Sample>(|this| this as Arc<dyn Sample>);
///     }
/// }
///
/// let container = Container::new();
/// container.register_transient::<dyn Sample, SampleImpl>().unwrap();
///
/// let a = container.resolve::<dyn Sample>().unwrap();
/// let b = container.resolve::<dyn Sample>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
///
/// // Registration is write-once per key, whatever the lifetime.
/// assert!(matches!(
///     container.register_singleton::<dyn Sample, SampleImpl>(),
///     Err(DiError::AlreadyRegistered(_))
/// ));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    id: u64,
    registry: Registry,
    policies: RwLock<Vec<Arc<dyn ResolutionPolicy>>>,
    singleton_disposers: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl ContainerInner {
    /// Disposes created singletons, last created first.
    ///
    /// Every call drains the bag, so a singleton first created after an
    /// earlier dispose is torn down by the next one, or by the drop.
    fn dispose_singletons(&self) {
        let first = !self.disposed.swap(true, Ordering::AcqRel);
        let mut bag = self.singleton_disposers.lock().take();
        let disposed = bag.run_all_reverse();
        if first {
            tracing::debug!(container = self.id, disposed, "container disposed");
        } else if disposed > 0 {
            tracing::debug!(container = self.id, disposed, "late singletons disposed");
        }
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.dispose_singletons();
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
                registry: Registry::new(),
                policies: RwLock::new(Vec::new()),
                singleton_disposers: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Snapshot of the policy chain; a policy added mid-resolution is seen by
    /// the next resolution.
    pub(crate) fn policies(&self) -> Vec<Arc<dyn ResolutionPolicy>> {
        self.inner.policies.read().clone()
    }

    pub(crate) fn track_singleton(&self, disposer: Arc<DisposerHandle>) {
        self.inner.singleton_disposers.lock().push(disposer);
    }

    // ----- Registration -----

    /// Registers `I` as the implementation of service `S` under the
    /// unqualified key.
    ///
    /// # Errors
    ///
    /// * [`DiError::TypeMismatch`] if `I` does not declare `S` among its
    ///   [`interfaces`](Injectable::interfaces)
    /// * [`DiError::AlreadyRegistered`] if the key is taken
    pub fn register<S, I>(&self, lifetime: Lifetime) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_qualified::<S, I>(lifetime, None, None)
    }

    /// Registers `I` as the implementation of service `S` under an optional
    /// name and tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_inject::{Constructor, Container, DiError, Injectable, Interfaces, Lifetime, Resolver};
    /// use std::sync::Arc;
    ///
    /// trait Sample: Send + Sync {}
    /// struct SampleImpl;
    /// impl Sample for SampleImpl {}
    /// impl Injectable for SampleImpl {
    ///     fn constructors() -> Vec<Constructor<Self>> {
    ///         vec![Constructor::nullary(|| SampleImpl)]
    ///     }
    ///     fn interfaces(interfaces: &mut Interfaces<Self>) {
    ///         interfaces.provide::<dyn Sample>(|this| this as Arc<dyn Sample>);
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_qualified::<dyn Sample, SampleImpl>(Lifetime::Transient, Some("n1"), Some("t1")).unwrap();
    /// container.register_qualified::<dyn Sample, SampleImpl>(Lifetime::Transient, Some("n2"), Some("t2")).unwrap();
    ///
    /// let one = container.resolve_qualified::<dyn Sample>(Some("n1"), Some("t1")).unwrap();
    /// let two = container.resolve_qualified::<dyn Sample>(Some("n2"), Some("t2")).unwrap();
    /// assert!(!Arc::ptr_eq(&one, &two));
    /// assert!(matches!(container.resolve::<dyn Sample>(), Err(DiError::UnregisteredService(_))));
    /// ```
    pub fn register_qualified<S, I>(&self, lifetime: Lifetime, name: Option<&str>, tag: Option<&str>) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        let key = InjectionKey::new(ServiceType::of::<S>(), name, tag);
        self.register_implementation::<I>(key, lifetime)
    }

    /// Registers a transient implementation.
    pub fn register_transient<S, I>(&self) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register::<S, I>(Lifetime::Transient)
    }

    /// Registers a scoped implementation.
    pub fn register_scoped<S, I>(&self) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register::<S, I>(Lifetime::Scoped)
    }

    /// Registers a singleton implementation.
    pub fn register_singleton<S, I>(&self) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register::<S, I>(Lifetime::Singleton)
    }

    /// Registers `I` under an arbitrary key; the key's service type must be
    /// one of `I`'s interfaces.
    pub(crate) fn register_implementation<I: Injectable>(&self, key: InjectionKey, lifetime: Lifetime) -> DiResult<()> {
        let implementation = std::any::type_name::<I>();
        let mut interfaces = Interfaces::<I>::of_type();
        I::interfaces(&mut interfaces);
        let upcast = interfaces
            .upcast_to(key.service_type())
            .ok_or(DiError::TypeMismatch {
                service: key.service_type().name(),
                implementation,
            })?;

        let activator: Activator = Arc::new(move |resolution: &Resolution<'_>| {
            let value = Arc::new(resolution.activate::<I>()?);
            let disposer = I::disposer(&value).map(DisposerHandle::new);
            Ok(Produced {
                instance: upcast(value),
                disposer,
            })
        });
        self.insert(key, Registration::new(lifetime, implementation, activator))
    }

    /// Registers a factory for service `S` under the unqualified key.
    ///
    /// The factory resolves its dependencies through the [`Resolution`] it is
    /// given. What it returns is cached per `lifetime` but never disposed by
    /// the container.
    pub fn register_factory<S, F>(&self, lifetime: Lifetime, factory: F) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolution<'_>) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        self.register_factory_qualified::<S, F>(lifetime, None, None, factory)
    }

    /// Registers a factory for service `S` under an optional name and tag.
    pub fn register_factory_qualified<S, F>(
        &self,
        lifetime: Lifetime,
        name: Option<&str>,
        tag: Option<&str>,
        factory: F,
    ) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolution<'_>) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        let key = InjectionKey::new(ServiceType::of::<S>(), name, tag);
        let activator: Activator = Arc::new(move |resolution: &Resolution<'_>| {
            factory(resolution).map(|service| Produced::untracked(Instance::new::<S>(service)))
        });
        self.insert(key, Registration::new(lifetime, "<factory>", activator))
    }

    /// Registers a pre-built singleton for service `S` under the unqualified
    /// key.
    ///
    /// # Errors
    ///
    /// [`DiError::NullSingletonInstance`] when `instance` is `None`.
    pub fn register_instance<S>(&self, instance: Option<Arc<S>>) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.register_instance_qualified::<S>(None, None, instance)
    }

    /// Registers a pre-built singleton for service `S` under an optional name
    /// and tag.
    pub fn register_instance_qualified<S>(
        &self,
        name: Option<&str>,
        tag: Option<&str>,
        instance: Option<Arc<S>>,
    ) -> DiResult<()>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let service = ServiceType::of::<S>();
        let instance = instance.ok_or(DiError::NullSingletonInstance(service.name()))?;
        let key = InjectionKey::new(service, name, tag);
        let produced = Produced::untracked(Instance::new::<S>(instance));
        self.insert(key, Registration::prebuilt(service.name(), produced))
    }

    fn insert(&self, key: InjectionKey, registration: Registration) -> DiResult<()> {
        let lifetime = registration.lifetime;
        let implementation = registration.implementation;
        self.inner.registry.insert(key.clone(), registration)?;
        tracing::debug!(service = %key, implementation, %lifetime, "registered");
        Ok(())
    }

    /// Whether a registration exists for exactly `key`.
    ///
    /// Policies are not consulted.
    pub fn is_registered(&self, key: &InjectionKey) -> bool {
        self.inner.registry.contains_key(key)
    }

    /// Number of registrations.
    pub fn registration_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Appends a policy to the chain. Policies cannot be removed.
    pub fn add_policy<P: ResolutionPolicy>(&self, policy: P) {
        self.add_policy_arc(Arc::new(policy));
    }

    pub(crate) fn add_policy_arc(&self, policy: Arc<dyn ResolutionPolicy>) {
        let mut policies = self.inner.policies.write();
        policies.push(policy);
        tracing::debug!(container = self.inner.id, policies = policies.len(), "policy added");
    }

    // ----- Scopes -----

    /// Opens a scope and makes it the current scope of the calling call
    /// chain until the returned handle is disposed or dropped.
    ///
    /// Opening a scope while another is current nests it; the outer scope
    /// becomes current again when the inner one is disposed.
    pub fn open_scope(&self) -> ScopeHandle {
        ScopeHandle::open(self.clone())
    }

    /// Whether a scope is current for this container on the calling call
    /// chain.
    pub fn current_scope(&self) -> Option<ScopeInfo> {
        self.ambient_scope().map(|scope| ScopeInfo {
            id: scope.id(),
            cached_instances: scope.len(),
        })
    }

    fn ambient_scope(&self) -> Option<Arc<Scope>> {
        let id = self.inner.id;
        with_call_chain(|chain| chain.current(id)).flatten()
    }

    // ----- Disposal -----

    /// Disposes every created disposable singleton, last created first, then
    /// the current scope of the calling call chain, if any.
    ///
    /// Singletons that were never resolved are not created for this. Calling
    /// `dispose` again only disposes singletons created and a scope made
    /// current since the previous call; each instance is disposed once.
    ///
    /// # Examples
    ///
    /// ```
    /// use flex_inject::{Constructor, Container, Dispose, Injectable, Lifetime, Resolver};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// static DISPOSED: AtomicUsize = AtomicUsize::new(0);
    ///
    /// struct Connection;
    /// impl Dispose for Connection {
    ///     fn dispose(&self) {
    ///         DISPOSED.fetch_add(1, Ordering::SeqCst);
    ///     }
    /// }
    /// impl Injectable for Connection {
    ///     fn constructors() -> Vec<Constructor<Self>> {
    ///         vec![Constructor::nullary(|| Connection)]
    ///     }
    ///     fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
    ///         Some(this.clone())
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_singleton::<Connection, Connection>().unwrap();
    /// let _connection = container.resolve::<Connection>().unwrap();
    ///
    /// container.dispose();
    /// container.dispose();
    /// assert_eq!(DISPOSED.load(Ordering::SeqCst), 1);
    /// ```
    pub fn dispose(&self) {
        self.inner.dispose_singletons();
        if let Some(scope) = self.ambient_scope() {
            let id = self.inner.id;
            with_call_chain(|chain| chain.remove(id, &scope));
            scope.dispose();
        }
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl ResolverCore for Container {
    fn resolve_key(&self, key: &InjectionKey) -> DiResult<Instance> {
        Resolution::new(self, self.ambient_scope()).resolve_key(key)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("registrations", &self.inner.registry.len())
            .field("policies", &self.inner.policies.read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Snapshot of the current scope, as returned by
/// [`Container::current_scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeInfo {
    /// Process-unique scope id
    pub id: u64,
    /// Scoped instances cached so far
    pub cached_instances: usize,
}
