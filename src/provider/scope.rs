//! Scoped instance caches and the handles that own them.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Container, Resolution};
use crate::error::DiResult;
use crate::instance::{Instance, Produced};
use crate::internal::{with_call_chain, DisposeBag};
use crate::key::InjectionKey;
use crate::traits::ResolverCore;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Cache of scoped instances for one unit of work.
///
/// Each scope is independent: a nested scope never sees its parent's
/// instances. Creation happens outside the cache lock, so a factory may
/// resolve other scoped services of the same scope.
pub(crate) struct Scope {
    id: u64,
    instances: Mutex<HashMap<InjectionKey, Instance, ahash::RandomState>>,
    disposers: Mutex<DisposeBag>,
    disposed: AtomicBool,
}

impl Scope {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            instances: Mutex::new(HashMap::default()),
            disposers: Mutex::new(DisposeBag::default()),
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Returns the cached instance for `key`, creating it on first use.
    ///
    /// When two callers race on the same key, the first insert wins and the
    /// loser's instance is torn down before it escapes.
    pub(crate) fn get_or_create(
        &self,
        key: &InjectionKey,
        create: impl FnOnce() -> DiResult<Produced>,
    ) -> DiResult<Produced> {
        if let Some(instance) = self.instances.lock().get(key) {
            return Ok(Produced::untracked(instance.clone()));
        }

        let produced = create()?;

        let mut instances = self.instances.lock();
        match instances.entry(key.clone()) {
            Entry::Occupied(existing) => {
                let winner = existing.get().clone();
                drop(instances);
                if let Some(disposer) = &produced.disposer {
                    tracing::trace!(scope = self.id, service = %key, "discarding raced scoped instance");
                    disposer.dispose_once();
                }
                Ok(Produced::untracked(winner))
            }
            Entry::Vacant(slot) => {
                slot.insert(produced.instance.clone());
                drop(instances);
                if let Some(disposer) = &produced.disposer {
                    self.disposers.lock().push(disposer.clone());
                }
                Ok(produced)
            }
        }
    }

    /// Number of cached scoped instances.
    pub(crate) fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Tears down every disposable instance this scope created, last created
    /// first. Only the first call has any effect.
    pub(crate) fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut bag = self.disposers.lock().take();
        let disposed = bag.run_all_reverse();
        self.instances.lock().clear();
        tracing::debug!(scope = self.id, disposed, "scope disposed");
    }
}

/// A unit-of-work scope opened by [`Container::open_scope`].
///
/// While the handle is alive its scope is the current scope of the call
/// chain that opened it, so plain `container.resolve` calls made on that
/// chain see it. The handle is also a resolver bound to its scope directly,
/// which works from any thread.
///
/// Disposing the handle, explicitly or by dropping it, tears down the
/// disposable scoped instances and makes the previous scope current again.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{Container, Constructor, Injectable, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct UnitOfWork;
/// impl Injectable for UnitOfWork {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| UnitOfWork)]
///     }
/// }
///
/// let container = Container::new();
/// container.register::<UnitOfWork, UnitOfWork>(Lifetime::Scoped).unwrap();
///
/// let outer = container.open_scope();
/// let a = outer.resolve::<UnitOfWork>().unwrap();
/// assert!(Arc::ptr_eq(&a, &container.resolve::<UnitOfWork>().unwrap()));
///
/// {
///     let inner = container.open_scope();
///     let b = container.resolve::<UnitOfWork>().unwrap();
///     assert!(!Arc::ptr_eq(&a, &b));
///     inner.dispose();
/// }
///
/// // The outer scope is current again.
/// assert!(Arc::ptr_eq(&a, &container.resolve::<UnitOfWork>().unwrap()));
/// ```
pub struct ScopeHandle {
    container: Container,
    scope: Arc<Scope>,
}

impl ScopeHandle {
    pub(crate) fn open(container: Container) -> Self {
        let scope = Arc::new(Scope::new());
        let container_id = container.id();
        if with_call_chain(|chain| chain.push(container_id, &scope)).is_none() {
            tracing::warn!(
                scope = scope.id(),
                container = container_id,
                "scope opened on a tokio task outside call_chain; it is only reachable through its handle"
            );
        }
        tracing::debug!(scope = scope.id(), container = container_id, "scope opened");
        Self { container, scope }
    }

    /// The container this scope belongs to.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Whether this scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.scope.is_disposed()
    }

    /// Number of scoped instances created so far in this scope.
    pub fn cached_instances(&self) -> usize {
        self.scope.len()
    }

    /// Disposes the scope. Later calls, and the drop that follows, do nothing.
    pub fn dispose(&self) {
        let container_id = self.container.id();
        with_call_chain(|chain| chain.remove(container_id, &self.scope));
        self.scope.dispose();
    }
}

impl ResolverCore for ScopeHandle {
    fn resolve_key(&self, key: &InjectionKey) -> DiResult<Instance> {
        let scope = (!self.scope.is_disposed()).then(|| self.scope.clone());
        Resolution::new(&self.container, scope).resolve_key(key)
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ScopeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeHandle")
            .field("id", &self.scope.id())
            .field("disposed", &self.scope.is_disposed())
            .finish()
    }
}
