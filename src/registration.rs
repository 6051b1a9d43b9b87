//! Service registration types and the registry.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::instance::Produced;
use crate::key::InjectionKey;
use crate::lifetime::Lifetime;
use crate::provider::Resolution;

/// Builds a fresh instance for a registration: either the resolver's
/// constructor-injection routine for an implementation type, or a factory.
pub(crate) type Activator = Arc<dyn for<'a> Fn(&Resolution<'a>) -> DiResult<Produced> + Send + Sync>;

/// Service registration with lifetime and activator
///
/// Owns the singleton slot. The slot is read without locking; the first
/// creation happens under `creation`, so racing first resolutions produce
/// exactly one instance.
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    /// Implementation type name for diagnostics
    pub(crate) implementation: &'static str,
    activator: Activator,
    singleton: OnceCell<Produced>,
    creation: Mutex<()>,
}

impl Registration {
    pub(crate) fn new(lifetime: Lifetime, implementation: &'static str, activator: Activator) -> Self {
        Self {
            lifetime,
            implementation,
            activator,
            singleton: OnceCell::new(),
            creation: Mutex::new(()),
        }
    }

    /// Registration whose singleton slot is filled up front.
    pub(crate) fn prebuilt(implementation: &'static str, produced: Produced) -> Self {
        let activator_value = produced.clone();
        let registration = Self::new(
            Lifetime::Singleton,
            implementation,
            Arc::new(move |_: &Resolution<'_>| Ok(activator_value.clone())),
        );
        // Fresh cell, cannot already be set.
        let _ = registration.singleton.set(produced);
        registration
    }

    /// Lifetime dispatch for one resolution of `key`.
    pub(crate) fn instance(&self, resolution: &Resolution<'_>, key: &InjectionKey) -> DiResult<Produced> {
        match self.lifetime {
            Lifetime::Transient => (self.activator)(resolution),
            Lifetime::Singleton => self.singleton_instance(resolution, key),
            Lifetime::Scoped => {
                let scope = resolution
                    .scope()
                    .ok_or(DiError::NoActiveScope(key.service_type().name()))?;
                scope.get_or_create(key, || (self.activator)(resolution))
            }
        }
    }

    fn singleton_instance(&self, resolution: &Resolution<'_>, key: &InjectionKey) -> DiResult<Produced> {
        // Fast path: already created
        if let Some(produced) = self.singleton.get() {
            return Ok(produced.clone());
        }

        let _guard = self.creation.lock();
        if let Some(produced) = self.singleton.get() {
            return Ok(produced.clone());
        }

        tracing::debug!(service = %key, implementation = self.implementation, "creating singleton");
        let produced = (self.activator)(resolution)?;
        if let Some(disposer) = &produced.disposer {
            resolution.container().track_singleton(disposer.clone());
        }
        // Only this thread can set the cell while the creation lock is held.
        let _ = self.singleton.set(produced.clone());
        Ok(produced)
    }
}

/// Service registry holding all registrations
///
/// Sharded concurrent map: reads never block each other and
/// [`insert`](Self::insert) is an atomic insert-if-absent, which is what
/// makes registration write-once per key.
pub(crate) struct Registry {
    entries: DashMap<InjectionKey, Arc<Registration>, ahash::RandomState>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Inserts a registration unless the key is already taken.
    pub(crate) fn insert(&self, key: InjectionKey, registration: Registration) -> DiResult<()> {
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => Err(DiError::AlreadyRegistered(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(registration));
                Ok(())
            }
        }
    }

    /// Gets a registration; the returned `Arc` outlives the map guard so
    /// resolution never holds a shard lock.
    #[inline(always)]
    pub(crate) fn get(&self, key: &InjectionKey) -> Option<Arc<Registration>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn contains_key(&self, key: &InjectionKey) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
