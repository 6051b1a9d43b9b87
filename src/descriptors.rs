//! Service descriptors for introspection and diagnostics.

use crate::key::InjectionKey;
use crate::lifetime::Lifetime;

/// Service descriptor for introspection and diagnostics
///
/// Records what a [`ServiceCollection`](crate::ServiceCollection) will
/// register once it is built: the key, the lifetime and the implementation.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{Constructor, Injectable, Lifetime, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database;
/// impl Injectable for Database {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| Database)]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Database, Database>();
/// services.add_qualified::<Database, Database>(Lifetime::Scoped, Some("replica"), None);
/// services.add_instance(Some(Arc::new(42u32)));
///
/// let descriptors = services.descriptors();
/// assert_eq!(descriptors.len(), 3);
///
/// let replica = descriptors.iter().find(|d| d.service_name() == Some("replica")).unwrap();
/// assert_eq!(replica.lifetime, Lifetime::Scoped);
/// assert!(replica.implementation.ends_with("Database"));
///
/// let singletons = descriptors.iter().filter(|d| d.lifetime == Lifetime::Singleton).count();
/// assert_eq!(singletons, 2);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The key the registration will be stored under
    pub key: InjectionKey,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Implementation type name, or `<factory>` / the service type for
    /// factory and instance registrations
    pub implementation: &'static str,
}

impl ServiceDescriptor {
    pub(crate) fn new(key: InjectionKey, lifetime: Lifetime, implementation: &'static str) -> Self {
        Self {
            key,
            lifetime,
            implementation,
        }
    }

    /// Service type name.
    pub fn type_name(&self) -> &'static str {
        self.key.service_type().name()
    }

    /// Registration name, if any.
    pub fn service_name(&self) -> Option<&str> {
        self.key.name()
    }

    /// Registration tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.key.tag()
    }

    /// True when the registration carries a name or a tag.
    pub fn is_qualified(&self) -> bool {
        !self.key.is_unqualified()
    }
}
