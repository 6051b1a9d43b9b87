//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// Fixed for the life of a registration; there are no transitions between
/// lifetimes.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{Container, Injectable, Constructor, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| Clock)]
///     }
/// }
///
/// let container = Container::new();
/// container.register::<Clock, Clock>(Lifetime::Singleton).unwrap();
///
/// // Singleton: same instance from the root and from any scope
/// let a = container.resolve::<Clock>().unwrap();
/// let scope = container.open_scope();
/// let b = scope.resolve::<Clock>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// New instance per resolution, never cached
    ///
    /// The container does not track transient instances, so they are never
    /// disposed by it.
    Transient,
    /// Single instance per scope, cached for the scope's lifetime
    ///
    /// Resolving a scoped service requires an open scope. Sibling and nested
    /// scopes each build their own instance.
    Scoped,
    /// Single instance per registration, cached until the container is disposed
    ///
    /// Created on first resolution under a per-registration lock; every later
    /// resolution, from any scope or thread, returns the same instance.
    Singleton,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifetime::Transient => "transient",
            Lifetime::Scoped => "scoped",
            Lifetime::Singleton => "singleton",
        };
        f.write_str(name)
    }
}
