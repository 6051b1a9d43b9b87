//! Lifecycle capabilities: post-construction initialization and teardown.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (flushing
/// caches, closing connections) and expose it from
/// [`Injectable::disposer`](crate::Injectable::disposer). The container runs
/// it for singletons on container disposal and for scoped instances when
/// their scope closes, at most once per instance. Transient instances are
/// never tracked and never disposed by the container.
///
/// # Examples
///
/// ```
/// use flex_inject::{Container, Constructor, Dispose, Injectable, Lifetime, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Cache {
///     flushed: AtomicBool,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// impl Injectable for Cache {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(Cache::default)]
///     }
///
///     fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
///         Some(this.clone())
///     }
/// }
///
/// let container = Container::new();
/// container.register::<Cache, Cache>(Lifetime::Singleton).unwrap();
/// let cache = container.resolve::<Cache>().unwrap();
/// container.dispose();
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Post-construction initialization hook.
///
/// Runs exactly once per created instance, after constructor and member
/// injection completed and before the instance is handed to any caller.
/// Because the instance is not shared yet, the hook receives `&mut self`.
pub trait Initialize {
    fn initialize(&mut self);
}
