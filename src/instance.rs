//! Type-erased service instances and their disposal handles.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::Dispose;

/// A resolved service with its static type erased.
///
/// Holds an `Arc<S>` for the service type `S` it was produced for, so the
/// same representation serves concrete types and trait objects alike.
/// Cloning is cheap and keeps pointing at the same underlying service.
///
/// Resolution policies build their answers with [`Instance::new`].
///
/// # Examples
///
/// ```rust
/// use flex_inject::Instance;
/// use std::sync::Arc;
///
/// trait Shape: Send + Sync {
///     fn sides(&self) -> u32;
/// }
/// struct Square;
/// impl Shape for Square {
///     fn sides(&self) -> u32 { 4 }
/// }
///
/// let instance = Instance::new::<dyn Shape>(Arc::new(Square));
/// let shape = instance.downcast::<dyn Shape>().unwrap();
/// assert_eq!(shape.sides(), 4);
/// assert!(instance.downcast::<Square>().is_none());
/// ```
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps a service that will be handed out as `Arc<S>`.
    pub fn new<S>(value: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<S>(),
        }
    }

    /// Recovers the `Arc<S>`, or `None` when this instance was produced for
    /// a different service type.
    pub fn downcast<S>(&self) -> Option<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.value.downcast_ref::<Arc<S>>().cloned()
    }

    /// Name of the service type this instance was produced for.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("type_name", &self.type_name).finish()
    }
}

/// Shared teardown handle that fires at most once.
///
/// The same handle may be reachable from more than one cache; whichever
/// disposes it first wins and later calls are no-ops.
pub(crate) struct DisposerHandle {
    target: Arc<dyn Dispose>,
    disposed: AtomicBool,
}

impl DisposerHandle {
    pub(crate) fn new(target: Arc<dyn Dispose>) -> Arc<Self> {
        Arc::new(Self {
            target,
            disposed: AtomicBool::new(false),
        })
    }

    /// Runs the teardown unless it already ran. Returns whether it ran now.
    pub(crate) fn dispose_once(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.target.dispose();
        true
    }
}

/// What a registration's activator hands back: the instance plus its
/// teardown handle, when the implementation exposes one.
#[derive(Clone)]
pub(crate) struct Produced {
    pub(crate) instance: Instance,
    pub(crate) disposer: Option<Arc<DisposerHandle>>,
}

impl Produced {
    pub(crate) fn untracked(instance: Instance) -> Self {
        Self {
            instance,
            disposer: None,
        }
    }
}
