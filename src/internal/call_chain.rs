//! Call-chain-local store for the current scope of each container.
//!
//! Synchronous callers get a thread-local store. Code running inside
//! [`call_chain`] gets a tokio task-local store instead, which follows the
//! task across `.await` points and worker threads. The task-local, when
//! present, always shadows the thread-local. Tokio tasks outside
//! [`call_chain`] get neither: they have no ambient scope and must resolve
//! scoped services through a [`ScopeHandle`](crate::ScopeHandle).

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::provider::Scope;

/// Scope stacks of one call chain, keyed by container id.
///
/// Entries are weak: a dropped or disposed scope is pruned lazily the next
/// time its stack is read.
#[derive(Default, Clone)]
pub(crate) struct CallChain {
    scopes: HashMap<u64, Vec<Weak<Scope>>, ahash::RandomState>,
}

impl CallChain {
    /// Top of the container's stack, after dropping dead entries above it.
    pub(crate) fn current(&mut self, container: u64) -> Option<Arc<Scope>> {
        let stack = self.scopes.get_mut(&container)?;
        while let Some(top) = stack.last() {
            match top.upgrade() {
                Some(scope) if !scope.is_disposed() => return Some(scope),
                _ => {
                    stack.pop();
                }
            }
        }
        self.scopes.remove(&container);
        None
    }

    pub(crate) fn push(&mut self, container: u64, scope: &Arc<Scope>) {
        self.scopes.entry(container).or_default().push(Arc::downgrade(scope));
    }

    /// Removes `scope` from the container's stack wherever it sits, which
    /// makes the scope below it current again.
    pub(crate) fn remove(&mut self, container: u64, scope: &Scope) {
        if let Some(stack) = self.scopes.get_mut(&container) {
            stack.retain(|entry| !std::ptr::eq(entry.as_ptr(), scope));
            if stack.is_empty() {
                self.scopes.remove(&container);
            }
        }
    }
}

thread_local! {
    static THREAD_CHAIN: RefCell<CallChain> = RefCell::new(CallChain::default());
}

#[cfg(feature = "async")]
tokio::task_local! {
    static TASK_CHAIN: RefCell<CallChain>;
}

/// Runs `f` against the store of the calling call chain.
///
/// Returns `None` when there is no store to use: code running on a tokio
/// runtime outside [`call_chain`] shares its worker thread with unrelated
/// tasks, so the thread-local is off limits there.
///
/// `f` must not call back into the container.
pub(crate) fn with_call_chain<R>(f: impl FnOnce(&mut CallChain) -> R) -> Option<R> {
    #[cfg(feature = "async")]
    {
        if TASK_CHAIN.try_with(|_| ()).is_ok() {
            return Some(TASK_CHAIN.with(|chain| f(&mut chain.borrow_mut())));
        }
        if tokio::runtime::Handle::try_current().is_ok() {
            return None;
        }
    }
    Some(THREAD_CHAIN.with(|chain| f(&mut chain.borrow_mut())))
}

/// Runs `future` as its own call chain.
///
/// The chain starts with a copy of the caller's current scopes, taken when
/// this function is called, so a future spawned onto another task still sees
/// the scope that was current where it was created. Scopes opened inside the
/// future stay inside it.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{call_chain, Constructor, Container, Injectable, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct RequestId;
/// impl Injectable for RequestId {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| RequestId)]
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container = Container::new();
/// container.register::<RequestId, RequestId>(Lifetime::Scoped).unwrap();
///
/// let handle = call_chain({
///     let container = container.clone();
///     async move {
///         let scope = container.open_scope();
///         let first = container.resolve::<RequestId>().unwrap();
///         tokio::task::yield_now().await;
///         let second = container.resolve::<RequestId>().unwrap();
///         scope.dispose();
///         Arc::ptr_eq(&first, &second)
///     }
/// });
/// assert!(tokio::spawn(handle).await.unwrap());
///
/// // The scope opened inside the call chain never leaked out of it.
/// assert!(container.current_scope().is_none());
/// # }
/// ```
#[cfg(feature = "async")]
pub fn call_chain<F>(future: F) -> impl std::future::Future<Output = F::Output>
where
    F: std::future::Future,
{
    let inherited = with_call_chain(|chain| chain.clone()).unwrap_or_default();
    TASK_CHAIN.scope(RefCell::new(inherited), future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposed_scopes_are_pruned_from_the_top() {
        let mut chain = CallChain::default();
        let outer = Arc::new(Scope::new());
        let inner = Arc::new(Scope::new());
        chain.push(7, &outer);
        chain.push(7, &inner);

        assert!(Arc::ptr_eq(&chain.current(7).unwrap(), &inner));
        inner.dispose();
        assert!(Arc::ptr_eq(&chain.current(7).unwrap(), &outer));
        drop(outer);
        assert!(chain.current(7).is_none());
    }

    #[test]
    fn remove_restores_the_scope_below() {
        let mut chain = CallChain::default();
        let outer = Arc::new(Scope::new());
        let inner = Arc::new(Scope::new());
        chain.push(1, &outer);
        chain.push(1, &inner);

        chain.remove(1, &inner);
        assert!(Arc::ptr_eq(&chain.current(1).unwrap(), &outer));
        assert!(chain.current(2).is_none());
    }

    #[test]
    fn thread_store_is_per_thread() {
        let scope = Arc::new(Scope::new());
        with_call_chain(|chain| chain.push(42, &scope)).unwrap();

        let seen_elsewhere = std::thread::spawn(|| with_call_chain(|chain| chain.current(42).is_some()))
            .join()
            .unwrap();
        assert_eq!(seen_elsewhere, Some(false));
        assert!(with_call_chain(|chain| chain.current(42)).flatten().is_some());
        with_call_chain(|chain| chain.remove(42, &scope));
    }
}
