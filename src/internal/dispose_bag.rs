//! Internal disposal bag for managing teardown handles.

use std::sync::Arc;

use crate::instance::DisposerHandle;

/// Teardown handles with LIFO execution order.
///
/// Handles are shared with the caches that produced them; each fires at most
/// once no matter how many bags hold it.
#[derive(Default)]
pub(crate) struct DisposeBag {
    handles: Vec<Arc<DisposerHandle>>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, handle: Arc<DisposerHandle>) {
        self.handles.push(handle);
    }

    /// Detaches the current contents, leaving the bag empty.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }

    /// Runs every handle in reverse order (LIFO). Returns how many fired now.
    pub(crate) fn run_all_reverse(&mut self) -> usize {
        let mut fired = 0;
        while let Some(handle) = self.handles.pop() {
            if handle.dispose_once() {
                fired += 1;
            }
        }
        fired
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
