/// Concurrent access integration tests
///
/// These tests verify that flex-inject behaves correctly under concurrent access,
/// testing singleton consistency, write-once registration and scope isolation.

use crossbeam_utils::thread;
use flex_inject::{Constructor, Container, DiError, Dispose, Injectable, Lifetime, Resolver};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

// ===== Test Services =====

static SLOW_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

struct SlowSingleton {
    id: usize,
}

impl Injectable for SlowSingleton {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::nullary(|| {
            let id = SLOW_CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            SlowSingleton { id }
        })]
    }
}

struct CounterService {
    count: AtomicU32,
}

impl CounterService {
    fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Injectable for CounterService {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::nullary(|| CounterService {
            count: AtomicU32::new(0),
        })]
    }
}

static REQUEST_DISPOSALS: AtomicUsize = AtomicUsize::new(0);

struct RequestState;

impl Dispose for RequestState {
    fn dispose(&self) {
        REQUEST_DISPOSALS.fetch_add(1, Ordering::SeqCst);
    }
}

impl Injectable for RequestState {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::nullary(|| {
            std::thread::sleep(Duration::from_millis(5));
            RequestState
        })]
    }

    fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
        Some(this.clone())
    }
}

// ===== Tests =====

#[test]
fn test_concurrent_first_singleton_resolution_creates_once() {
    let container = Container::new();
    container.register_singleton::<SlowSingleton, SlowSingleton>().unwrap();
    let barrier = Barrier::new(8);

    let resolved: Vec<Arc<SlowSingleton>> = thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    container.resolve::<SlowSingleton>().unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(SLOW_CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    assert_eq!(resolved[0].id, 0);
}

#[test]
fn test_concurrent_registration_is_write_once() {
    let container = Container::new();
    let barrier = Barrier::new(6);

    let outcomes: Vec<Result<(), DiError>> = thread::scope(|s| {
        let workers: Vec<_> = (0..6u32)
            .map(|value| {
                let container = &container;
                let barrier = &barrier;
                s.spawn(move |_| {
                    barrier.wait();
                    container.register_instance(Some(Arc::new(value)))
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, DiError::AlreadyRegistered(_))));
    assert_eq!(container.registration_count(), 1);
}

#[test]
fn test_shared_singleton_state_across_threads() {
    let container = Container::new();
    container.register_singleton::<CounterService, CounterService>().unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                for _ in 0..250 {
                    container.resolve::<CounterService>().unwrap().increment();
                }
            });
        }
    })
    .unwrap();

    assert_eq!(container.resolve::<CounterService>().unwrap().increment(), 1001);
}

#[test]
fn test_scopes_are_isolated_per_thread() {
    let container = Container::new();
    container.register_scoped::<CounterService, CounterService>().unwrap();

    let per_thread: Vec<(u32, bool)> = thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|_| {
                    let scope = container.open_scope();
                    let first = container.resolve::<CounterService>().unwrap();
                    for _ in 0..10 {
                        container.resolve::<CounterService>().unwrap().increment();
                    }
                    let same = Arc::ptr_eq(&first, &container.resolve::<CounterService>().unwrap());
                    let count = first.increment();
                    scope.dispose();
                    (count, same)
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    })
    .unwrap();

    for (count, same) in per_thread {
        assert!(same);
        assert_eq!(count, 11);
    }
    // The scopes never leaked to this thread.
    assert!(container.current_scope().is_none());
}

#[test]
fn test_scope_opened_on_one_thread_is_not_ambient_on_another() {
    let container = Container::new();
    container.register_scoped::<CounterService, CounterService>().unwrap();
    let _scope = container.open_scope();

    let other = thread::scope(|s| s.spawn(|_| container.resolve::<CounterService>()).join().unwrap()).unwrap();
    assert!(matches!(other, Err(DiError::NoActiveScope(_))));
    assert!(container.resolve::<CounterService>().is_ok());
}

#[test]
fn test_scoped_instance_disposed_once_under_contention() {
    let container = Container::new();
    container.register::<RequestState, RequestState>(Lifetime::Scoped).unwrap();

    let scope = container.open_scope();
    let barrier = Barrier::new(4);
    let resolved: Vec<Arc<RequestState>> = thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    // Explicit scope handle: the ambient scope belongs to the main thread.
                    scope.resolve::<RequestState>().unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    })
    .unwrap();

    // Racing creators may each construct, but everyone gets the cached winner.
    assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    assert_eq!(scope.cached_instances(), 1);

    let losers = REQUEST_DISPOSALS.load(Ordering::SeqCst);
    scope.dispose();
    scope.dispose();
    assert_eq!(REQUEST_DISPOSALS.load(Ordering::SeqCst), losers + 1);
}
