//! # flex-inject
//!
//! An inversion-of-control container: register implementations against
//! service contracts, then resolve whole object graphs on demand.
//!
//! ## Features
//!
//! - **Qualified registrations**: a key is service type + optional name + optional tag
//! - **Lifetimes**: Transient, Scoped and Singleton
//! - **Constructor and member injection**: declared through [`Injectable`]
//! - **Circular dependency detection**: fails with the detected cycle path
//! - **Nested scopes**: a stack of unit-of-work caches per call chain
//! - **Resolution policies**: pluggable resolvers consulted before the registry
//! - **Disposal**: singletons and scoped instances are torn down at most once
//!
//! ## Quick Start
//!
//! ```rust
//! use flex_inject::{Constructor, Container, Injectable, Interfaces, Lifetime, Resolver};
//! use std::sync::Arc;
//!
//! trait Service: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//!
//! struct ServiceImplementation;
//! impl Service for ServiceImplementation {
//!     fn name(&self) -> &str { "service" }
//! }
//! impl Injectable for ServiceImplementation {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::nullary(|| ServiceImplementation)]
//!     }
//!     fn interfaces(interfaces: &mut Interfaces<Self>) {
//!         interfaces.provide::<dyn Service>(|this| this as Arc<dyn Service>);
//!     }
//! }
//!
//! struct Consumer {
//!     service: Arc<dyn Service>,
//! }
//! impl Injectable for Consumer {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::unary::<dyn Service>(|service| Consumer { service })]
//!     }
//! }
//!
//! let container = Container::new();
//! container.register::<dyn Service, ServiceImplementation>(Lifetime::Singleton).unwrap();
//! container.register::<Consumer, Consumer>(Lifetime::Transient).unwrap();
//!
//! let consumer = container.resolve::<Consumer>().unwrap();
//! assert_eq!(consumer.service.name(), "service");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once per registration and shared everywhere
//! - **Scoped**: Created once per scope; requires an open scope
//! - **Transient**: Created fresh on every resolution
//!
//! ## Scoped Services
//!
//! ```rust
//! use flex_inject::{Constructor, Container, DiError, Injectable, Lifetime, Resolver};
//! use std::sync::Arc;
//!
//! struct RequestContext;
//! impl Injectable for RequestContext {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::nullary(|| RequestContext)]
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_scoped::<RequestContext, RequestContext>().unwrap();
//!
//! assert!(matches!(container.resolve::<RequestContext>(), Err(DiError::NoActiveScope(_))));
//!
//! let first = container.open_scope();
//! let a = first.resolve::<RequestContext>().unwrap();
//! let second = container.open_scope();
//! let b = second.resolve::<RequestContext>().unwrap();
//! assert!(!Arc::ptr_eq(&a, &b));
//! ```
//!
//! ## Asynchronous call chains
//!
//! The current scope is tracked per call chain. Synchronous code gets one
//! chain per thread; async code wraps its work in [`call_chain`] so the scope
//! follows the task across `.await` points (feature `async`, on by default).
//! A tokio task outside [`call_chain`] has no current scope; resolve scoped
//! services through the [`ScopeHandle`] there.

// Module declarations
pub mod collection;
pub mod descriptors;
pub mod error;
pub mod injectable;
pub mod instance;
pub mod key;
pub mod lifetime;
pub mod policy;
pub mod provider;
pub mod traits;

mod internal;
mod registration;

// Re-exports
pub use collection::{ServiceCollection, ServiceCollectionExt, ServiceModule};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use injectable::{Arguments, BoxError, Constructor, Injectable, Interfaces, Member};
pub use instance::Instance;
#[cfg(feature = "async")]
pub use internal::call_chain;
pub use key::{InjectionKey, ServiceType};
pub use lifetime::Lifetime;
pub use policy::ResolutionPolicy;
pub use provider::{Container, Resolution, ScopeHandle, ScopeInfo};
pub use traits::{Dispose, Initialize, Resolver, ResolverCore};
