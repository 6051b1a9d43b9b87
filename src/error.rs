//! Error types for the container.

use std::fmt;
use std::sync::Arc;

use crate::key::InjectionKey;

/// Container errors
///
/// Every registration and resolution failure surfaces synchronously to the
/// caller as one of these variants. None of them are retried internally.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{Container, DiError, InjectionKey, Resolver};
///
/// trait Sample: Send + Sync {}
///
/// let container = Container::new();
/// match container.resolve::<dyn Sample>() {
///     Err(DiError::UnregisteredService(key)) => {
///         assert_eq!(key, InjectionKey::of::<dyn Sample>());
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use flex_inject::DiError;
///
/// let circular = DiError::CircularDependency(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency detected: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// A registration with the same type, name and tag already exists
    AlreadyRegistered(InjectionKey),
    /// The implementation cannot be bound to (or downcast as) the service type
    TypeMismatch {
        service: &'static str,
        implementation: &'static str,
    },
    /// No registration and no policy produced the requested key
    UnregisteredService(InjectionKey),
    /// The requested type is already being resolved on this call chain (includes path)
    CircularDependency(Vec<&'static str>),
    /// A scoped service was requested with no scope open
    NoActiveScope(&'static str),
    /// The implementation declares no constructor
    NoPublicConstructor(&'static str),
    /// Constructor, member setter or factory failed
    ConstructionFailed {
        implementation: &'static str,
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    /// A singleton instance registration was given no instance
    NullSingletonInstance(&'static str),
}

impl DiError {
    /// Wraps an arbitrary cause as a [`DiError::ConstructionFailed`].
    ///
    /// Factories use this to report their own failures.
    pub fn construction_failed<E>(implementation: &'static str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DiError::ConstructionFailed {
            implementation,
            source: Arc::from(source.into()),
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::AlreadyRegistered(key) => write!(f, "Type {} is already registered", key),
            DiError::TypeMismatch { service, implementation } => {
                write!(f, "Type {} does not implement {}", implementation, service)
            }
            DiError::UnregisteredService(key) => write!(f, "Type {} is not registered", key),
            DiError::CircularDependency(path) => {
                write!(f, "Circular dependency detected: {}", path.join(" -> "))
            }
            DiError::NoActiveScope(name) => write!(
                f,
                "Attempted to resolve scoped service {} without an active scope",
                name
            ),
            DiError::NoPublicConstructor(name) => write!(f, "No public constructors found for {}", name),
            DiError::ConstructionFailed { implementation, source } => {
                write!(f, "Failed to create an instance of {}: {}", implementation, source)
            }
            DiError::NullSingletonInstance(name) => {
                write!(f, "Singleton instance for {} was not supplied", name)
            }
        }
    }
}

impl std::error::Error for DiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiError::ConstructionFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type for container operations
///
/// A convenience alias for `Result<T, DiError>` used throughout flex-inject.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::NoPublicConstructor("app::Widget"))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
