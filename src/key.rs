//! Service identity types for the container.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a service contract or implementation type.
///
/// Works for concrete types as well as trait objects (`dyn Logger`), since
/// `TypeId::of` accepts any `?Sized + 'static` type. The type name is carried
/// along purely for diagnostics.
///
/// # Examples
///
/// ```rust
/// use flex_inject::ServiceType;
///
/// trait Logger: Send + Sync {}
///
/// let a = ServiceType::of::<dyn Logger>();
/// let b = ServiceType::of::<dyn Logger>();
/// assert_eq!(a, b);
/// assert_ne!(a, ServiceType::of::<String>());
/// assert!(a.name().contains("Logger"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
}

impl ServiceType {
    /// Returns the identity of `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` backing this identity.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name (`std::any::type_name`).
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// Identity is the TypeId alone; the name never participates.
impl PartialEq for ServiceType {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Key for registration storage and lookup.
///
/// A key is the combination of service type, optional name and optional tag.
/// Two keys are equal only when all three components are equal, so a service
/// registered with a name is not reachable through the unqualified key and
/// vice versa.
///
/// # Examples
///
/// ```rust
/// use flex_inject::InjectionKey;
///
/// trait Sample: Send + Sync {}
///
/// let plain = InjectionKey::of::<dyn Sample>();
/// let named = InjectionKey::of::<dyn Sample>().named("n1");
/// let qualified = InjectionKey::of::<dyn Sample>().named("n1").tagged("t1");
///
/// assert_ne!(plain, named);
/// assert_ne!(named, qualified);
/// assert_eq!(qualified, InjectionKey::new(flex_inject::ServiceType::of::<dyn Sample>(), Some("n1"), Some("t1")));
/// assert_eq!(qualified.name(), Some("n1"));
/// assert_eq!(plain.tag(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectionKey {
    service: ServiceType,
    name: Option<Arc<str>>,
    tag: Option<Arc<str>>,
}

impl InjectionKey {
    /// Builds a key from its three components.
    pub fn new(service: ServiceType, name: Option<&str>, tag: Option<&str>) -> Self {
        Self {
            service,
            name: name.map(Arc::from),
            tag: tag.map(Arc::from),
        }
    }

    /// Unqualified key for service type `S`.
    #[inline(always)]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            service: ServiceType::of::<S>(),
            name: None,
            tag: None,
        }
    }

    /// Returns this key with the given name qualifier.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    /// Returns this key with the given tag qualifier.
    pub fn tagged(mut self, tag: &str) -> Self {
        self.tag = Some(Arc::from(tag));
        self
    }

    pub fn service_type(&self) -> ServiceType {
        self.service
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// True when neither a name nor a tag is set.
    pub fn is_unqualified(&self) -> bool {
        self.name.is_none() && self.tag.is_none()
    }
}

impl From<ServiceType> for InjectionKey {
    fn from(service: ServiceType) -> Self {
        Self {
            service,
            name: None,
            tag: None,
        }
    }
}

impl fmt::Display for InjectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with name '{}' and tag '{}'",
            self.service.name,
            self.name().unwrap_or("default"),
            self.tag().unwrap_or("default"),
        )
    }
}
