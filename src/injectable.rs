//! Implementation metadata: constructors, injectable members and the
//! service contracts a type can be bound to.
//!
//! Rust has no runtime reflection, so each implementation type describes
//! itself through [`Injectable`]. The resolver only ever consumes these
//! declarative lists; it never inspects a type any other way.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::instance::Instance;
use crate::key::{InjectionKey, ServiceType};
use crate::traits::{Dispose, Initialize};

/// Boxed error returned by constructors and member setters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A type the container can build through constructor and member injection.
///
/// Only [`constructors`](Self::constructors) is required. The other hooks
/// default to "nothing to declare".
///
/// # Examples
///
/// ```
/// use flex_inject::{Container, Constructor, Injectable, Interfaces, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Service: Send + Sync {}
/// trait Consumer: Send + Sync {
///     fn service(&self) -> &Arc<dyn Service>;
/// }
///
/// struct ServiceImpl;
/// impl Service for ServiceImpl {}
/// impl Injectable for ServiceImpl {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::nullary(|| ServiceImpl)]
///     }
///     fn interfaces(interfaces: &mut Interfaces<Self>) {
///         interfaces.provide::<dyn Service>(|this| this as Arc<dyn Service>);
///     }
/// }
///
/// struct ConsumerImpl {
///     service: Arc<dyn Service>,
/// }
/// impl Consumer for ConsumerImpl {
///     fn service(&self) -> &Arc<dyn Service> { &self.service }
/// }
/// impl Injectable for ConsumerImpl {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::unary::<dyn Service>(|service| ConsumerImpl { service })]
///     }
///     fn interfaces(interfaces: &mut Interfaces<Self>) {
///         interfaces.provide::<dyn Consumer>(|this| this as Arc<dyn Consumer>);
///     }
/// }
///
/// let container = Container::new();
/// container.register::<dyn Service, ServiceImpl>(Lifetime::Transient).unwrap();
/// container.register::<dyn Consumer, ConsumerImpl>(Lifetime::Transient).unwrap();
///
/// let consumer = container.resolve::<dyn Consumer>().unwrap();
/// let _service = consumer.service();
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The public constructors of this type.
    ///
    /// The resolver uses the one with the most parameters; among equally
    /// long constructors the first listed wins. An empty list makes the
    /// type unresolvable ([`DiError::NoPublicConstructor`](crate::DiError::NoPublicConstructor)).
    fn constructors() -> Vec<Constructor<Self>>;

    /// Members injected after construction, in order.
    fn members() -> Vec<Member<Self>> {
        Vec::new()
    }

    /// Service contracts this type may be registered under.
    ///
    /// The type itself is always included.
    fn interfaces(interfaces: &mut Interfaces<Self>) {
        let _ = interfaces;
    }

    /// Initialization capability, run once after all injection.
    fn initializer(&mut self) -> Option<&mut dyn Initialize> {
        None
    }

    /// Disposable capability of a built instance.
    fn disposer(this: &Arc<Self>) -> Option<Arc<dyn Dispose>> {
        let _ = this;
        None
    }
}

type Activation<T> = Arc<dyn Fn(&mut Arguments) -> Result<T, BoxError> + Send + Sync>;

/// A public constructor: declared parameter types plus the code that builds
/// the value from the resolved arguments.
///
/// Parameters are always resolved by type alone; names and tags only apply
/// to [`Member`]s.
///
/// # Examples
///
/// ```
/// use flex_inject::{Constructor, ServiceType};
/// use std::sync::Arc;
///
/// struct Port(u16);
/// struct Server {
///     port: Arc<Port>,
///     name: Arc<String>,
/// }
///
/// let lean = Constructor::<Server>::unary::<Port>(|port| Server { port, name: Arc::new("default".into()) });
/// let rich = Constructor::<Server>::binary::<Port, String>(|port, name| Server { port, name });
/// assert_eq!(lean.arity(), 1);
/// assert_eq!(rich.parameters(), &[ServiceType::of::<Port>(), ServiceType::of::<String>()]);
/// ```
pub struct Constructor<T> {
    parameters: Vec<ServiceType>,
    activate: Activation<T>,
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
            activate: self.activate.clone(),
        }
    }
}

impl<T: 'static> Constructor<T> {
    /// Builds a constructor from an explicit parameter list.
    ///
    /// `activate` receives one resolved argument per declared parameter, in
    /// order, and pulls them out with [`Arguments::next`].
    pub fn new<F>(parameters: Vec<ServiceType>, activate: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            activate: Arc::new(activate),
        }
    }

    /// Parameterless constructor.
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(Vec::new(), move |_| Ok(f()))
    }

    /// Constructor taking one dependency.
    pub fn unary<A>(f: impl Fn(Arc<A>) -> T + Send + Sync + 'static) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
    {
        Self::new(vec![ServiceType::of::<A>()], move |args| {
            let a = args.next::<A>()?;
            Ok(f(a))
        })
    }

    /// Constructor taking two dependencies.
    pub fn binary<A, B>(f: impl Fn(Arc<A>, Arc<B>) -> T + Send + Sync + 'static) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
    {
        Self::new(vec![ServiceType::of::<A>(), ServiceType::of::<B>()], move |args| {
            let a = args.next::<A>()?;
            let b = args.next::<B>()?;
            Ok(f(a, b))
        })
    }

    /// Constructor taking three dependencies.
    pub fn ternary<A, B, C>(f: impl Fn(Arc<A>, Arc<B>, Arc<C>) -> T + Send + Sync + 'static) -> Self
    where
        A: ?Sized + Send + Sync + 'static,
        B: ?Sized + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        Self::new(
            vec![ServiceType::of::<A>(), ServiceType::of::<B>(), ServiceType::of::<C>()],
            move |args| {
                let a = args.next::<A>()?;
                let b = args.next::<B>()?;
                let c = args.next::<C>()?;
                Ok(f(a, b, c))
            },
        )
    }
}

impl<T> Constructor<T> {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameters(&self) -> &[ServiceType] {
        &self.parameters
    }

    pub(crate) fn invoke(&self, arguments: Vec<Instance>) -> Result<T, BoxError> {
        let mut arguments = Arguments {
            values: arguments.into_iter(),
            parameters: &self.parameters,
            position: 0,
        };
        (self.activate)(&mut arguments)
    }
}

/// Picks the constructor with the greatest parameter count; the first one
/// listed wins a tie.
pub(crate) fn richest<T>(constructors: &[Constructor<T>]) -> Option<&Constructor<T>> {
    let mut best: Option<&Constructor<T>> = None;
    for candidate in constructors {
        match best {
            Some(current) if current.arity() >= candidate.arity() => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Resolved constructor arguments, consumed in declaration order.
pub struct Arguments<'a> {
    values: std::vec::IntoIter<Instance>,
    parameters: &'a [ServiceType],
    position: usize,
}

impl Arguments<'_> {
    /// Takes the next argument as `Arc<S>`.
    ///
    /// Fails when the arguments are exhausted or when the next argument was
    /// declared with a different type.
    pub fn next<S>(&mut self) -> Result<Arc<S>, BoxError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let position = self.position;
        self.position += 1;
        let value = self.values.next().ok_or_else(|| ArgumentError {
            position,
            expected: std::any::type_name::<S>(),
            found: None,
        })?;
        value.downcast::<S>().ok_or_else(|| {
            ArgumentError {
                position,
                expected: std::any::type_name::<S>(),
                found: Some(
                    self.parameters
                        .get(position)
                        .map(|p| p.name())
                        .unwrap_or(value.type_name()),
                ),
            }
            .into()
        })
    }

    /// Arguments not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug)]
struct ArgumentError {
    position: usize,
    expected: &'static str,
    found: Option<&'static str>,
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "argument {} was declared as {} but taken as {}",
                self.position, found, self.expected
            ),
            None => write!(
                f,
                "argument {} ({}) was not declared by the constructor",
                self.position, self.expected
            ),
        }
    }
}

impl std::error::Error for ArgumentError {}

type Setter<T> = Arc<dyn Fn(&mut T, Instance) -> Result<(), BoxError> + Send + Sync>;

/// An injection point on an implementation type.
///
/// Carries the member name (diagnostics only), the desired service type, an
/// optional name/tag qualifier and the setter. A member without a setter, a
/// property with no writable accessor, is skipped without being resolved.
///
/// # Examples
///
/// ```
/// use flex_inject::Member;
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
///
/// #[derive(Default)]
/// struct Job {
///     clock: Option<Arc<dyn Clock>>,
/// }
///
/// let member = Member::<Job>::field::<dyn Clock>("clock", |job, clock| job.clock = Some(clock))
///     .named("utc");
/// assert_eq!(member.key().name(), Some("utc"));
/// assert!(member.is_writable());
///
/// let skipped = Member::<Job>::read_only::<dyn Clock>("computed_clock");
/// assert!(!skipped.is_writable());
/// ```
pub struct Member<T> {
    member: &'static str,
    key: InjectionKey,
    setter: Option<Setter<T>>,
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Self {
            member: self.member,
            key: self.key.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<T: 'static> Member<T> {
    /// A field injection point. Fields are always assignable.
    pub fn field<S>(member: &'static str, set: impl Fn(&mut T, Arc<S>) + Send + Sync + 'static) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self::with_setter::<S>(member, set)
    }

    /// A property with a writable setter, such as a `set_*` method.
    ///
    /// Injected exactly like [`field`](Self::field); the two differ only in
    /// what they describe. A property without a setter is declared with
    /// [`read_only`](Self::read_only) instead.
    pub fn property<S>(member: &'static str, set: impl Fn(&mut T, Arc<S>) + Send + Sync + 'static) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self::with_setter::<S>(member, set)
    }

    /// A property marked for injection that has no setter.
    pub fn read_only<S>(member: &'static str) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            member,
            key: InjectionKey::of::<S>(),
            setter: None,
        }
    }

    fn with_setter<S>(member: &'static str, set: impl Fn(&mut T, Arc<S>) + Send + Sync + 'static) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target: &mut T, value: Instance| {
            let value = value.downcast::<S>().ok_or_else(|| -> BoxError {
                format!(
                    "member {} expects {} but resolved {}",
                    member,
                    std::any::type_name::<S>(),
                    value.type_name()
                )
                .into()
            })?;
            set(target, value);
            Ok(())
        });
        Self {
            member,
            key: InjectionKey::of::<S>(),
            setter: Some(setter),
        }
    }
}

impl<T> Member<T> {
    /// Qualifies the member's dependency with a registration name.
    pub fn named(mut self, name: &str) -> Self {
        self.key = self.key.named(name);
        self
    }

    /// Qualifies the member's dependency with a registration tag.
    pub fn tagged(mut self, tag: &str) -> Self {
        self.key = self.key.tagged(tag);
        self
    }

    pub fn member_name(&self) -> &'static str {
        self.member
    }

    /// The key this member resolves.
    pub fn key(&self) -> &InjectionKey {
        &self.key
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn assign(&self, target: &mut T, value: Instance) -> Option<Result<(), BoxError>> {
        self.setter.as_ref().map(|set| set(target, value))
    }
}

type Upcast<T> = Arc<dyn Fn(Arc<T>) -> Instance + Send + Sync>;

/// The set of service contracts an implementation type can be bound to.
///
/// Each entry is an upcast from `Arc<T>` to `Arc<S>`; a registration of `T`
/// under a service type missing here fails with
/// [`DiError::TypeMismatch`](crate::DiError::TypeMismatch).
pub struct Interfaces<T> {
    upcasts: HashMap<ServiceType, Upcast<T>, ahash::RandomState>,
}

impl<T: Send + Sync + 'static> Interfaces<T> {
    pub(crate) fn of_type() -> Self {
        let mut interfaces = Self {
            upcasts: HashMap::default(),
        };
        interfaces
            .upcasts
            .insert(ServiceType::of::<T>(), Arc::new(|this: Arc<T>| Instance::new::<T>(this)));
        interfaces
    }

    /// Declares that `T` can be handed out as `S`.
    pub fn provide<S>(&mut self, upcast: fn(Arc<T>) -> Arc<S>) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.upcasts.insert(
            ServiceType::of::<S>(),
            Arc::new(move |this: Arc<T>| Instance::new::<S>(upcast(this))),
        );
        self
    }

    pub fn contains(&self, service: ServiceType) -> bool {
        self.upcasts.contains_key(&service)
    }

    pub(crate) fn upcast_to(&self, service: ServiceType) -> Option<Upcast<T>> {
        self.upcasts.get(&service).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    struct Widget(usize);

    #[test]
    fn richest_prefers_more_parameters() {
        let constructors = vec![
            Constructor::<Widget>::nullary(|| Widget(0)),
            Constructor::<Widget>::binary::<u8, u16>(|_, _| Widget(2)),
            Constructor::<Widget>::unary::<u8>(|_| Widget(1)),
        ];
        let chosen = richest(&constructors).unwrap();
        assert_eq!(chosen.arity(), 2);
    }

    #[test]
    fn richest_takes_first_on_tie() {
        let constructors = vec![
            Constructor::<Widget>::unary::<u8>(|_| Widget(10)),
            Constructor::<Widget>::unary::<u16>(|_| Widget(20)),
        ];
        let chosen = richest(&constructors).unwrap();
        assert_eq!(chosen.parameters(), &[ServiceType::of::<u8>()]);
    }

    #[test]
    fn richest_of_nothing_is_none() {
        let constructors: Vec<Constructor<Widget>> = Vec::new();
        assert!(richest(&constructors).is_none());
    }

    #[test]
    fn arguments_report_type_confusion() {
        let ctor = Constructor::<Widget>::new(vec![ServiceType::of::<u8>()], |args| {
            let wrong = args.next::<u16>()?;
            Ok(Widget(*wrong as usize))
        });
        let err = ctor.invoke(vec![Instance::new(Arc::new(1u8))]).err().unwrap();
        assert!(err.to_string().contains("argument 0"));
    }

    #[test]
    fn interfaces_always_contain_self() {
        let interfaces = Interfaces::<Widget>::of_type();
        assert!(interfaces.contains(ServiceType::of::<Widget>()));
        assert!(!interfaces.contains(ServiceType::of::<u8>()));
    }
}
