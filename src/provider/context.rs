//! Resolution context for dependency injection.
//!
//! A [`Resolution`] is created for every top-level resolve call and threaded
//! through everything that call triggers: constructor parameters, member
//! injection, factories and policies. It carries the resolve stack used for
//! cycle detection and the scope scoped services are cached in.

use std::cell::RefCell;
use std::sync::Arc;

use smallvec::SmallVec;

use super::{Container, Scope};
use crate::error::{DiError, DiResult};
use crate::injectable::{richest, Injectable};
use crate::instance::Instance;
use crate::key::{InjectionKey, ServiceType};
use crate::traits::ResolverCore;

/// An in-flight resolution, handed to factories and policies.
///
/// Resolve further services through it (it implements
/// [`Resolver`](crate::Resolver)) rather than through the container, so they
/// join the same resolve stack and see the same scope.
///
/// # Examples
///
/// ```
/// use flex_inject::{Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container
///     .register_instance(Some(Arc::new(Database { url: "postgres://localhost".to_string() })))
///     .unwrap();
/// container
///     .register_factory::<UserService, _>(Lifetime::Transient, |resolution| {
///         Ok(Arc::new(UserService { db: resolution.resolve::<Database>()? }))
///     })
///     .unwrap();
///
/// let users = container.resolve::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct Resolution<'a> {
    container: &'a Container,
    scope: Option<Arc<Scope>>,
    stack: RefCell<SmallVec<[ServiceType; 8]>>,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(container: &'a Container, scope: Option<Arc<Scope>>) -> Self {
        Self {
            container,
            scope,
            stack: RefCell::new(SmallVec::new()),
        }
    }

    /// The container being resolved from.
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Whether a scope is active for this resolution.
    pub fn has_scope(&self) -> bool {
        self.scope.is_some()
    }

    /// Service types currently being resolved, outermost first.
    pub fn path(&self) -> Vec<&'static str> {
        self.stack.borrow().iter().map(|service| service.name()).collect()
    }

    pub(crate) fn scope(&self) -> Option<&Arc<Scope>> {
        self.scope.as_ref()
    }

    /// Pushes `service` onto the resolve stack, failing if it is already there.
    fn enter(&self, service: ServiceType) -> DiResult<Frame<'_>> {
        let mut stack = self.stack.borrow_mut();
        if let Some(start) = stack.iter().position(|s| *s == service) {
            let mut cycle: Vec<&'static str> = stack[start..].iter().map(|s| s.name()).collect();
            cycle.push(service.name());
            return Err(DiError::CircularDependency(cycle));
        }
        stack.push(service);
        Ok(Frame { stack: &self.stack })
    }

    /// Builds an `I` through constructor and member injection, then runs its
    /// initializer.
    pub(crate) fn activate<I: Injectable>(&self) -> DiResult<I> {
        let implementation = std::any::type_name::<I>();
        let constructors = I::constructors();
        let constructor = richest(&constructors).ok_or(DiError::NoPublicConstructor(implementation))?;

        let arguments = constructor
            .parameters()
            .iter()
            .map(|parameter| self.resolve_key(&InjectionKey::from(*parameter)))
            .collect::<DiResult<Vec<_>>>()?;
        let mut value = constructor
            .invoke(arguments)
            .map_err(|e| DiError::construction_failed(implementation, e))?;

        for member in I::members() {
            if !member.is_writable() {
                tracing::trace!(implementation, member = member.member_name(), "skipping member without setter");
                continue;
            }
            let dependency = self.resolve_key(member.key())?;
            if let Some(Err(e)) = member.assign(&mut value, dependency) {
                return Err(DiError::construction_failed(implementation, e));
            }
        }

        if let Some(initializer) = value.initializer() {
            initializer.initialize();
        }
        Ok(value)
    }
}

impl ResolverCore for Resolution<'_> {
    fn resolve_key(&self, key: &InjectionKey) -> DiResult<Instance> {
        let _frame = self.enter(key.service_type())?;

        for policy in self.container.policies() {
            if let Some(instance) = policy.resolve(self, key) {
                tracing::trace!(service = %key, "resolved by policy");
                return Ok(instance);
            }
        }

        let registration = self
            .container
            .registry()
            .get(key)
            .ok_or_else(|| DiError::UnregisteredService(key.clone()))?;
        tracing::trace!(service = %key, lifetime = %registration.lifetime, "resolving registration");
        Ok(registration.instance(self, key)?.instance)
    }
}

/// Pops the resolve stack on drop, on success and failure alike.
struct Frame<'r> {
    stack: &'r RefCell<SmallVec<[ServiceType; 8]>>,
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}
