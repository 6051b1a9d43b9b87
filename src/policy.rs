//! Resolution policies: pluggable resolvers consulted before the registry.

use crate::instance::Instance;
use crate::key::InjectionKey;
use crate::provider::Resolution;

/// A pluggable resolver that may answer a request before the registry does.
///
/// Policies run in the order they were added, ahead of every registration
/// and every cache. The first one to return `Some` wins; its answer is not
/// cached, so a policy sees every request for every key and may be called
/// many times for the same key.
///
/// Further services should be resolved through `resolution`, which keeps
/// the request on the same call chain for cycle detection and scope lookup.
///
/// Closures of the right shape are policies too.
///
/// # Examples
///
/// ```rust
/// use flex_inject::{Container, Instance, InjectionKey, Resolution, Resolver, ServiceType};
/// use std::sync::Arc;
///
/// trait Sample: Send + Sync {
///     fn label(&self) -> &str;
/// }
/// struct Fixed;
/// impl Sample for Fixed {
///     fn label(&self) -> &str { "from policy" }
/// }
///
/// let container = Container::new();
/// container.add_policy(|_: &Resolution<'_>, key: &InjectionKey| {
///     (key.service_type() == ServiceType::of::<dyn Sample>())
///         .then(|| Instance::new::<dyn Sample>(Arc::new(Fixed)))
/// });
///
/// let sample = container.resolve::<dyn Sample>().unwrap();
/// assert_eq!(sample.label(), "from policy");
/// ```
pub trait ResolutionPolicy: Send + Sync + 'static {
    /// Answers the request, or returns `None` to pass it on.
    fn resolve(&self, resolution: &Resolution<'_>, key: &InjectionKey) -> Option<Instance>;
}

impl<F> ResolutionPolicy for F
where
    F: Fn(&Resolution<'_>, &InjectionKey) -> Option<Instance> + Send + Sync + 'static,
{
    fn resolve(&self, resolution: &Resolution<'_>, key: &InjectionKey) -> Option<Instance> {
        self(resolution, key)
    }
}
