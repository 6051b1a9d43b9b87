/// Unit tests for ServiceType and InjectionKey

use flex_inject::{InjectionKey, ServiceType};
use std::collections::HashSet;

trait Logger: Send + Sync {}

#[test]
fn test_service_type_identity() {
    assert_eq!(ServiceType::of::<String>(), ServiceType::of::<String>());
    assert_ne!(ServiceType::of::<String>(), ServiceType::of::<&'static str>());
    assert_ne!(ServiceType::of::<dyn Logger>(), ServiceType::of::<Box<dyn Logger>>());

    assert_eq!(ServiceType::of::<String>().name(), "alloc::string::String");
    assert_eq!(ServiceType::of::<String>().to_string(), "alloc::string::String");
    assert_eq!(ServiceType::of::<u8>().id(), std::any::TypeId::of::<u8>());
}

#[test]
fn test_key_equality_needs_all_components() {
    let service = ServiceType::of::<dyn Logger>();
    let base = InjectionKey::new(service, Some("n"), Some("t"));

    assert_eq!(base, InjectionKey::of::<dyn Logger>().named("n").tagged("t"));
    assert_ne!(base, InjectionKey::new(service, Some("n"), None));
    assert_ne!(base, InjectionKey::new(service, None, Some("t")));
    assert_ne!(base, InjectionKey::new(service, Some("t"), Some("n")));
    assert_ne!(base, InjectionKey::new(ServiceType::of::<String>(), Some("n"), Some("t")));
}

#[test]
fn test_default_word_is_not_special() {
    // "default" is only how an absent qualifier is displayed.
    let literal = InjectionKey::of::<u32>().named("default");
    let absent = InjectionKey::of::<u32>();
    assert_ne!(literal, absent);
    assert_eq!(literal.to_string(), absent.to_string());
}

#[test]
fn test_key_hash_distinguishes_qualifiers() {
    let keys: HashSet<InjectionKey> = [
        InjectionKey::of::<u32>(),
        InjectionKey::of::<u32>().named("a"),
        InjectionKey::of::<u32>().tagged("a"),
        InjectionKey::of::<u32>().named("a").tagged("a"),
        InjectionKey::of::<u32>().named("a"),
    ]
    .into_iter()
    .collect();

    assert_eq!(keys.len(), 4);
}

#[test]
fn test_key_accessors() {
    let key = InjectionKey::of::<u32>().named("port");
    assert_eq!(key.service_type(), ServiceType::of::<u32>());
    assert_eq!(key.name(), Some("port"));
    assert_eq!(key.tag(), None);
    assert!(!key.is_unqualified());
    assert!(InjectionKey::from(ServiceType::of::<u32>()).is_unqualified());
}

#[test]
fn test_key_display() {
    let key = InjectionKey::of::<u32>().tagged("fast");
    assert_eq!(key.to_string(), "u32 with name 'default' and tag 'fast'");
}
