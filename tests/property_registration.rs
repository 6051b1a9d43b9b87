/// Property-based tests for service registration
///
/// These tests use proptest to generate random qualifier sets and verify the
/// write-once and key-distinctness rules hold for all of them.

use flex_inject::{Container, DiError, InjectionKey, Lifetime, Resolver, ServiceType};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn qualifier() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-c]{1,2}")
}

fn lifetime() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Transient),
        Just(Lifetime::Scoped),
        Just(Lifetime::Singleton),
    ]
}

// Property: the first registration of a key wins and every later one is rejected
proptest! {
    #[test]
    fn first_registration_wins(entries in prop::collection::vec((qualifier(), qualifier(), 0u32..1000), 1..20)) {
        let container = Container::new();
        let mut expected: HashMap<(Option<String>, Option<String>), u32> = HashMap::new();

        for (name, tag, value) in &entries {
            let result = container.register_instance_qualified::<u32>(
                name.as_deref(),
                tag.as_deref(),
                Some(Arc::new(*value)),
            );
            match expected.entry((name.clone(), tag.clone())) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    prop_assert!(result.is_ok());
                    slot.insert(*value);
                }
                std::collections::hash_map::Entry::Occupied(_) => {
                    let is_duplicate = matches!(result, Err(DiError::AlreadyRegistered(_)));
                    prop_assert!(is_duplicate);
                }
            }
        }

        prop_assert_eq!(container.registration_count(), expected.len());
        for ((name, tag), value) in &expected {
            let resolved = container.resolve_qualified::<u32>(name.as_deref(), tag.as_deref()).unwrap();
            prop_assert_eq!(*resolved, *value);
        }
    }
}

// Property: a duplicate is rejected regardless of the lifetime either side used
proptest! {
    #[test]
    fn duplicates_rejected_across_lifetimes(first in lifetime(), second in lifetime(), name in qualifier()) {
        let container = Container::new();
        container
            .register_factory_qualified::<String, _>(first, name.as_deref(), None, |_| Ok(Arc::new("first".to_string())))
            .unwrap();

        let result = container.register_factory_qualified::<String, _>(second, name.as_deref(), None, |_| {
            Ok(Arc::new("second".to_string()))
        });
        let expected_key = InjectionKey::new(ServiceType::of::<String>(), name.as_deref(), None);
        match result {
            Err(DiError::AlreadyRegistered(key)) => prop_assert_eq!(key, expected_key),
            _ => prop_assert!(false, "Expected AlreadyRegistered"),
        }

        // The surviving registration keeps its own lifetime.
        let scope = container.open_scope();
        let resolved = container.resolve_qualified::<String>(name.as_deref(), None).unwrap();
        prop_assert_eq!(resolved.as_str(), "first");
        drop(scope);
    }
}

// Property: unqualified lookups never see qualified registrations
proptest! {
    #[test]
    fn qualified_keys_hidden_from_plain_lookup(name in "[a-z]{1,8}", tag in qualifier()) {
        let container = Container::new();
        container
            .register_instance_qualified::<u64>(Some(&name), tag.as_deref(), Some(Arc::new(1)))
            .unwrap();

        let is_unregistered = matches!(container.resolve::<u64>(), Err(DiError::UnregisteredService(_)));
        prop_assert!(is_unregistered);
        prop_assert!(container.is_registered(&InjectionKey::new(ServiceType::of::<u64>(), Some(&name), tag.as_deref())));
    }
}
