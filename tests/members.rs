use flex_inject::{
    Constructor, Container, DiError, Initialize, Injectable, Interfaces, Lifetime, Member, Resolver,
};
use std::sync::Arc;

trait Sample: Send + Sync {
    fn label(&self) -> &'static str;
}

struct Labeled(&'static str);

impl Sample for Labeled {
    fn label(&self) -> &'static str {
        self.0
    }
}

fn register_samples(container: &Container) {
    container
        .register_factory::<dyn Sample, _>(Lifetime::Singleton, |_| Ok(Arc::new(Labeled("default")) as Arc<dyn Sample>))
        .unwrap();
    container
        .register_factory_qualified::<dyn Sample, _>(Lifetime::Singleton, Some("n1"), None, |_| {
            Ok(Arc::new(Labeled("named")) as Arc<dyn Sample>)
        })
        .unwrap();
    container
        .register_factory_qualified::<dyn Sample, _>(Lifetime::Singleton, None, Some("t1"), |_| {
            Ok(Arc::new(Labeled("tagged")) as Arc<dyn Sample>)
        })
        .unwrap();
}

// ===== Field and property injection =====

#[derive(Default)]
struct ClassWithInjectedField {
    sample: Option<Arc<dyn Sample>>,
}

impl Injectable for ClassWithInjectedField {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::nullary(ClassWithInjectedField::default)]
    }

    fn members() -> Vec<Member<Self>> {
        vec![Member::<Self>::field::<dyn Sample>("sample", |this, sample| this.sample = Some(sample))]
    }
}

#[test]
fn test_field_injection() {
    let container = Container::new();
    register_samples(&container);
    container.register_transient::<ClassWithInjectedField, ClassWithInjectedField>().unwrap();

    let built = container.resolve::<ClassWithInjectedField>().unwrap();
    assert_eq!(built.sample.as_ref().unwrap().label(), "default");
}

#[derive(Default)]
struct ClassWithInjectedProperty {
    named: Option<Arc<dyn Sample>>,
    tagged: Option<Arc<dyn Sample>>,
    computed: Option<Arc<dyn Sample>>,
}

impl Injectable for ClassWithInjectedProperty {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::nullary(ClassWithInjectedProperty::default)]
    }

    fn members() -> Vec<Member<Self>> {
        vec![
            Member::<Self>::property::<dyn Sample>("named", |this, sample| this.named = Some(sample)).named("n1"),
            Member::<Self>::property::<dyn Sample>("tagged", |this, sample| this.tagged = Some(sample)).tagged("t1"),
            // No setter, and the qualifier is not registered: it must be skipped, not resolved.
            Member::<Self>::read_only::<dyn Sample>("computed").named("missing"),
        ]
    }
}

#[test]
fn test_qualified_property_injection() {
    let container = Container::new();
    register_samples(&container);
    container
        .register_transient::<ClassWithInjectedProperty, ClassWithInjectedProperty>()
        .unwrap();

    let built = container.resolve::<ClassWithInjectedProperty>().unwrap();
    assert_eq!(built.named.as_ref().unwrap().label(), "named");
    assert_eq!(built.tagged.as_ref().unwrap().label(), "tagged");
    assert!(built.computed.is_none());
}

#[test]
fn test_missing_member_dependency_fails() {
    let container = Container::new();
    container.register_transient::<ClassWithInjectedField, ClassWithInjectedField>().unwrap();

    assert!(matches!(
        container.resolve::<ClassWithInjectedField>(),
        Err(DiError::UnregisteredService(_))
    ));
}

// ===== Constructor parameters ignore qualifiers =====

struct TakesSample {
    sample: Arc<dyn Sample>,
}

impl Injectable for TakesSample {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::unary::<dyn Sample>(|sample| TakesSample { sample })]
    }
}

#[test]
fn test_constructor_parameters_resolve_unqualified() {
    let container = Container::new();
    register_samples(&container);
    container
        .register_qualified::<TakesSample, TakesSample>(Lifetime::Transient, Some("n1"), Some("t1"))
        .unwrap();

    let built = container
        .resolve_qualified::<TakesSample>(Some("n1"), Some("t1"))
        .unwrap();
    assert_eq!(built.sample.label(), "default");
}

// ===== Initialization =====

trait Initialized: Send + Sync {
    fn trace(&self) -> Vec<&'static str>;
}

#[derive(Default)]
struct InitializableSample {
    sample: Option<Arc<dyn Sample>>,
    steps: Vec<&'static str>,
}

impl Initialize for InitializableSample {
    fn initialize(&mut self) {
        // Member injection has already happened.
        let step = if self.sample.is_some() { "initialized-after-injection" } else { "initialized-early" };
        self.steps.push(step);
    }
}

impl Initialized for InitializableSample {
    fn trace(&self) -> Vec<&'static str> {
        self.steps.clone()
    }
}

impl Injectable for InitializableSample {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::nullary(|| InitializableSample {
            sample: None,
            steps: vec!["constructed"],
        })]
    }

    fn members() -> Vec<Member<Self>> {
        vec![Member::<Self>::field::<dyn Sample>("sample", |this, sample| {
            this.steps.push("injected");
            this.sample = Some(sample);
        })]
    }

    fn interfaces(interfaces: &mut Interfaces<Self>) {
        interfaces.provide::<dyn Initialized>(|this| this as Arc<dyn Initialized>);
    }

    fn initializer(&mut self) -> Option<&mut dyn Initialize> {
        Some(self)
    }
}

#[test]
fn test_initialize_runs_once_after_injection() {
    let container = Container::new();
    register_samples(&container);
    container
        .register::<dyn Initialized, InitializableSample>(Lifetime::Singleton)
        .unwrap();

    let first = container.resolve::<dyn Initialized>().unwrap();
    let second = container.resolve::<dyn Initialized>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.trace(), vec!["constructed", "injected", "initialized-after-injection"]);
}

#[test]
fn test_initialize_runs_for_every_transient() {
    let container = Container::new();
    register_samples(&container);
    container
        .register::<dyn Initialized, InitializableSample>(Lifetime::Transient)
        .unwrap();

    for _ in 0..3 {
        let built = container.resolve::<dyn Initialized>().unwrap();
        assert_eq!(built.trace().len(), 3);
    }
}
