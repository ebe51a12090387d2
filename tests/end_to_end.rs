use ferrous_construct::definition::{create, prepare, prepare_shared, share};
use ferrous_construct::factory::extender;
use ferrous_construct::{
    AnyArc, Arguments, BindFlags, ClassInfo, Container, ContainerConfig, ContainerObserver, DiError, Factory,
    ParameterInfo, PropertyInfo,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct Widget {
    name: Arc<String>,
}

fn widget_container() -> Container {
    let container = Container::new();
    container.register_class(
        ClassInfo::new("Widget", |args| Ok(Widget { name: args.require::<String>("name")? }))
            .parameter(ParameterInfo::new("name")),
    );
    container
}

#[test]
fn test_widget_scenario() {
    let container = widget_container();
    let plan = container.plan("Widget");
    plan.set_argument("name", Factory::value(String::from("gear")));

    let widget = plan.create_object(&Arguments::new()).unwrap().downcast::<Widget>().unwrap();
    assert_eq!(*widget.name, "gear");

    let first = plan.create_shared_object(&Arguments::new()).unwrap();
    let second = plan.create_shared_object(&Arguments::new()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first.downcast::<Widget>().unwrap().name, "gear");
}

#[test]
fn test_unbound_parameter_without_argument_fails() {
    let container = widget_container();
    match container.new_instance("Widget", &Arguments::new()) {
        Err(DiError::DependencyResolution { class, dependency }) => {
            assert_eq!(class, "Widget");
            assert_eq!(dependency, "name");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_plan_arguments_apply_to_plain_resolution() {
    let container = widget_container();
    container.plan("widget").set_argument("name", Factory::value(String::from("cog")));

    let widget = container.get_as::<Widget>("\\Widget").unwrap();
    assert_eq!(*widget.name, "cog");
}

#[test]
fn test_type_hints_autowire_parameters() {
    struct Engine;
    struct Car {
        engine: Arc<Engine>,
    }

    let container = Container::new();
    container.register_class(ClassInfo::new("Engine", |_| Ok(Engine)));
    container.register_class(
        ClassInfo::new("Car", |args| Ok(Car { engine: args.require::<Engine>("engine")? }))
            .parameter(ParameterInfo::new("engine").typed("Engine")),
    );
    container.create_shared_object("Engine", &Arguments::new(), false).unwrap();

    let a = container.get_as::<Car>("Car").unwrap();
    let b = container.get_as::<Car>("Car").unwrap();
    assert!(Arc::ptr_eq(&a.engine, &b.engine));
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_property_without_argument_or_default_fails() {
    let container = Container::new();
    container.register_class(ClassInfo::new("Holder", |_| Ok(())).property(PropertyInfo::new("slot").typed("Anything")));
    container.bind("Anything", Factory::value(1u8), BindFlags::empty());

    assert!(matches!(
        container.get("Holder"),
        Err(DiError::DependencyResolution { ref dependency, .. }) if dependency == "slot"
    ));
}

#[test]
fn test_create_object_transient_rebinds_each_call() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let container = Container::new();
    container.register_class(ClassInfo::new("Job", move |_| Ok(counter.fetch_add(1, Ordering::SeqCst))));

    let a = container.create_object("Job", &Arguments::new(), BindFlags::empty()).unwrap();
    let b = container.get("Job").unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert!(!container.entry("Job").unwrap().is_shared());
}

#[test]
fn test_protected_shared_object_is_kept() {
    let container = widget_container();
    let gear = Arguments::new().with("name", String::from("gear"));
    let bolt = Arguments::new().with("name", String::from("bolt"));

    let first = container.create_shared_object("Widget", &gear, true).unwrap();
    let again = container.create_object("Widget", &bolt, BindFlags::empty()).unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(*again.downcast::<Widget>().unwrap().name, "gear");
}

#[test]
fn test_prepare_object_defers_construction() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();
    let container = Container::new();
    container.register_class(ClassInfo::new("Lazy", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(String::from("lazy"))
    }));

    let tag = extender(|value, _| {
        let s = value.downcast::<String>().map_err(|_| DiError::TypeMismatch("String"))?;
        Ok(Arc::new(format!("{s}!")) as AnyArc)
    });
    assert!(container.prepare_object("Lazy", Some(tag), BindFlags::SHARED));
    assert_eq!(built.load(Ordering::SeqCst), 0);

    assert_eq!(*container.get_as::<String>("Lazy").unwrap(), "lazy!");
    assert_eq!(*container.get_as::<String>("Lazy").unwrap(), "lazy!");
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_definition_helpers() {
    let container = widget_container();

    let builder = create("Widget", vec![Factory::value(String::from("nut"))]);
    let nut = builder.build(&container).unwrap().downcast::<Widget>().unwrap();
    assert_eq!(*nut.name, "nut");
    assert!(container.entry("Widget").is_none());

    assert!(container.store("shared.widget", share("Widget", vec![Factory::value(String::from("hub"))])));
    let a = container.get("shared.widget").unwrap();
    let b = container.get("shared.widget").unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    container.plan("Widget").set_argument("name", Factory::value(String::from("axle")));
    let upper = extender(|value, _| {
        let w = value.downcast::<Widget>().map_err(|_| DiError::TypeMismatch("Widget"))?;
        Ok(Arc::new(w.name.to_uppercase()) as AnyArc)
    });
    assert!(container.store("upper", prepare_shared("Widget", Some(upper), BindFlags::empty())));
    assert_eq!(*container.get_as::<String>("upper").unwrap(), "AXLE");
    assert!(container.entry("upper").unwrap().is_shared());

    let transient = prepare("Widget", None, BindFlags::from_bits_truncate(0));
    assert!(container.store("fresh", transient));
    let x = container.get("fresh").unwrap();
    let y = container.get("fresh").unwrap();
    assert!(!Arc::ptr_eq(&x, &y));
}

#[test]
fn test_identifiers_are_normalized() {
    let container = Container::new();
    container.bind("\\App\\Service", Factory::value(7u8), BindFlags::empty());

    assert!(container.has("app\\service"));
    assert!(container.has("App::Service"));
    assert_eq!(*container.get_as::<u8>("APP\\SERVICE\\").unwrap(), 7);
}

#[test]
fn test_get_as_wrong_type() {
    let container = Container::new();
    container.bind("n", Factory::value(1u8), BindFlags::empty());
    assert!(matches!(container.get_as::<String>("n"), Err(DiError::TypeMismatch(_))));
}

#[test]
fn test_execute_passes_extra_arguments() {
    let container = Container::new();
    container.bind_shared("default.name", Factory::value(String::from("anon")), false);
    let hello = Factory::deferred(|ctx| Ok(format!("hello {}", ctx.param::<String>("name", "default.name")?)));

    let a = container.execute(&hello, &Arguments::new()).unwrap();
    let b = container.execute(&hello, &Arguments::new().with("name", String::from("bo"))).unwrap();
    assert_eq!(*a.downcast::<String>().unwrap(), "hello anon");
    assert_eq!(*b.downcast::<String>().unwrap(), "hello bo");
}

#[derive(Default)]
struct Events {
    log: Mutex<Vec<String>>,
}

impl ContainerObserver for Events {
    fn resolving(&self, id: &str) {
        self.log.lock().unwrap().push(format!("resolving {id}"));
    }

    fn resolved(&self, id: &str, _duration: Duration) {
        self.log.lock().unwrap().push(format!("resolved {id}"));
    }

    fn bound(&self, id: &str, flags: BindFlags) {
        self.log.lock().unwrap().push(format!("bound {id} {}", flags.bits()));
    }

    fn bind_rejected(&self, id: &str) {
        self.log.lock().unwrap().push(format!("rejected {id}"));
    }
}

#[test]
fn test_observers_see_binding_and_resolution_events() {
    let events = Arc::new(Events::default());
    let container = Container::with_config(ContainerConfig::builder().trace_resolution(true).build());
    container.add_observer(events.clone());

    container.bind_shared("svc", Factory::value(1u8), true);
    container.bind_shared("svc", Factory::value(2u8), false);
    container.get("svc").unwrap();

    assert_eq!(
        *events.log.lock().unwrap(),
        vec!["bound svc 3", "rejected svc", "resolving svc", "resolved svc"]
    );
}

#[test]
fn test_depth_limit_from_config() {
    let container = Container::with_config(ContainerConfig::builder().max_depth(2).build());
    container.bind("a", Factory::deferred_any(|ctx| ctx.get("b")), BindFlags::empty());
    container.bind("b", Factory::deferred_any(|ctx| ctx.get("c")), BindFlags::empty());
    container.bind("c", Factory::value(()), BindFlags::empty());

    assert!(matches!(container.get("a"), Err(DiError::DepthExceeded(2))));
    assert!(container.get("b").is_ok());
}

#[cfg(feature = "diagnostics")]
#[test]
fn test_debug_string_lists_bindings_and_classes() {
    let container = widget_container();
    container.bind_shared("svc", Factory::value(1u8), false);
    let dump = container.to_debug_string();
    assert!(dump.contains("svc"));
    assert!(dump.contains("Widget"));
}
