use ferrous_construct::{Arguments, BindFlags, ClassInfo, Container, DiError, Factory, ParameterInfo};

fn assert_cycle(result: Result<impl Sized, DiError>, expected_path: &[&str]) {
    match result {
        Err(DiError::CyclicDependency(path)) => assert_eq!(path, expected_path, "wrong cyclic path"),
        Err(other) => panic!("expected cyclic dependency, got {other}"),
        Ok(_) => panic!("expected cyclic dependency, resolution succeeded"),
    }
}

#[test]
fn test_self_referencing_binding() {
    let container = Container::new();
    container.bind("SelfRef", Factory::deferred_any(|ctx| ctx.get("SelfRef")), BindFlags::empty());

    assert_cycle(container.get("SelfRef"), &["SelfRef", "SelfRef"]);
}

#[test]
fn test_two_class_cycle_through_type_hints() {
    let container = Container::new();
    container.register_class(ClassInfo::new("A", |_| Ok(())).parameter(ParameterInfo::new("b").typed("B")));
    container.register_class(ClassInfo::new("B", |_| Ok(())).parameter(ParameterInfo::new("a").typed("A")));

    assert_cycle(container.get("A"), &["A", "B", "A"]);
}

#[test]
fn test_three_class_cycle() {
    let container = Container::new();
    container.register_class(ClassInfo::new("A", |_| Ok(())).parameter(ParameterInfo::new("b").typed("B")));
    container.register_class(ClassInfo::new("B", |_| Ok(())).parameter(ParameterInfo::new("c").typed("C")));
    container.register_class(ClassInfo::new("C", |_| Ok(())).parameter(ParameterInfo::new("a").typed("A")));

    assert_cycle(container.new_instance("B", &Arguments::new()), &["B", "C", "A", "B"]);
}

#[test]
fn test_shared_binding_of_own_class_reports_class_frames_only() {
    let container = Container::new();
    container.register_class(ClassInfo::new("A", |_| Ok(())).parameter(ParameterInfo::new("b").typed("B")));
    container.register_class(ClassInfo::new("B", |_| Ok(())).parameter(ParameterInfo::new("a").typed("A")));

    // "A" is now a binding whose factory constructs class "A"
    container.prepare_object("A", None, BindFlags::SHARED);
    assert_cycle(container.get("A"), &["A", "B", "A"]);
}

#[test]
fn test_cycle_through_plan_argument() {
    let container = Container::new();
    container.register_class(ClassInfo::new("Node", |args| args.require::<()>("next").map(|_| ())));
    container
        .plan("Node")
        .set_argument("next", Factory::deferred_any(|ctx| ctx.container().new_instance("Node", &Arguments::new())));

    assert_cycle(container.get("Node"), &["Node", "Node.next", "Node"]);
}

#[test]
fn test_stack_unwinds_after_cycle() {
    let container = Container::new();
    container.bind("Loop", Factory::deferred_any(|ctx| ctx.get("Loop")), BindFlags::empty());
    container.bind("Fine", Factory::value(1u8), BindFlags::empty());

    assert!(container.get("Loop").is_err());
    assert!(container.get("Fine").is_ok());
    assert!(container.get("Loop").is_err());
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let container = Container::new();
    container.register_class(ClassInfo::new("Leaf", |_| Ok(())));
    container.register_class(ClassInfo::new("Left", |_| Ok(())).parameter(ParameterInfo::new("leaf").typed("Leaf")));
    container.register_class(ClassInfo::new("Right", |_| Ok(())).parameter(ParameterInfo::new("leaf").typed("Leaf")));
    container.register_class(
        ClassInfo::new("Top", |_| Ok(()))
            .parameter(ParameterInfo::new("left").typed("Left"))
            .parameter(ParameterInfo::new("right").typed("Right")),
    );

    assert!(container.get("Top").is_ok());
}
