use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferrous_construct::*;
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_shared_hit(c: &mut Criterion) {
    let container = Container::new();
    container.bind_shared("answer", Factory::value(42u64), false);

    // Prime the cache
    let _ = container.get("answer").unwrap();

    c.bench_function("shared_hit_u64", |b| {
        b.iter(|| {
            let v = container.get_as::<u64>("answer").unwrap();
            black_box(v);
        })
    });
}

fn bench_transient_factory(c: &mut Criterion) {
    let container = Container::new();
    container.bind("counter", Factory::deferred(|_| Ok(7u64)), BindFlags::empty());

    c.bench_function("transient_factory_u64", |b| {
        b.iter(|| {
            let v = container.get("counter").unwrap();
            black_box(v);
        })
    });
}

fn bench_plan_argument_memoized(c: &mut Criterion) {
    let container = Container::new();
    let plan = container.plan("App\\Widget");
    plan.set_argument("name", Factory::deferred(|_| Ok(String::from("gear"))));
    let _ = plan.get_argument("name").unwrap();

    c.bench_function("plan_argument_memoized", |b| {
        b.iter(|| {
            let v = plan.get_argument("name").unwrap();
            black_box(v);
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_class_name", |b| {
        b.iter(|| black_box(normalize_class_name(black_box("\\App\\Http\\Controllers\\HomeController"))))
    });
}

// ===== Macro Benchmarks =====

struct Leaf;
struct Node {
    _children: Vec<Arc<Leaf>>,
}

fn bench_autowired_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("autowired_construction");

    for width in [1usize, 4, 16] {
        let container = Container::new();
        container.register_class(ClassInfo::new("Leaf", |_| Ok(Leaf)));
        let mut node = ClassInfo::new("Node", move |args| {
            let children = (0..width)
                .map(|i| args.require::<Leaf>(&format!("leaf{i}")))
                .collect::<DiResult<Vec<_>>>()?;
            Ok(Node { _children: children })
        });
        for i in 0..width {
            node = node.parameter(ParameterInfo::new(format!("leaf{i}")).typed("Leaf"));
        }
        container.register_class(node);

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let v = container.new_instance("Node", &Arguments::new()).unwrap();
                black_box(v);
            })
        });
    }
    group.finish();
}

fn bench_attribute_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_chain");

    for depth in [0usize, 1, 4, 8] {
        let container = Container::new();
        container.attributes().register_attribute("Pass", AttributeTarget::CLASS);
        let mut class = ClassInfo::new("Wrapped", |_| Ok(0u64));
        for _ in 0..depth {
            class = class.attribute(AttributeSpec::instance("Pass", |h: &AttributeHandler| h.call()));
        }
        container.register_class(class);

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let v = container.get("Wrapped").unwrap();
                black_box(v);
            })
        });
    }
    group.finish();
}

fn bench_shared_contention(c: &mut Criterion) {
    let container = Container::new();
    container.bind_shared("config", Factory::value(String::from("cfg")), false);

    c.bench_function("shared_hit_4_threads", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let c = container.clone();
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            black_box(c.get("config").unwrap());
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        })
    });
}

criterion_group!(
    micro_benches,
    bench_shared_hit,
    bench_transient_factory,
    bench_plan_argument_memoized,
    bench_normalize
);

criterion_group!(macro_benches, bench_autowired_construction, bench_attribute_chain, bench_shared_contention);

criterion_main!(micro_benches, macro_benches);
