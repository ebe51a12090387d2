#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_construct::{Container, Factory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let container = Container::new();
    let plan = container.plan("Fuzz\\Target");
    let calls = Arc::new(AtomicUsize::new(0));

    // Each byte pair is an operation on one of eight argument names
    for chunk in data.chunks(2) {
        let op = chunk[0] % 4;
        let name = format!("arg{}", chunk.get(1).copied().unwrap_or(0) % 8);

        match op {
            0 => {
                let calls = calls.clone();
                plan.set_argument(name.clone(), Factory::deferred(move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7u32)
                }));
                assert!(plan.has_argument(&name));
            }
            1 => {
                plan.remove_argument(&name);
                assert!(!plan.has_argument(&name));
            }
            2 => {
                let first = plan.get_argument(&name).expect("argument resolution failed");
                let before = calls.load(Ordering::SeqCst);
                let second = plan.get_argument(&name).expect("argument resolution failed");

                // Resolved arguments are memoized
                assert_eq!(calls.load(Ordering::SeqCst), before);
                match (first, second) {
                    (Some(a), Some(b)) => assert!(Arc::ptr_eq(&a, &b)),
                    (None, None) => {}
                    _ => panic!("argument presence changed between reads"),
                }
            }
            _ => {
                let args = plan.get_arguments().expect("argument resolution failed");
                assert_eq!(args.len(), plan.argument_names().len());
            }
        }
    }
});
