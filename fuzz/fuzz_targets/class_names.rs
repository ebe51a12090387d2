#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_construct::normalize_class_name;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    if !name.is_ascii() {
        return;
    }

    let normalized = normalize_class_name(name);

    // Normalizing twice changes nothing
    assert_eq!(normalize_class_name(&normalized), normalized);

    // No leading or trailing separators survive
    assert!(!normalized.starts_with('\\'));
    assert!(!normalized.ends_with('\\'));

    // `::` and `\` spell the same path
    assert_eq!(normalize_class_name(&name.replace("::", "\\")), normalized);
});
