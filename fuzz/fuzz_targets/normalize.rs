#![no_main]

use libfuzzer_sys::fuzz_target;
use qbin_roundtrip::compare::{compare_exact, normalize, split_lines, unified_diff, DIFF_CONTEXT};

fuzz_target!(|data: &[u8]| {
    // Decoding is lossy, so every input is a valid source
    let text = String::from_utf8_lossy(data);

    let once = normalize(&text);
    assert_eq!(normalize(&once), once);
    assert!(once.ends_with('\n'));

    // Diff the input against its normalized form; must not panic
    let a = split_lines(&text);
    let b = split_lines(&once);
    let _ = unified_diff(&a, &b, "input", "normalized", DIFF_CONTEXT);

    assert!(compare_exact(data, data).is_equal());
});
