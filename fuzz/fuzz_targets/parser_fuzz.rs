#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    // Patch text: parse, validate and re-serialize without panicking.
    if let Ok(set) = shapatch::patch::deserialize(&text) {
        let _ = set.validate();
        let _ = shapatch::patch::serialize(&set, &Default::default());
    }

    // The same bytes as command-line tokens.
    let args: Vec<String> = text
        .split_whitespace()
        .take(32)
        .map(str::to_string)
        .collect();
    shapatch::cli::fuzz_try_parse_args(&args);
});
