#![no_main]
use libfuzzer_sys::fuzz_target;
use shapatch::apply::{self, ApplyOptions, MatchPolicy};
use shapatch::patch;

fuzz_target!(|data: &[u8]| {
    // Split into patch text and an original buffer.
    // Parsing and applying must never panic, only return errors.
    let split = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let text = String::from_utf8_lossy(&data[..split]);
    let original = data.get(split + 1..).unwrap_or(&[]);

    if let Ok(set) = patch::deserialize(&text) {
        for policy in [MatchPolicy::All, MatchPolicy::First, MatchPolicy::Unique] {
            let opts = ApplyOptions {
                policy,
                offset_fallback: true,
            };
            let _ = apply::apply(original, &set, &opts);
        }
    }
});
