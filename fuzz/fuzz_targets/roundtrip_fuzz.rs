#![no_main]
use libfuzzer_sys::fuzz_target;
use shapatch::apply::{self, ApplyOptions};
use shapatch::diff;
use shapatch::patch::{self, PatchOptions};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // First byte picks the anchor mode; the rest is split into an original
    // and an equal-length modified buffer.
    let opts = match data[0] % 3 {
        0 => PatchOptions::default(),
        1 => PatchOptions {
            digest: false,
            ..Default::default()
        },
        _ => PatchOptions {
            offsets: false,
            ..Default::default()
        },
    };
    let payload = &data[1..];
    let half = payload.len() / 2;
    let (original, modified) = (&payload[..half], &payload[half..half * 2]);

    let Ok(set) = diff::diff(original, modified, &opts) else {
        return;
    };
    let text = patch::serialize(&set, &opts).unwrap();
    let parsed = patch::deserialize(&text).unwrap();
    assert_eq!(parsed, set);

    // A repeated anchor window is patched at every copy, so exact
    // reproduction only holds when each anchor is unique.
    let exact = !opts.digest || diff::repeated_anchors(original, &parsed).is_empty();
    if let Ok(out) = apply::apply(original, &parsed, &ApplyOptions::default()) {
        if exact {
            assert_eq!(out.data, modified);
        }
    }
});
