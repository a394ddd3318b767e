use proptest::prelude::*;
use shapatch::apply::{self, ApplyOptions};
use shapatch::diff;
use shapatch::patch::{self, ChangeRecord, PatchOptions, PatchSet};

fn mode(i: u8) -> PatchOptions {
    let (digest, offsets) = [(true, true), (true, false), (false, true)][i as usize % 3];
    PatchOptions {
        digest,
        offsets,
        pretty: i >= 3,
    }
}

// Equal-length pair: a random original and a copy with random bytes replaced.
fn buffer_pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    proptest::collection::vec(any::<u8>(), 64..2048).prop_flat_map(|original| {
        let len = original.len();
        let edits = proptest::collection::vec((0..len, any::<u8>()), 0..24);
        (Just(original), edits).prop_map(|(original, edits)| {
            let mut modified = original.clone();
            for (i, b) in edits {
                modified[i] = b;
            }
            (original, modified)
        })
    })
}

fn record() -> impl Strategy<Value = ChangeRecord> {
    (
        any::<u32>(),
        any::<u16>(),
        proptest::collection::vec(any::<u8>(), 0..32),
        proptest::option::of(proptest::array::uniform32(any::<u8>())),
        ".{0,24}",
    )
        .prop_map(|(start, offset, bytes, digest, comment)| {
            ChangeRecord::new(
                start as usize,
                offset as usize,
                &bytes,
                digest.map(Into::into),
            )
            .with_comment(comment)
        })
}

proptest! {
    #[test]
    fn prop_diff_apply_roundtrip((original, modified) in buffer_pair(), m in 0u8..6) {
        let opts = mode(m);
        let set = diff::diff(&original, &modified, &opts).unwrap();
        let text = patch::serialize(&set, &opts).unwrap();
        let parsed = patch::deserialize(&text).unwrap();
        let out = apply::apply(&original, &parsed, &ApplyOptions::default()).unwrap();
        prop_assert_eq!(out.data, modified);
    }

    #[test]
    fn prop_identical_buffers_diff_empty(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let set = diff::diff(&data, &data, &PatchOptions::default()).unwrap();
        prop_assert!(set.is_empty());
    }

    #[test]
    fn prop_serialize_deserialize_identity(
        records in proptest::collection::vec(record(), 0..8),
        pretty in any::<bool>()
    ) {
        let set: PatchSet = records.into();
        let opts = PatchOptions { pretty, ..Default::default() };
        let text = patch::serialize(&set, &opts).unwrap();
        prop_assert_eq!(patch::deserialize(&text).unwrap(), set.clone());
        // Deterministic output.
        prop_assert_eq!(patch::serialize(&set, &opts).unwrap(), text);
    }

    #[test]
    fn prop_runs_are_disjoint_and_maximal((original, modified) in buffer_pair()) {
        let runs = diff::runs(&original, &modified);
        let mut prev_end = None;
        for r in &runs {
            prop_assert!(r.start < r.end);
            if let Some(end) = prev_end {
                prop_assert!(r.start > end, "runs {:?} not separated", runs);
            }
            prop_assert!(original[r.clone()].iter().zip(&modified[r.clone()]).all(|(a, b)| a != b));
            prev_end = Some(r.end);
        }
        let changed = original.iter().zip(&modified).filter(|(a, b)| a != b).count();
        prop_assert_eq!(runs.iter().map(|r| r.len()).sum::<usize>(), changed);
    }

    #[test]
    fn prop_parser_never_panics(text in ".{0,256}") {
        let _ = patch::deserialize(&text);
    }
}
