// Difference detection between two equal-length buffers.
//
// The buffers are scanned in lockstep. Every maximal run of differing bytes
// becomes one change record holding the new bytes and, when requested, the
// digest of a WINDOW_SIZE anchor window taken from the original. The window
// normally starts at the run; runs that begin within WINDOW_SIZE bytes of
// the end are anchored on the last full window instead and reach the run
// through `offset`.

use std::ops::Range;

use crate::error::{PatchError, Result};
use crate::hash::{self, Digest, DigestIndex, WINDOW_SIZE};
use crate::patch::{ChangeRecord, PatchOptions, PatchSet};

/// Compute the patch that turns `original` into `modified`.
///
/// `opts.pretty` is ignored here; it only affects serialization.
pub fn diff(original: &[u8], modified: &[u8], opts: &PatchOptions) -> Result<PatchSet> {
    opts.validate()?;
    if original.len() != modified.len() {
        return Err(PatchError::LengthMismatch {
            original: original.len(),
            modified: modified.len(),
        });
    }

    let mut set = PatchSet::new();
    for run in runs(original, modified) {
        let record = emit(original, modified, run, set.len(), opts)?;
        set.push(record);
    }

    if opts.digest {
        for (record, matches) in repeated_anchors(original, &set) {
            log::warn!(
                "record {record}: anchor window occurs {matches} times in the original; \
                 applying with the default match policy patches every copy"
            );
        }
    }

    log::debug!(
        "diff: {} bytes compared, {} runs",
        original.len(),
        set.len()
    );
    Ok(set)
}

/// Records whose anchor digest matches more than one window of `original`,
/// as `(record, matches)`.
pub fn repeated_anchors(original: &[u8], set: &PatchSet) -> Vec<(usize, usize)> {
    let digests: Vec<Option<Digest>> = set
        .iter()
        .enumerate()
        .map(|(i, r)| r.decode_digest(i).ok().flatten())
        .collect();
    let index = DigestIndex::build(original, digests.iter().flatten().copied());

    digests
        .iter()
        .enumerate()
        .filter_map(|(i, d)| {
            let matches = index.lookup(d.as_ref()?).len();
            (matches > 1).then_some((i, matches))
        })
        .collect()
}

/// Anchor window start for a run beginning at `run_start` in a buffer of
/// `len` bytes, and the distance from it to the run.
pub fn anchor_for(run_start: usize, len: usize) -> (usize, usize) {
    if run_start + WINDOW_SIZE > len {
        let anchor = len.saturating_sub(WINDOW_SIZE);
        (anchor, run_start - anchor)
    } else {
        (run_start, 0)
    }
}

/// Maximal ranges where the two buffers differ, in ascending order.
///
/// A run that reaches the last byte is closed at the buffer end.
pub fn runs(a: &[u8], b: &[u8]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut open: Option<usize> = None;

    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        match (x != y, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                out.push(start..i);
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        out.push(start..a.len().min(b.len()));
    }
    out
}

fn emit(
    original: &[u8],
    modified: &[u8],
    run: Range<usize>,
    index: usize,
    opts: &PatchOptions,
) -> Result<ChangeRecord> {
    let (anchor, offset) = anchor_for(run.start, original.len());

    let digest = if opts.digest {
        match hash::digest(original, anchor) {
            Ok(d) => Some(d),
            // A record with neither digest nor start could not be located.
            Err(e) if !opts.offsets => {
                return Err(PatchError::out_of_bounds(
                    index,
                    e.offset,
                    WINDOW_SIZE,
                    e.buffer_len,
                ));
            }
            Err(e) => {
                log::warn!("record {index}: no anchor digest: {e}");
                None
            }
        }
    } else {
        None
    };

    let record = ChangeRecord::new(anchor, offset, &modified[run.clone()], digest);
    log::trace!(
        "record {index}: run {}..{} anchored at {anchor}+{offset}",
        run.start,
        run.end
    );
    Ok(record.masked(opts))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
