// Patch application.
//
// Every record is resolved against the unmodified original, never against
// the partially patched copy, so the result does not depend on whether an
// earlier write happened to touch a later record's anchor window.
//
// Resolution:
//   - no digest: write at `start + offset`
//   - digest: find windows of the original with that digest and write at
//     `window + offset`; `MatchPolicy` decides which matches are used

use crate::error::{PatchError, Result};
use crate::hash::{Digest, DigestIndex};
use crate::patch::PatchSet;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do when a digest occurs at more than one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Write at every matching window.
    #[default]
    All,
    /// Write at the lowest matching window only.
    First,
    /// Fail with `AmbiguousMatch` unless exactly one window matches.
    Unique,
}

/// Configuration for `apply`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub policy: MatchPolicy,
    /// When a digest matches nowhere, fall back to the literal
    /// `start + offset` instead of failing with `NotFound`.
    pub offset_fallback: bool,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Summary of one apply call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Number of records processed.
    pub records: usize,
    /// Total bytes written across all writes.
    pub bytes_written: usize,
    /// Positions written for each record, in record order.
    pub writes: Vec<Vec<usize>>,
    /// Records that fell back to their literal position.
    pub fallbacks: Vec<usize>,
    /// Non-empty record comments as `(record, comment)`.
    pub comments: Vec<(usize, String)>,
}

/// Patched buffer plus what happened while producing it.
#[derive(Debug, Clone)]
pub struct Applied {
    pub data: Vec<u8>,
    pub report: ApplyReport,
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Apply `set` to a copy of `original` with the default options.
pub fn apply_patch(original: &[u8], set: &PatchSet) -> Result<Vec<u8>> {
    apply(original, set, &ApplyOptions::default()).map(|a| a.data)
}

/// Apply `set` to a copy of `original`.
///
/// Any error aborts the whole call; no partially patched buffer escapes.
pub fn apply(original: &[u8], set: &PatchSet, opts: &ApplyOptions) -> Result<Applied> {
    // Decode everything up front so errors surface in record order.
    let mut decoded: Vec<(Vec<u8>, Option<Digest>)> = Vec::with_capacity(set.len());
    for (index, record) in set.iter().enumerate() {
        let bytes = record.decode_replacement(index)?;
        let digest = record.decode_digest(index)?;
        decoded.push((bytes, digest));
    }

    let wanted = decoded.iter().filter_map(|(_, d)| *d);
    let index = DigestIndex::build(original, wanted);

    let mut data = original.to_vec();
    let mut report = ApplyReport {
        records: set.len(),
        ..Default::default()
    };

    let buffer_len = data.len();
    for (i, (record, (bytes, digest))) in set.iter().zip(&decoded).enumerate() {
        let at = |base: usize| literal_position(base, record.offset, bytes.len(), i, buffer_len);
        let positions = match digest {
            None => vec![at(record.start)?],
            Some(d) => {
                let matches = select(index.lookup(d), opts.policy, i)?;
                if matches.is_empty() {
                    if !opts.offset_fallback {
                        return Err(PatchError::NotFound {
                            record: i,
                            shasum: d.to_hex(),
                        });
                    }
                    log::warn!("{}", fallback_note(i, record.start, record.offset));
                    report.fallbacks.push(i);
                    vec![at(record.start)?]
                } else {
                    matches.iter().map(|&m| at(m)).collect::<Result<Vec<_>>>()?
                }
            }
        };

        for &pos in &positions {
            write_at(&mut data, pos, bytes, i)?;
            report.bytes_written += bytes.len();
        }
        log::debug!("record {i}: {} bytes at {positions:?}", bytes.len());

        if !record.comment.is_empty() {
            log::info!("{}", record.comment);
            report.comments.push((i, record.comment.clone()));
        }
        report.writes.push(positions);
    }

    Ok(Applied { data, report })
}

fn select(matches: &[usize], policy: MatchPolicy, record: usize) -> Result<&[usize]> {
    match policy {
        MatchPolicy::All => {
            if matches.len() > 1 {
                log::warn!(
                    "record {record}: digest matches {} windows, patching all",
                    matches.len()
                );
            }
            Ok(matches)
        }
        MatchPolicy::First => Ok(&matches[..matches.len().min(1)]),
        MatchPolicy::Unique if matches.len() > 1 => Err(PatchError::AmbiguousMatch {
            record,
            matches: matches.len(),
        }),
        MatchPolicy::Unique => Ok(matches),
    }
}

// Records written without offsets carry `start == 0`, so their fallback is
// relative to the beginning of the file rather than to a known location.
fn fallback_note(record: usize, start: usize, offset: usize) -> String {
    if start == 0 {
        format!(
            "record {record}: digest not found and no literal start recorded, \
             writing {offset} bytes from the beginning of the file"
        )
    } else {
        format!("record {record}: digest not found, using offset {start}+{offset}")
    }
}

fn literal_position(
    base: usize,
    offset: usize,
    len: usize,
    record: usize,
    buffer_len: usize,
) -> Result<usize> {
    base.checked_add(offset)
        .ok_or_else(|| PatchError::out_of_bounds(record, base, len, buffer_len))
}

fn write_at(data: &mut [u8], pos: usize, bytes: &[u8], record: usize) -> Result<()> {
    let buffer_len = data.len();
    let dst = pos
        .checked_add(bytes.len())
        .and_then(|end| data.get_mut(pos..end))
        .ok_or_else(|| PatchError::out_of_bounds(record, pos, bytes.len(), buffer_len))?;
    dst.copy_from_slice(bytes);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
