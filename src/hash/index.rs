// Digest -> window offsets lookup.
//
// Built once per apply call over the unmodified original. Only digests that
// some record asks for are kept, so memory stays proportional to the patch
// rather than to the buffer. Offsets for each digest are ascending.

use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::window::{self, Digest};

/// Offsets of every window in a buffer whose digest was requested.
#[derive(Debug, Default, Clone)]
pub struct DigestIndex {
    offsets: HashMap<Digest, Vec<usize>>,
    windows_scanned: usize,
}

impl DigestIndex {
    /// Scan `buffer` once and record where each of `wanted` occurs.
    pub fn build<I>(buffer: &[u8], wanted: I) -> Self
    where
        I: IntoIterator<Item = Digest>,
    {
        let wanted: HashSet<Digest> = wanted.into_iter().collect();
        let mut offsets: HashMap<Digest, Vec<usize>> = HashMap::with_capacity(wanted.len());
        if wanted.is_empty() {
            return Self {
                offsets,
                windows_scanned: 0,
            };
        }

        let windows_scanned = window::window_count(buffer.len());
        for (offset, d) in scan(buffer, &wanted) {
            offsets.entry(d).or_default().push(offset);
        }

        log::debug!(
            "digest index: {} windows scanned, {} of {} digests present",
            windows_scanned,
            offsets.len(),
            wanted.len()
        );

        Self {
            offsets,
            windows_scanned,
        }
    }

    /// Ascending offsets whose window hashes to `digest`; empty if none.
    pub fn lookup(&self, digest: &Digest) -> &[usize] {
        self.offsets.get(digest).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn windows_scanned(&self) -> usize {
        self.windows_scanned
    }
}

// Only matching windows are kept; the full set of window digests is never
// materialized.
#[cfg(not(feature = "parallel"))]
fn scan(buffer: &[u8], wanted: &HashSet<Digest>) -> Vec<(usize, Digest)> {
    window::windows(buffer)
        .filter(|(_, d)| wanted.contains(d))
        .collect()
}

// Windows are hashed on the rayon pool; matches come back in offset order
// before anything reads them.
#[cfg(feature = "parallel")]
fn scan(buffer: &[u8], wanted: &HashSet<Digest>) -> Vec<(usize, Digest)> {
    buffer
        .par_windows(window::WINDOW_SIZE)
        .map(window::hash_window)
        .enumerate()
        .filter(|(_, d)| wanted.contains(d))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
