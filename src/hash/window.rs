// Anchor window digests.
//
// A window is exactly WINDOW_SIZE bytes; its digest is SHA-256. The size
// equals the SHA-256 block size, which is what existing patch files were
// produced with, so both the diff and the apply side must keep it.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256};

/// Length in bytes of every anchor window.
pub const WINDOW_SIZE: usize = 64;

/// Length in bytes of a window digest.
pub const DIGEST_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// SHA-256 of one anchor window.
///
/// Displays and parses as 64 lowercase hex characters, which is the
/// representation stored in the `shasum` field of a patch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = hex::FromHexError;

    /// Accepts upper or lower case hex; anything but 64 digits is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

// ---------------------------------------------------------------------------
// Window hashing
// ---------------------------------------------------------------------------

/// A window `[offset, offset + WINDOW_SIZE)` does not fit in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("window at offset {offset} exceeds buffer of {buffer_len} bytes")]
pub struct WindowOutOfBounds {
    pub offset: usize,
    pub buffer_len: usize,
}

/// Digest of the window starting at `offset`.
pub fn digest(buffer: &[u8], offset: usize) -> Result<Digest, WindowOutOfBounds> {
    let window = offset
        .checked_add(WINDOW_SIZE)
        .and_then(|end| buffer.get(offset..end))
        .ok_or(WindowOutOfBounds {
            offset,
            buffer_len: buffer.len(),
        })?;
    Ok(hash_window(window))
}

#[inline]
pub(crate) fn hash_window(window: &[u8]) -> Digest {
    debug_assert_eq!(window.len(), WINDOW_SIZE);
    Digest(Sha256::digest(window).into())
}

/// Number of complete windows in a buffer of `len` bytes.
#[inline]
pub fn window_count(len: usize) -> usize {
    (len + 1).saturating_sub(WINDOW_SIZE)
}

/// Sliding-window scan: yields `(offset, digest)` for every offset in
/// `0..=len - WINDOW_SIZE`, in ascending order.
///
/// Empty when the buffer is shorter than one window.
pub fn windows(buffer: &[u8]) -> impl Iterator<Item = (usize, Digest)> + '_ {
    buffer.windows(WINDOW_SIZE).map(hash_window).enumerate()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
