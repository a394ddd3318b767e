// Error type shared by the diff, codec, apply and file layers.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while computing, parsing or applying a patch.
///
/// Variants that relate to a single change record carry its zero-based
/// index in the patch set so the operator can locate it in the file.
#[derive(Error, Debug)]
pub enum PatchError {
    /// File read/write failure on a named path.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Patch text does not parse into the expected structure.
    #[error("malformed patch: {0}")]
    MalformedInput(#[from] serde_json::Error),

    /// A hex field could not be decoded.
    #[error("record {record}: invalid {field}: {reason}")]
    InvalidEncoding {
        record: usize,
        field: &'static str,
        reason: String,
    },

    /// A digest window or a write region lies outside the buffer.
    #[error(
        "record {record}: {len} bytes at offset {position} exceed buffer of {buffer_len} bytes"
    )]
    OutOfBounds {
        record: usize,
        position: usize,
        len: usize,
        buffer_len: usize,
    },

    /// Digest and offset output were both disabled.
    #[error("digest and offset output cannot both be disabled: the patch would be unanchored")]
    AmbiguousDirectives,

    /// No window of the original matches a record's digest.
    #[error("record {record}: no window matches digest {shasum}")]
    NotFound { record: usize, shasum: String },

    /// More than one window matched under the `unique` match policy.
    #[error("record {record}: digest matches {matches} windows, expected exactly one")]
    AmbiguousMatch { record: usize, matches: usize },

    /// Diff inputs must have the same length.
    #[error("length mismatch: original is {original} bytes, modified is {modified} bytes")]
    LengthMismatch { original: usize, modified: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PatchError>;

impl PatchError {
    pub(crate) fn file(path: &Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn out_of_bounds(
        record: usize,
        position: usize,
        len: usize,
        buffer_len: usize,
    ) -> Self {
        Self::OutOfBounds {
            record,
            position,
            len,
            buffer_len,
        }
    }
}
