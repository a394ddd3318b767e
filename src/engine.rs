// Patch engine: ties diffing and application to the text format.
//
// Provides buffer-level APIs that orchestrate:
//   - Difference detection (diff module) and serialization (patch::codec)
//   - Parsing (patch::codec) and application (apply module)

use crate::apply::{self, Applied, ApplyOptions};
use crate::diff;
use crate::error::Result;
use crate::patch::{self, PatchOptions};

// ---------------------------------------------------------------------------
// High-level diff
// ---------------------------------------------------------------------------

/// Diff `original` against `modified` and return patch text.
pub fn diff_to_string(original: &[u8], modified: &[u8], opts: &PatchOptions) -> Result<String> {
    let set = diff::diff(original, modified, opts)?;
    patch::serialize(&set, opts)
}

// ---------------------------------------------------------------------------
// High-level apply
// ---------------------------------------------------------------------------

/// Parse patch text and apply it to a copy of `original`.
pub fn apply_str(original: &[u8], text: &str, opts: &ApplyOptions) -> Result<Applied> {
    let set = patch::deserialize(text)?;
    apply::apply(original, &set, opts)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
