// JSON codec for patch sets.
//
// Output is `{"patch":[{"start":..,"offset":..,"newbytes":"..","shasum":"..","comment":".."}]}`
// with keys always in that order, so equal input and options give
// byte-identical text. Parsing accepts any key order and layout, ignores
// unknown keys, and fills missing keys with zero or empty values.

use super::model::{PatchOptions, PatchSet};
use crate::error::Result;

/// Serialize `set` with the fields and layout selected by `opts`.
pub fn serialize(set: &PatchSet, opts: &PatchOptions) -> Result<String> {
    opts.validate()?;
    let masked = set.masked(opts);
    let text = if opts.pretty {
        serde_json::to_string_pretty(&masked)?
    } else {
        serde_json::to_string(&masked)?
    };
    Ok(text)
}

/// Parse patch text, minified or indented.
pub fn deserialize(text: &str) -> Result<PatchSet> {
    Ok(serde_json::from_str(text)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
