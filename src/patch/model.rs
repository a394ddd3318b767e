// Patch data model.
//
// A patch set is an ordered list of change records. Each record replaces a
// run of bytes at a position given either literally (`start + offset`) or
// relative to a window located by its SHA-256 digest.

use serde::{Deserialize, Serialize};

use crate::error::{PatchError, Result};
use crate::hash::Digest;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which fields a produced patch carries and how it is laid out.
///
/// At least one of `digest` and `offsets` must be enabled, otherwise the
/// records cannot be located when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOptions {
    /// Emit the anchor window digest (`shasum`).
    pub digest: bool,
    /// Emit the literal anchor position (`start`).
    pub offsets: bool,
    /// Indent the JSON output.
    pub pretty: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            digest: true,
            offsets: true,
            pretty: false,
        }
    }
}

impl PatchOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.digest && !self.offsets {
            return Err(PatchError::AmbiguousDirectives);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChangeRecord
// ---------------------------------------------------------------------------

/// One contiguous run of replaced bytes.
///
/// Field order here is the key order of the serialized form. Missing keys
/// default to zero or empty when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeRecord {
    /// Where the anchor window begins in the original.
    pub start: usize,
    /// Distance from the anchor window to the first replaced byte.
    pub offset: usize,
    /// Replacement bytes, lowercase hex.
    #[serde(rename = "newbytes")]
    pub replacement: String,
    /// Hex SHA-256 of the anchor window in the original, or empty.
    #[serde(rename = "shasum")]
    pub digest: String,
    /// Free-text note logged when the record is applied.
    pub comment: String,
}

impl ChangeRecord {
    /// Record that writes `bytes` at `start + offset` and is located by
    /// `digest` when one is given.
    pub fn new(start: usize, offset: usize, bytes: &[u8], digest: Option<Digest>) -> Self {
        Self {
            start,
            offset,
            replacement: hex::encode(bytes),
            digest: digest.map(|d| d.to_hex()).unwrap_or_default(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Literal edit position, `start + offset`.
    pub fn position(&self) -> Option<usize> {
        self.start.checked_add(self.offset)
    }

    pub fn has_digest(&self) -> bool {
        !self.digest.is_empty()
    }

    /// Decode the replacement bytes. `index` is the record's position in
    /// its patch set and only feeds the error.
    pub fn decode_replacement(&self, index: usize) -> Result<Vec<u8>> {
        hex::decode(&self.replacement).map_err(|e| PatchError::InvalidEncoding {
            record: index,
            field: "newbytes",
            reason: e.to_string(),
        })
    }

    /// Parse the anchor digest; `None` when the record has none.
    pub fn decode_digest(&self, index: usize) -> Result<Option<Digest>> {
        if !self.has_digest() {
            return Ok(None);
        }
        self.digest
            .parse::<Digest>()
            .map(Some)
            .map_err(|e| PatchError::InvalidEncoding {
                record: index,
                field: "shasum",
                reason: e.to_string(),
            })
    }

    /// Copy with the fields disabled by `opts` cleared.
    ///
    /// Only `start` is dropped for location-free output: `offset` is
    /// relative to the anchor window, and records anchored near the end of
    /// the buffer need it to land on the right byte.
    pub fn masked(&self, opts: &PatchOptions) -> Self {
        let mut out = self.clone();
        if !opts.digest {
            out.digest.clear();
        }
        if !opts.offsets {
            out.start = 0;
        }
        out
    }
}

// ---------------------------------------------------------------------------
// PatchSet
// ---------------------------------------------------------------------------

/// Ordered collection of change records forming one patch file.
///
/// Records are applied in order; where two overlap the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchSet {
    patch: Vec<ChangeRecord>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ChangeRecord) {
        self.patch.push(record);
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.patch
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.patch.iter()
    }

    pub fn len(&self) -> usize {
        self.patch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }

    /// Copy with every record masked by `opts`.
    pub fn masked(&self, opts: &PatchOptions) -> Self {
        self.patch.iter().map(|r| r.masked(opts)).collect()
    }

    /// Check every hex field without applying anything.
    pub fn validate(&self) -> Result<()> {
        for (index, record) in self.patch.iter().enumerate() {
            record.decode_replacement(index)?;
            record.decode_digest(index)?;
        }
        Ok(())
    }
}

impl From<Vec<ChangeRecord>> for PatchSet {
    fn from(patch: Vec<ChangeRecord>) -> Self {
        Self { patch }
    }
}

impl FromIterator<ChangeRecord> for PatchSet {
    fn from_iter<I: IntoIterator<Item = ChangeRecord>>(iter: I) -> Self {
        Self {
            patch: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PatchSet {
    type Item = ChangeRecord;
    type IntoIter = std::vec::IntoIter<ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.patch.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.patch.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;

    #[test]
    fn options_reject_unanchored() {
        let opts = PatchOptions {
            digest: false,
            offsets: false,
            pretty: true,
        };
        assert!(matches!(
            opts.validate(),
            Err(PatchError::AmbiguousDirectives)
        ));
        assert!(PatchOptions::default().validate().is_ok());
    }

    #[test]
    fn record_hex_fields() {
        let d = hash::digest(&[7u8; hash::WINDOW_SIZE], 0).unwrap();
        let r = ChangeRecord::new(10, 2, &[0xde, 0xad], Some(d));
        assert_eq!(r.replacement, "dead");
        assert_eq!(r.decode_replacement(0).unwrap(), vec![0xde, 0xad]);
        assert_eq!(r.decode_digest(0).unwrap(), Some(d));
        assert_eq!(r.position(), Some(12));
    }

    #[test]
    fn bad_hex_reports_record_and_field() {
        let r = ChangeRecord {
            replacement: "abc".into(),
            ..Default::default()
        };
        match r.decode_replacement(4) {
            Err(PatchError::InvalidEncoding { record, field, .. }) => {
                assert_eq!(record, 4);
                assert_eq!(field, "newbytes");
            }
            other => panic!("unexpected: {other:?}"),
        }

        let r = ChangeRecord {
            digest: "00ff".into(),
            ..Default::default()
        };
        assert!(matches!(
            r.decode_digest(1),
            Err(PatchError::InvalidEncoding { field: "shasum", .. })
        ));
    }

    #[test]
    fn masking_keeps_relative_offset() {
        let d = hash::digest(&[1u8; hash::WINDOW_SIZE], 0).unwrap();
        let r = ChangeRecord::new(100, 30, b"x", Some(d));

        let no_offsets = r.masked(&PatchOptions {
            offsets: false,
            ..Default::default()
        });
        assert_eq!(no_offsets.start, 0);
        assert_eq!(no_offsets.offset, 30);
        assert!(no_offsets.has_digest());

        let no_digest = r.masked(&PatchOptions {
            digest: false,
            ..Default::default()
        });
        assert_eq!(no_digest.start, 100);
        assert!(!no_digest.has_digest());
    }

    #[test]
    fn validate_stops_at_first_bad_record() {
        let set: PatchSet = vec![
            ChangeRecord::new(0, 0, b"ok", None),
            ChangeRecord {
                replacement: "zz".into(),
                ..Default::default()
            },
        ]
        .into();
        assert!(matches!(
            set.validate(),
            Err(PatchError::InvalidEncoding { record: 1, .. })
        ));
    }
}
