// File-level helpers for diffing and patching.
//
// Provides `diff_files()` and `patch_file()` convenience functions that read
// whole files into memory, run the engine, and write results atomically: the
// patched buffer goes to a temporary file in the destination directory which
// is renamed over the output only once it is complete.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::apply::{self, ApplyOptions, ApplyReport};
use crate::diff;
use crate::error::{PatchError, Result};
use crate::patch::{self, PatchOptions};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `diff_files()`.
#[derive(Debug, Clone)]
pub struct DiffStats {
    /// Original file size in bytes.
    pub original_size: u64,
    /// Modified file size in bytes.
    pub modified_size: u64,
    /// Number of change records produced.
    pub records: usize,
    /// Total replacement bytes across all records.
    pub changed_bytes: u64,
    /// SHA-256 of the original file.
    pub original_sha256: [u8; 32],
    /// SHA-256 of the modified file.
    pub modified_sha256: [u8; 32],
}

/// Statistics returned by `patch_file()`.
#[derive(Debug, Clone)]
pub struct PatchStats {
    /// Original file size in bytes.
    pub original_size: u64,
    /// Patch file size in bytes.
    pub patch_size: u64,
    /// Written output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the written output.
    pub output_sha256: [u8; 32],
    /// Per-record outcome of the apply step.
    pub report: ApplyReport,
}

// ---------------------------------------------------------------------------
// Reading / writing
// ---------------------------------------------------------------------------

/// Read a whole file, attaching the path to any error.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| PatchError::file(path, e))
}

/// Read a patch file, which must be valid UTF-8.
pub fn read_patch_text(path: &Path) -> Result<String> {
    let bytes = read_file(path)?;
    String::from_utf8(bytes).map_err(|e| {
        PatchError::file(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Write `data` to `path` without ever leaving a partial file there.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PatchError::file(dir, e))?;
    tmp.write_all(data).map_err(|e| PatchError::file(tmp.path(), e))?;
    tmp.flush().map_err(|e| PatchError::file(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| PatchError::file(path, e.error))?;
    Ok(())
}

/// Default patch output: `<original>.patched.bin` next to the original.
pub fn default_output_path(original: &Path) -> PathBuf {
    let mut name = OsString::from(original.as_os_str());
    name.push(".patched.bin");
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// diff_files
// ---------------------------------------------------------------------------

/// Diff two files and return the serialized patch with stats.
pub fn diff_files(
    original_path: &Path,
    modified_path: &Path,
    opts: &PatchOptions,
) -> Result<(String, DiffStats)> {
    let original = read_file(original_path)?;
    let modified = read_file(modified_path)?;

    let set = diff::diff(&original, &modified, opts)?;
    let text = patch::serialize(&set, opts)?;

    let changed_bytes = set.iter().map(|r| (r.replacement.len() / 2) as u64).sum();
    let stats = DiffStats {
        original_size: original.len() as u64,
        modified_size: modified.len() as u64,
        records: set.len(),
        changed_bytes,
        original_sha256: Sha256::digest(&original).into(),
        modified_sha256: Sha256::digest(&modified).into(),
    };
    Ok((text, stats))
}

// ---------------------------------------------------------------------------
// patch_file
// ---------------------------------------------------------------------------

/// Apply the patch at `patch_path` to `original_path`, writing `output_path`.
///
/// Nothing is written unless every record applied cleanly.
pub fn patch_file(
    original_path: &Path,
    patch_path: &Path,
    output_path: &Path,
    opts: &ApplyOptions,
) -> Result<PatchStats> {
    let text = read_patch_text(patch_path)?;
    let original = read_file(original_path)?;

    let set = patch::deserialize(&text)?;
    let applied = apply::apply(&original, &set, opts)?;

    write_atomic(output_path, &applied.data)?;

    Ok(PatchStats {
        original_size: original.len() as u64,
        patch_size: text.len() as u64,
        output_size: applied.data.len() as u64,
        output_sha256: Sha256::digest(&applied.data).into(),
        report: applied.report,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rom(len: usize) -> Vec<u8> {
        let mut s = 0x1234_5678u32;
        (0..len)
            .map(|_| {
                s = s.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
                (s >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn diff_patch_file_roundtrip() {
        let dir = tempdir().unwrap();
        let original = rom(1024);
        let mut modified = original.clone();
        for b in &mut modified[300..304] {
            *b ^= 0xff;
        }
        modified[1023] ^= 0xff;

        let original_path = dir.path().join("game.rom");
        let modified_path = dir.path().join("game-hack.rom");
        let patch_path = dir.path().join("hack.json");
        std::fs::write(&original_path, &original).unwrap();
        std::fs::write(&modified_path, &modified).unwrap();

        let (text, diff_stats) =
            diff_files(&original_path, &modified_path, &PatchOptions::default()).unwrap();
        assert_eq!(diff_stats.records, 2);
        assert_eq!(diff_stats.changed_bytes, 5);
        assert_eq!(diff_stats.original_size, 1024);
        std::fs::write(&patch_path, &text).unwrap();

        let output_path = default_output_path(&original_path);
        let stats = patch_file(
            &original_path,
            &patch_path,
            &output_path,
            &ApplyOptions::default(),
        )
        .unwrap();

        assert_eq!(std::fs::read(&output_path).unwrap(), modified);
        assert_eq!(stats.output_size, 1024);
        assert_eq!(stats.output_sha256, diff_stats.modified_sha256);
        assert_eq!(stats.report.records, 2);
    }

    #[test]
    fn default_output_appends_suffix() {
        assert_eq!(
            default_output_path(Path::new("dir/zelda.sfc")),
            PathBuf::from("dir/zelda.sfc.patched.bin")
        );
    }

    #[test]
    fn failed_patch_leaves_output_untouched() {
        let dir = tempdir().unwrap();
        let original_path = dir.path().join("a.bin");
        let patch_path = dir.path().join("p.json");
        let output_path = dir.path().join("out.bin");
        std::fs::write(&original_path, rom(100)).unwrap();
        std::fs::write(&output_path, b"previous").unwrap();
        std::fs::write(
            &patch_path,
            r#"{"patch":[{"start":99,"offset":0,"newbytes":"aabb"}]}"#,
        )
        .unwrap();

        let err = patch_file(
            &original_path,
            &patch_path,
            &output_path,
            &ApplyOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::OutOfBounds { .. }));
        assert_eq!(std::fs::read(&output_path).unwrap(), b"previous");
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        let err = read_file(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.bin"));
        assert!(matches!(err, PatchError::File { .. }));
    }

    #[test]
    fn patch_text_must_be_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.json");
        std::fs::write(&path, b"{\"patch\":[{\"comment\":\"caf\xe9\"}]}").unwrap();

        let err = read_patch_text(&path).unwrap_err();
        match err {
            PatchError::File { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidData)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn write_atomic_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"old contents").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
