//! Shapatch: hash-anchored, human-readable binary patches.
//!
//! A patch is a JSON list of change records. Each record replaces a run of
//! bytes and is located either by a literal offset or by the SHA-256 digest
//! of a 64-byte window of the original, so a patch keeps applying when the
//! original file is shifted slightly between distributions.
//!
//! The crate provides:
//! - Window digests and the digest index (`hash`)
//! - Difference detection (`diff`) and application (`apply`)
//! - The patch model and JSON codec (`patch`)
//! - Text-level helpers (`engine`) and file helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use shapatch::engine;
//! use shapatch::apply::ApplyOptions;
//! use shapatch::patch::PatchOptions;
//!
//! let original: Vec<u8> = (0..=255).collect();
//! let mut modified = original.clone();
//! modified[100] = 0x22;
//!
//! let text = engine::diff_to_string(&original, &modified, &PatchOptions::default()).unwrap();
//! let applied = engine::apply_str(&original, &text, &ApplyOptions::default()).unwrap();
//! assert_eq!(applied.data, modified);
//! ```

pub mod apply;
pub mod diff;
pub mod engine;
pub mod error;
pub mod hash;
pub mod io;
pub mod patch;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{PatchError, Result};
