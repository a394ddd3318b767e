// Content hashing for anchor windows.
//
// This module provides:
// - The fixed-size window digest used to anchor change records
// - A sliding-window scan over every window of a buffer
// - A digest -> offsets index built once per patch application

pub mod index;
pub mod window;

pub use index::DigestIndex;
pub use window::{Digest, WINDOW_SIZE, WindowOutOfBounds, digest, windows};
