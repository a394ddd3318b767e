// Patch model and its JSON representation.
//
// - `model`: change records, patch sets and output options
// - `codec`: deterministic serialization and lenient parsing

pub mod codec;
pub mod model;

pub use codec::{deserialize, serialize};
pub use model::{ChangeRecord, PatchOptions, PatchSet};
