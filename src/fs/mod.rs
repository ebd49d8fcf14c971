pub mod hidden;
pub mod tree;
pub mod types;
pub mod walker;

pub use hidden::{HiddenPolicy, DEFAULT_ALLOWED_HIDDEN};
pub use tree::{DiskTreeBuilder, DEPTH_RANGE};
pub use types::*;
pub use walker::{DirectoryTreeWalker, Footprint, WalkMode, WalkOutput};
