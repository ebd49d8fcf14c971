// Content hashing and duplicate detection

pub mod dedup;
pub mod digest;

pub use dedup::{total_wasted_space, DuplicateDetector, DuplicateFile, DuplicateGroup, KeepPolicy};
pub use digest::{hash_file, ContentHash, CHUNK_SIZE};
