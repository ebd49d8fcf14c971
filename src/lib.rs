// Library module for surge
// Re-exports modules for use in integration tests and external crates

pub mod cancel;
pub mod cleaner;
pub mod config;
pub mod engine;
pub mod error;
pub mod fs;
pub mod hash;
pub mod large_files;
pub mod quarantine;
pub mod security;
pub mod treemap;

pub use cancel::CancelToken;
pub use config::EngineConfig;
pub use engine::{Engine, Request, Response};
pub use error::{Result, SurgeError};
