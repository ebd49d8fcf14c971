//! Path authorization.
//!
//! Every destructive operation and every walk of a caller-supplied root passes
//! through [`PathAuthorizer`] first.

pub mod authorizer;
pub mod path_utils;
pub mod policy;

pub use authorizer::PathAuthorizer;
pub use policy::{SafetyPolicy, BLACKLISTED_PATHS, CRITICAL_DIRECTORIES};
