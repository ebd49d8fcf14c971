//! Treemap layout: pure geometry over a [`crate::fs::DirectoryNode`] tree.

pub mod geometry;
pub mod layout;

pub use geometry::Rect;
pub use layout::{layout, squarify, LayoutRect};
