//! Artifact builders for embedded filesystem images.
//!
//! - [`cramfs`] - Page-aligned Compressed ROMFS images built from a directory tree
//! - [`filesystem`] - Output file helpers (parent creation, truncating and atomic writes)

pub mod cramfs;
pub mod filesystem;
