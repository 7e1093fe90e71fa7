//! Error types for image construction.
//!
//! Every variant is fatal: the build aborts on the first error and makes
//! no promise about the state of the output file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::artifact::cramfs::EntryKind;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("cannot traverse '{}': {reason}", path.display())]
    Traversal { path: PathBuf, reason: String },

    #[error("unsupported entry '{}': {kind} (only directories and regular files can be packed)", path.display())]
    UnsupportedEntry { path: PathBuf, kind: EntryKind },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image too large: {size} bytes does not fit the 32-bit size field")]
    ImageTooLarge { size: u64 },

    #[error("node list does not start with the root header page")]
    MissingRoot,
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;
