//! Build read-only Compressed ROMFS images for embedded targets.
//!
//! The crate walks a source directory and gives every directory and
//! regular file a page-aligned slot. It then writes the header plus every
//! payload as a single flat image:
//!
//! - **Tree walker** - [`TreeSource`] over the host filesystem or memory
//! - **Node builder** - Per-entry classification, sizing and padding
//! - **Image serializer** - Concatenation, header patch-up and output
//!
//! # Architecture
//!
//! ```text
//! cramfs-builder (this crate)
//!     │
//!     ├── config      BuildConfig, fidelity presets, TOML loading
//!     ├── error       BuildError taxonomy
//!     └── artifact
//!          ├── cramfs      walk → node → image (+ header, mode, table)
//!          └── filesystem  output file helpers
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use cramfs_builder::{build_image, BuildConfig, Fidelity};
//!
//! let config = BuildConfig::new("approot", "image.bin").with_fidelity(Fidelity::Complete);
//! let summary = build_image(&config)?;
//! assert_eq!(summary.output.to_str(), Some("image.bin"));
//! # Ok::<(), cramfs_builder::BuildError>(())
//! ```

pub mod artifact;
pub mod config;
pub mod error;

pub use artifact::cramfs::{build_image, BuildSummary, PAGE_SIZE};
pub use config::{BuildConfig, Fidelity};
pub use error::{BuildError, Result};
