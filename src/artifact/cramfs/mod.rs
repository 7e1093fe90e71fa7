//! Compressed ROMFS image builder.
//!
//! Packs a directory tree into one flat, page-aligned image:
//!
//! ```text
//! walk ──► build_node (per entry, chained offsets) ──► assemble ──► write_image
//! ```
//!
//! The first page holds the 64-byte [`header`]. Each regular file follows
//! in walk order, padded to whole pages. Directories take no space. No
//! compression is applied despite the format name.
//!
//! # Example
//!
//! ```rust,ignore
//! use cramfs_builder::{build_image, BuildConfig};
//!
//! let summary = build_image(&BuildConfig::new("approot", "image.bin"))?;
//! println!("{} nodes, {} bytes", summary.node_count, summary.total_size);
//! ```

pub mod header;
pub mod image;
pub mod mode;
pub mod node;
pub mod table;
pub mod walk;

use std::path::PathBuf;

use log::info;

pub use image::{assemble, write_image, ChecksumMode, Image, ImageOptions, InodeTableMode};
pub use node::{build_node, collect_nodes, page_span, Node, NodeKind};
pub use table::{NameOffsetTable, TableRecord};
pub use walk::{EntryKind, HostTree, MemoryTree, PathDescriptor, TreeSource};

use crate::config::BuildConfig;
use crate::error::Result;

/// Storage unit of the target filesystem.
pub const PAGE_SIZE: u64 = 4096;

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub output: PathBuf,
    pub node_count: u32,
    pub directory_count: usize,
    pub file_count: usize,
    pub total_size: u32,
    pub checksum: u32,
}

/// Build an image from `config.source_dir` and write it to `config.output_path`.
pub fn build_image(config: &BuildConfig) -> Result<BuildSummary> {
    info!(
        "Packing '{}' into '{}' ({:?} checksum, inode table {:?})",
        config.source_dir.display(),
        config.output_path.display(),
        config.checksum,
        config.inode_table
    );

    let tree = HostTree::open(&config.source_dir)?;
    let nodes = collect_nodes(&tree)?;
    let image = assemble(&nodes, &config.image_options())?;
    write_image(&image, &config.output_path, config.atomic_write)?;

    let count = |kind: NodeKind| nodes.iter().filter(|n| n.kind == kind).count();
    let summary = BuildSummary {
        output: config.output_path.clone(),
        node_count: image.node_count,
        directory_count: count(NodeKind::Directory),
        file_count: count(NodeKind::RegularFile),
        total_size: image.total_size,
        checksum: image.checksum,
    };

    info!(
        "Image written: {} nodes, {:#x} bytes, checksum {:#010x}",
        summary.node_count, summary.total_size, summary.checksum
    );
    Ok(summary)
}
