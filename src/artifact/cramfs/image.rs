//! Image assembly and output.
//!
//! Payloads are concatenated in node order, then the header fields that
//! depend on the full layout are patched in the root page.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::header::{
    patch_u32, CHECKSUM_AT, CHECKSUM_PLACEHOLDER, ENTRY_COUNT_AT, TABLE_LEN_AT, TABLE_OFFSET_AT,
    TOTAL_SIZE_AT,
};
use super::node::{Node, NodeKind};
use super::table::NameOffsetTable;
use super::PAGE_SIZE;
use crate::artifact::filesystem::{atomic_move, ensure_parent_dir, write_truncate};
use crate::error::{BuildError, Result};

/// How the header checksum field is filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumMode {
    /// Constant `0xFFFFFFFF`, never computed.
    #[default]
    Placeholder,
    /// CRC-32 (IEEE) of the whole image with the checksum field zeroed.
    Crc32,
}

/// Whether a [`NameOffsetTable`] is written after the payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InodeTableMode {
    #[default]
    Omit,
    Append,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub checksum: ChecksumMode,
    pub inode_table: InodeTableMode,
}

/// Byte range of the appended table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    pub offset: u32,
    pub len: u32,
}

/// A fully patched image, ready to be written.
#[derive(Debug, Clone)]
pub struct Image {
    pub bytes: Vec<u8>,
    pub total_size: u32,
    pub node_count: u32,
    pub checksum: u32,
    pub table: Option<TableLocation>,
}

/// Lay out `nodes` into a single image.
pub fn assemble(nodes: &[Node], options: &ImageOptions) -> Result<Image> {
    if nodes.first().map(|n| n.kind) != Some(NodeKind::Root) {
        return Err(BuildError::MissingRoot);
    }

    let table = match options.inode_table {
        InodeTableMode::Omit => NameOffsetTable::empty(),
        InodeTableMode::Append => NameOffsetTable::from_nodes(nodes)?,
    };
    let encoded_table = table.encode();

    let payload_size: u64 = nodes.iter().map(|n| n.data_size).sum();
    let table_span = padded_to_page(encoded_table.len() as u64);
    let total = payload_size + table_span;
    let total_size = u32::try_from(total).map_err(|_| BuildError::ImageTooLarge { size: total })?;
    let node_count = u32::try_from(nodes.len()).map_err(|_| BuildError::ImageTooLarge {
        size: nodes.len() as u64,
    })?;

    let mut bytes = Vec::with_capacity(total as usize);
    for node in nodes {
        bytes.extend_from_slice(&node.payload);
    }

    let table_location = if encoded_table.is_empty() {
        None
    } else {
        let location = TableLocation {
            offset: bytes.len() as u32,
            len: encoded_table.len() as u32,
        };
        bytes.extend_from_slice(&encoded_table);
        bytes.resize(total as usize, 0);
        patch_u32(&mut bytes, TABLE_OFFSET_AT, location.offset);
        patch_u32(&mut bytes, TABLE_LEN_AT, location.len);
        Some(location)
    };
    debug_assert_eq!(bytes.len() as u64, total);

    patch_u32(&mut bytes, TOTAL_SIZE_AT, total_size);
    patch_u32(&mut bytes, ENTRY_COUNT_AT, node_count);

    let checksum = match options.checksum {
        ChecksumMode::Placeholder => CHECKSUM_PLACEHOLDER,
        ChecksumMode::Crc32 => {
            patch_u32(&mut bytes, CHECKSUM_AT, 0);
            crc32fast::hash(&bytes)
        }
    };
    patch_u32(&mut bytes, CHECKSUM_AT, checksum);

    Ok(Image {
        bytes,
        total_size,
        node_count,
        checksum,
        table: table_location,
    })
}

/// Write `image` to `output`, replacing any existing file.
///
/// With `atomic`, the bytes go to a sibling `.partial` file that is then
/// moved over `output`, so a failed write never clobbers a previous image.
pub fn write_image(image: &Image, output: &Path, atomic: bool) -> Result<()> {
    ensure_parent_dir(output)?;

    if !atomic {
        return write_truncate(output, &image.bytes);
    }

    let mut partial_name = output.file_name().unwrap_or_default().to_os_string();
    partial_name.push(".partial");
    let partial = output.with_file_name(partial_name);

    let result =
        write_truncate(&partial, &image.bytes).and_then(|()| atomic_move(&partial, output));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn padded_to_page(len: u64) -> u64 {
    len.div_ceil(PAGE_SIZE) * PAGE_SIZE
}
