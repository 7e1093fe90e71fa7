//! Name/offset table linking each node's name to its payload.
//!
//! Each record is encoded little-endian as
//!
//! ```text
//! mode u32 | file_size u32 | offset u32 | parent u32 | name_len u32 | name (zero padded to 4)
//! ```
//!
//! `parent` is the index of the record for the containing directory. The
//! root is its own parent (index 0). An empty table encodes to no bytes,
//! which leaves the image identical to one built without a table.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;

use super::header::read_u32;
use super::node::Node;
use crate::error::{BuildError, Result};

const RECORD_FIXED_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub mode: u32,
    pub file_size: u32,
    pub offset: u32,
    pub parent: u32,
    /// Raw name bytes, never re-encoded.
    pub name: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameOffsetTable {
    records: Vec<TableRecord>,
}

impl NameOffsetTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One record per node, in node order.
    pub fn from_nodes(nodes: &[Node]) -> Result<Self> {
        let mut index_of: HashMap<&Path, u32> = HashMap::with_capacity(nodes.len());
        let mut table = Self::empty();

        for (index, node) in nodes.iter().enumerate() {
            let index = to_u32(index as u64)?;
            let parent = node
                .path
                .parent()
                .and_then(|p| index_of.get(p).copied())
                .unwrap_or(0);
            index_of.insert(node.path.as_path(), index);

            table.push(TableRecord {
                mode: node.mode,
                file_size: to_u32(node.file_size)?,
                offset: to_u32(node.offset)?,
                parent,
                name: node_name(node),
            });
        }
        Ok(table)
    }

    pub fn push(&mut self, record: TableRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TableRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for record in &self.records {
            let name = record.name.as_slice();
            buf.extend_from_slice(&record.mode.to_le_bytes());
            buf.extend_from_slice(&record.file_size.to_le_bytes());
            buf.extend_from_slice(&record.offset.to_le_bytes());
            buf.extend_from_slice(&record.parent.to_le_bytes());
            buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
            buf.extend_from_slice(name);
            buf.resize(buf.len() + round_up4(name.len()) - name.len(), 0);
        }
        buf
    }

    /// Parse an encoded table. Returns `None` on truncated input.
    pub fn decode(mut bytes: &[u8]) -> Option<Self> {
        let mut table = Self::empty();
        while !bytes.is_empty() {
            if bytes.len() < RECORD_FIXED_LEN {
                return None;
            }
            let name_len = read_u32(bytes, 16) as usize;
            let padded = round_up4(name_len);
            let end = RECORD_FIXED_LEN + padded;
            if bytes.len() < end {
                return None;
            }
            let name = &bytes[RECORD_FIXED_LEN..RECORD_FIXED_LEN + name_len];
            table.push(TableRecord {
                mode: read_u32(bytes, 0),
                file_size: read_u32(bytes, 4),
                offset: read_u32(bytes, 8),
                parent: read_u32(bytes, 12),
                name: name.to_vec(),
            });
            bytes = &bytes[end..];
        }
        Some(table)
    }
}

fn node_name(node: &Node) -> Vec<u8> {
    match node.path.file_name() {
        Some(name) => os_bytes(name),
        None => node.name.as_bytes().to_vec(),
    }
}

#[cfg(unix)]
fn os_bytes(name: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    name.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_bytes(name: &OsStr) -> Vec<u8> {
    name.to_string_lossy().into_owned().into_bytes()
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| BuildError::ImageTooLarge { size: value })
}
