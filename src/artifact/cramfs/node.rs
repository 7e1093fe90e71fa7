//! Per-entry node construction and page layout.

use std::fmt;
use std::path::PathBuf;

use log::debug;

use super::header::Header;
use super::mode::{DIR_MODE, FILE_MODE};
use super::walk::{EntryKind, PathDescriptor, TreeSource};
use super::PAGE_SIZE;
use crate::error::{BuildError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The walk root. Its payload is the header page.
    Root,
    Directory,
    RegularFile,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Directory => f.write_str("dir"),
            Self::RegularFile => f.write_str("file"),
        }
    }
}

/// One entry of the image with its layout and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// Exact source length. Zero for directories and the root.
    pub file_size: u64,
    /// Page-aligned slot size. Zero only for directories.
    pub data_size: u64,
    /// Position of the payload within the image.
    pub offset: u64,
    pub payload: Vec<u8>,
}

impl Node {
    pub fn next_offset(&self) -> u64 {
        self.offset + self.data_size
    }
}

/// Slot size for a file of `file_size` bytes.
///
/// Always adds a whole page, so an empty file still gets one page and a
/// file of exactly one page gets two.
pub fn page_span(file_size: u64) -> u64 {
    (file_size / PAGE_SIZE + 1) * PAGE_SIZE
}

/// Build the node for `entry`, placed at `offset`.
///
/// Returns the node together with the offset of the next node.
pub fn build_node(
    source: &dyn TreeSource,
    entry: &PathDescriptor,
    offset: u64,
) -> Result<(Node, u64)> {
    let mut node = Node {
        name: entry.name.clone(),
        path: entry.path.clone(),
        kind: NodeKind::Directory,
        mode: DIR_MODE,
        uid: 0,
        gid: 0,
        file_size: 0,
        data_size: 0,
        offset,
        payload: Vec::new(),
    };

    if entry.depth == 0 {
        node.kind = NodeKind::Root;
        node.offset = 0;
        node.data_size = PAGE_SIZE;
        node.payload = Header::placeholder().encode().to_vec();
        node.payload.resize(PAGE_SIZE as usize, 0);
    } else {
        match entry.kind {
            EntryKind::Directory => {}
            EntryKind::RegularFile => {
                let contents = source.read_file(&entry.path)?;
                node.kind = NodeKind::RegularFile;
                node.mode = FILE_MODE;
                node.file_size = contents.len() as u64;
                node.data_size = page_span(node.file_size);
                node.payload = contents;
                node.payload.resize(node.data_size as usize, 0);
            }
            kind => {
                return Err(BuildError::UnsupportedEntry {
                    path: entry.path.clone(),
                    kind,
                });
            }
        }
    }

    debug!(
        "{} '{}' at {:#x}, {:#x} bytes",
        node.kind, node.name, node.offset, node.data_size
    );

    let next = node.next_offset();
    Ok((node, next))
}

/// Walk `source` and build every node, chaining offsets in walk order.
pub fn collect_nodes(source: &dyn TreeSource) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    let mut offset = 0;
    for entry in source.entries() {
        let (node, next) = build_node(source, &entry?, offset)?;
        offset = next;
        nodes.push(node);
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::cramfs::header::HEADER_SIZE;
    use crate::artifact::cramfs::walk::MemoryTree;
    use std::path::Path;

    fn descriptor(path: &str, depth: usize, kind: EntryKind) -> PathDescriptor {
        PathDescriptor {
            path: PathBuf::from(path),
            name: Path::new(path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
            depth,
            kind,
        }
    }

    #[test]
    fn test_page_span() {
        assert_eq!(page_span(0), 4096);
        assert_eq!(page_span(1), 4096);
        assert_eq!(page_span(4095), 4096);
        assert_eq!(page_span(4096), 8192);
        assert_eq!(page_span(10_000), 12_288);
    }

    #[test]
    fn test_root_node() {
        let tree = MemoryTree::new("approot");
        let entry = descriptor("approot", 0, EntryKind::Directory);

        let (node, next) = build_node(&tree, &entry, 0).unwrap();

        assert_eq!(node.kind, NodeKind::Root);
        assert_eq!(node.mode, DIR_MODE);
        assert_eq!(node.data_size, 4096);
        assert_eq!(node.payload.len(), 4096);
        assert_eq!(&node.payload[..HEADER_SIZE], &Header::placeholder().encode());
        assert!(node.payload[HEADER_SIZE..].iter().all(|b| *b == 0));
        assert_eq!(next, 4096);
    }

    #[test]
    fn test_directory_node_has_no_payload() {
        let tree = MemoryTree::new("approot").dir("sub");
        let entry = descriptor("approot/sub", 1, EntryKind::Directory);

        let (node, next) = build_node(&tree, &entry, 4096).unwrap();

        assert_eq!(node.kind, NodeKind::Directory);
        assert_eq!(node.offset, 4096);
        assert_eq!(node.data_size, 0);
        assert_eq!(node.file_size, 0);
        assert!(node.payload.is_empty());
        assert_eq!(next, 4096);
    }

    #[test]
    fn test_file_node_padding() {
        let tree = MemoryTree::new("approot").file("hello.txt", "hello, world");
        let entry = descriptor("approot/hello.txt", 1, EntryKind::RegularFile);

        let (node, next) = build_node(&tree, &entry, 4096).unwrap();

        assert_eq!(node.kind, NodeKind::RegularFile);
        assert_eq!(node.mode, FILE_MODE);
        assert_eq!(node.file_size, 12);
        assert_eq!(node.data_size, 4096);
        assert_eq!(node.payload.len(), 4096);
        assert_eq!(&node.payload[..12], b"hello, world");
        assert!(node.payload[12..].iter().all(|b| *b == 0));
        assert_eq!(next, 8192);
    }

    #[test]
    fn test_empty_file_gets_a_page() {
        let tree = MemoryTree::new("approot").file("empty", Vec::<u8>::new());
        let entry = descriptor("approot/empty", 1, EntryKind::RegularFile);

        let (node, _) = build_node(&tree, &entry, 4096).unwrap();

        assert_eq!(node.file_size, 0);
        assert_eq!(node.data_size, 4096);
    }

    #[test]
    fn test_unsupported_entry() {
        let tree = MemoryTree::new("approot").special("dev/console", EntryKind::CharDevice);
        let entry = descriptor("approot/dev/console", 2, EntryKind::CharDevice);

        match build_node(&tree, &entry, 4096) {
            Err(BuildError::UnsupportedEntry { kind, path }) => {
                assert_eq!(kind, EntryKind::CharDevice);
                assert_eq!(path, PathBuf::from("approot/dev/console"));
            }
            other => panic!("expected unsupported entry, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_file() {
        let tree = MemoryTree::new("approot");
        let entry = descriptor("approot/vanished.txt", 1, EntryKind::RegularFile);

        assert!(matches!(
            build_node(&tree, &entry, 4096),
            Err(BuildError::Io { .. })
        ));
    }

    #[test]
    fn test_collect_nodes_chains_offsets() {
        let tree = MemoryTree::new("approot")
            .file("a.bin", vec![1u8; 4096])
            .file("sub/b.txt", "0123456789")
            .dir("sub/empty");

        let nodes = collect_nodes(&tree).unwrap();

        let kinds: Vec<NodeKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Root,
                NodeKind::RegularFile,
                NodeKind::Directory,
                NodeKind::RegularFile,
                NodeKind::Directory,
            ]
        );

        assert_eq!(nodes[0].offset, 0);
        for pair in nodes.windows(2) {
            assert_eq!(pair[1].offset, pair[0].offset + pair[0].data_size);
        }
        assert_eq!(nodes[1].data_size, 8192);
        assert_eq!(nodes[3].offset, 4096 + 8192);
        assert_eq!(nodes[4].offset, 4096 + 8192 + 4096);
    }
}
