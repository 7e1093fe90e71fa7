//! Source tree traversal.
//!
//! A [`TreeSource`] yields one [`PathDescriptor`] per entry, root first,
//! in the host walk order: a directory, then its immediate files, then
//! each sub-directory recursively. Names are never sorted; within a
//! directory the order is whatever the source lists.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{BuildError, Result};

/// Kind of a listed entry, as observed without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Unknown,
}

impl EntryKind {
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::RegularFile
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            special_kind(file_type)
        }
    }
}

#[cfg(unix)]
fn special_kind(file_type: fs::FileType) -> EntryKind {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_block_device() {
        EntryKind::BlockDevice
    } else if file_type.is_char_device() {
        EntryKind::CharDevice
    } else if file_type.is_fifo() {
        EntryKind::Fifo
    } else if file_type.is_socket() {
        EntryKind::Socket
    } else {
        EntryKind::Unknown
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: fs::FileType) -> EntryKind {
    EntryKind::Unknown
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Directory => "directory",
            Self::RegularFile => "regular file",
            Self::Symlink => "symbolic link",
            Self::BlockDevice => "block device",
            Self::CharDevice => "character device",
            Self::Fifo => "fifo",
            Self::Socket => "socket",
            Self::Unknown => "unknown entry type",
        };
        f.write_str(label)
    }
}

/// One entry produced by a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDescriptor {
    /// Full path used to read the entry.
    pub path: PathBuf,
    /// Final path segment.
    pub name: String,
    /// 0 for the walk root.
    pub depth: usize,
    pub kind: EntryKind,
}

pub type Entries<'a> = Box<dyn Iterator<Item = Result<PathDescriptor>> + 'a>;

/// A directory tree that can be walked and read.
pub trait TreeSource {
    fn root(&self) -> &Path;

    /// Lazily walk the tree, root first.
    fn entries(&self) -> Entries<'_>;

    /// Read the full contents of a regular file yielded by [`entries`](Self::entries).
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}

/// A directory on the host filesystem.
#[derive(Debug, Clone)]
pub struct HostTree {
    root: PathBuf,
}

impl HostTree {
    /// Open `root` for walking.
    ///
    /// Fails with [`BuildError::Traversal`] if the path does not exist or
    /// is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| BuildError::Traversal {
            path: root.clone(),
            reason: match e.kind() {
                io::ErrorKind::NotFound => "source directory does not exist".to_string(),
                _ => e.to_string(),
            },
        })?;
        if !metadata.is_dir() {
            return Err(BuildError::Traversal {
                path: root,
                reason: "source path is not a directory".to_string(),
            });
        }
        Ok(Self { root })
    }
}

impl TreeSource for HostTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn entries(&self) -> Entries<'_> {
        // Stable sort: files ahead of sub-directories, host order otherwise.
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by(|a, b| a.file_type().is_dir().cmp(&b.file_type().is_dir()));

        Box::new(walker.into_iter().map(|entry| match entry {
            Ok(entry) => Ok(describe(&entry)),
            Err(err) => Err(walk_error(err)),
        }))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| BuildError::io(path, e))
    }
}

fn describe(entry: &DirEntry) -> PathDescriptor {
    PathDescriptor {
        path: entry.path().to_path_buf(),
        name: entry.file_name().to_string_lossy().into_owned(),
        depth: entry.depth(),
        kind: EntryKind::from_file_type(entry.file_type()),
    }
}

fn walk_error(err: walkdir::Error) -> BuildError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let reason = err.to_string();
    match err.into_io_error() {
        Some(source) => BuildError::Io { path, source },
        None => BuildError::Traversal { path, reason },
    }
}

/// An in-memory tree, walked in insertion order.
///
/// Parent directories are created implicitly when a nested entry is added.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    root: PathBuf,
    entries: Vec<MemoryEntry>,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    path: PathBuf,
    kind: EntryKind,
    contents: Vec<u8>,
}

impl MemoryTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    pub fn dir(mut self, relative: impl AsRef<Path>) -> Self {
        self.insert(relative.as_ref(), EntryKind::Directory, Vec::new());
        self
    }

    pub fn file(mut self, relative: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(relative.as_ref(), EntryKind::RegularFile, contents.into());
        self
    }

    /// Add an entry of any other kind, e.g. a symlink or device node.
    pub fn special(mut self, relative: impl AsRef<Path>, kind: EntryKind) -> Self {
        self.insert(relative.as_ref(), kind, Vec::new());
        self
    }

    fn insert(&mut self, relative: &Path, kind: EntryKind, contents: Vec<u8>) {
        if let Some(parent) = relative.parent() {
            let parent_path = self.root.join(parent);
            if !parent.as_os_str().is_empty() && !self.contains(&parent_path) {
                self.insert(parent, EntryKind::Directory, Vec::new());
            }
        }

        let entry = MemoryEntry {
            path: self.root.join(relative),
            kind,
            contents,
        };
        match self.entries.iter_mut().find(|e| e.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    fn collect(&self, dir: &Path, depth: usize, out: &mut Vec<PathDescriptor>) {
        let children: Vec<&MemoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.path.parent() == Some(dir))
            .collect();

        for child in children.iter().filter(|e| e.kind != EntryKind::Directory) {
            out.push(child.describe(depth + 1));
        }
        for child in children.iter().filter(|e| e.kind == EntryKind::Directory) {
            out.push(child.describe(depth + 1));
            self.collect(&child.path, depth + 1, out);
        }
    }
}

impl MemoryEntry {
    fn describe(&self, depth: usize) -> PathDescriptor {
        PathDescriptor {
            path: self.path.clone(),
            name: file_name(&self.path),
            depth,
            kind: self.kind,
        }
    }
}

impl TreeSource for MemoryTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn entries(&self) -> Entries<'_> {
        let mut out = vec![PathDescriptor {
            path: self.root.clone(),
            name: file_name(&self.root),
            depth: 0,
            kind: EntryKind::Directory,
        }];
        self.collect(&self.root, 0, &mut out);
        Box::new(out.into_iter().map(Ok))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.entries
            .iter()
            .find(|e| e.path == path && e.kind == EntryKind::RegularFile)
            .map(|e| e.contents.clone())
            .ok_or_else(|| BuildError::io(path, io::Error::from(io::ErrorKind::NotFound)))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(source: &dyn TreeSource) -> Vec<String> {
        source
            .entries()
            .map(|e| e.unwrap().name)
            .collect::<Vec<_>>()
    }

    #[test]
    fn test_open_missing_root() {
        let result = HostTree::open("/nonexistent_path_12345");
        match result {
            Err(BuildError::Traversal { reason, .. }) => assert!(reason.contains("does not exist")),
            other => panic!("expected traversal error, got {other:?}"),
        }
    }

    #[test]
    fn test_open_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        let err = HostTree::open(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_host_walk_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("approot");
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("top.txt"), "top").unwrap();
        fs::write(root.join("sub/inner.txt"), "inner").unwrap();
        fs::write(root.join("sub/deeper/leaf.txt"), "leaf").unwrap();

        let tree = HostTree::open(&root).unwrap();
        let entries: Vec<PathDescriptor> = tree.entries().map(|e| e.unwrap()).collect();

        let order: Vec<(&str, usize, EntryKind)> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.depth, e.kind))
            .collect();
        assert_eq!(
            order,
            vec![
                ("approot", 0, EntryKind::Directory),
                ("top.txt", 1, EntryKind::RegularFile),
                ("sub", 1, EntryKind::Directory),
                ("inner.txt", 2, EntryKind::RegularFile),
                ("deeper", 2, EntryKind::Directory),
                ("leaf.txt", 3, EntryKind::RegularFile),
            ]
        );
        assert_eq!(tree.read_file(&entries[1].path).unwrap(), b"top");
    }

    #[cfg(unix)]
    #[test]
    fn test_host_walk_reports_symlinks() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target.txt"), "t").unwrap();
        std::os::unix::fs::symlink("target.txt", temp.path().join("link")).unwrap();

        let tree = HostTree::open(temp.path()).unwrap();
        let link = tree
            .entries()
            .map(|e| e.unwrap())
            .find(|e| e.name == "link")
            .unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
    }

    #[test]
    fn test_memory_walk_order() {
        let tree = MemoryTree::new("approot")
            .dir("b")
            .file("b/one.txt", "1")
            .file("a.txt", "a")
            .file("c/nested/deep.txt", "d");

        assert_eq!(
            names(&tree),
            vec!["approot", "a.txt", "b", "one.txt", "c", "nested", "deep.txt"]
        );
    }

    #[test]
    fn test_memory_read_file() {
        let tree = MemoryTree::new("approot").file("a.txt", "alpha").dir("d");

        assert_eq!(tree.read_file(Path::new("approot/a.txt")).unwrap(), b"alpha");
        assert!(matches!(
            tree.read_file(Path::new("approot/d")),
            Err(BuildError::Io { .. })
        ));
        assert!(tree.read_file(Path::new("approot/missing")).is_err());
    }
}
