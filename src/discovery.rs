//! Leaf-directory discovery.
//!
//! A leaf is a directory with no traversable subdirectories. Entries whose
//! name starts with `.` and symbolic links are never traversed, so a directory
//! whose only children are excluded is itself a leaf. The root is always
//! considered, even if its own name would be excluded.
//!
//! Filesystem access goes through [`DirSource`] so the walk can be exercised
//! against an in-memory tree.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::errors::HarnessError;

// ============================================================================
// FILESYSTEM ACCESS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    Symlink,
    File,
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    /// True if the walk should descend into this entry.
    pub fn is_traversable(&self) -> bool {
        self.kind == EntryKind::Dir && !self.name.starts_with('.')
    }
}

/// Lists the immediate children of a directory, sorted by name.
pub trait DirSource {
    fn entries(&self, dir: &Path) -> Result<Vec<DirEntry>, HarnessError>;
}

/// The real filesystem. Symbolic links are reported as links, never followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDirSource;

impl DirSource for OsDirSource {
    fn entries(&self, dir: &Path) -> Result<Vec<DirEntry>, HarnessError> {
        let metadata =
            std::fs::metadata(dir).map_err(|e| HarnessError::io("scan directory", dir, e))?;
        if !metadata.is_dir() {
            return Err(not_a_directory(dir));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| HarnessError::io("scan directory", dir, e.into()))?;
            let file_type = entry.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }
}

fn not_a_directory(dir: &Path) -> HarnessError {
    HarnessError::io(
        "scan directory",
        dir,
        io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
    )
}

/// An in-memory tree of directories, files and links.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirSource {
    nodes: BTreeMap<PathBuf, EntryKind>,
}

impl MemoryDirSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory and any missing parents.
    pub fn dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert(path.as_ref(), EntryKind::Dir);
        self
    }

    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.insert(path.as_ref(), EntryKind::File);
        self
    }

    pub fn symlink(mut self, path: impl AsRef<Path>) -> Self {
        self.insert(path.as_ref(), EntryKind::Symlink);
        self
    }

    fn insert(&mut self, path: &Path, kind: EntryKind) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.nodes.insert(ancestor.to_path_buf(), EntryKind::Dir);
        }
        self.nodes.insert(path.to_path_buf(), kind);
    }
}

impl DirSource for MemoryDirSource {
    fn entries(&self, dir: &Path) -> Result<Vec<DirEntry>, HarnessError> {
        match self.nodes.get(dir) {
            Some(EntryKind::Dir) => {}
            Some(_) => return Err(not_a_directory(dir)),
            None => {
                return Err(HarnessError::io(
                    "scan directory",
                    dir,
                    io::Error::new(io::ErrorKind::NotFound, "no such directory"),
                ))
            }
        }
        let entries = self
            .nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, kind)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(DirEntry { name, kind: *kind })
            })
            .collect();
        Ok(entries)
    }
}

// ============================================================================
// LEAF WALK
// ============================================================================

/// Returns every leaf directory reachable from `root` (inclusive), depth-first
/// in name order.
pub fn leaf_directories<S>(source: &S, root: &Path) -> Result<Vec<PathBuf>, HarnessError>
where
    S: DirSource + ?Sized,
{
    let mut leaves = Vec::new();
    collect_leaves(source, root, &mut leaves)?;
    debug!(root = %root.display(), leaves = leaves.len(), "scanned leaf directories");
    Ok(leaves)
}

fn collect_leaves<S>(source: &S, dir: &Path, leaves: &mut Vec<PathBuf>) -> Result<(), HarnessError>
where
    S: DirSource + ?Sized,
{
    let children: Vec<PathBuf> = source
        .entries(dir)?
        .into_iter()
        .filter(DirEntry::is_traversable)
        .map(|entry| dir.join(entry.name))
        .collect();

    if children.is_empty() {
        leaves.push(dir.to_path_buf());
        return Ok(());
    }
    for child in children {
        collect_leaves(source, &child, leaves)?;
    }
    Ok(())
}
