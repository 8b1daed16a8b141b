//! In-memory file trees and the filtered walk over them.
//!
//! A fetched package lives only in memory: [`MemoryTree`] maps repository
//! paths to file contents. Consumers see it through the small [`SourceTree`]
//! interface, so tests can build trees by hand and the materializer never
//! depends on where the bytes came from.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};

/// Minimal read-only view of a file tree with `/`-separated paths.
pub trait SourceTree {
    /// Paths of all files at or below `prefix`, in lexicographic order.
    fn list_files(&self, prefix: &str) -> Vec<String>;

    /// A reader over the contents of the file at `path`.
    fn open(&self, path: &str) -> Option<Box<dyn Read + Send + '_>>;

    /// Whether the file at `path` carries the executable bit.
    fn is_executable(&self, path: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoryFile {
    contents: Vec<u8>,
    executable: bool,
}

/// File tree held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTree {
    files: BTreeMap<String, MemoryFile>,
}

impl MemoryTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file. Leading and trailing slashes are ignored.
    pub fn insert(&mut self, path: &str, contents: Vec<u8>, executable: bool) {
        self.files.insert(
            normalize(path).to_string(),
            MemoryFile {
                contents,
                executable,
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all file contents in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.files.values().map(|f| f.contents.len()).sum()
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// True when `path` is `root` itself or lies below it.
fn is_under(path: &str, root: &str) -> bool {
    root.is_empty()
        || path == root
        || (path.len() > root.len() && path.starts_with(root) && path.as_bytes()[root.len()] == b'/')
}

impl SourceTree for MemoryTree {
    fn list_files(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize(prefix);
        self.files.keys().filter(|path| is_under(path, prefix)).cloned().collect()
    }

    fn open(&self, path: &str) -> Option<Box<dyn Read + Send + '_>> {
        self.files
            .get(normalize(path))
            .map(|file| Box::new(Cursor::new(file.contents.as_slice())) as Box<dyn Read + Send + '_>)
    }

    fn is_executable(&self, path: &str) -> bool {
        self.files.get(normalize(path)).is_some_and(|f| f.executable)
    }
}

/// One item of a [`walk_filtered`] traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path relative to the walk root.
    pub relative_path: String,
    pub is_dir: bool,
}

/// Walks every entry below `root`, yielding paths relative to `root`.
///
/// Directories are derived from file paths and reported once, before their
/// contents. `keep` sees each entry and decides whether it is yielded.
pub fn walk_filtered<T, F>(tree: &T, root: &str, mut keep: F) -> Vec<WalkEntry>
where
    T: SourceTree + ?Sized,
    F: FnMut(&WalkEntry) -> bool,
{
    let root = normalize(root);
    let mut seen_dirs = BTreeSet::new();
    let mut entries = Vec::new();

    for path in tree.list_files(root) {
        let relative = if root.is_empty() { path.as_str() } else { &path[root.len()..] };
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            // `root` names a file, not a directory.
            continue;
        }

        let mut dir_end = 0;
        while let Some(offset) = relative[dir_end..].find('/') {
            dir_end += offset;
            let dir = &relative[..dir_end];
            if seen_dirs.insert(dir.to_string()) {
                let entry = WalkEntry {
                    relative_path: dir.to_string(),
                    is_dir: true,
                };
                if keep(&entry) {
                    entries.push(entry);
                }
            }
            dir_end += 1;
        }

        let entry = WalkEntry {
            relative_path: relative.to_string(),
            is_dir: false,
        };
        if keep(&entry) {
            entries.push(entry);
        }
    }
    entries
}
