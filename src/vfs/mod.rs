//! In-memory virtual filesystem
//!
//! An owned tree of directories and text files with per-file undo. Nothing
//! here touches real storage. All operations are synchronous and atomic:
//! preconditions are checked before the tree is modified, so a failed
//! operation leaves the tree exactly as it was.

mod error;
mod node;
mod snapshot;

pub use error::{SnapshotError, SnapshotResult, VfsError, VfsResult};
pub use node::{DirectoryNode, Entry, FileNode, Node, NodeKind};
pub use snapshot::{Snapshot, SnapshotEntry};

use crate::path::{self, ROOT};
use serde::{Deserialize, Serialize};

/// How `str_replace` treats text that occurs more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacePolicy {
    /// Replace the first occurrence only
    #[default]
    First,
    /// Fail with [`VfsError::AmbiguousMatch`]
    RejectAmbiguous,
    /// Replace every occurrence
    All,
}

/// Configuration for the virtual filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Maximum number of history entries kept per file (unbounded if unset)
    pub history_limit: Option<usize>,
    /// Policy for `str_replace` when the text occurs several times
    pub replace_policy: ReplacePolicy,
}

/// Result of `create`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Overwritten,
}

/// One child in a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
}

/// Result of `view`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewResult {
    File { content: String },
    Directory { entries: Vec<DirEntry> },
}

/// The virtual filesystem
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFileSystem {
    root: DirectoryNode,
    config: VfsConfig,
}

impl VirtualFileSystem {
    /// Create an empty tree with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with custom configuration
    pub fn with_config(config: VfsConfig) -> Self {
        Self {
            root: DirectoryNode::default(),
            config,
        }
    }

    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Look up the node at `path`
    pub fn lookup(&self, path: &str) -> Option<Entry<'_>> {
        let path = path::normalize(path);
        let mut dir = &self.root;
        let mut segments = path::segments(&path).peekable();

        while let Some(segment) = segments.next() {
            let is_last = segments.peek().is_none();
            match dir.children.get(segment)? {
                Node::Directory(child) if is_last => return Some(Entry::Directory(child)),
                Node::Directory(child) => dir = child,
                Node::File(file) if is_last => return Some(Entry::File(file)),
                Node::File(_) => return None,
            }
        }

        Some(Entry::Directory(dir))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn is_file(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(Entry::File(_)))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(Entry::Directory(_)))
    }

    /// Borrow the content of the file at `path`
    pub fn read_file(&self, path: &str) -> VfsResult<&str> {
        match self.lookup(path) {
            Some(Entry::File(file)) => Ok(file.content()),
            Some(Entry::Directory(_)) => Err(VfsError::NotAFile(path::normalize(path))),
            None => Err(VfsError::NotFound(path::normalize(path))),
        }
    }

    /// Number of undo steps available for the file at `path`
    pub fn history_len(&self, path: &str) -> VfsResult<usize> {
        match self.lookup(path) {
            Some(Entry::File(file)) => Ok(file.history().len()),
            Some(Entry::Directory(_)) => Err(VfsError::NotAFile(path::normalize(path))),
            None => Err(VfsError::NotFound(path::normalize(path))),
        }
    }

    /// File content, or a one-level listing for a directory
    pub fn view(&self, path: &str) -> VfsResult<ViewResult> {
        match self.lookup(path) {
            Some(Entry::File(file)) => Ok(ViewResult::File {
                content: file.content().to_string(),
            }),
            Some(Entry::Directory(dir)) => Ok(ViewResult::Directory {
                entries: dir
                    .children()
                    .map(|(name, node)| DirEntry {
                        name: name.to_string(),
                        kind: node.kind(),
                    })
                    .collect(),
            }),
            None => Err(VfsError::NotFound(path::normalize(path))),
        }
    }

    /// Lines `start..=end` (1-based) of a file; `end < 0` reads to the end
    ///
    /// The window is clamped to the file's bounds.
    pub fn view_range(&self, path: &str, start: usize, end: i64) -> VfsResult<Vec<(usize, String)>> {
        let content = self.read_file(path)?;
        let start = start.max(1);

        Ok(content
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(number, _)| *number >= start && (end < 0 || *number as i64 <= end))
            .map(|(number, line)| (number, line.to_string()))
            .collect())
    }

    /// Paths of every file in the tree, depth-first in insertion order
    pub fn files(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter(|(_, entry)| matches!(entry, Entry::File(_)))
            .map(|(path, _)| path)
            .collect()
    }

    /// Every node below the root in pre-order, with its absolute path
    pub fn walk(&self) -> Vec<(String, Entry<'_>)> {
        fn visit<'a>(dir: &'a DirectoryNode, prefix: &str, out: &mut Vec<(String, Entry<'a>)>) {
            for (name, node) in dir.children() {
                let path = path::join(prefix, name);
                match node {
                    Node::File(file) => out.push((path, Entry::File(file))),
                    Node::Directory(child) => {
                        out.push((path.clone(), Entry::Directory(child)));
                        visit(child, &path, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        visit(&self.root, ROOT, &mut out);
        out
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create or overwrite a file, creating missing parent directories
    pub fn create(&mut self, path: &str, content: impl Into<String>) -> VfsResult<CreateOutcome> {
        let path = path::normalize(path);
        if path == ROOT {
            return Err(VfsError::InvalidPath(path));
        }

        self.check_parents(&path)?;
        if let Some(Entry::Directory(_)) = self.lookup(&path) {
            return Err(VfsError::Conflict(path));
        }

        let limit = self.config.history_limit;
        let name = path::basename(&path).to_string();
        let parent = self.create_dirs(path::dirname(&path))?;

        match parent.children.get_mut(&name) {
            Some(Node::File(file)) => {
                file.record(content.into(), limit);
                Ok(CreateOutcome::Overwritten)
            }
            Some(Node::Directory(_)) => Err(VfsError::Conflict(path)),
            None => {
                parent.children.insert(name, Node::File(FileNode::new(content)));
                Ok(CreateOutcome::Created)
            }
        }
    }

    /// Replace `old_text` with `new_text` according to the replace policy
    pub fn str_replace(&mut self, path: &str, old_text: &str, new_text: &str) -> VfsResult<()> {
        let path = path::normalize(path);
        let policy = self.config.replace_policy;
        let limit = self.config.history_limit;
        let file = self.file_mut(&path)?;

        if old_text.is_empty() {
            return Err(VfsError::NoMatch(path));
        }

        let count = file.content().matches(old_text).count();
        let updated = match (count, policy) {
            (0, _) => return Err(VfsError::NoMatch(path)),
            (1, _) | (_, ReplacePolicy::First) => file.content().replacen(old_text, new_text, 1),
            (_, ReplacePolicy::All) => file.content().replace(old_text, new_text),
            (count, ReplacePolicy::RejectAmbiguous) => {
                return Err(VfsError::AmbiguousMatch { path, count });
            }
        };

        file.record(updated, limit);
        Ok(())
    }

    /// Insert `new_text` as a new line after line `line` (1-based)
    ///
    /// `line == 0` inserts before the first line; indices past the end
    /// append after the last line.
    pub fn insert(&mut self, path: &str, line: usize, new_text: &str) -> VfsResult<()> {
        let path = path::normalize(path);
        let limit = self.config.history_limit;
        let file = self.file_mut(&path)?;

        let content = file.content();
        let trailing_newline = content.ends_with('\n');
        let mut lines: Vec<&str> = if content.is_empty() {
            Vec::new()
        } else {
            content.strip_suffix('\n').unwrap_or(content).split('\n').collect()
        };

        let at = line.min(lines.len());
        lines.insert(at, new_text);

        let mut updated = lines.join("\n");
        if trailing_newline {
            updated.push('\n');
        }

        file.record(updated, limit);
        Ok(())
    }

    /// Restore the previous content of a file
    pub fn undo_edit(&mut self, path: &str) -> VfsResult<()> {
        let path = path::normalize(path);
        let file = self.file_mut(&path)?;

        if file.undo() {
            Ok(())
        } else {
            Err(VfsError::NoHistory(path))
        }
    }

    /// Move a file or a whole directory subtree to a new path
    pub fn rename(&mut self, old_path: &str, new_path: &str) -> VfsResult<()> {
        let old_path = path::normalize(old_path);
        let new_path = path::normalize(new_path);

        if old_path == ROOT {
            return Err(VfsError::InvalidPath(old_path));
        }
        if new_path == ROOT {
            return Err(VfsError::InvalidPath(new_path));
        }
        if !self.exists(&old_path) {
            return Err(VfsError::NotFound(old_path));
        }
        if self.exists(&new_path) {
            return Err(VfsError::Conflict(new_path));
        }
        if path::is_within(&new_path, &old_path) {
            return Err(VfsError::InvalidPath(new_path));
        }
        self.check_parents(&new_path)?;

        // new_path is not below old_path, so detaching cannot remove the
        // directories created here
        let new_parent = path::dirname(&new_path).to_string();
        self.create_dirs(&new_parent)?;

        let node = self
            .detach(&old_path)
            .ok_or_else(|| VfsError::NotFound(old_path.clone()))?;
        let parent = self
            .dir_mut(&new_parent)
            .ok_or_else(|| VfsError::NotFound(new_parent.clone()))?;
        parent
            .children
            .insert(path::basename(&new_path).to_string(), node);

        Ok(())
    }

    /// Remove a file, or a directory and everything below it
    pub fn delete(&mut self, path: &str) -> VfsResult<()> {
        let path = path::normalize(path);
        if path == ROOT {
            return Err(VfsError::InvalidPath(path));
        }

        self.detach(&path).map(|_| ()).ok_or(VfsError::NotFound(path))
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Project the tree into its persisted form
    pub fn serialize(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();

        for (path, entry) in self.walk() {
            let entry = match entry {
                Entry::Directory(_) => SnapshotEntry::Directory,
                Entry::File(file) => SnapshotEntry::File {
                    content: file.content().to_string(),
                    history: file.history().iter().rev().cloned().collect(),
                },
            };
            snapshot.insert(path, entry);
        }

        snapshot
    }

    /// Rebuild a tree from a snapshot
    pub fn deserialize(snapshot: &Snapshot, config: VfsConfig) -> SnapshotResult<Self> {
        let limit = config.history_limit;
        let mut vfs = Self::with_config(config);

        for (path, entry) in snapshot.entries() {
            if path::normalize(path) != path {
                return Err(SnapshotError::invalid_path(path));
            }

            match entry {
                SnapshotEntry::Directory => {
                    if vfs.is_file(path) || vfs.check_parents(path).is_err() {
                        return Err(SnapshotError::Conflict(path.to_string()));
                    }
                    vfs.create_dirs(path)
                        .map_err(|_| SnapshotError::Conflict(path.to_string()))?;
                }
                SnapshotEntry::File { content, history } => {
                    if path == ROOT || vfs.exists(path) || vfs.check_parents(path).is_err() {
                        return Err(SnapshotError::Conflict(path.to_string()));
                    }
                    let parent = vfs
                        .create_dirs(path::dirname(path))
                        .map_err(|_| SnapshotError::Conflict(path.to_string()))?;
                    let history = history.iter().rev().cloned().collect();
                    parent.children.insert(
                        path::basename(path).to_string(),
                        Node::File(FileNode::with_history(
                            content.clone(),
                            history,
                            limit,
                        )),
                    );
                }
            }
        }

        Ok(vfs)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Fail if any proper ancestor of `path` is a file
    fn check_parents(&self, path: &str) -> VfsResult<()> {
        let segments: Vec<&str> = path::segments(path).collect();
        let mut dir = &self.root;
        let mut current = String::new();

        for segment in &segments[..segments.len().saturating_sub(1)] {
            current.push('/');
            current.push_str(segment);

            match dir.children.get(*segment) {
                Some(Node::Directory(child)) => dir = child,
                Some(Node::File(_)) => return Err(VfsError::Conflict(current)),
                None => return Ok(()),
            }
        }

        Ok(())
    }

    /// Walk to the directory at `path`, creating missing directories
    fn create_dirs(&mut self, path: &str) -> VfsResult<&mut DirectoryNode> {
        let mut dir = &mut self.root;

        for segment in path::segments(path) {
            let node = dir
                .children
                .entry(segment.to_string())
                .or_insert_with(|| Node::Directory(DirectoryNode::default()));
            dir = match node {
                Node::Directory(child) => child,
                Node::File(_) => return Err(VfsError::Conflict(path.to_string())),
            };
        }

        Ok(dir)
    }

    fn dir_mut(&mut self, path: &str) -> Option<&mut DirectoryNode> {
        let mut dir = &mut self.root;

        for segment in path::segments(path) {
            dir = match dir.children.get_mut(segment)? {
                Node::Directory(child) => child,
                Node::File(_) => return None,
            };
        }

        Some(dir)
    }

    fn file_mut(&mut self, path: &str) -> VfsResult<&mut FileNode> {
        let name = path::basename(path);
        let parent = self
            .dir_mut(path::dirname(path))
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;

        match parent.children.get_mut(name) {
            Some(Node::File(file)) => Ok(file),
            Some(Node::Directory(_)) => Err(VfsError::NotAFile(path.to_string())),
            None if path == ROOT => Err(VfsError::NotAFile(path.to_string())),
            None => Err(VfsError::NotFound(path.to_string())),
        }
    }

    fn detach(&mut self, path: &str) -> Option<Node> {
        let parent = self.dir_mut(path::dirname(path))?;
        parent.children.shift_remove(path::basename(path))
    }
}
