//! Tree nodes
//!
//! Nodes never store their own path. The path of a node is the chain of
//! child names leading to it from the root, rebuilt during traversal.

use indexmap::IndexMap;

/// A node in the virtual tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileNode),
    Directory(DirectoryNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Directory(_) => NodeKind::Directory,
        }
    }
}

/// Discriminant of a [`Node`], used in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// A text file with its linear edit history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNode {
    content: String,
    /// Prior contents, oldest first
    history: Vec<String>,
}

impl FileNode {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            history: Vec::new(),
        }
    }

    /// Restore a file from stored history (oldest first), keeping at most
    /// `limit` of the most recent entries
    pub(crate) fn with_history(
        content: String,
        mut history: Vec<String>,
        limit: Option<usize>,
    ) -> Self {
        if let Some(limit) = limit {
            let excess = history.len().saturating_sub(limit);
            history.drain(..excess);
        }
        Self { content, history }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Prior contents, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Replace the content, pushing the previous content onto the history
    pub(crate) fn record(&mut self, content: String, limit: Option<usize>) {
        let previous = std::mem::replace(&mut self.content, content);
        self.history.push(previous);

        if let Some(limit) = limit {
            let excess = self.history.len().saturating_sub(limit);
            self.history.drain(..excess);
        }
    }

    /// Restore the most recent history entry; `false` when there is none
    pub(crate) fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.content = previous;
                true
            }
            None => false,
        }
    }
}

/// A directory; children keep their insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryNode {
    pub(crate) children: IndexMap<String, Node>,
}

impl DirectoryNode {
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Borrowed view of a node found by path lookup
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    File(&'a FileNode),
    Directory(&'a DirectoryNode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_undo() {
        let mut file = FileNode::new("one");
        file.record("two".to_string(), None);
        file.record("three".to_string(), None);
        assert_eq!(file.history(), ["one", "two"]);

        assert!(file.undo());
        assert_eq!(file.content(), "two");
        assert!(file.undo());
        assert_eq!(file.content(), "one");
        assert!(!file.undo());
    }

    #[test]
    fn test_history_limit_drops_oldest() {
        let mut file = FileNode::new("v0");
        for i in 1..=5 {
            file.record(format!("v{i}"), Some(2));
        }
        assert_eq!(file.history(), ["v3", "v4"]);
    }
}
