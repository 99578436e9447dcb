//! Tool-call commands
//!
//! The finite command set the tool-dispatch collaborator sends, in the shape
//! of its JSON arguments:
//!
//! ```json
//! { "tool": "str_replace_editor", "input": { "command": "create", "path": "/App.jsx", "file_text": "..." } }
//! { "tool": "file_manager", "input": { "command": "rename", "path": "/a.jsx", "new_path": "/b.jsx" } }
//! ```
//!
//! Each command maps onto one virtual filesystem operation and returns a
//! short outcome message for the caller to relay.

use crate::path;
use crate::vfs::{CreateOutcome, NodeKind, VfsResult, ViewResult, VirtualFileSystem};
use serde::{Deserialize, Serialize};

/// Commands of the file-edit tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FileEditCommand {
    Create {
        path: String,
        #[serde(default)]
        file_text: String,
    },
    View {
        path: String,
        /// 1-based inclusive `[start, end]`; `end == -1` reads to the end
        #[serde(default)]
        view_range: Option<[i64; 2]>,
    },
    StrReplace {
        path: String,
        old_str: String,
        #[serde(default)]
        new_str: String,
    },
    Insert {
        path: String,
        insert_line: usize,
        new_str: String,
    },
    UndoEdit {
        path: String,
    },
}

/// Commands of the file-management tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FileManagerCommand {
    Rename { path: String, new_path: String },
    Delete { path: String },
}

/// A tool call addressed to one of the two tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "input")]
pub enum ToolCall {
    #[serde(rename = "str_replace_editor")]
    Edit(FileEditCommand),
    #[serde(rename = "file_manager")]
    Manage(FileManagerCommand),
}

impl ToolCall {
    /// Whether a successful call changes the tree
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ToolCall::Edit(FileEditCommand::View { .. }))
    }

    /// Apply the call to `vfs`, returning the outcome message
    pub fn apply(&self, vfs: &mut VirtualFileSystem) -> VfsResult<String> {
        match self {
            ToolCall::Edit(command) => command.apply(vfs),
            ToolCall::Manage(command) => command.apply(vfs),
        }
    }
}

impl FileEditCommand {
    pub fn apply(&self, vfs: &mut VirtualFileSystem) -> VfsResult<String> {
        match self {
            FileEditCommand::Create { path, file_text } => {
                let outcome = vfs.create(path, file_text.as_str())?;
                let verb = match outcome {
                    CreateOutcome::Created => "created",
                    CreateOutcome::Overwritten => "overwritten",
                };
                Ok(format!("File {}: {}", verb, path::normalize(path)))
            }
            FileEditCommand::View { path, view_range } => view(vfs, path, *view_range),
            FileEditCommand::StrReplace {
                path,
                old_str,
                new_str,
            } => {
                vfs.str_replace(path, old_str, new_str)?;
                Ok(format!("Replaced text in {}", path::normalize(path)))
            }
            FileEditCommand::Insert {
                path,
                insert_line,
                new_str,
            } => {
                vfs.insert(path, *insert_line, new_str)?;
                Ok(format!(
                    "Text inserted after line {} in {}",
                    insert_line,
                    path::normalize(path)
                ))
            }
            FileEditCommand::UndoEdit { path } => {
                vfs.undo_edit(path)?;
                Ok(format!("Last edit to {} undone", path::normalize(path)))
            }
        }
    }
}

impl FileManagerCommand {
    pub fn apply(&self, vfs: &mut VirtualFileSystem) -> VfsResult<String> {
        match self {
            FileManagerCommand::Rename { path, new_path } => {
                vfs.rename(path, new_path)?;
                Ok(format!(
                    "Renamed {} to {}",
                    path::normalize(path),
                    path::normalize(new_path)
                ))
            }
            FileManagerCommand::Delete { path } => {
                vfs.delete(path)?;
                Ok(format!("Deleted {}", path::normalize(path)))
            }
        }
    }
}

/// Numbered lines for a file, or a listing for a directory
fn view(vfs: &VirtualFileSystem, path: &str, range: Option<[i64; 2]>) -> VfsResult<String> {
    if let Some([start, end]) = range {
        let start = usize::try_from(start).unwrap_or(1);
        let lines = vfs.view_range(path, start, end)?;
        return Ok(number_lines(lines.iter().map(|(n, l)| (*n, l.as_str()))));
    }

    match vfs.view(path)? {
        ViewResult::File { content } if content.is_empty() => Ok("(empty file)".to_string()),
        ViewResult::File { content } => Ok(number_lines(
            content.lines().enumerate().map(|(idx, line)| (idx + 1, line)),
        )),
        ViewResult::Directory { entries } if entries.is_empty() => {
            Ok("(empty directory)".to_string())
        }
        ViewResult::Directory { entries } => Ok(entries
            .iter()
            .map(|entry| match entry.kind {
                NodeKind::Directory => format!("[DIR] {}", entry.name),
                NodeKind::File => format!("[FILE] {}", entry.name),
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

fn number_lines<'a>(lines: impl Iterator<Item = (usize, &'a str)>) -> String {
    lines
        .map(|(number, line)| format!("{}\t{}", number, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::VfsError;
    use serde_json::json;

    fn call(value: serde_json::Value) -> ToolCall {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parses_tool_call_arguments() {
        let create = call(json!({
            "tool": "str_replace_editor",
            "input": { "command": "create", "path": "/App.jsx", "file_text": "x" }
        }));
        assert_eq!(
            create,
            ToolCall::Edit(FileEditCommand::Create {
                path: "/App.jsx".into(),
                file_text: "x".into()
            })
        );

        let rename = call(json!({
            "tool": "file_manager",
            "input": { "command": "rename", "path": "/a", "new_path": "/b" }
        }));
        assert_eq!(
            rename,
            ToolCall::Manage(FileManagerCommand::Rename {
                path: "/a".into(),
                new_path: "/b".into()
            })
        );
    }

    #[test]
    fn test_rejects_unknown_command() {
        let result = serde_json::from_value::<ToolCall>(json!({
            "tool": "str_replace_editor",
            "input": { "command": "chmod", "path": "/a" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_flow() {
        let mut vfs = VirtualFileSystem::new();

        let out = call(json!({
            "tool": "str_replace_editor",
            "input": { "command": "create", "path": "components/Card.jsx", "file_text": "a\nb" }
        }))
        .apply(&mut vfs)
        .unwrap();
        assert_eq!(out, "File created: /components/Card.jsx");

        call(json!({
            "tool": "str_replace_editor",
            "input": { "command": "insert", "path": "/components/Card.jsx", "insert_line": 1, "new_str": "mid" }
        }))
        .apply(&mut vfs)
        .unwrap();

        let shown = call(json!({
            "tool": "str_replace_editor",
            "input": { "command": "view", "path": "/components/Card.jsx" }
        }))
        .apply(&mut vfs)
        .unwrap();
        assert_eq!(shown, "1\ta\n2\tmid\n3\tb");

        let window = call(json!({
            "tool": "str_replace_editor",
            "input": { "command": "view", "path": "/components/Card.jsx", "view_range": [2, -1] }
        }))
        .apply(&mut vfs)
        .unwrap();
        assert_eq!(window, "2\tmid\n3\tb");

        let listing = call(json!({
            "tool": "str_replace_editor",
            "input": { "command": "view", "path": "/" }
        }))
        .apply(&mut vfs)
        .unwrap();
        assert_eq!(listing, "[DIR] components");
    }

    #[test]
    fn test_errors_are_typed() {
        let mut vfs = VirtualFileSystem::new();
        let err = call(json!({
            "tool": "file_manager",
            "input": { "command": "delete", "path": "/ghost.jsx" }
        }))
        .apply(&mut vfs)
        .unwrap_err();
        assert_eq!(err, VfsError::NotFound("/ghost.jsx".into()));
    }

    #[test]
    fn test_only_view_is_read_only() {
        let view = ToolCall::Edit(FileEditCommand::View {
            path: "/".into(),
            view_range: None,
        });
        let undo = ToolCall::Edit(FileEditCommand::UndoEdit { path: "/a".into() });
        let delete = ToolCall::Manage(FileManagerCommand::Delete { path: "/a".into() });

        assert!(!view.is_mutation());
        assert!(undo.is_mutation());
        assert!(delete.is_mutation());
    }
}
