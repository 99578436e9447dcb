//! Command-line helpers and the interactive session shell

use crate::config::Config;
use crate::linker::Severity;
use crate::path;
use crate::session::Session;
use crate::tools::ToolCall;
use crate::vfs::{Entry, Snapshot, SnapshotError, VirtualFileSystem};
use colored::{ColoredString, Colorize};
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;

/// Errors raised by the file helpers
#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Invalid tool calls: {0}")]
    ToolCalls(#[from] serde_json::Error),
}

/// Result type for CLI helpers
pub type CliResult<T> = Result<T, CliError>;

/// Read a snapshot file
pub fn read_snapshot(file: &Path) -> CliResult<Snapshot> {
    let json = std::fs::read_to_string(file)?;
    Ok(Snapshot::from_json(&json)?)
}

/// Write a snapshot file, replacing any previous contents
pub fn write_snapshot(file: &Path, snapshot: &Snapshot) -> CliResult<()> {
    std::fs::write(file, snapshot.to_json())?;
    Ok(())
}

/// Parse tool calls from JSON: either one call or an array of calls
pub fn parse_tool_calls(json: &str) -> CliResult<Vec<ToolCall>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let calls = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(calls)
}

/// Read a file of tool calls
pub fn read_tool_calls(file: &Path) -> CliResult<Vec<ToolCall>> {
    let json = std::fs::read_to_string(file)?;
    parse_tool_calls(&json)
}

/// Indented listing of the whole tree
pub fn render_tree(vfs: &VirtualFileSystem) -> String {
    let mut out = String::from("/");
    for (entry_path, entry) in vfs.walk() {
        let depth = path::segments(&entry_path).count();
        let indent = "  ".repeat(depth);
        let name = path::basename(&entry_path);
        out.push('\n');
        match entry {
            Entry::Directory(_) => out.push_str(&format!("{}{}/", indent, name)),
            Entry::File(_) => out.push_str(&format!("{}{}", indent, name)),
        }
    }
    out
}

/// Colored label for a linker diagnostic
pub fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Warning => "Warning".yellow(),
        Severity::Error => "Error".red(),
    }
}

/// Shell configuration
#[derive(Debug, Clone)]
pub struct ReplConfig {
    pub prompt: String,
    /// Prompt while a JSON value spans several lines
    pub continuation_prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "canvas> ".to_string(),
            continuation_prompt: "   ... ".to_string(),
        }
    }
}

/// Interactive shell driving a session with JSON tool calls
pub struct Repl {
    session: Session,
    config: ReplConfig,
}

impl Repl {
    pub fn new(session: Session) -> Self {
        Self::with_config(session, ReplConfig::default())
    }

    pub fn with_config(session: Session, config: ReplConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn print_banner(&self) {
        println!("{}", "livecanvas session shell".cyan().bold());
        println!("Version: {}", env!("CARGO_PKG_VERSION").green());
        println!("Type {} for help, {} to exit", ".help".yellow(), ".exit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!("{}", "Available commands:".bold());
        println!("  {}          - Show this help message", ".help".yellow());
        println!("  {}          - Print the bootstrap document", ".build".yellow());
        println!("  {}           - List the file tree", ".tree".yellow());
        println!("  {}    - Write a snapshot of the tree", ".save <file>".yellow());
        println!("  {}          - Exit the shell", ".exit".yellow());
        println!();
        println!("{}", "Tool calls:".bold());
        println!(
            r#"  {{"tool": "str_replace_editor", "input": {{"command": "create", "path": "/App.jsx", "file_text": "..."}}}}"#
        );
        println!(
            r#"  {{"tool": "file_manager", "input": {{"command": "delete", "path": "/old.jsx"}}}}"#
        );
        println!();
    }

    /// Whether the buffer holds a whole JSON value; only a value cut short
    /// waits for more lines, malformed input is evaluated to report its error
    fn is_complete(&self, input: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(input) {
            Ok(_) => true,
            Err(e) => !e.is_eof(),
        }
    }

    /// Run a dot command; returns false to leave the shell
    fn process_command(&mut self, command: &str) -> bool {
        let mut parts = command.split_whitespace();
        match (parts.next().unwrap_or_default(), parts.next()) {
            (".exit" | ".quit" | ".q", _) => return false,
            (".help" | ".h", _) => self.print_help(),
            (".tree", _) => println!("{}", render_tree(self.session.vfs())),
            (".build", _) => match self.session.build() {
                Ok(document) => println!("{}", document.to_json()),
                Err(e) => println!("{}: {}", "Error".red(), e),
            },
            (".save", Some(file)) => {
                match write_snapshot(Path::new(file), &self.session.snapshot()) {
                    Ok(()) => println!("{} {}", "Saved".green(), file),
                    Err(e) => println!("{}: {}", "Error".red(), e),
                }
            }
            (".save", None) => println!("{}: .save needs a file name", "Error".red()),
            (cmd, _) => {
                println!(
                    "{}: Unknown command '{}'. Type .help for available commands.",
                    "Error".red(),
                    cmd
                );
            }
        }
        true
    }

    fn evaluate(&mut self, input: &str) {
        let calls = match parse_tool_calls(input) {
            Ok(calls) => calls,
            Err(e) => {
                println!("{}: {}", "Error".red(), e);
                return;
            }
        };

        for call in &calls {
            match self.session.execute(call) {
                Ok(message) => println!("{} {}", "=>".green(), message),
                Err(e) => println!("{}: {}", "Error".red(), e),
            }
        }
    }

    /// Run the shell until `.exit` or end of input
    pub fn run(&mut self) -> io::Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut input_buffer = String::new();

        loop {
            let prompt = if input_buffer.is_empty() {
                &self.config.prompt
            } else {
                &self.config.continuation_prompt
            };
            print!("{}", prompt.cyan());
            stdout.flush()?;

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => {
                    println!();
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    println!("{}: Failed to read input: {}", "Error".red(), e);
                    continue;
                }
            }

            let line = line.trim_end_matches('\n').trim_end_matches('\r');

            if line.is_empty() && input_buffer.is_empty() {
                continue;
            }

            if line.starts_with('.') && input_buffer.is_empty() {
                if !self.process_command(line) {
                    break;
                }
                continue;
            }

            if !input_buffer.is_empty() {
                input_buffer.push('\n');
            }
            input_buffer.push_str(line);

            if self.is_complete(&input_buffer) {
                let input = std::mem::take(&mut input_buffer);
                self.evaluate(&input);
            }
        }

        println!("{}", "Goodbye!".cyan());
        Ok(())
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new(Session::new(&Config::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::FileEditCommand;

    #[test]
    fn test_snapshot_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("project.json");

        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.jsx", "export default 1;").unwrap();
        vfs.create("/components/Button.jsx", "export default 2;").unwrap();

        write_snapshot(&file, &vfs.serialize()).unwrap();
        let snapshot = read_snapshot(&file).unwrap();
        let restored = VirtualFileSystem::deserialize(&snapshot, Default::default()).unwrap();

        assert_eq!(restored, vfs);
    }

    #[test]
    fn test_read_snapshot_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_snapshot(&dir.path().join("absent.json")),
            Err(CliError::Io(_))
        ));

        let file = dir.path().join("bad.json");
        std::fs::write(&file, "[1, 2]").unwrap();
        assert!(matches!(read_snapshot(&file), Err(CliError::Snapshot(_))));
    }

    #[test]
    fn test_tool_calls_single_or_array() {
        let single = parse_tool_calls(
            r#"{"tool": "str_replace_editor", "input": {"command": "undo_edit", "path": "/a.jsx"}}"#,
        )
        .unwrap();
        assert_eq!(
            single,
            vec![ToolCall::Edit(FileEditCommand::UndoEdit {
                path: "/a.jsx".into()
            })]
        );

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("calls.json");
        std::fs::write(
            &file,
            r#"[
                {"tool": "str_replace_editor", "input": {"command": "create", "path": "/a.jsx", "file_text": ""}},
                {"tool": "file_manager", "input": {"command": "delete", "path": "/a.jsx"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(read_tool_calls(&file).unwrap().len(), 2);

        assert!(matches!(
            parse_tool_calls(r#"{"tool": "shell"}"#),
            Err(CliError::ToolCalls(_))
        ));
    }

    #[test]
    fn test_render_tree() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.jsx", "").unwrap();
        vfs.create("/components/ui/Button.jsx", "").unwrap();

        assert_eq!(
            render_tree(&vfs),
            "/\n  App.jsx\n  components/\n    ui/\n      Button.jsx"
        );
    }

    #[test]
    fn test_input_completeness() {
        let repl = Repl::default();
        assert!(!repl.is_complete(r#"{"tool": "file_manager","#));
        assert!(repl.is_complete(r#"{"tool": "file_manager", "input": {}}"#));
        assert!(repl.is_complete("[]"));

        // Braces inside strings do not count
        let open_in_strings = r#"{"tool":"str_replace_editor","input":{"command":"str_replace","path":"/App.jsx","old_str":"function App() {","new_str":"function App(props) {"}}"#;
        assert!(repl.is_complete(open_in_strings));
        assert_eq!(parse_tool_calls(open_in_strings).unwrap().len(), 1);

        assert!(!repl.is_complete(
            "{\"tool\":\"str_replace_editor\",\"input\":{\"command\":\"str_replace\",\n\"path\":\"/App.jsx\",\"old_str\":\"}}}}\","
        ));

        // Malformed input is handed on so its error gets reported
        assert!(repl.is_complete(r#"{"tool": nope}"#));
    }

    #[test]
    fn test_severity_label() {
        assert_eq!(&*severity_label(Severity::Error), "Error");
        assert_eq!(&*severity_label(Severity::Warning), "Warning");
    }
}
