//! livecanvas - live preview pipeline for in-memory React projects
//!
//! A project lives entirely in a virtual filesystem that tool calls edit.
//! Each build turns the current tree into a bootstrap document a rendering
//! host can load:
//! - OXC: JSX/TypeScript transpilation with import specifier rewriting
//! - Resolution of aliased, relative and absolute specifiers against the tree
//! - Linking with stand-in modules for anything missing or broken
//! - Entry selection and import-map packaging

pub mod cli;
pub mod config;
pub mod linker;
pub mod packager;
pub mod path;
pub mod resolver;
pub mod session;
pub mod tools;
pub mod transpiler;
pub mod vfs;

// Re-export commonly used types
pub use config::{Config, ConfigError, ConfigResult};
pub use linker::{Linker, LinkerConfig, ModuleGraph};
pub use packager::{BootstrapDocument, PackageError, PackageResult, Packager, PackagerConfig};
pub use resolver::{ModuleResolver, ResolverConfig};
pub use session::{Session, SessionError, SessionResult};
pub use tools::{FileEditCommand, FileManagerCommand, ToolCall};
pub use transpiler::{TranspileError, Transpiler, TranspilerConfig};
pub use vfs::{Snapshot, SnapshotError, VfsConfig, VfsError, VirtualFileSystem};
