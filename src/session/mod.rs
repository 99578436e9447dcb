//! Editing session
//!
//! A `Session` is the single owner of one project's virtual filesystem. Tool
//! calls go through it, and it rebuilds the bootstrap document from the
//! whole tree whenever the tree has changed since the last build.

use crate::config::Config;
use crate::linker::{Linker, ModuleGraph};
use crate::packager::{BootstrapDocument, PackageError, Packager};
use crate::tools::ToolCall;
use crate::vfs::{Snapshot, SnapshotResult, VfsError, VirtualFileSystem};
use thiserror::Error;

/// Errors that can occur during a session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error(transparent)]
    Package(#[from] PackageError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

struct Build {
    revision: u64,
    graph: ModuleGraph,
    document: BootstrapDocument,
}

pub struct Session {
    vfs: VirtualFileSystem,
    linker: Linker,
    packager: Packager,
    revision: u64,
    last_build: Option<Build>,
}

impl Session {
    /// Start a session over an empty tree
    pub fn new(config: &Config) -> Self {
        Self::with_vfs(VirtualFileSystem::with_config(config.vfs.clone()), config)
    }

    /// Start a session from a stored snapshot
    pub fn from_snapshot(snapshot: &Snapshot, config: &Config) -> SnapshotResult<Self> {
        let vfs = VirtualFileSystem::deserialize(snapshot, config.vfs.clone())?;
        Ok(Self::with_vfs(vfs, config))
    }

    fn with_vfs(vfs: VirtualFileSystem, config: &Config) -> Self {
        Self {
            vfs,
            linker: Linker::with_config(config.linker_config()),
            packager: Packager::new(config.packager.clone(), config.resolver.extensions.clone()),
            revision: 0,
            last_build: None,
        }
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    /// Number of successful mutations applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn linker(&self) -> &Linker {
        &self.linker
    }

    /// Apply one tool call; the revision advances only if it changed the tree
    pub fn execute(&mut self, call: &ToolCall) -> SessionResult<String> {
        match call.apply(&mut self.vfs) {
            Ok(message) => {
                if call.is_mutation() {
                    self.revision += 1;
                    tracing::debug!("Revision {}: {}", self.revision, message);
                }
                Ok(message)
            }
            Err(e) => {
                tracing::debug!("Tool call failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Link and package the current tree
    ///
    /// Repeated calls at the same revision return the previous document.
    pub fn build(&mut self) -> SessionResult<&BootstrapDocument> {
        let stale = self
            .last_build
            .as_ref()
            .is_none_or(|build| build.revision != self.revision);

        if stale {
            let graph = self.linker.link(&self.vfs);
            let document = self.packager.package(&graph)?;
            tracing::info!(
                "Built revision {}: {} modules, {} diagnostics",
                self.revision,
                document.modules.len(),
                document.diagnostics.len()
            );
            self.last_build = Some(Build {
                revision: self.revision,
                graph,
                document,
            });
        }

        match &self.last_build {
            Some(build) => Ok(&build.document),
            None => Err(PackageError::NoEntry.into()),
        }
    }

    /// Graph of the last successful build
    pub fn graph(&self) -> Option<&ModuleGraph> {
        self.last_build.as_ref().map(|build| &build.graph)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.vfs.serialize()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
