//! Execution packaging
//!
//! Picks the entry module and assembles the bootstrap document handed to the
//! rendering host: the entry key, a specifier→reference map, the code of
//! every local module, the third-party specifiers to fetch and the collected
//! stylesheets. Isolation and script injection are the host's business.

use crate::linker::{
    Diagnostic, GraphEntry, ModuleGraph, ModuleOrigin, StandInReason, Stylesheet,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while packaging
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    #[error("No entry module: the project contains no source files")]
    NoEntry,
}

/// Result type for packaging operations
pub type PackageResult<T> = Result<T, PackageError>;

/// Configuration for the packager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
    /// Entry path without extension, tried with the primary then secondary extension
    pub entry_stem: String,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            entry_stem: "/App".to_string(),
        }
    }
}

/// What a key in the import map points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleReference {
    /// A transpiled source module; code is in `modules`
    Local { path: String },
    /// A non-source file wrapped as a module; code is in `modules`
    Asset { path: String },
    /// A generated placeholder; code is in `modules`
    StandIn {
        path: String,
        #[serde(flatten)]
        reason: StandInReason,
    },
    /// A third-party package
    Registry { url: String },
}

/// Everything the rendering host needs to load the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapDocument {
    /// Key of the entry module
    pub entry: String,
    /// One entry per distinct specifier key
    pub imports: BTreeMap<String, ModuleReference>,
    /// Code of every local module, stand-in and asset by key
    pub modules: BTreeMap<String, String>,
    /// Third-party specifiers that need registry resolution
    pub externals: Vec<String>,
    pub styles: Vec<Stylesheet>,
    pub diagnostics: Vec<Diagnostic>,
    pub graph: Vec<GraphEntry>,
}

impl BootstrapDocument {
    /// Build an import map, asking `local_url` for the URL of each local key
    ///
    /// ```text
    /// { "imports": { "/App.jsx": "<local_url(/App.jsx)>", "react": "https://esm.sh/react" } }
    /// ```
    pub fn to_import_map<F>(&self, mut local_url: F) -> serde_json::Value
    where
        F: FnMut(&str) -> String,
    {
        let imports: serde_json::Map<String, serde_json::Value> = self
            .imports
            .iter()
            .map(|(key, reference)| {
                let url = match reference {
                    ModuleReference::Registry { url } => url.clone(),
                    _ => local_url(key),
                };
                (key.clone(), serde_json::Value::String(url))
            })
            .collect();

        serde_json::json!({ "imports": imports })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Selects the entry module and emits bootstrap documents
pub struct Packager {
    config: PackagerConfig,
    extensions: Vec<String>,
}

impl Packager {
    /// `extensions` is the ordered source extension list; the first two
    /// decide the preferred entry files
    pub fn new(config: PackagerConfig, extensions: Vec<String>) -> Self {
        Self { config, extensions }
    }

    /// Pick the entry: stem + primary ext, stem + secondary ext, else the
    /// lexicographically first source module
    pub fn select_entry(&self, graph: &ModuleGraph) -> PackageResult<String> {
        let preferred = self
            .extensions
            .iter()
            .take(2)
            .map(|ext| format!("{}{}", self.config.entry_stem, ext))
            .find(|candidate| graph.sources.contains(candidate));

        if let Some(entry) = preferred {
            return Ok(entry);
        }

        graph
            .sources
            .iter()
            .min()
            .cloned()
            .ok_or(PackageError::NoEntry)
    }

    /// Assemble the bootstrap document for a linked graph
    pub fn package(&self, graph: &ModuleGraph) -> PackageResult<BootstrapDocument> {
        let entry = self.select_entry(graph)?;

        let mut imports = BTreeMap::new();
        let mut modules = BTreeMap::new();

        for (key, module) in &graph.modules {
            let path = key.clone();
            let reference = match &module.origin {
                ModuleOrigin::Source => ModuleReference::Local { path },
                ModuleOrigin::Asset => ModuleReference::Asset { path },
                ModuleOrigin::StandIn(reason) => ModuleReference::StandIn {
                    path,
                    reason: reason.clone(),
                },
            };
            imports.insert(key.clone(), reference);
            modules.insert(key.clone(), module.code.clone());
        }

        for (specifier, url) in &graph.externals {
            imports.insert(specifier.clone(), ModuleReference::Registry { url: url.clone() });
        }

        tracing::debug!("Packaged {} with {} import map entries", entry, imports.len());

        Ok(BootstrapDocument {
            entry,
            imports,
            modules,
            externals: graph.externals.keys().cloned().collect(),
            styles: graph.styles.clone(),
            diagnostics: graph.diagnostics.clone(),
            graph: graph.edges.clone(),
        })
    }
}

impl Default for Packager {
    fn default() -> Self {
        Self::new(
            PackagerConfig::default(),
            crate::resolver::ResolverConfig::default().extensions,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linker::Linker;
    use crate::vfs::VirtualFileSystem;

    fn package(vfs: &VirtualFileSystem) -> PackageResult<BootstrapDocument> {
        let graph = Linker::new().link(vfs);
        Packager::default().package(&graph)
    }

    #[test]
    fn test_primary_extension_wins_regardless_of_creation_order() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.tsx", "export default () => null;").unwrap();
        vfs.create("/App.jsx", "export default () => null;").unwrap();
        assert_eq!(package(&vfs).unwrap().entry, "/App.jsx");

        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.jsx", "export default () => null;").unwrap();
        vfs.create("/App.tsx", "export default () => null;").unwrap();
        assert_eq!(package(&vfs).unwrap().entry, "/App.jsx");
    }

    #[test]
    fn test_secondary_extension_then_first_source() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/zeta.jsx", "export default 1;").unwrap();
        vfs.create("/App.tsx", "export default 1;").unwrap();
        assert_eq!(package(&vfs).unwrap().entry, "/App.tsx");

        let mut vfs = VirtualFileSystem::new();
        vfs.create("/zeta.jsx", "export default 1;").unwrap();
        vfs.create("/components/Main.js", "export default 1;").unwrap();
        vfs.create("/styles.css", "").unwrap();
        assert_eq!(package(&vfs).unwrap().entry, "/components/Main.js");
    }

    #[test]
    fn test_no_source_modules() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/styles.css", "body {}").unwrap();
        assert_eq!(package(&vfs), Err(PackageError::NoEntry));
        assert_eq!(package(&VirtualFileSystem::new()), Err(PackageError::NoEntry));
    }

    #[test]
    fn test_document_contents() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create(
            "/App.jsx",
            "import Missing from './Missing'; import './app.css'; export default () => <Missing />;",
        )
        .unwrap();
        vfs.create("/app.css", "h1 { color: red; }").unwrap();

        let doc = package(&vfs).unwrap();

        assert_eq!(doc.entry, "/App.jsx");
        assert_eq!(
            doc.imports["/App.jsx"],
            ModuleReference::Local {
                path: "/App.jsx".into()
            }
        );
        assert_eq!(
            doc.imports["/Missing"],
            ModuleReference::StandIn {
                path: "/Missing".into(),
                reason: StandInReason::Missing
            }
        );
        assert_eq!(
            doc.imports["/app.css"],
            ModuleReference::Asset {
                path: "/app.css".into()
            }
        );
        assert_eq!(
            doc.imports["react/jsx-runtime"],
            ModuleReference::Registry {
                url: "https://esm.sh/react/jsx-runtime".into()
            }
        );
        assert!(doc.externals.contains(&"react".to_string()));
        assert!(doc.modules["/App.jsx"].contains("/Missing"));
        assert_eq!(doc.styles.len(), 1);
        assert_eq!(doc.diagnostics.len(), 1);
    }

    #[test]
    fn test_import_map() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.jsx", "export default () => <div />;").unwrap();

        let doc = package(&vfs).unwrap();
        let map = doc.to_import_map(|key| format!("blob:{key}"));

        assert_eq!(map["imports"]["/App.jsx"], "blob:/App.jsx");
        assert_eq!(
            map["imports"]["react/jsx-runtime"],
            "https://esm.sh/react/jsx-runtime"
        );
    }

    #[test]
    fn test_document_serializes_reference_kinds() {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.jsx", "import X from './X'; export default X;").unwrap();

        let doc = package(&vfs).unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["imports"]["/X"]["kind"], "stand_in");
        assert_eq!(value["imports"]["/X"]["reason"], "missing");
        assert_eq!(value["imports"]["/App.jsx"]["kind"], "local");
    }
}
