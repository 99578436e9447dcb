//! Module graph linking
//!
//! Walks every source module in the virtual filesystem, transpiles it and
//! resolves its specifiers into a closed graph:
//! - Local imports point at the canonical key of their target (the resolved
//!   VFS path), so identical literals written in different directories never
//!   collide
//! - Third-party imports point at a registry reference
//! - Unresolved local imports and modules that fail to transpile are backed
//!   by generated stand-ins, reported as diagnostics, and never abort the pass
//!
//! The graph is rebuilt from scratch on every pass; per-file transpile
//! results are memoized by content hash.

mod cache;
mod registry;
mod stand_in;

pub use cache::{CompiledModule, ResolvedImport, TranspileCache};
pub use registry::{Registry, RegistryConfig};
pub use stand_in::StandInReason;

use crate::path;
use crate::resolver::{ModuleResolver, Resolution, ResolverConfig};
use crate::transpiler::{Transpiler, TranspilerConfig};
use crate::vfs::VirtualFileSystem;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How a specifier was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    LocalResolved,
    LocalUnresolved,
    ThirdParty,
}

/// One import edge of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEntry {
    /// Path of the importing module
    pub importer: String,
    /// The specifier as written in source
    pub specifier: String,
    pub kind: ResolutionKind,
    /// VFS path, stand-in key or registry reference
    pub target: String,
}

/// Where a linked module's code came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum ModuleOrigin {
    /// Transpiled from a source file
    Source,
    /// Wrapped from a non-source file (stylesheet, JSON, other asset)
    Asset,
    /// Generated placeholder
    StandIn(StandInReason),
}

/// A module ready to be loaded by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedModule {
    pub code: String,
    #[serde(flatten)]
    pub origin: ModuleOrigin,
}

/// A stylesheet imported by some module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stylesheet {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found while linking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The module the problem belongs to
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    pub message: String,
}

/// The closed module graph produced by one linking pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleGraph {
    /// Every source module in the tree, sorted
    pub sources: Vec<String>,
    /// Loadable modules by canonical key
    pub modules: BTreeMap<String, LinkedModule>,
    /// Import edges in importer order
    pub edges: Vec<GraphEntry>,
    /// Third-party specifiers and their registry references
    pub externals: BTreeMap<String, String>,
    pub styles: Vec<Stylesheet>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModuleGraph {
    /// Keys of every generated stand-in
    pub fn stand_ins(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .filter(|(_, m)| matches!(m.origin, ModuleOrigin::StandIn(_)))
            .map(|(key, _)| key.as_str())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Configuration for linking
#[derive(Debug, Clone, Default)]
pub struct LinkerConfig {
    pub resolver: ResolverConfig,
    pub transpiler: TranspilerConfig,
    pub registry: RegistryConfig,
}

/// Builds module graphs from virtual filesystem snapshots
pub struct Linker {
    resolver: ResolverConfig,
    transpiler: Transpiler,
    registry: RegistryConfig,
    cache: TranspileCache,
}

impl Linker {
    pub fn new() -> Self {
        Self::with_config(LinkerConfig::default())
    }

    pub fn with_config(config: LinkerConfig) -> Self {
        Self {
            resolver: config.resolver,
            transpiler: Transpiler::with_config(config.transpiler),
            registry: config.registry,
            cache: TranspileCache::new(),
        }
    }

    pub fn resolver_config(&self) -> &ResolverConfig {
        &self.resolver
    }

    pub fn cache(&self) -> &TranspileCache {
        &self.cache
    }

    /// Link every source module currently in the tree
    pub fn link(&mut self, vfs: &VirtualFileSystem) -> ModuleGraph {
        let files = vfs.files();
        let fingerprint = TranspileCache::fingerprint(&files);
        let registry = Registry::for_tree(&self.registry, vfs);

        let mut sources: Vec<String> = files
            .iter()
            .filter(|f| self.resolver.is_source(f))
            .cloned()
            .collect();
        sources.sort();

        let mut graph = ModuleGraph {
            sources: sources.clone(),
            ..Default::default()
        };
        // Bindings requested from each local target, for stand-in exports
        let mut wanted: HashMap<String, Vec<String>> = HashMap::new();
        let mut failed: BTreeMap<String, String> = BTreeMap::new();
        let mut missing: BTreeSet<String> = BTreeSet::new();
        let mut assets: BTreeSet<String> = BTreeSet::new();

        self.cache.begin_pass();

        for source in &sources {
            let Ok(content) = vfs.read_file(source) else {
                continue;
            };

            let compiled = match self.compile(vfs, source, content, &fingerprint) {
                Ok(compiled) => compiled,
                Err(e) => {
                    tracing::warn!("{}", e);
                    graph.diagnostics.push(Diagnostic {
                        severity: Severity::Error,
                        path: source.clone(),
                        specifier: None,
                        message: e.to_string(),
                    });
                    failed.insert(source.clone(), e.to_string());
                    continue;
                }
            };

            tracing::debug!("Linked {} ({} imports)", source, compiled.imports.len());

            for ResolvedImport { import, resolution } in compiled.imports {
                let (kind, target) = match resolution {
                    Resolution::Local(target) => {
                        if !self.resolver.is_source(&target) {
                            assets.insert(target.clone());
                        }
                        (ResolutionKind::LocalResolved, target)
                    }
                    Resolution::Unresolved(target) => {
                        tracing::warn!("Cannot resolve '{}' from {}", import.specifier, source);
                        graph.diagnostics.push(Diagnostic {
                            severity: Severity::Warning,
                            path: source.clone(),
                            specifier: Some(import.specifier.clone()),
                            message: format!(
                                "Cannot resolve '{}'; using a placeholder for {}",
                                import.specifier, target
                            ),
                        });
                        missing.insert(target.clone());
                        (ResolutionKind::LocalUnresolved, target)
                    }
                    Resolution::ThirdParty(specifier) => {
                        let reference = registry.reference(&specifier);
                        graph.externals.insert(specifier, reference.clone());
                        (ResolutionKind::ThirdParty, reference)
                    }
                };

                if kind != ResolutionKind::ThirdParty {
                    wanted
                        .entry(target.clone())
                        .or_default()
                        .extend(import.names.iter().cloned());
                }

                graph.edges.push(GraphEntry {
                    importer: source.clone(),
                    specifier: import.specifier,
                    kind,
                    target,
                });
            }

            graph.modules.insert(
                source.clone(),
                LinkedModule {
                    code: compiled.code,
                    origin: ModuleOrigin::Source,
                },
            );
        }

        self.cache.end_pass();

        for asset in &assets {
            let Ok(content) = vfs.read_file(asset) else {
                continue;
            };
            match path::extname(asset) {
                ".css" => {
                    graph.styles.push(Stylesheet {
                        path: asset.clone(),
                        content: content.to_string(),
                    });
                    graph.modules.insert(asset.clone(), asset_module("export default {};\n".into()));
                }
                ".json" => match serde_json::from_str::<serde_json::Value>(content) {
                    Ok(value) => {
                        graph
                            .modules
                            .insert(asset.clone(), asset_module(format!("export default {};\n", value)));
                    }
                    Err(e) => {
                        let message = format!("Invalid JSON: {}", e);
                        tracing::warn!("{}: {}", asset, message);
                        graph.diagnostics.push(Diagnostic {
                            severity: Severity::Error,
                            path: asset.clone(),
                            specifier: None,
                            message: message.clone(),
                        });
                        failed.insert(asset.clone(), message);
                    }
                },
                _ => {
                    let literal = serde_json::Value::String(asset.clone());
                    graph
                        .modules
                        .insert(asset.clone(), asset_module(format!("export default {};\n", literal)));
                }
            }
        }

        let runtime = self.transpiler.config().runtime_package().to_string();
        let stand_ins = failed
            .into_iter()
            .map(|(key, message)| (key, StandInReason::TransformFailed { message }))
            .chain(missing.into_iter().map(|key| (key, StandInReason::Missing)));

        for (key, reason) in stand_ins {
            let names = wanted.get(&key).map(Vec::as_slice).unwrap_or_default();
            let code = stand_in::render(&key, &reason, names, &runtime);
            graph.modules.insert(
                key,
                LinkedModule {
                    code,
                    origin: ModuleOrigin::StandIn(reason),
                },
            );
        }

        if graph.stand_ins().next().is_some() && !graph.externals.contains_key(&runtime) {
            let reference = registry.reference(&runtime);
            graph.externals.insert(runtime, reference);
        }

        let (hits, misses) = self.cache.stats();
        tracing::info!(
            "Linked {} modules ({} stand-ins, {} externals, cache {}/{})",
            graph.modules.len(),
            graph.stand_ins().count(),
            graph.externals.len(),
            hits,
            hits + misses
        );

        graph
    }

    /// Transpile one source module, resolving and rewriting its specifiers
    fn compile(
        &mut self,
        vfs: &VirtualFileSystem,
        source: &str,
        content: &str,
        fingerprint: &str,
    ) -> cache::CompileOutcome {
        let key = TranspileCache::key(source, content, fingerprint);
        if let Some(outcome) = self.cache.get(&key) {
            return outcome;
        }

        let resolver = ModuleResolver::new(vfs, &self.resolver);
        let mut resolutions: HashMap<String, Resolution> = HashMap::new();

        let outcome = self
            .transpiler
            .transpile_module(content, source, |specifier| {
                let resolution = resolver.resolve(specifier, source);
                let rewritten = match &resolution {
                    Resolution::Local(target) | Resolution::Unresolved(target) => {
                        Some(target.clone())
                    }
                    Resolution::ThirdParty(_) => None,
                };
                resolutions.insert(specifier.to_string(), resolution);
                rewritten
            })
            .map(|module| CompiledModule {
                code: module.code,
                imports: module
                    .imports
                    .into_iter()
                    .filter_map(|import| {
                        let resolution = resolutions.get(&import.specifier)?.clone();
                        Some(ResolvedImport { import, resolution })
                    })
                    .collect(),
            });

        self.cache.insert(key, outcome.clone());
        outcome
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new()
    }
}

fn asset_module(code: String) -> LinkedModule {
    LinkedModule {
        code,
        origin: ModuleOrigin::Asset,
    }
}
