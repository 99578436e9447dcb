//! Module resolution against the virtual filesystem
//!
//! Classifies each specifier and resolves local ones to a concrete file:
//! - Alias specifiers (e.g., "@/components/Button") map to the VFS root
//! - Relative specifiers (e.g., "./utils", "../App") resolve against the importer
//! - Absolute specifiers (e.g., "/lib/data") are used as-is
//! - Anything else (e.g., "react", "@radix-ui/react-icons") is third-party
//!
//! Local targets are probed as an exact file, then with each source
//! extension appended, then as a directory holding an `index` file.

use crate::path;
use crate::vfs::VirtualFileSystem;
use serde::{Deserialize, Serialize};

/// Configuration for module resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Prefix that maps to the VFS root
    pub alias: String,
    /// Source extensions, in probe order; the first two pick the entry module
    pub extensions: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            alias: "@/".to_string(),
            extensions: vec![
                ".jsx".to_string(),
                ".tsx".to_string(),
                ".js".to_string(),
                ".ts".to_string(),
            ],
        }
    }
}

impl ResolverConfig {
    /// Whether `path` carries one of the source extensions
    pub fn is_source(&self, path: &str) -> bool {
        let ext = path::extname(path);
        !ext.is_empty() && self.extensions.iter().any(|e| e == ext)
    }
}

/// The shape of a specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Starts with the local-root alias; carries the absolute target
    Alias(String),
    /// Starts with `./` or `../`; carries the absolute target
    Relative(String),
    /// Starts with `/`; carries the normalized target
    Absolute(String),
    /// Not a local path
    ThirdParty,
}

impl SpecifierKind {
    /// The absolute VFS path a local specifier points at
    pub fn target(&self) -> Option<&str> {
        match self {
            SpecifierKind::Alias(p) | SpecifierKind::Relative(p) | SpecifierKind::Absolute(p) => {
                Some(p)
            }
            SpecifierKind::ThirdParty => None,
        }
    }
}

/// Outcome of resolving one specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A file in the VFS
    Local(String),
    /// A local path with no matching file; carries the attempted path
    Unresolved(String),
    /// A package to fetch from the registry
    ThirdParty(String),
}

/// Resolves specifiers against a read-only VFS
pub struct ModuleResolver<'v> {
    vfs: &'v VirtualFileSystem,
    config: &'v ResolverConfig,
}

impl<'v> ModuleResolver<'v> {
    pub fn new(vfs: &'v VirtualFileSystem, config: &'v ResolverConfig) -> Self {
        Self { vfs, config }
    }

    /// Classify a specifier written in `importer`
    pub fn classify(&self, specifier: &str, importer: &str) -> SpecifierKind {
        if !self.config.alias.is_empty() {
            if let Some(rest) = specifier.strip_prefix(self.config.alias.as_str()) {
                return SpecifierKind::Alias(path::normalize(rest));
            }
        }

        if specifier == "."
            || specifier == ".."
            || specifier.starts_with("./")
            || specifier.starts_with("../")
        {
            return SpecifierKind::Relative(path::join(path::dirname(importer), specifier));
        }

        if specifier.starts_with('/') {
            return SpecifierKind::Absolute(path::normalize(specifier));
        }

        SpecifierKind::ThirdParty
    }

    /// Resolve a specifier written in `importer`
    pub fn resolve(&self, specifier: &str, importer: &str) -> Resolution {
        match self.classify(specifier, importer).target() {
            Some(target) => match self.probe(target) {
                Some(found) => Resolution::Local(found),
                None => Resolution::Unresolved(target.to_string()),
            },
            None => Resolution::ThirdParty(specifier.to_string()),
        }
    }

    /// Find the file a local target refers to
    fn probe(&self, target: &str) -> Option<String> {
        if self.vfs.is_file(target) {
            return Some(target.to_string());
        }

        if let Some(found) = self.probe_extensions(target) {
            return Some(found);
        }

        if self.vfs.is_dir(target) {
            return self.probe_extensions(&path::join(target, "index"));
        }

        None
    }

    fn probe_extensions(&self, base: &str) -> Option<String> {
        self.config
            .extensions
            .iter()
            .map(|ext| format!("{}{}", base, ext))
            .find(|candidate| self.vfs.is_file(candidate))
    }
}

/// Split a third-party specifier into package name and subpath
///
/// `@scope/name/sub/path` → (`@scope/name`, `/sub/path`), `react` → (`react`, ``).
pub fn split_package(specifier: &str) -> (&str, &str) {
    let mut slashes = specifier.match_indices('/').map(|(idx, _)| idx);

    let split_at = if specifier.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };

    match split_at {
        Some(idx) => (&specifier[..idx], &specifier[idx..]),
        None => (specifier, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> VirtualFileSystem {
        let mut vfs = VirtualFileSystem::new();
        vfs.create("/App.jsx", "").unwrap();
        vfs.create("/components/Button.jsx", "").unwrap();
        vfs.create("/components/Card.tsx", "").unwrap();
        vfs.create("/components/Card.js", "").unwrap();
        vfs.create("/lib/index.ts", "").unwrap();
        vfs.create("/styles.css", "").unwrap();
        vfs.create("/empty/readme.md", "").unwrap();
        vfs
    }

    #[test]
    fn test_bare_dot_specifiers_are_relative() {
        let vfs = fixture();
        let config = ResolverConfig::default();
        let resolver = ModuleResolver::new(&vfs, &config);

        assert_eq!(
            resolver.classify("..", "/pages/Home.jsx"),
            SpecifierKind::Relative("/".into())
        );
        assert_eq!(
            resolver.classify(".", "/pages/Home.jsx"),
            SpecifierKind::Relative("/pages".into())
        );
        assert_eq!(
            resolver.resolve("..", "/lib/sub/helpers.ts"),
            Resolution::Local("/lib/index.ts".into())
        );
        assert_eq!(
            resolver.resolve(".", "/lib/format.ts"),
            Resolution::Local("/lib/index.ts".into())
        );
    }

    #[test]
    fn test_classify() {
        let vfs = VirtualFileSystem::new();
        let config = ResolverConfig::default();
        let resolver = ModuleResolver::new(&vfs, &config);
        let importer = "/components/ui/Dialog.jsx";

        assert_eq!(
            resolver.classify("@/lib/utils", importer),
            SpecifierKind::Alias("/lib/utils".into())
        );
        assert_eq!(
            resolver.classify("./Button", importer),
            SpecifierKind::Relative("/components/ui/Button".into())
        );
        assert_eq!(
            resolver.classify("../../App", importer),
            SpecifierKind::Relative("/App".into())
        );
        assert_eq!(
            resolver.classify("/lib//data/", importer),
            SpecifierKind::Absolute("/lib/data".into())
        );
        assert_eq!(resolver.classify("react", importer), SpecifierKind::ThirdParty);
        assert_eq!(
            resolver.classify("@radix-ui/react-icons", importer),
            SpecifierKind::ThirdParty
        );
    }

    #[test]
    fn test_resolve_probe_order() {
        let vfs = fixture();
        let config = ResolverConfig::default();
        let resolver = ModuleResolver::new(&vfs, &config);

        assert_eq!(
            resolver.resolve("./components/Button.jsx", "/App.jsx"),
            Resolution::Local("/components/Button.jsx".into())
        );
        assert_eq!(
            resolver.resolve("./Button", "/components/Card.tsx"),
            Resolution::Local("/components/Button.jsx".into())
        );
        // .tsx is probed before .js
        assert_eq!(
            resolver.resolve("@/components/Card", "/App.jsx"),
            Resolution::Local("/components/Card.tsx".into())
        );
        assert_eq!(
            resolver.resolve("/lib", "/App.jsx"),
            Resolution::Local("/lib/index.ts".into())
        );
        assert_eq!(
            resolver.resolve("./styles.css", "/App.jsx"),
            Resolution::Local("/styles.css".into())
        );
    }

    #[test]
    fn test_resolve_unresolved_and_third_party() {
        let vfs = fixture();
        let config = ResolverConfig::default();
        let resolver = ModuleResolver::new(&vfs, &config);

        assert_eq!(
            resolver.resolve("./Missing", "/components/Button.jsx"),
            Resolution::Unresolved("/components/Missing".into())
        );
        assert_eq!(
            resolver.resolve("@/empty", "/App.jsx"),
            Resolution::Unresolved("/empty".into())
        );
        assert_eq!(
            resolver.resolve("framer-motion", "/App.jsx"),
            Resolution::ThirdParty("framer-motion".into())
        );
    }

    #[test]
    fn test_custom_alias() {
        let vfs = fixture();
        let config = ResolverConfig {
            alias: "~/".to_string(),
            ..Default::default()
        };
        let resolver = ModuleResolver::new(&vfs, &config);

        assert_eq!(
            resolver.resolve("~/components/Button", "/App.jsx"),
            Resolution::Local("/components/Button.jsx".into())
        );
        assert_eq!(
            resolver.resolve("@/components/Button", "/App.jsx"),
            Resolution::ThirdParty("@/components/Button".into())
        );
    }

    #[test]
    fn test_split_package() {
        assert_eq!(split_package("react"), ("react", ""));
        assert_eq!(split_package("react/jsx-runtime"), ("react", "/jsx-runtime"));
        assert_eq!(split_package("@scope/pkg"), ("@scope/pkg", ""));
        assert_eq!(split_package("@scope/pkg/sub/x"), ("@scope/pkg", "/sub/x"));
    }

    #[test]
    fn test_is_source() {
        let config = ResolverConfig::default();
        assert!(config.is_source("/App.jsx"));
        assert!(config.is_source("/lib/util.ts"));
        assert!(!config.is_source("/styles.css"));
        assert!(!config.is_source("/README"));
    }
}
