//! Configuration
//!
//! Every section has defaults, and a JSON file only needs to name the
//! values it overrides:
//!
//! ```json
//! { "resolver": { "alias": "~/" }, "registry": { "versions": { "react": "18.3.1" } } }
//! ```

use crate::linker::{LinkerConfig, RegistryConfig};
use crate::packager::PackagerConfig;
use crate::resolver::ResolverConfig;
use crate::transpiler::TranspilerConfig;
use crate::vfs::VfsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for a whole editing session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vfs: VfsConfig,
    pub resolver: ResolverConfig,
    pub transpiler: TranspilerConfig,
    pub registry: RegistryConfig,
    pub packager: PackagerConfig,
}

impl Config {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolver.extensions.len() < 2 {
            return Err(ConfigError::Invalid(
                "resolver.extensions needs a primary and a secondary extension".to_string(),
            ));
        }
        if let Some(ext) = self.resolver.extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(ConfigError::Invalid(format!(
                "resolver.extensions entries must start with '.': {}",
                ext
            )));
        }
        if !self.packager.entry_stem.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "packager.entry_stem must be absolute: {}",
                self.packager.entry_stem
            )));
        }
        if self.registry.url.is_empty() {
            return Err(ConfigError::Invalid("registry.url is empty".to_string()));
        }
        Ok(())
    }

    pub fn linker_config(&self) -> LinkerConfig {
        LinkerConfig {
            resolver: self.resolver.clone(),
            transpiler: self.transpiler.clone(),
            registry: self.registry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::ReplacePolicy;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_json(
            r#"{ "vfs": { "history_limit": 50, "replace_policy": "reject_ambiguous" },
                 "registry": { "versions": { "react": "18.3.1" } } }"#,
        )
        .unwrap();

        assert_eq!(config.vfs.history_limit, Some(50));
        assert_eq!(config.vfs.replace_policy, ReplacePolicy::RejectAmbiguous);
        assert_eq!(config.registry.url, "https://esm.sh/");
        assert_eq!(config.registry.versions["react"], "18.3.1");
        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.packager.entry_stem, "/App");
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Config::from_json(r#"{ "resolver": { "extensions": [".jsx"] } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "resolver": { "extensions": [".jsx", "tsx"] } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "packager": { "entry_stem": "App" } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livecanvas.json");
        std::fs::write(&path, r#"{ "transpiler": { "jsx_runtime": "classic" } }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.transpiler.jsx_runtime,
            crate::transpiler::JsxRuntimeMode::Classic
        );

        assert!(matches!(
            Config::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
