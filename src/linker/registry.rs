//! Registry references for third-party packages

use crate::resolver::split_package;
use crate::vfs::VirtualFileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest read from the tree to pin package versions
const MANIFEST_PATH: &str = "/package.json";

/// Configuration for third-party references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL packages are fetched from
    pub url: String,
    /// Pinned versions by package name
    pub versions: BTreeMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://esm.sh/".to_string(),
            versions: BTreeMap::new(),
        }
    }
}

/// Builds registry references for one linking pass
#[derive(Debug, Clone)]
pub struct Registry {
    url: String,
    versions: BTreeMap<String, String>,
}

impl Registry {
    /// Combine configured versions with the `dependencies` of `/package.json`
    ///
    /// Versions from the manifest win. An unreadable manifest is ignored.
    pub fn for_tree(config: &RegistryConfig, vfs: &VirtualFileSystem) -> Self {
        let mut versions = config.versions.clone();

        if let Ok(manifest) = vfs.read_file(MANIFEST_PATH) {
            match serde_json::from_str::<serde_json::Value>(manifest) {
                Ok(value) => {
                    if let Some(deps) = value.get("dependencies").and_then(|d| d.as_object()) {
                        for (name, version) in deps {
                            if let Some(version) = version.as_str() {
                                versions.insert(name.clone(), version.to_string());
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("Ignoring {}: {}", MANIFEST_PATH, e),
            }
        }

        Self {
            url: config.url.clone(),
            versions,
        }
    }

    /// The URL a third-party specifier is fetched from
    pub fn reference(&self, specifier: &str) -> String {
        let (name, subpath) = split_package(specifier);

        match self.versions.get(name) {
            Some(version) => format!("{}{}@{}{}", self.url, name, version, subpath),
            None => format!("{}{}", self.url, specifier),
        }
    }
}
