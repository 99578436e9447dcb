//! Per-file memoization of transpile results
//!
//! A module's output depends on its path, its content and which files exist
//! (resolution probes the tree), so entries are keyed by a hash of all three.
//! Entries not used during a pass are evicted at the end of it.

use crate::resolver::Resolution;
use crate::transpiler::{ModuleImport, TranspileError};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// A specifier together with what it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    pub import: ModuleImport,
    pub resolution: Resolution,
}

/// Transpiled code with its resolved imports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    pub code: String,
    pub imports: Vec<ResolvedImport>,
}

pub type CompileOutcome = Result<CompiledModule, TranspileError>;

#[derive(Debug, Default)]
pub struct TranspileCache {
    entries: HashMap<String, CompileOutcome>,
    touched: HashSet<String>,
    hits: usize,
    misses: usize,
}

impl TranspileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash the set of file paths currently in the tree
    pub fn fingerprint(files: &[String]) -> String {
        let mut hasher = Sha256::new();
        for file in files {
            hasher.update(file.as_bytes());
            hasher.update([0]);
        }
        hex::encode(hasher.finalize())
    }

    pub fn key(path: &str, content: &str, fingerprint: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(path.as_bytes());
        hasher.update([0]);
        hasher.update(content.as_bytes());
        hasher.update([0]);
        hasher.update(fingerprint.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn begin_pass(&mut self) {
        self.touched.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn get(&mut self, key: &str) -> Option<CompileOutcome> {
        let found = self.entries.get(key).cloned();
        match found {
            Some(_) => {
                self.hits += 1;
                self.touched.insert(key.to_string());
            }
            None => self.misses += 1,
        }
        found
    }

    pub fn insert(&mut self, key: String, outcome: CompileOutcome) {
        self.touched.insert(key.clone());
        self.entries.insert(key, outcome);
    }

    /// Drop every entry the current pass did not use
    pub fn end_pass(&mut self) {
        let touched = &self.touched;
        self.entries.retain(|key, _| touched.contains(key));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) for the current pass
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(code: &str) -> CompileOutcome {
        Ok(CompiledModule {
            code: code.to_string(),
            imports: Vec::new(),
        })
    }

    #[test]
    fn test_key_depends_on_every_input() {
        let fp = TranspileCache::fingerprint(&["/App.jsx".to_string()]);
        let other_fp =
            TranspileCache::fingerprint(&["/App.jsx".to_string(), "/Button.jsx".to_string()]);

        let base = TranspileCache::key("/App.jsx", "x", &fp);
        assert_eq!(base, TranspileCache::key("/App.jsx", "x", &fp));
        assert_ne!(base, TranspileCache::key("/App.jsx", "y", &fp));
        assert_ne!(base, TranspileCache::key("/Main.jsx", "x", &fp));
        assert_ne!(base, TranspileCache::key("/App.jsx", "x", &other_fp));
    }

    #[test]
    fn test_untouched_entries_are_evicted() {
        let mut cache = TranspileCache::new();
        cache.begin_pass();
        cache.insert("a".into(), compiled("a"));
        cache.insert("b".into(), compiled("b"));
        cache.end_pass();
        assert_eq!(cache.len(), 2);

        cache.begin_pass();
        assert!(cache.get("a").is_some());
        assert!(cache.get("missing").is_none());
        assert_eq!(cache.stats(), (1, 1));
        cache.end_pass();

        assert_eq!(cache.len(), 1);
        cache.begin_pass();
        assert!(cache.get("b").is_none());
    }
}
