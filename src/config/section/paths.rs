//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! web_root = "public"      # Directory that `/` maps to
//! output = "dist"          # Rewritten pages
//! cache = ".bundles"       # Persisted bundles ({id}.js / {id}.css)
//! context_path = "/app"    # Prefix of emitted combined.* URLs
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub web_root: PathBuf,
    pub output: PathBuf,
    pub cache: PathBuf,
    pub context_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("."),
            output: PathBuf::from("dist"),
            cache: PathBuf::from(".bundles"),
            context_path: String::new(),
        }
    }
}

impl PathsConfig {
    /// Make every directory absolute relative to `root`.
    pub fn normalize(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;

        self.web_root = normalize_path(&root.join(&self.web_root));
        self.output = normalize_path(&root.join(&self.output));
        self.cache = normalize_path(&root.join(&self.cache));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let context = &self.context_path;
        if !context.is_empty() && !context.starts_with('/') {
            diag.error_with_hint(
                "paths.context_path",
                format!("'{context}' must start with '/'"),
                format!("use '/{context}'"),
            );
        }
        if context.len() > 1 && context.ends_with('/') {
            diag.error_with_hint(
                "paths.context_path",
                format!("'{context}' must not end with '/'"),
                format!("use '{}'", context.trim_end_matches('/')),
            );
        }
        if !self.web_root.is_dir() {
            diag.error(
                "paths.web_root",
                format!("directory '{}' does not exist", self.web_root.display()),
            );
        }
    }
}
