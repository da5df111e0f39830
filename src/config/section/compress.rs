//! `[compress]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compress]
//! javascript = true            # Combine <script> elements
//! css = true                   # Combine <link rel="stylesheet"> elements
//! js_method = "minify"         # "minify" | "none"
//! css_method = "minify"        # also minifies inline <style> blocks
//! clean_js_duplicates = true   # Drop scripts already emitted in this request
//! clean_css_duplicates = true
//! ignore_missing_files = true  # Skip (with a warning) references to missing files
//! basepath = "/static"         # Base for relative references
//! options = "mangle=false"     # Passed to the compressor
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// How bundle content is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressMethod {
    /// oxc for JavaScript, lightningcss for CSS.
    #[default]
    Minify,
    /// Plain concatenation.
    None,
}

impl CompressMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minify => "minify",
            Self::None => "none",
        }
    }
}

impl fmt::Display for CompressMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minify" => Ok(Self::Minify),
            "none" => Ok(Self::None),
            other => Err(format!("unknown compress method `{other}`")),
        }
    }
}

/// Combiner behaviour shared by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressSettings {
    /// Run the script pass.
    #[serde(rename = "javascript")]
    pub handle_javascript: bool,

    /// Run the style passes.
    #[serde(rename = "css")]
    pub handle_css: bool,

    pub js_method: CompressMethod,

    /// Method for stylesheet bundles and inline `<style>` blocks.
    pub css_method: CompressMethod,

    pub clean_js_duplicates: bool,

    pub clean_css_duplicates: bool,

    /// Missing local files are dropped with a warning instead of failing
    /// the bundle.
    pub ignore_missing_files: bool,

    /// Base for relative references. `None`: directory of the page.
    pub basepath: Option<String>,

    /// Compressor options (`key=value`, separated by `;` or newlines).
    pub options: Option<String>,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            handle_javascript: true,
            handle_css: true,
            js_method: CompressMethod::Minify,
            css_method: CompressMethod::Minify,
            clean_js_duplicates: true,
            clean_css_duplicates: true,
            ignore_missing_files: true,
            basepath: None,
            options: None,
        }
    }
}

impl CompressSettings {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(basepath) = &self.basepath
            && !basepath.starts_with('/')
        {
            diag.error_with_hint(
                "compress.basepath",
                format!("'{basepath}' is not an absolute web path"),
                format!("use '/{basepath}'"),
            );
        }
    }
}
