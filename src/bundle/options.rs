//! Compressor option strings.
//!
//! Options travel as newline-separated `key=value` lines. The handler builds
//! them, the cache hashes them into the bundle key, and the minifier reads
//! the few keys it understands:
//!
//! ```text
//! javascript.compress=none     # method override
//! minify.mangle=false          # keep identifiers
//! minify.compress=false        # whitespace and mangling only
//! ```

use crate::config::CompressMethod;

/// Key of the method override line.
pub const JS_COMPRESS_METHOD_KEY: &str = "javascript.compress";

/// Build the option string of a script pass.
///
/// The method override, if any, comes first. User options are normalized
/// for the effective method (the override, else `default_method`).
pub fn build(
    method: Option<CompressMethod>,
    user_options: Option<&str>,
    default_method: CompressMethod,
) -> String {
    let mut options = String::new();
    if let Some(method) = method {
        options.push_str(JS_COMPRESS_METHOD_KEY);
        options.push('=');
        options.push_str(method.as_str());
        options.push('\n');
    }
    if let Some(user) = user_options {
        options.push_str(&normalize(user, method.unwrap_or(default_method)));
    }
    options
}

/// Rewrite user options as `{method}.{key}={value}` lines.
///
/// Entries are separated by `;` or newlines. A bare `flag` means
/// `flag=true`. Keys already carrying the method prefix are kept.
///
/// # Examples
/// ```ignore
/// normalize("mangle=false; compress = false", Minify)
///     -> "minify.mangle=false\nminify.compress=false\n"
/// ```
pub fn normalize(user_options: &str, method: CompressMethod) -> String {
    let prefix = method.as_str();
    let mut out = String::new();
    for entry in user_options.split([';', '\n']) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (entry, "true"),
        };
        if key.is_empty() {
            continue;
        }
        let key = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(key);
        out.push_str(&format!("{prefix}.{key}={value}\n"));
    }
    out
}

/// Options as read by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Method override (`javascript.compress`).
    pub method: Option<CompressMethod>,
    /// Rename local identifiers.
    pub mangle: bool,
    /// Run the compressor passes (dead code, constant folding).
    pub compress: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            method: None,
            mangle: true,
            compress: true,
        }
    }
}

impl CompressOptions {
    /// Read an option string. Unknown keys and malformed lines are ignored.
    pub fn parse(options: &str) -> Self {
        let mut parsed = Self::default();
        for line in options.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                JS_COMPRESS_METHOD_KEY => parsed.method = value.parse().ok(),
                "minify.mangle" => parsed.mangle = parse_flag(value, parsed.mangle),
                "minify.compress" => parsed.compress = parse_flag(value, parsed.compress),
                _ => {}
            }
        }
        parsed
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => true,
        "false" | "no" | "0" | "off" => false,
        _ => default,
    }
}
