//! Web path utilities.
//!
//! Pure functions for resource reference math. No side effects.
//!
//! - `is_web_address()` - remote/absolute URLs (rejected by the combiner)
//! - `is_valid_js()`, `is_valid_css()` - local extension checks
//! - `calc_path()` - reference → web-root relative path
//! - `clean()` - canonical form used as the duplicate key
//! - `normalize_path()` - filesystem directories from config and CLI

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Check if a reference is a remote/absolute web address.
///
/// True for anything with a URL scheme (`http:`, `https:`, `data:`, …) and
/// for protocol-relative references (`//cdn.example.com/a.js`).
///
/// # Examples
/// ```ignore
/// assert!(is_web_address("https://example.com/a.js"));
/// assert!(is_web_address("//cdn.example.com/a.js"));
/// assert!(!is_web_address("/js/a.js"));
/// ```
#[inline]
pub fn is_web_address(reference: &str) -> bool {
    let reference = reference.trim();
    reference.starts_with("//")
        || reference.find(':').is_some_and(|pos| {
            pos > 0
                && reference[..pos]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        })
}

/// Whether the reference names a local `.js` file.
#[inline]
pub fn is_valid_js(reference: &str) -> bool {
    has_extension(reference, "js")
}

/// Whether the reference names a local `.css` file.
#[inline]
pub fn is_valid_css(reference: &str) -> bool {
    has_extension(reference, "css")
}

/// Check the extension of the path part (query and fragment stripped).
fn has_extension(reference: &str, ext: &str) -> bool {
    let path = strip_query_fragment(reference.trim());
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.')
        .is_some_and(|(stem, e)| !stem.is_empty() && e.eq_ignore_ascii_case(ext))
}

/// Strip `?query` and `#fragment` from a reference.
#[inline]
pub fn strip_query_fragment(reference: &str) -> &str {
    reference.split(['?', '#']).next().unwrap_or(reference)
}

/// Resolve a resource reference to a web-root relative path.
///
/// - Absolute references (`/js/a.js`) lose the context path prefix, if any
/// - Relative references are resolved against `basepath` when given,
///   otherwise against the directory of `request_path`
///
/// The result is percent-decoded and [`clean`]ed.
///
/// # Examples
/// ```ignore
/// calc_path("/app/js/a.js", "/app", "/app/index.html", None) -> "/js/a.js"
/// calc_path("a.js", "", "/blog/post.html", None)             -> "/blog/a.js"
/// calc_path("../a.js", "", "/blog/post.html", Some("/lib"))  -> "/a.js"
/// ```
pub fn calc_path(
    reference: &str,
    context_path: &str,
    request_path: &str,
    basepath: Option<&str>,
) -> String {
    let reference = strip_query_fragment(reference.trim());
    let decoded = percent_decode_str(reference)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| reference.to_string());

    let joined = if decoded.starts_with('/') {
        strip_context(&decoded, context_path).to_string()
    } else {
        let base = match basepath {
            Some(base) => base.trim_end_matches('/'),
            None => parent_dir(request_path),
        };
        format!("{base}/{decoded}")
    };

    clean(&joined)
}

/// Remove the context path when it is a whole leading segment.
fn strip_context<'a>(path: &'a str, context_path: &str) -> &'a str {
    if context_path.is_empty() {
        return path;
    }
    match path.strip_prefix(context_path) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Directory part of a request path (`/blog/post.html` → `/blog`).
fn parent_dir(request_path: &str) -> &str {
    let path = strip_query_fragment(request_path);
    path.rfind('/').map_or("", |pos| &path[..pos])
}

/// Canonicalize a web path: collapse `//`, resolve `.` and `..`, always
/// start with `/`. `..` never climbs above the web root.
///
/// # Examples
/// ```ignore
/// clean("/a/./b/../c.js") -> "/a/c.js"
/// clean("a//b.js")        -> "/a/b.js"
/// clean("/../a.js")       -> "/a.js"
/// ```
pub fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut result = String::with_capacity(path.len() + 1);
    for segment in &segments {
        result.push('/');
        result.push_str(segment);
    }
    if result.is_empty() {
        result.push('/');
    }
    result
}

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_web_address() {
        assert!(is_web_address("http://example.com/a.js"));
        assert!(is_web_address("https://example.com/a.css"));
        assert!(is_web_address("//cdn.example.com/a.js"));
        assert!(is_web_address("data:text/javascript,alert(1)"));
        assert!(!is_web_address("/js/a.js"));
        assert!(!is_web_address("js/a.js"));
        assert!(!is_web_address("./a.js"));
        assert!(!is_web_address(":a.js"));
    }

    #[test]
    fn test_valid_extensions() {
        assert!(is_valid_js("/a.js"));
        assert!(is_valid_js("/a.JS?v=3"));
        assert!(is_valid_js("lib/a.min.js#x"));
        assert!(!is_valid_js("/a.jsp"));
        assert!(!is_valid_js("/script.php?f=a.js"));
        assert!(!is_valid_js("/.js"));
        assert!(is_valid_css("/a.css"));
        assert!(!is_valid_css("/a.js"));
        assert!(!is_valid_css("/css/"));
    }

    #[test]
    fn test_calc_path_absolute() {
        assert_eq!(calc_path("/js/a.js", "", "/index.html", None), "/js/a.js");
        assert_eq!(calc_path("/app/js/a.js", "/app", "/app/", None), "/js/a.js");
        // Only a whole segment counts as the context path
        assert_eq!(calc_path("/apps/a.js", "/app", "/", None), "/apps/a.js");
        assert_eq!(calc_path("/js/a.js?v=1", "", "/", None), "/js/a.js");
    }

    #[test]
    fn test_calc_path_relative() {
        assert_eq!(calc_path("a.js", "", "/blog/post.html", None), "/blog/a.js");
        assert_eq!(calc_path("../a.js", "", "/blog/post.html", None), "/a.js");
        assert_eq!(calc_path("a.js", "", "/blog/post.html", Some("/lib/")), "/lib/a.js");
        assert_eq!(calc_path("my%20file.js", "", "/", None), "/my file.js");
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("/a/./b/../c.js"), "/a/c.js");
        assert_eq!(clean("a//b.js"), "/a/b.js");
        assert_eq!(clean("/../a.js"), "/a.js");
        assert_eq!(clean(""), "/");
        assert_eq!(clean(&clean("/x/../y.js")), "/y.js");
    }

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/dir"));
        assert!(normalized.is_absolute());
    }
}
