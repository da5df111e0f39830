//! Bundle resolution: the boundary between the combiner and the cache.
//!
//! The handler hands each non-empty group to a [`BundleCache`] and gets back
//! an opaque bundle id. [`TagCache`] is the default cache: content-addressed,
//! at most one compression per key, optionally persisted to disk.

mod cache;
mod minify;
pub mod options;

pub use cache::{Bundle, TagCache};
pub use minify::{minify_css, minify_js};

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::CompileError;
use crate::fragment::FragmentDescriptor;
use crate::request::RequestScope;
use crate::utils::mime;

/// Output family of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKind {
    Script,
    Style,
}

impl BundleKind {
    /// File extension of the persisted bundle.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::Script => mime::types::JAVASCRIPT,
            Self::Style => mime::types::CSS,
        }
    }

    /// Served path of a bundle, relative to the context path.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Script => "/combined.js",
            Self::Style => "/combined.css",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Script => "script",
            Self::Style => "stylesheet",
        })
    }
}

/// Inputs of one bundle: ordered fragments plus the option string.
#[derive(Debug, Clone, Copy)]
pub struct BundleRequest<'a> {
    pub fragments: &'a [FragmentDescriptor],
    pub kind: BundleKind,
    pub options: &'a str,
}

/// Failure to build or store a bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compress {kind} bundle")]
    Compress { kind: BundleKind },
}

/// Content-addressed bundle store.
///
/// Identical `(fragments, kind, options)` inputs must yield the same id, and
/// concurrent callers with the same inputs must trigger at most one
/// compression. Calls may block.
pub trait BundleCache: Send + Sync {
    fn compress_and_store(
        &self,
        request: &RequestScope,
        bundle: BundleRequest<'_>,
    ) -> Result<String, BundleError>;
}

/// Obtain the bundle id of a group. An empty group needs no bundle.
pub fn resolve(
    cache: &dyn BundleCache,
    request: &RequestScope,
    fragments: &[FragmentDescriptor],
    kind: BundleKind,
    options: &str,
) -> Result<Option<String>, CompileError> {
    if fragments.is_empty() {
        return Ok(None);
    }
    let bundle = BundleRequest {
        fragments,
        kind,
        options,
    };
    let id = cache.compress_and_store(request, bundle)?;
    crate::debug!("bundle"; "{} fragments -> {} {}", fragments.len(), kind, id);
    Ok(Some(id))
}
