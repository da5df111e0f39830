//! Hard failures of a combiner pass.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::bundle::BundleError;

/// Resource family of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Script,
    Stylesheet,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
        })
    }
}

/// Error aborting a whole document pass. No partial rewrite is ever
/// returned alongside one of these.
///
/// A missing local file is not an error: it is logged and dropped.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("dynamic or remote {kind}s can not be combined: `{reference}`")]
    InvalidResourceReference {
        kind: ResourceKind,
        reference: String,
    },

    #[error("failed to build bundle")]
    CacheOrCompression(#[from] BundleError),

    #[error("dependency scan failed")]
    DependencyScan(#[source] io::Error),
}

impl CompileError {
    pub(crate) fn invalid(kind: ResourceKind, reference: &str) -> Self {
        Self::InvalidResourceReference {
            kind,
            reference: reference.to_string(),
        }
    }
}
