//! Dependency-aware script groups.
//!
//! Some libraries load their own dependency graph at runtime. When a group
//! contains one, dropping "duplicate" files from it would break that graph,
//! so the handler asks a [`DependencyCheck`] before filtering duplicates.

use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::fragment::FragmentDescriptor;
use crate::request::RequestScope;

/// Bootstrap line of the Closure Library's `base.js`.
static CLOSURE_BASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*var\s+goog\s*=\s*goog\s*\|\|\s*\{\s*\}\s*;").unwrap());

/// Decides whether a script group manages its own dependencies.
pub trait DependencyCheck: Send + Sync {
    /// `true` if duplicate filtering must be skipped for this group.
    fn claims(&self, fragments: &[FragmentDescriptor], request: &RequestScope) -> io::Result<bool>;
}

/// Never claims a group.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencyCheck;

impl DependencyCheck for NoDependencyCheck {
    fn claims(&self, _: &[FragmentDescriptor], _: &RequestScope) -> io::Result<bool> {
        Ok(false)
    }
}

/// Claims groups that include the Closure Library (`base.js` with the
/// `var goog = goog || {};` bootstrap).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureLibraryCheck;

impl ClosureLibraryCheck {
    /// Position of the Closure base file in `fragments`.
    pub fn find_base(
        &self,
        fragments: &[FragmentDescriptor],
        request: &RequestScope,
    ) -> io::Result<Option<usize>> {
        for (index, fragment) in fragments.iter().enumerate() {
            let Some(path) = fragment.path() else {
                continue;
            };
            if Path::new(path).file_name().is_none_or(|name| name != "base.js") {
                continue;
            }
            if CLOSURE_BASE.is_match(&fragment.load(request)?) {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

impl DependencyCheck for ClosureLibraryCheck {
    fn claims(&self, fragments: &[FragmentDescriptor], request: &RequestScope) -> io::Result<bool> {
        Ok(self.find_base(fragments, request)?.is_some())
    }
}
