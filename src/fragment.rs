//! Fragment descriptors: one unit of script/style content for a bundle.

use std::borrow::Cow;
use std::fs;
use std::io;

use crate::request::RequestScope;

/// One resource occurrence destined for a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FragmentDescriptor {
    /// Local file, as a cleaned web-root relative path (`/js/app.js`).
    External(String),
    /// Literal inline text of a `<script>` without `src`.
    Internal(String),
}

impl FragmentDescriptor {
    /// Duplicate-elimination key. Inline fragments have none: they are never
    /// deduplicated against each other.
    pub fn dedup_key(&self) -> Option<&str> {
        match self {
            Self::External(path) => Some(path),
            Self::Internal(_) => None,
        }
    }

    /// Web path of an external fragment.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::External(path) => Some(path),
            Self::Internal(_) => None,
        }
    }

    /// Read the fragment's text: the file on disk for external fragments,
    /// the literal for inline ones.
    pub fn load(&self, request: &RequestScope) -> io::Result<Cow<'_, str>> {
        match self {
            Self::External(path) => fs::read_to_string(request.real_path(path)).map(Cow::Owned),
            Self::Internal(content) => Ok(Cow::Borrowed(content)),
        }
    }
}
