//! Request-scoped duplicate tracking.
//!
//! A page is often assembled from several fragments, each running its own
//! combiner pass. The tracker remembers which resources were already emitted
//! in the current request so a later pass drops them instead of bundling them
//! again.
//!
//! - scripts: one set of cleaned paths
//! - stylesheets: one set per media value, keyed by `media + path`
//!
//! Both live in the request's attribute store under fixed keys, created on
//! first use by [`DuplicateTracker::attach`].

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::request::RequestScope;

/// Attribute key of the script set.
pub const SCRIPT_DUPLICATES_KEY: &str = "tola_bundle.js_duplicates";

/// Attribute key of the per-media stylesheet sets.
pub const STYLE_DUPLICATES_KEY: &str = "tola_bundle.css_duplicates";

#[derive(Debug, Default)]
pub struct ScriptDuplicates(Mutex<FxHashSet<String>>);

#[derive(Debug, Default)]
pub struct StyleDuplicates(Mutex<FxHashMap<String, FxHashSet<String>>>);

/// Handle on the duplicate sets of one request.
#[derive(Debug, Clone, Default)]
pub struct DuplicateTracker {
    scripts: Arc<ScriptDuplicates>,
    styles: Arc<StyleDuplicates>,
}

impl DuplicateTracker {
    /// Sets of `request`, created and stored in its attribute store if absent.
    pub fn attach(request: &RequestScope) -> Self {
        Self {
            scripts: request.attribute_or_insert_with(SCRIPT_DUPLICATES_KEY, ScriptDuplicates::default),
            styles: request.attribute_or_insert_with(STYLE_DUPLICATES_KEY, StyleDuplicates::default),
        }
    }

    /// Record a script path. Returns `false` if it was already emitted.
    ///
    /// Check and insert are one step: of two concurrent passes claiming the
    /// same path, exactly one wins.
    pub fn claim_script(&self, path: &str) -> bool {
        let mut set = self.scripts.0.lock();
        if set.contains(path) {
            return false;
        }
        set.insert(path.to_string())
    }

    pub fn contains_script(&self, path: &str) -> bool {
        self.scripts.0.lock().contains(path)
    }

    /// Record a stylesheet path for `media`. Returns `false` if it was
    /// already emitted for that media.
    pub fn claim_style(&self, media: &str, path: &str) -> bool {
        let key = format!("{media}{path}");
        self.styles
            .0
            .lock()
            .entry(media.to_string())
            .or_default()
            .insert(key)
    }

    pub fn contains_style(&self, media: &str, path: &str) -> bool {
        let key = format!("{media}{path}");
        self.styles
            .0
            .lock()
            .get(media)
            .is_some_and(|set| set.contains(&key))
    }
}
