//! Request scope: the page being rendered plus its attribute store.
//!
//! One `RequestScope` lives for one incoming request. Every
//! [`CompressHandler`](crate::CompressHandler) invocation within that request
//! receives the same scope, which is how duplicate tracking spans several
//! invocations (see [`DuplicateTracker`](crate::dedup::DuplicateTracker)).

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

type AttributeValue = Arc<dyn Any + Send + Sync>;

/// Per-request state shared by all handler invocations of one request.
pub struct RequestScope {
    /// Web path of the page being rendered (`/blog/post.html`).
    request_path: String,
    /// Prefix of every URL the application serves (`""` or `/app`).
    context_path: String,
    /// Directory `/` maps to.
    web_root: PathBuf,
    attributes: Arc<Mutex<FxHashMap<&'static str, AttributeValue>>>,
}

impl RequestScope {
    pub fn new(request_path: impl Into<String>, web_root: impl Into<PathBuf>) -> Self {
        Self {
            request_path: request_path.into(),
            context_path: String::new(),
            web_root: web_root.into(),
            attributes: Arc::default(),
        }
    }

    /// Scope of another page rendered as part of this request.
    ///
    /// The included page resolves relative references against its own path
    /// but shares this request's attribute store, so resources emitted by
    /// one are duplicates for the other.
    pub fn include(&self, request_path: impl Into<String>) -> Self {
        Self {
            request_path: request_path.into(),
            context_path: self.context_path.clone(),
            web_root: self.web_root.clone(),
            attributes: Arc::clone(&self.attributes),
        }
    }

    /// Set the context path (no trailing slash).
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    /// Map a cleaned web path to its file under the web root.
    pub fn real_path(&self, web_path: &str) -> PathBuf {
        self.web_root.join(web_path.trim_start_matches('/'))
    }

    /// Whether a web path names an existing local file.
    pub fn exists(&self, web_path: &str) -> bool {
        self.real_path(web_path).is_file()
    }

    // ========================================================================
    // Attribute store
    // ========================================================================

    /// Typed attribute lookup. `None` if absent or stored with another type.
    pub fn attribute<T: Any + Send + Sync>(&self, key: &'static str) -> Option<Arc<T>> {
        let value = self.attributes.lock().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    pub fn set_attribute<T: Any + Send + Sync>(&self, key: &'static str, value: Arc<T>) {
        self.attributes.lock().insert(key, value);
    }

    /// Get the attribute, creating it first if absent.
    ///
    /// Lookup and insert happen under one lock, so concurrent callers of the
    /// same request always end up sharing a single value. A value stored
    /// under `key` with a different type is replaced.
    pub fn attribute_or_insert_with<T, F>(&self, key: &'static str, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let mut attributes = self.attributes.lock();
        if let Some(existing) = attributes.get(key).cloned()
            && let Ok(typed) = existing.downcast::<T>()
        {
            return typed;
        }
        let value = Arc::new(init());
        attributes.insert(key, Arc::clone(&value) as AttributeValue);
        value
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("request_path", &self.request_path)
            .field("context_path", &self.context_path)
            .field("web_root", &self.web_root)
            .field("attributes", &self.attributes.lock().len())
            .finish()
    }
}
