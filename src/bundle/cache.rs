//! Default bundle cache.
//!
//! Bundles are addressed by a blake3 digest of their inputs, so the same
//! resource set yields the same id in every request and every process.
//!
//! Each key owns a slot. The first caller locks the slot and compresses;
//! concurrent callers with the same key block on the slot and reuse the
//! result. The map itself is only locked long enough to fetch the slot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::minify::{minify_css, minify_js};
use super::options::CompressOptions;
use super::{BundleCache, BundleError, BundleKind, BundleRequest};
use crate::config::{CompressMethod, CompressSettings};
use crate::fragment::FragmentDescriptor;
use crate::request::RequestScope;

/// Hex digits of the digest used as bundle id.
const ID_LEN: usize = 16;

type Slot = Arc<Mutex<Option<Arc<Bundle>>>>;

/// A compressed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub id: String,
    pub kind: BundleKind,
    pub content: String,
}

/// In-memory bundle cache with optional on-disk store.
pub struct TagCache {
    js_method: CompressMethod,
    css_method: CompressMethod,
    bundles: DashMap<String, Slot>,
    store: Option<PathBuf>,
}

impl TagCache {
    pub fn new(settings: &CompressSettings) -> Self {
        Self {
            js_method: settings.js_method,
            css_method: settings.css_method,
            bundles: DashMap::new(),
            store: None,
        }
    }

    /// Persist every new bundle as `{dir}/{id}.js` or `{dir}/{id}.css`.
    pub fn with_store(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store = Some(dir.into());
        self
    }

    pub fn store(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    /// Number of bundles computed by this cache.
    pub fn len(&self) -> usize {
        self.bundles
            .iter()
            .filter(|entry| entry.value().lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find a bundle by id: memory first, then the store.
    pub fn lookup(&self, id: &str, kind: BundleKind) -> Option<Arc<Bundle>> {
        let slot = self.bundles.get(id).map(|entry| Arc::clone(entry.value()));
        if let Some(slot) = slot
            && let Some(bundle) = slot.lock().as_ref()
            && bundle.kind == kind
        {
            return Some(Arc::clone(bundle));
        }

        if !is_bundle_id(id) {
            return None;
        }
        let path = self.store.as_ref()?.join(format!("{id}.{}", kind.extension()));
        let content = fs::read_to_string(path).ok()?;
        Some(Arc::new(Bundle {
            id: id.to_string(),
            kind,
            content,
        }))
    }

    /// Method in effect for a bundle: the option override, else the
    /// configured method of its kind.
    fn method(&self, kind: BundleKind, options: &CompressOptions) -> CompressMethod {
        match kind {
            BundleKind::Script => options.method.unwrap_or(self.js_method),
            BundleKind::Style => self.css_method,
        }
    }

    fn build(
        &self,
        request: &RequestScope,
        bundle: &BundleRequest<'_>,
        id: &str,
    ) -> Result<Bundle, BundleError> {
        let mut parts = Vec::with_capacity(bundle.fragments.len());
        for fragment in bundle.fragments {
            let text = fragment.load(request).map_err(|source| BundleError::Io {
                path: fragment
                    .path()
                    .map_or_else(PathBuf::new, |path| request.real_path(path)),
                source,
            })?;
            parts.push(text);
        }
        let joined = parts.join("\n");

        let options = CompressOptions::parse(bundle.options);
        let content = match (bundle.kind, self.method(bundle.kind, &options)) {
            (_, CompressMethod::None) => joined,
            (BundleKind::Script, CompressMethod::Minify) => minify_js(&joined, &options)
                .ok_or(BundleError::Compress { kind: bundle.kind })?,
            (BundleKind::Style, CompressMethod::Minify) => {
                minify_css(&joined).ok_or(BundleError::Compress { kind: bundle.kind })?
            }
        };

        Ok(Bundle {
            id: id.to_string(),
            kind: bundle.kind,
            content,
        })
    }

    fn persist(&self, bundle: &Bundle) -> Result<(), BundleError> {
        let Some(dir) = &self.store else {
            return Ok(());
        };
        let path = dir.join(format!("{}.{}", bundle.id, bundle.kind.extension()));
        fs::create_dir_all(dir)
            .and_then(|()| fs::write(&path, &bundle.content))
            .map_err(|source| BundleError::Io { path, source })
    }
}

impl BundleCache for TagCache {
    fn compress_and_store(
        &self,
        request: &RequestScope,
        bundle: BundleRequest<'_>,
    ) -> Result<String, BundleError> {
        let id = bundle_id(&bundle, self.method(bundle.kind, &CompressOptions::parse(bundle.options)));

        // Shard lock released at the end of this statement
        let slot = Arc::clone(&self.bundles.entry(id.clone()).or_default());

        let mut guard = slot.lock();
        if guard.is_some() {
            return Ok(id);
        }

        let built = self.build(request, &bundle, &id)?;
        self.persist(&built)?;
        crate::debug!("bundle"; "built {} {} ({} bytes)", bundle.kind, id, built.content.len());
        *guard = Some(Arc::new(built));
        Ok(id)
    }
}

/// Digest of a bundle's inputs, truncated to [`ID_LEN`] hex digits.
fn bundle_id(bundle: &BundleRequest<'_>, method: CompressMethod) -> String {
    let mut hasher = blake3::Hasher::new();
    hash_field(&mut hasher, bundle.kind.extension().as_bytes());
    hash_field(&mut hasher, method.as_str().as_bytes());
    hash_field(&mut hasher, bundle.options.as_bytes());
    for fragment in bundle.fragments {
        let (tag, value) = match fragment {
            FragmentDescriptor::External(path) => (b"E", path),
            FragmentDescriptor::Internal(text) => (b"I", text),
        };
        hasher.update(tag);
        hash_field(&mut hasher, value.as_bytes());
    }
    let mut id = hex::encode(hasher.finalize().as_bytes());
    id.truncate(ID_LEN);
    id
}

/// Length-prefixed so adjacent fields never run together.
fn hash_field(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn is_bundle_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}
