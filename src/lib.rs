//! tola-bundle - combine script and stylesheet references into cached bundles.
//!
//! # Module Structure
//!
//! ```text
//! markup/    # Element model + TagScanner (raw text → located elements)
//! fragment   # FragmentDescriptor (External path | Internal text)
//! request    # RequestScope + per-request attribute store
//! dedup      # DuplicateTracker (request-scoped emitted resource sets)
//! deps       # DependencyCheck (libraries that manage their own deps)
//! group      # Grouping engine (scripts → one group, links → media groups)
//! bundle/    # BundleCache trait, resolver, TagCache, minify, options
//! splice     # Splice engine (original spans → rewritten text)
//! handler/   # CompressHandler (script pass + style passes)
//! config/    # bundle.toml (sections, diagnostics, discovery)
//! cli/       # rewrite / serve / clean commands
//! logger     # log! / debug! macros + ProgressLine
//! utils/     # web path math, MIME types
//! ```
//!
//! # Example
//!
//! ```ignore
//! let settings = CompressSettings::default();
//! let cache = TagCache::new(&settings);
//! let request = RequestScope::new("/index.html", web_root);
//! let handler = CompressHandler::new(&settings, &cache);
//! let body = handler.handle(&request, &html)?;
//! ```

pub mod bundle;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod deps;
pub mod error;
pub mod fragment;
pub mod group;
pub mod handler;
pub mod logger;
pub mod markup;
pub mod request;
pub mod splice;
pub mod utils;

pub use bundle::{BundleCache, BundleKind, BundleRequest, TagCache};
pub use config::{BundleConfig, CompressMethod, CompressSettings};
pub use error::CompileError;
pub use fragment::FragmentDescriptor;
pub use handler::CompressHandler;
pub use request::RequestScope;
