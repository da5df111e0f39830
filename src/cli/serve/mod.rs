//! Bundle server.
//!
//! Serves rewritten pages from the output directory and bundles from the
//! store:
//!
//! ```text
//! GET {context}/combined.js?id=…    script bundle
//! GET {context}/combined.css?id=…   stylesheet bundle
//! GET {context}/…                   file under the output directory
//! ```

mod lifecycle;
mod path;
mod response;

use crate::{
    bundle::{BundleKind, TagCache},
    config::BundleConfig,
    debug, log,
};
use anyhow::{Context, Result};
use tiny_http::{Request, Server};

/// Start the server and handle requests until the process exits.
pub fn serve(config: &BundleConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    log!("serve"; "http://{}{}", addr, config.paths.context_path);

    let cache = TagCache::new(&config.compress).with_store(&config.paths.cache);
    run_request_loop(&server, config, &cache)
}

fn run_request_loop(server: &Server, config: &BundleConfig, cache: &TagCache) -> Result<()> {
    // Use thread pool to handle requests concurrently
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .context("Failed to create thread pool")?;

    pool.scope(|scope| {
        for request in server.incoming_requests() {
            scope.spawn(move |_| {
                if let Err(e) = handle_request(request, config, cache) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
    });
    Ok(())
}

/// What a request URL asks for.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Bundle { kind: BundleKind, id: String },
    File(String),
    NotFound,
}

/// Map a request URL to a route. URLs outside the context path are not found.
fn route(url: &str, context_path: &str) -> Route {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let Some(path) = path.strip_prefix(context_path) else {
        return Route::NotFound;
    };
    if !path.is_empty() && !path.starts_with('/') {
        return Route::NotFound;
    }

    let kind = [BundleKind::Script, BundleKind::Style]
        .into_iter()
        .find(|kind| path == kind.endpoint());
    match kind {
        Some(kind) => url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "id")
            .map_or(Route::NotFound, |(_, id)| Route::Bundle {
                kind,
                id: id.into_owned(),
            }),
        None => Route::File(path.to_string()),
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &BundleConfig, cache: &TagCache) -> Result<()> {
    debug!("serve"; "{} {}", request.method(), request.url());

    match route(request.url(), &config.paths.context_path) {
        Route::Bundle { kind, id } => match cache.lookup(&id, kind) {
            Some(bundle) => response::respond_bundle(request, &bundle),
            None => response::respond_not_found(request),
        },
        Route::File(path) => match path::resolve_path(&path, &config.paths.output) {
            Some(file) => response::respond_file(request, &file),
            None => response::respond_not_found(request),
        },
        Route::NotFound => response::respond_not_found(request),
    }
}
