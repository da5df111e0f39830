//! `rewrite` command: run the combiner over pages on disk.
//!
//! Each page is one request unless `--shared-request` is given, in which
//! case all pages are includes of a single request and are processed in
//! order. Bundles are persisted to the store directory so `serve` (or any
//! static server) can deliver them.

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    bundle::TagCache,
    cli::RewriteArgs,
    config::BundleConfig,
    handler::CompressHandler,
    log,
    logger::ProgressLine,
    request::RequestScope,
};

/// A page to rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Page {
    /// File on disk.
    source: PathBuf,
    /// Path relative to the web root (`blog/post.html`).
    relative: PathBuf,
}

impl Page {
    /// Web path the page is served at (`/blog/post.html`).
    fn request_path(&self) -> String {
        let mut path = String::new();
        for component in self.relative.components() {
            path.push('/');
            path.push_str(&component.as_os_str().to_string_lossy());
        }
        path
    }
}

/// Rewrite every page named on the command line.
pub fn rewrite_pages(args: &RewriteArgs, config: &BundleConfig) -> Result<()> {
    if let Some(basepath) = &args.basepath
        && !basepath.starts_with('/')
    {
        bail!("--basepath must start with '/', got `{basepath}`");
    }
    let pages = collect_pages(&args.files, &config.paths.web_root)?;
    if pages.is_empty() {
        bail!("no pages found");
    }

    let cache = TagCache::new(&config.compress).with_store(&config.paths.cache);
    let handler = handler_for(args, config, &cache);
    let progress = (!args.stdout).then(|| ProgressLine::new(&[("pages", pages.len())]));

    let rewrite = |page: &Page, request: &RequestScope| -> Result<String> {
        let body = fs::read_to_string(&page.source)
            .with_context(|| format!("Failed to read {}", page.source.display()))?;
        let out = handler
            .handle(request, &body)
            .with_context(|| format!("Failed to rewrite {}", page.source.display()))?;
        if let Some(progress) = &progress {
            progress.inc("pages");
        }
        Ok(out)
    };

    let new_scope = |page: &Page| {
        RequestScope::new(page.request_path(), &config.paths.web_root)
            .with_context_path(config.paths.context_path.as_str())
    };

    let outputs: Vec<String> = if args.shared_request {
        let mut outputs = Vec::with_capacity(pages.len());
        let root = new_scope(&pages[0]);
        for page in &pages {
            outputs.push(rewrite(page, &root.include(page.request_path()))?);
        }
        outputs
    } else {
        pages
            .par_iter()
            .map(|page| rewrite(page, &new_scope(page)))
            .collect::<Result<_>>()?
    };

    if let Some(progress) = progress {
        progress.finish();
    }

    if args.stdout {
        for out in &outputs {
            print!("{out}");
        }
        return Ok(());
    }

    for (page, out) in pages.iter().zip(&outputs) {
        write_page(&config.paths.output, page, out)?;
    }
    log!(
        "rewrite"; "{} pages -> {}, {} bundles",
        pages.len(),
        config.paths.output.display(),
        cache.len()
    );
    Ok(())
}

/// Handler for this run: configured settings plus the command line's
/// method, options and basepath overrides.
fn handler_for<'a>(
    args: &RewriteArgs,
    config: &'a BundleConfig,
    cache: &'a TagCache,
) -> CompressHandler<'a> {
    let mut handler = CompressHandler::new(&config.compress, cache);
    if let Some(method) = args.method {
        handler = handler.with_method(method);
    }
    if let Some(options) = &args.options {
        handler = handler.with_options(options.as_str());
    }
    if let Some(basepath) = &args.basepath {
        handler = handler.with_basepath(basepath.as_str());
    }
    handler
}

fn write_page(output: &Path, page: &Page, content: &str) -> Result<()> {
    let target = output.join(&page.relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&target, content).with_context(|| format!("Failed to write {}", target.display()))
}

/// Expand arguments into pages: files as given, directories searched
/// recursively for `.html`/`.htm` files (sorted).
fn collect_pages(inputs: &[PathBuf], web_root: &Path) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = collect_html(input);
            found.sort();
            for source in found {
                pages.push(page_of(source, web_root)?);
            }
        } else if input.is_file() {
            pages.push(page_of(input.clone(), web_root)?);
        } else {
            bail!("{} not found", input.display());
        }
    }
    Ok(pages)
}

/// All `.html`/`.htm` files under `dir`.
fn collect_html(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e, "html" | "htm"))
        })
        .collect()
}

/// Locate a page under the web root. Its output path mirrors that
/// location, so pages outside the web root are rejected.
fn page_of(source: PathBuf, web_root: &Path) -> Result<Page> {
    let absolute = crate::utils::path::normalize_path(&source);
    let Ok(relative) = absolute.strip_prefix(web_root) else {
        bail!(
            "{} is outside the web root {}",
            source.display(),
            web_root.display()
        );
    };
    let relative = relative.to_path_buf();
    Ok(Page { source, relative })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressMethod;
    use crate::utils::path::normalize_path;
    use tempfile::TempDir;

    fn make_site() -> (TempDir, BundleConfig) {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        fs::create_dir_all(root.join("blog")).unwrap();
        fs::write(root.join("a.js"), "var a = 1;").unwrap();
        fs::write(root.join("blog/b.js"), "var b = 2;").unwrap();
        fs::write(
            root.join("index.html"),
            "<script src=\"/a.js\"></script><p>home</p>",
        )
        .unwrap();
        fs::write(
            root.join("blog/post.html"),
            "<script src=\"/a.js\"></script><script src=\"b.js\"></script>",
        )
        .unwrap();

        let mut config = BundleConfig::default();
        config.compress.js_method = CompressMethod::None;
        config.paths.web_root = root.clone();
        config.paths.output = root.join("dist");
        config.paths.cache = root.join(".bundles");
        (dir, config)
    }

    fn args(files: Vec<PathBuf>) -> RewriteArgs {
        RewriteArgs {
            files,
            output: None,
            web_root: None,
            context_path: None,
            method: None,
            options: None,
            basepath: None,
            shared_request: false,
            stdout: false,
        }
    }

    #[test]
    fn test_request_path() {
        let page = Page {
            source: PathBuf::from("/srv/blog/post.html"),
            relative: PathBuf::from("blog/post.html"),
        };
        assert_eq!(page.request_path(), "/blog/post.html");
    }

    #[test]
    fn test_collect_pages_from_dir() {
        let (_dir, config) = make_site();
        let pages = collect_pages(&[config.paths.web_root.clone()], &config.paths.web_root).unwrap();
        let relative: Vec<_> = pages.iter().map(|p| p.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("blog/post.html"), PathBuf::from("index.html")]
        );
        assert!(collect_pages(&[PathBuf::from("/nonexistent/x.html")], &config.paths.web_root).is_err());
    }

    #[test]
    fn test_collect_pages_outside_web_root() {
        let (_dir, config) = make_site();
        let other = TempDir::new().unwrap();
        let outside = other.path().join("index.html");
        fs::write(&outside, "<p>elsewhere</p>").unwrap();

        let err = collect_pages(&[outside], &config.paths.web_root).unwrap_err();
        assert!(err.to_string().contains("outside the web root"));
    }

    #[test]
    fn test_rewrite_writes_pages_and_bundles() {
        let (_dir, config) = make_site();
        let root = config.paths.web_root.clone();
        rewrite_pages(&args(vec![root.join("index.html"), root.join("blog/post.html")]), &config).unwrap();

        let index = fs::read_to_string(config.paths.output.join("index.html")).unwrap();
        assert!(index.starts_with("<script src=\"/combined.js?id="));
        assert!(index.ends_with("</script><p>home</p>"));

        let post = fs::read_to_string(config.paths.output.join("blog/post.html")).unwrap();
        assert_eq!(post.matches("<script").count(), 1);

        // Separate requests: both pages bundle /a.js, in different bundles
        let bundles = fs::read_dir(&config.paths.cache).unwrap().count();
        assert_eq!(bundles, 2);
    }

    #[test]
    fn test_shared_request_drops_repeated_scripts() {
        let (_dir, config) = make_site();
        let root = config.paths.web_root.clone();
        let mut shared = args(vec![root.join("index.html"), root.join("blog/post.html")]);
        shared.shared_request = true;
        rewrite_pages(&shared, &config).unwrap();

        let post = fs::read_to_string(config.paths.output.join("blog/post.html")).unwrap();
        let id = post
            .split("id=")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let bundle = fs::read_to_string(config.paths.cache.join(format!("{id}.js"))).unwrap();
        assert_eq!(bundle, "var b = 2;");
    }

    #[test]
    fn test_method_override_reaches_bundles() {
        let (_dir, mut config) = make_site();
        config.compress.js_method = CompressMethod::Minify;
        fs::write(
            config.paths.web_root.join("a.js"),
            "function add(first, second) { return first + second; }",
        )
        .unwrap();
        let index = config.paths.web_root.join("index.html");

        let bundle_of = |config: &BundleConfig| {
            let page = fs::read_to_string(config.paths.output.join("index.html")).unwrap();
            let id = page
                .split("id=")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .unwrap()
                .to_string();
            let content = fs::read_to_string(config.paths.cache.join(format!("{id}.js"))).unwrap();
            (id, content)
        };

        rewrite_pages(&args(vec![index.clone()]), &config).unwrap();
        let (minified_id, minified) = bundle_of(&config);
        assert!(!minified.contains("first + second"));

        let mut plain = args(vec![index]);
        plain.method = Some(CompressMethod::None);
        rewrite_pages(&plain, &config).unwrap();
        let (plain_id, content) = bundle_of(&config);

        assert_ne!(plain_id, minified_id);
        assert_eq!(content, "function add(first, second) { return first + second; }");
        assert_eq!(config.compress.js_method, CompressMethod::Minify);
    }
}
