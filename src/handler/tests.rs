use std::fs;

use parking_lot::Mutex;
use tempfile::TempDir;

use super::CompressHandler;
use crate::bundle::{BundleCache, BundleError, BundleKind, BundleRequest, TagCache};
use crate::config::{CompressMethod, CompressSettings};
use crate::deps::NoDependencyCheck;
use crate::error::CompileError;
use crate::fragment::FragmentDescriptor;
use crate::markup::{Element, ElementKind, MarkupParser};
use crate::request::RequestScope;

/// Records every bundle request; scripts get `BUNDLE1`, styles `BUNDLE2`.
#[derive(Default)]
struct RecordingCache {
    calls: Mutex<Vec<(BundleKind, Vec<FragmentDescriptor>, String)>>,
}

impl RecordingCache {
    fn calls(&self) -> Vec<(BundleKind, Vec<FragmentDescriptor>, String)> {
        self.calls.lock().clone()
    }
}

impl BundleCache for RecordingCache {
    fn compress_and_store(
        &self,
        _request: &RequestScope,
        bundle: BundleRequest<'_>,
    ) -> Result<String, BundleError> {
        self.calls.lock().push((
            bundle.kind,
            bundle.fragments.to_vec(),
            bundle.options.to_string(),
        ));
        Ok(match bundle.kind {
            BundleKind::Script => "BUNDLE1".into(),
            BundleKind::Style => "BUNDLE2".into(),
        })
    }
}

struct FailingCache;

impl BundleCache for FailingCache {
    fn compress_and_store(
        &self,
        _request: &RequestScope,
        bundle: BundleRequest<'_>,
    ) -> Result<String, BundleError> {
        Err(BundleError::Compress { kind: bundle.kind })
    }
}

fn make_site(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for file in files {
        let path = dir.path().join(file.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("var x = \"{file}\";")).unwrap();
    }
    dir
}

fn external(path: &str) -> FragmentDescriptor {
    FragmentDescriptor::External(path.into())
}

// ============================================================================
// script pass
// ============================================================================

#[test]
fn test_scripts_combined_into_one_reference() {
    let site = make_site(&["/a.js", "/b.js"]);
    let request = RequestScope::new("/index.html", site.path()).with_context_path("/ctx");
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<script src=\"/a.js\"></script><script src=\"/b.js\"></script>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    assert_eq!(out, "<script src=\"/ctx/combined.js?id=BUNDLE1\"></script>");
    assert_eq!(
        cache.calls(),
        vec![(BundleKind::Script, vec![external("/a.js"), external("/b.js")], String::new())]
    );
}

#[test]
fn test_inline_scripts_join_the_bundle() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<head><script src=\"/a.js\"></script>\n<script>init();</script></head>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    assert_eq!(out, "<head>\n<script src=\"/combined.js?id=BUNDLE1\"></script></head>");
    assert_eq!(
        cache.calls()[0].1,
        vec![external("/a.js"), FragmentDescriptor::Internal("init();".into())]
    );
}

#[test]
fn test_reference_lands_at_last_surviving_script() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<script src=\"/a.js\"></script><p>mid</p><script src=\"/gone.js\"></script>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    assert_eq!(out, "<script src=\"/combined.js?id=BUNDLE1\"></script><p>mid</p>");
}

#[test]
fn test_remote_script_aborts_the_pass() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<script src=\"/a.js\"></script><script src=\"http://example.com/a.js\"></script>";
    let err = CompressHandler::new(&settings, &cache)
        .handle(&request, body)
        .unwrap_err();

    assert!(matches!(err, CompileError::InvalidResourceReference { .. }));
    assert!(cache.calls().is_empty());
}

#[test]
fn test_only_missing_script_is_deleted_without_bundle() {
    let site = make_site(&[]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "before<script src=\"/gone.js\"></script>after";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    assert_eq!(out, "beforeafter");
    assert!(cache.calls().is_empty());
}

#[test]
fn test_duplicates_across_invocations_of_one_request() {
    let site = make_site(&["/a.js", "/b.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();
    let handler = CompressHandler::new(&settings, &cache);

    let header = handler
        .handle(&request, "<script src=\"/a.js\"></script>")
        .unwrap();
    assert_eq!(header, "<script src=\"/combined.js?id=BUNDLE1\"></script>");

    let footer = handler
        .handle(&request, "<script src=\"/a.js\"></script><script src=\"/b.js\"></script>")
        .unwrap();
    assert_eq!(footer, "<script src=\"/combined.js?id=BUNDLE1\"></script>");
    assert_eq!(cache.calls()[1].1, vec![external("/b.js")]);

    // A new request starts with empty sets
    let other = RequestScope::new("/index.html", site.path());
    handler.handle(&other, "<script src=\"/a.js\"></script>").unwrap();
    assert_eq!(cache.calls()[2].1, vec![external("/a.js")]);
}

#[test]
fn test_dependency_check_controls_duplicate_filtering() {
    let site = make_site(&["/a.js"]);
    fs::write(site.path().join("base.js"), "var goog = goog || {};").unwrap();
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();
    let body = "<script src=\"/base.js\"></script><script src=\"/a.js\"></script>";

    // Default check: the Closure group keeps its repeated script
    let request = RequestScope::new("/index.html", site.path());
    let handler = CompressHandler::new(&settings, &cache);
    handler.handle(&request, "<script src=\"/a.js\"></script>").unwrap();
    handler.handle(&request, body).unwrap();
    assert_eq!(cache.calls()[1].1, vec![external("/base.js"), external("/a.js")]);

    let request = RequestScope::new("/index.html", site.path());
    let handler = CompressHandler::new(&settings, &cache).with_dependency_check(&NoDependencyCheck);
    handler.handle(&request, "<script src=\"/a.js\"></script>").unwrap();
    handler.handle(&request, body).unwrap();
    assert_eq!(cache.calls()[3].1, vec![external("/base.js")]);
}

/// Parser that reports no elements at all.
struct BlindParser;

impl MarkupParser for BlindParser {
    fn elements(&self, _text: &str, _kind: ElementKind) -> Vec<Element> {
        Vec::new()
    }
}

#[test]
fn test_custom_parser_drives_the_passes() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<script src=\"/a.js\"></script><style>a { color: red; }</style>";
    let out = CompressHandler::new(&settings, &cache)
        .with_parser(&BlindParser)
        .handle(&request, body)
        .unwrap();
    assert_eq!(out, body);
    assert!(cache.calls().is_empty());
}

#[test]
fn test_duplicate_cleaning_disabled() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings {
        clean_js_duplicates: false,
        ..CompressSettings::default()
    };
    let cache = RecordingCache::default();

    let body = "<script src=\"/a.js\"></script><script src=\"/a.js\"></script>";
    CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();
    assert_eq!(cache.calls()[0].1.len(), 2);
}

#[test]
fn test_method_and_options_reach_the_cache() {
    let site = make_site(&["/a.js", "/a.css"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<script src=\"/a.js\"></script><link rel=\"stylesheet\" href=\"/a.css\">";
    CompressHandler::new(&settings, &cache)
        .with_method(CompressMethod::None)
        .with_options("mangle=false")
        .handle(&request, body)
        .unwrap();

    let calls = cache.calls();
    assert_eq!(calls[0].2, "javascript.compress=none\nnone.mangle=false\n");
    assert_eq!(calls[1].0, BundleKind::Style);
    assert_eq!(calls[1].2, "");
}

#[test]
fn test_basepath_resolves_relative_references() {
    let site = make_site(&["/lib/a.js"]);
    let request = RequestScope::new("/blog/post.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    CompressHandler::new(&settings, &cache)
        .with_basepath("/lib")
        .handle(&request, "<script src=\"a.js\"></script>")
        .unwrap();
    assert_eq!(cache.calls()[0].1, vec![external("/lib/a.js")]);
}

#[test]
fn test_cache_failure_is_hard_error() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();

    let err = CompressHandler::new(&settings, &FailingCache)
        .handle(&request, "<script src=\"/a.js\"></script>")
        .unwrap_err();
    assert!(matches!(err, CompileError::CacheOrCompression(_)));
}

// ============================================================================
// style pass
// ============================================================================

#[test]
fn test_duplicate_print_stylesheet() {
    let site = make_site(&["/a.css"]);
    let request = RequestScope::new("/index.html", site.path()).with_context_path("/ctx");
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = concat!(
        "<link rel=\"stylesheet\" href=\"/a.css\" media=\"print\">\n",
        "<link rel=\"stylesheet\" href=\"/a.css\" media=\"print\">",
    );
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    assert_eq!(
        out,
        "<link rel=\"stylesheet\" href=\"/ctx/combined.css?id=BUNDLE2\"  media=\"print\">\n"
    );
    assert_eq!(
        cache.calls(),
        vec![(BundleKind::Style, vec![external("/a.css")], String::new())]
    );
}

#[test]
fn test_media_groups_never_merge() {
    let site = make_site(&["/a.css", "/b.css"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = concat!(
        "<link rel=\"stylesheet\" href=\"/a.css\">",
        "<link rel=\"stylesheet\" href=\"/a.css\" media=\"print\">",
        "<link rel=\"icon\" href=\"/favicon.ico\">",
        "<link rel=\"stylesheet\" href=\"/b.css\">",
    );
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    let calls = cache.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, vec![external("/a.css"), external("/b.css")]);
    assert_eq!(calls[1].1, vec![external("/a.css")]);
    assert_eq!(
        out,
        concat!(
            "<link rel=\"stylesheet\" href=\"/combined.css?id=BUNDLE2\"  media=\"print\">",
            "<link rel=\"icon\" href=\"/favicon.ico\">",
            "<link rel=\"stylesheet\" href=\"/combined.css?id=BUNDLE2\" >",
        )
    );
}

#[test]
fn test_style_blocks_split_chunks() {
    let site = make_site(&["/a.css", "/b.css"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = concat!(
        "<link rel=\"stylesheet\" href=\"/a.css\">",
        "<style>\n  p { color: red; }\n</style>",
        "<link rel=\"stylesheet\" href=\"/b.css\">",
        "<p>end</p>",
    );
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    assert_eq!(
        out,
        concat!(
            "<link rel=\"stylesheet\" href=\"/combined.css?id=BUNDLE2\" >",
            "<style>p{color:red}</style>",
            "<link rel=\"stylesheet\" href=\"/combined.css?id=BUNDLE2\" >",
            "<p>end</p>",
        )
    );
    // One bundle per chunk
    assert_eq!(cache.calls().len(), 2);
}

#[test]
fn test_style_blocks_verbatim_without_minify() {
    let site = make_site(&[]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings {
        css_method: CompressMethod::None,
        ..CompressSettings::default()
    };
    let cache = RecordingCache::default();

    let body = "a<style>\n  p { color: red; }\n</style>b<style></style>c";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();
    assert_eq!(out, body);
}

#[test]
fn test_invalid_style_block_kept() {
    let site = make_site(&[]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<style>p { color: red; </style><style>@@@{</style>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();
    assert!(out.starts_with("<style>"));
    assert!(out.ends_with("</style>"));
    assert_eq!(out.matches("<style>").count(), 2);
}

#[test]
fn test_remote_stylesheet_aborts() {
    let site = make_site(&[]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let err = CompressHandler::new(&settings, &cache)
        .handle(&request, "<link rel=\"stylesheet\" href=\"https://cdn.example.com/a.css\">")
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidResourceReference { .. }));
}

#[test]
fn test_disabled_passes_leave_body_unchanged() {
    let site = make_site(&["/a.js", "/a.css"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings {
        handle_javascript: false,
        handle_css: false,
        ..CompressSettings::default()
    };
    let cache = RecordingCache::default();

    let body = "<script src=\"http://example.com/x.js\"></script><link rel=\"stylesheet\" href=\"/a.css\"><style> p {} </style>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();
    assert_eq!(out, body);
    assert!(cache.calls().is_empty());
}

#[test]
fn test_untouched_text_is_byte_identical() {
    let site = make_site(&["/a.js"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<!-- <script src=\"/x.js\"></script> -->\n<p>héllo wörld</p>\n<script src=\"/a.js\"></script>\n";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();
    assert_eq!(
        out,
        "<!-- <script src=\"/x.js\"></script> -->\n<p>héllo wörld</p>\n<script src=\"/combined.js?id=BUNDLE1\"></script>\n"
    );
}

#[test]
fn test_custom_elements_left_alone() {
    let site = make_site(&["/a.js", "/a.css"]);
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings::default();
    let cache = RecordingCache::default();

    let body = "<script-x>hi</script-x><p>keep</p><style-guide>x</style-guide>\
                <link-card rel=\"stylesheet\" href=\"/a.css\">\
                <script src=\"/a.js\"></script>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();
    assert_eq!(
        out,
        "<script-x>hi</script-x><p>keep</p><style-guide>x</style-guide>\
         <link-card rel=\"stylesheet\" href=\"/a.css\">\
         <script src=\"/combined.js?id=BUNDLE1\"></script>"
    );

    let calls = cache.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, vec![external("/a.js")]);
}

// ============================================================================
// with the default cache
// ============================================================================

#[test]
fn test_end_to_end_with_tag_cache() {
    let site = make_site(&[]);
    fs::write(site.path().join("a.js"), "var first = 1;").unwrap();
    fs::write(site.path().join("a.css"), "a { color: blue; }").unwrap();
    let request = RequestScope::new("/index.html", site.path());
    let settings = CompressSettings {
        js_method: CompressMethod::None,
        ..CompressSettings::default()
    };
    let cache = TagCache::new(&settings);

    let body = "<link rel=\"stylesheet\" href=\"/a.css\"><script src=\"/a.js\"></script><script>var second = 2;</script>";
    let out = CompressHandler::new(&settings, &cache).handle(&request, body).unwrap();

    let script_id = out
        .split("combined.js?id=")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap();
    let style_id = out
        .split("combined.css?id=")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap();

    let script = cache.lookup(script_id, BundleKind::Script).unwrap();
    assert_eq!(script.content, "var first = 1;\nvar second = 2;");
    let style = cache.lookup(style_id, BundleKind::Style).unwrap();
    assert!(style.content.starts_with("a{color:"));
    assert!(!style.content.contains(' '));

    // Same resources in another request: same ids
    let again = CompressHandler::new(&settings, &cache)
        .handle(&RequestScope::new("/other.html", site.path()), body)
        .unwrap();
    assert_eq!(again, out);
}
