//! The combiner entry point.
//!
//! [`CompressHandler::handle`] rewrites one document body:
//!
//! 1. script pass over the whole body: all `<script>` elements become one
//!    bundle reference at the position of the last surviving script
//! 2. style passes: the body is cut at every inline `<style>` block, the
//!    `<link rel="stylesheet">` elements of each chunk are bundled per media,
//!    style blocks are minified in place
//!
//! Every pass goes parse → group → resolve → splice. A hard failure aborts
//! the whole body: no partially rewritten text is ever returned.

use std::borrow::Cow;

use crate::bundle::{self, BundleCache, BundleKind, minify_css, options};
use crate::config::{CompressMethod, CompressSettings};
use crate::dedup::DuplicateTracker;
use crate::deps::{ClosureLibraryCheck, DependencyCheck};
use crate::error::CompileError;
use crate::group::{GroupContext, Grouping, group_scripts, group_styles};
use crate::markup::{Element, ElementKind, MarkupParser, TagScanner};
use crate::request::RequestScope;
use crate::splice::splice;

/// Rewrites document bodies to reference combined bundles.
///
/// Holds no per-request state: one handler can serve many requests, and
/// several threads at once.
pub struct CompressHandler<'a> {
    settings: &'a CompressSettings,
    cache: &'a dyn BundleCache,
    parser: &'a dyn MarkupParser,
    deps: &'a dyn DependencyCheck,
    /// Script compression method override.
    method: Option<CompressMethod>,
    /// User compressor options, overriding the configured ones.
    options: Option<String>,
    /// Base of relative references, overriding the configured one.
    basepath: Option<String>,
}

impl<'a> CompressHandler<'a> {
    pub fn new(settings: &'a CompressSettings, cache: &'a dyn BundleCache) -> Self {
        Self {
            settings,
            cache,
            parser: &TagScanner,
            deps: &ClosureLibraryCheck,
            method: None,
            options: None,
            basepath: None,
        }
    }

    pub fn with_method(mut self, method: CompressMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn with_basepath(mut self, basepath: impl Into<String>) -> Self {
        self.basepath = Some(basepath.into());
        self
    }

    pub fn with_parser(mut self, parser: &'a dyn MarkupParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_dependency_check(mut self, deps: &'a dyn DependencyCheck) -> Self {
        self.deps = deps;
        self
    }

    /// Option string of script bundles.
    fn script_options(&self) -> String {
        let user = self.options.as_deref().or(self.settings.options.as_deref());
        options::build(self.method, user, self.settings.js_method)
    }

    /// Rewrite `body` for `request`.
    pub fn handle(&self, request: &RequestScope, body: &str) -> Result<String, CompileError> {
        let settings = self.settings;
        let duplicates = (settings.clean_js_duplicates || settings.clean_css_duplicates)
            .then(|| DuplicateTracker::attach(request));
        let ctx = GroupContext {
            request,
            settings,
            basepath: self.basepath.as_deref().or(settings.basepath.as_deref()),
            duplicates: duplicates.as_ref(),
            deps: self.deps,
        };

        let body = if settings.handle_javascript {
            self.script_pass(&ctx, body)?
        } else {
            Cow::Borrowed(body)
        };

        if !settings.handle_css {
            return Ok(body.into_owned());
        }
        self.style_pass(&ctx, &body)
    }

    fn script_pass<'t>(&self, ctx: &GroupContext<'_>, body: &'t str) -> Result<Cow<'t, str>, CompileError> {
        let scripts = self.parser.elements(body, ElementKind::Script);
        if scripts.is_empty() {
            return Ok(Cow::Borrowed(body));
        }

        let grouping = group_scripts(&scripts, body, ctx)?;
        let ids = self.resolve_groups(ctx.request, &grouping, BundleKind::Script, &self.script_options())?;
        let edits = grouping.edits(scripts.len(), &ids, BundleKind::Script, true);
        Ok(Cow::Owned(splice(body, &scripts, &edits, ctx.request.context_path())))
    }

    fn style_pass(&self, ctx: &GroupContext<'_>, body: &str) -> Result<String, CompileError> {
        let blocks = self.parser.elements(body, ElementKind::StyleBlock);
        let mut out = String::with_capacity(body.len());
        let mut start = 0;

        for block in &blocks {
            out.push_str(&self.process_chunk(ctx, &body[start..block.begin()])?);
            self.push_style_block(&mut out, body, block);
            start = block.end();
        }
        out.push_str(&self.process_chunk(ctx, &body[start..])?);
        Ok(out)
    }

    /// Bundle the stylesheet links of one chunk.
    fn process_chunk<'t>(&self, ctx: &GroupContext<'_>, chunk: &'t str) -> Result<Cow<'t, str>, CompileError> {
        let links = self.parser.elements(chunk, ElementKind::StyleLink);
        if links.is_empty() {
            return Ok(Cow::Borrowed(chunk));
        }

        let grouping = group_styles(&links, ctx)?;
        if grouping.groups.is_empty() {
            return Ok(Cow::Borrowed(chunk));
        }
        let ids = self.resolve_groups(ctx.request, &grouping, BundleKind::Style, "")?;
        let edits = grouping.edits(links.len(), &ids, BundleKind::Style, false);
        Ok(Cow::Owned(splice(chunk, &links, &edits, ctx.request.context_path())))
    }

    fn resolve_groups(
        &self,
        request: &RequestScope,
        grouping: &Grouping,
        kind: BundleKind,
        options: &str,
    ) -> Result<Vec<Option<String>>, CompileError> {
        grouping
            .groups
            .iter()
            .map(|group| bundle::resolve(self.cache, request, &group.fragments, kind, options))
            .collect()
    }

    /// Copy an inline `<style>` block, minifying its content when CSS
    /// minification is on. Content that fails to minify is kept as is.
    fn push_style_block(&self, out: &mut String, body: &str, block: &Element) {
        let content = block.content.filter(|span| !span.is_empty());
        let Some(content) = content.filter(|_| self.settings.css_method == CompressMethod::Minify) else {
            out.push_str(&body[block.begin()..block.end()]);
            return;
        };

        out.push_str(&body[block.begin()..content.start]);
        let css = &body[content.start..content.end];
        match minify_css(css) {
            Some(minified) => out.push_str(&minified),
            None => {
                crate::debug!("style"; "inline style block at {} kept unminified", block.begin());
                out.push_str(css);
            }
        }
        out.push_str(&body[content.end..block.end()]);
    }
}

#[cfg(test)]
mod tests;
