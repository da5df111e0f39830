//! Grouping engine: which elements feed which bundle.
//!
//! - scripts form a single group
//! - stylesheet links are grouped by their `media` value (`""` if absent)
//!
//! Missing-file and duplicate policy is applied while grouping. Elements
//! dropped by either end up in [`Grouping::eliminated`] and are deleted from
//! the document; links that are not `rel="stylesheet"` with an `href` never
//! enter a group and are left alone.

use crate::bundle::BundleKind;
use crate::config::CompressSettings;
use crate::dedup::DuplicateTracker;
use crate::deps::DependencyCheck;
use crate::error::{CompileError, ResourceKind};
use crate::fragment::FragmentDescriptor;
use crate::log;
use crate::markup::Element;
use crate::request::RequestScope;
use crate::splice::{BundleRef, Edit};
use crate::utils::path::{calc_path, is_valid_css, is_valid_js, is_web_address};

/// Fragments destined for one bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Grouping key: `""` for scripts, the media value for stylesheets.
    pub key: String,
    /// Surviving fragments in document order.
    pub fragments: Vec<FragmentDescriptor>,
    /// Element index of each fragment.
    pub members: Vec<usize>,
}

impl Group {
    fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    fn push(&mut self, index: usize, fragment: FragmentDescriptor) {
        self.members.push(index);
        self.fragments.push(fragment);
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Result of grouping one element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Groups in order of first appearance.
    pub groups: Vec<Group>,
    /// Elements dropped as duplicates or missing files, ascending.
    pub eliminated: Vec<usize>,
}

impl Grouping {
    fn group_mut(&mut self, key: &str) -> &mut Group {
        let pos = match self.groups.iter().position(|g| g.key == key) {
            Some(pos) => pos,
            None => {
                self.groups.push(Group::new(key));
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos]
    }

    /// One edit per element.
    ///
    /// `ids[g]` is the bundle of `groups[g]`. The last member of a bundled
    /// group is replaced by the reference, its other members and every
    /// eliminated element are deleted. Everything else is kept, except that
    /// `delete_rest` deletes elements in no group at all (scripts: an empty
    /// group still removes its tags).
    pub fn edits(
        &self,
        count: usize,
        ids: &[Option<String>],
        kind: BundleKind,
        delete_rest: bool,
    ) -> Vec<Edit> {
        let fallback = if delete_rest { Edit::Delete } else { Edit::Keep };
        let mut edits = vec![fallback; count];

        for &index in &self.eliminated {
            edits[index] = Edit::Delete;
        }
        for (group, id) in self.groups.iter().zip(ids) {
            let Some(id) = id else { continue };
            let Some((&last, rest)) = group.members.split_last() else {
                continue;
            };
            for &index in rest {
                edits[index] = Edit::Delete;
            }
            edits[last] = Edit::Replace(BundleRef::new(kind, id.clone()));
        }
        edits
    }
}

/// Everything grouping needs besides the elements.
pub struct GroupContext<'a> {
    pub request: &'a RequestScope,
    pub settings: &'a CompressSettings,
    /// Base of relative references, `None` for the page's directory.
    pub basepath: Option<&'a str>,
    /// Duplicate sets of the request, when any duplicate cleaning is on.
    pub duplicates: Option<&'a DuplicateTracker>,
    pub deps: &'a dyn DependencyCheck,
}

impl GroupContext<'_> {
    fn resolve(&self, reference: &str) -> String {
        calc_path(
            reference,
            self.request.context_path(),
            self.request.request_path(),
            self.basepath,
        )
    }

    /// Missing-file policy: `true` if the file must be skipped.
    fn skip_missing(&self, path: &str) -> bool {
        if self.settings.ignore_missing_files && !self.request.exists(path) {
            log!("warning"; "file {} not found, ignored", path);
            return true;
        }
        false
    }
}

/// Group script elements into the single script group.
pub fn group_scripts(
    elements: &[Element],
    text: &str,
    ctx: &GroupContext<'_>,
) -> Result<Grouping, CompileError> {
    let mut grouping = Grouping::default();
    let mut candidates: Vec<(usize, FragmentDescriptor)> = Vec::with_capacity(elements.len());

    for (index, element) in elements.iter().enumerate() {
        match element.attributes.value("src") {
            Some(src) => {
                if is_web_address(src) || !is_valid_js(src) {
                    return Err(CompileError::invalid(ResourceKind::Script, src));
                }
                let path = ctx.resolve(src);
                if ctx.skip_missing(&path) {
                    grouping.eliminated.push(index);
                } else {
                    candidates.push((index, FragmentDescriptor::External(path)));
                }
            }
            None => {
                let content = element.content_str(text).to_string();
                candidates.push((index, FragmentDescriptor::Internal(content)));
            }
        }
    }

    let tracker = ctx.duplicates.filter(|_| ctx.settings.clean_js_duplicates);
    if let Some(tracker) = tracker {
        let fragments: Vec<FragmentDescriptor> =
            candidates.iter().map(|(_, f)| f.clone()).collect();
        let claimed = ctx
            .deps
            .claims(&fragments, ctx.request)
            .map_err(CompileError::DependencyScan)?;

        if claimed {
            crate::debug!("group"; "dependency-managed scripts, duplicates kept");
        } else {
            candidates.retain(|(index, fragment)| match fragment.dedup_key() {
                Some(key) if !tracker.claim_script(key) => {
                    grouping.eliminated.push(*index);
                    false
                }
                _ => true,
            });
        }
    }

    let group = grouping.group_mut("");
    for (index, fragment) in candidates {
        group.push(index, fragment);
    }
    grouping.eliminated.sort_unstable();
    Ok(grouping)
}

/// Group stylesheet links by media.
pub fn group_styles(elements: &[Element], ctx: &GroupContext<'_>) -> Result<Grouping, CompileError> {
    let mut grouping = Grouping::default();
    let tracker = ctx.duplicates.filter(|_| ctx.settings.clean_css_duplicates);

    for (index, element) in elements.iter().enumerate() {
        let attrs = &element.attributes;
        let is_stylesheet = attrs
            .value("rel")
            .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"));
        let Some(href) = attrs.value("href").filter(|_| is_stylesheet) else {
            continue;
        };
        let media = attrs.value("media").unwrap_or("");
        grouping.group_mut(media);

        if is_web_address(href) || !is_valid_css(href) {
            return Err(CompileError::invalid(ResourceKind::Stylesheet, href));
        }
        let path = ctx.resolve(href);

        if tracker.is_some_and(|t| t.contains_style(media, &path)) || ctx.skip_missing(&path) {
            grouping.eliminated.push(index);
            continue;
        }
        // Claim after the missing check: a missing file never marks its
        // path as emitted.
        if let Some(tracker) = tracker
            && !tracker.claim_style(media, &path)
        {
            grouping.eliminated.push(index);
            continue;
        }
        grouping
            .group_mut(media)
            .push(index, FragmentDescriptor::External(path));
    }

    Ok(grouping)
}
