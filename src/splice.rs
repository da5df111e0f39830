//! Offset-safe document splicing.
//!
//! Every element gets one [`Edit`]. The output is rebuilt in a fresh buffer
//! reading only the original text at original offsets, so an edit never
//! shifts the boundaries of the elements after it.

use crate::bundle::BundleKind;
use crate::markup::Element;

/// What happens to one element's span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Copy the element verbatim.
    Keep,
    /// Drop the element's span entirely.
    Delete,
    /// Point the element at a bundle.
    Replace(BundleRef),
}

/// Reference to a combined bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRef {
    pub kind: BundleKind,
    pub id: String,
}

impl BundleRef {
    pub fn new(kind: BundleKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// URL the bundle is served at.
    pub fn url(&self, context_path: &str) -> String {
        format!("{context_path}{}?id={}", self.kind.endpoint(), self.id)
    }
}

/// Apply `edits` to the element spans of `text`.
///
/// - script bundles replace the whole element with
///   `<script src="{ctx}/combined.js?id={id}"></script>`
/// - style bundles replace only the `href` attribute with
///   `href="{ctx}/combined.css?id={id}" `, the rest of the tag is untouched
///
/// # Panics
///
/// If `edits` and `elements` differ in length, or if element spans are
/// unsorted, overlapping or out of bounds.
pub fn splice(text: &str, elements: &[Element], edits: &[Edit], context_path: &str) -> String {
    assert_eq!(
        elements.len(),
        edits.len(),
        "one edit per element is required"
    );

    let mut out = String::with_capacity(text.len());
    let mut start = 0;

    for (element, edit) in elements.iter().zip(edits) {
        assert!(
            start <= element.begin() && element.begin() <= element.end() && element.end() <= text.len(),
            "element spans must be sorted, disjoint and in bounds: {:?} after offset {start}",
            element.span,
        );

        out.push_str(&text[start..element.begin()]);
        match edit {
            Edit::Keep => out.push_str(&text[element.begin()..element.end()]),
            Edit::Delete => {}
            Edit::Replace(bundle) => push_reference(&mut out, text, element, bundle, context_path),
        }
        start = element.end();
    }

    out.push_str(&text[start..]);
    out
}

fn push_reference(
    out: &mut String,
    text: &str,
    element: &Element,
    bundle: &BundleRef,
    context_path: &str,
) {
    let url = bundle.url(context_path);
    match (bundle.kind, element.attributes.get("href")) {
        (BundleKind::Style, Some(href)) => {
            out.push_str(&text[element.begin()..href.span.start]);
            out.push_str(&format!("href=\"{url}\" "));
            out.push_str(&text[href.span.end..element.end()]);
        }
        (BundleKind::Style, None) => {
            out.push_str(&format!("<link rel=\"stylesheet\" href=\"{url}\" />"));
        }
        (BundleKind::Script, _) => {
            out.push_str(&format!("<script src=\"{url}\"></script>"));
        }
    }
}
