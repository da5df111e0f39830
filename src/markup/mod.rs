//! Located markup elements.
//!
//! The rest of the crate never tokenizes HTML itself: it asks a
//! [`MarkupParser`] for the script, stylesheet-link and style-block elements of
//! a text and works on their source spans. [`TagScanner`] is the default parser.

mod entities;
mod scanner;
mod span;

pub use entities::unescape;
pub use scanner::TagScanner;
pub use span::Span;

/// Which kind of resource-bearing element was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<script>…</script>`
    Script,
    /// `<link …>`
    StyleLink,
    /// `<style>…</style>`
    StyleBlock,
}

impl ElementKind {
    /// Lowercase tag name of the element.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::StyleLink => "link",
            Self::StyleBlock => "style",
        }
    }
}

/// A single attribute with its source span.
///
/// `span` covers the whole attribute text (`name="value"`), including quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Unescaped value, `None` for bare attributes (`async`, `defer`).
    pub value: Option<String>,
    pub span: Span,
}

/// Ordered attribute list of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new(attrs: Vec<Attribute>) -> Self {
        Self(attrs)
    }

    /// First attribute with the given (lowercase) name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name == name)
    }

    /// Value of an attribute that is present with a non-empty value.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|a| a.value.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Whether the attribute exists and carries a non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A located element.
///
/// Invariant: within one parse result, element spans are sorted by
/// `span.start` and never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    /// Whole element, from `<` of the start tag to `>` of the end tag.
    pub span: Span,
    /// Inner text of raw-text elements (`script`, `style`).
    pub content: Option<Span>,
    pub attributes: Attributes,
}

impl Element {
    #[inline]
    pub fn begin(&self) -> usize {
        self.span.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Inner content as a slice of the text the element was parsed from.
    pub fn content_str<'t>(&self, text: &'t str) -> &'t str {
        self.content.map_or("", |span| &text[span.start..span.end])
    }

    /// Whether a raw-text element has any inner content.
    pub fn has_content(&self) -> bool {
        self.content.is_some_and(|span| !span.is_empty())
    }
}

/// Parsing collaborator: locate every element of `kind` in `text`.
pub trait MarkupParser: Send + Sync {
    fn elements(&self, text: &str, kind: ElementKind) -> Vec<Element>;
}
