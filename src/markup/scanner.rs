//! Regex-driven scanner for script, link and style elements.
//!
//! Not a full HTML tokenizer. It understands exactly what the combiner
//! needs:
//! - comments are skipped (`<!-- <script> -->` is not an element)
//! - `<script>` and `<style>` are raw text: their content is never scanned
//! - start tags end at the first `>` outside a quoted attribute value

use std::sync::LazyLock;

use regex::Regex;

use super::{Attribute, Attributes, Element, ElementKind, MarkupParser, Span, unescape};

/// Comment, or the start of one of the tags we care about. The name must be
/// followed by whitespace, `/`, `>` or the end of text, so custom elements
/// like `<script-x>` are not matched.
static TAG_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!--.*?-->|<(script|style|link)(?:[\s/>]|$)").unwrap());

static SCRIPT_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</script\s*>").unwrap());

static STYLE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</style\s*>").unwrap());

/// Default [`MarkupParser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TagScanner;

impl TagScanner {
    pub const fn new() -> Self {
        Self
    }

    /// Locate every script, link and style element in document order.
    pub fn scan(&self, text: &str) -> Vec<Element> {
        let mut elements = Vec::new();
        let mut pos = 0;

        while let Some(caps) = TAG_START.captures_at(text, pos) {
            let Some(whole) = caps.get(0) else { break };
            let Some(name) = caps.get(1) else {
                // Comment
                pos = whole.end();
                continue;
            };

            let kind = match name.as_str().to_ascii_lowercase().as_str() {
                "script" => ElementKind::Script,
                "style" => ElementKind::StyleBlock,
                _ => ElementKind::StyleLink,
            };

            // Unterminated start tag: nothing after it can be an element
            let Some(open_end) = find_tag_end(text, name.end()) else {
                break;
            };
            let gt = open_end - 1;
            let attributes = Attributes::new(parse_attributes(text, name.end(), gt));
            let self_closing = text[name.end()..gt].trim_end().ends_with('/');

            let element = match kind {
                ElementKind::StyleLink => Element {
                    kind,
                    span: Span::new(whole.start(), open_end),
                    content: None,
                    attributes,
                },
                _ if self_closing => Element {
                    kind,
                    span: Span::new(whole.start(), open_end),
                    content: None,
                    attributes,
                },
                _ => {
                    let end_tag = match kind {
                        ElementKind::Script => &*SCRIPT_END,
                        _ => &*STYLE_END,
                    };
                    let (content_end, end) = end_tag
                        .find_at(text, open_end)
                        .map_or((text.len(), text.len()), |m| (m.start(), m.end()));
                    Element {
                        kind,
                        span: Span::new(whole.start(), end),
                        content: Some(Span::new(open_end, content_end)),
                        attributes,
                    }
                }
            };

            pos = element.end();
            elements.push(element);
        }

        elements
    }
}

impl MarkupParser for TagScanner {
    fn elements(&self, text: &str, kind: ElementKind) -> Vec<Element> {
        self.scan(text)
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

/// Find the byte index just past the `>` closing a start tag.
///
/// Quotes only count when they open an attribute value (`="…"`), so a stray
/// apostrophe in a bare attribute does not swallow the rest of the document.
fn find_tag_end(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    let mut after_eq = false;

    while i < bytes.len() {
        match bytes[i] {
            b'>' => return Some(i + 1),
            b'=' => after_eq = true,
            q @ (b'"' | b'\'') if after_eq => {
                let close = text[i + 1..].find(q as char)?;
                i += 1 + close;
                after_eq = false;
            }
            b if b.is_ascii_whitespace() => {}
            _ => after_eq = false,
        }
        i += 1;
    }

    None
}

/// Parse attributes of a start tag between `start` (after the tag name) and
/// `end` (the closing `>`), recording each attribute's full span.
fn parse_attributes(text: &str, start: usize, end: usize) -> Vec<Attribute> {
    let bytes = text.as_bytes();
    let mut attrs = Vec::new();
    let mut i = start;

    let skip_ws = |mut j: usize| {
        while j < end && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        j
    };

    while i < end {
        let b = bytes[i];
        if b.is_ascii_whitespace() || b == b'/' {
            i += 1;
            continue;
        }

        // Read attribute name
        let name_start = i;
        while i < end && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'/') {
            i += 1;
        }
        if i == name_start {
            // Stray `=`
            i += 1;
            continue;
        }
        let name = text[name_start..i].to_ascii_lowercase();

        let mut j = skip_ws(i);
        if j < end && bytes[j] == b'=' {
            j = skip_ws(j + 1);
            let raw = if j < end && matches!(bytes[j], b'"' | b'\'') {
                let quote = bytes[j] as char;
                let value_start = j + 1;
                let value_end = text[value_start..end]
                    .find(quote)
                    .map_or(end, |offset| value_start + offset);
                i = (value_end + 1).min(end);
                &text[value_start..value_end]
            } else {
                let value_start = j;
                while j < end && !bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                i = j;
                &text[value_start..j]
            };

            attrs.push(Attribute {
                name,
                value: Some(unescape(raw).into_owned()),
                span: Span::new(name_start, i),
            });
        } else {
            // Boolean attribute (no value)
            attrs.push(Attribute {
                name,
                value: None,
                span: Span::new(name_start, i),
            });
        }
    }

    attrs
}
