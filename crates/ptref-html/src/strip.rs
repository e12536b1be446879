//! Streaming HTML tag handler producing plain text.

use std::borrow::Cow;
use std::sync::LazyLock;

use ptref_core::is_url;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;

use crate::entities::{convert_html_entities, decode_entity};
use crate::error::HtmlError;

/// Elements whose raw content is never text. Removed before tokenizing
/// because their bodies are not well-formed markup.
static RAW_TEXT_ELEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<template\b.*?</template\s*>",
    )
    .expect("invalid raw text element regex")
});

/// A `<` that cannot open a tag, comment or declaration.
static STRAY_LESS_THAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^a-zA-Z/!?]|$)").expect("invalid stray `<` regex"));

/// Elements that end the current line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "dd", "div", "dl", "dt", "figcaption", "figure", "footer",
    "form", "header", "main", "nav", "ol", "section", "table", "tr", "ul",
];

/// Elements followed by a blank line.
const PARAGRAPH_ELEMENTS: &[&str] = &["blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "p"];

/// Convert an HTML document to plain text.
///
/// Lines are separated by `\n` and the result ends with a newline unless
/// it is empty. When `start_marker` is given, text before its first
/// occurrence is dropped; a marker that never appears leaves the text whole.
///
/// # Errors
///
/// Returns an error if the markup cannot be tokenized.
pub fn strip_html(raw_html: &str, start_marker: Option<&str>) -> Result<String, HtmlError> {
    let html = RAW_TEXT_ELEMENTS.replace_all(raw_html, "");
    if html.len() != raw_html.len() {
        tracing::debug!("dropped script/style content before conversion");
    }
    let html = STRAY_LESS_THAN.replace_all(&html, "&lt;$1");
    let html = convert_html_entities(&html);

    let mut reader = Reader::from_str(&html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut sink = TextSink::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let tag = tag_name(&e);
                sink.open(&tag, &e);
            }
            Event::Empty(e) => {
                let tag = tag_name(&e);
                sink.open(&tag, &e);
                sink.close(&tag);
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                sink.close(&tag);
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                sink.text(&text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                sink.text(&decode_entity(&entity));
            }
            Event::CData(e) => {
                sink.text(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    let text = normalize_lines(&sink.finish());
    Ok(apply_start_marker(text, start_marker))
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase()
}

/// Absolute `href` of an anchor, if any.
fn anchor_href(e: &BytesStart) -> Option<String> {
    let attr = e
        .html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(b"href"))?;
    let value = attr.unescape_value().map_or_else(
        |_| String::from_utf8_lossy(&attr.value).into_owned(),
        Cow::into_owned,
    );
    let value = value.trim();
    is_url(value).then(|| value.to_owned())
}

/// An open `<a>` element.
#[derive(Debug)]
struct Anchor {
    /// Absolute link target; `None` for relative or missing links.
    href: Option<String>,
    /// Output offset where the link text begins.
    start: usize,
}

/// Accumulates text while tracking the elements that shape it.
#[derive(Debug, Default)]
struct TextSink {
    out: String,
    anchors: Vec<Anchor>,
    /// Nesting depth of `<pre>`; whitespace is kept while positive.
    pre_depth: usize,
    /// Inside `<head>`: nothing is emitted.
    in_head: bool,
}

impl TextSink {
    fn open(&mut self, tag: &str, e: &BytesStart) {
        match tag {
            "head" => self.in_head = true,
            "body" => self.in_head = false,
            _ if self.in_head => {}
            "br" => self.line_break(),
            "hr" => self.paragraph_break(),
            "li" => {
                self.end_line();
                self.out.push_str("* ");
            }
            "pre" => {
                self.end_line();
                self.pre_depth += 1;
            }
            "a" => self.anchors.push(Anchor {
                href: anchor_href(e),
                start: self.out.len(),
            }),
            t if BLOCK_ELEMENTS.contains(&t) || PARAGRAPH_ELEMENTS.contains(&t) => {
                self.end_line();
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: &str) {
        match tag {
            "head" => self.in_head = false,
            _ if self.in_head => {}
            "pre" => {
                self.pre_depth = self.pre_depth.saturating_sub(1);
                self.paragraph_break();
            }
            "a" => {
                if let Some(anchor) = self.anchors.pop() {
                    self.close_anchor(anchor);
                }
            }
            t if PARAGRAPH_ELEMENTS.contains(&t) => self.paragraph_break(),
            t if BLOCK_ELEMENTS.contains(&t) || t == "li" => self.end_line(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_head {
            return;
        }
        if self.pre_depth > 0 {
            self.out.extend(text.chars().filter(|&c| c != '\r'));
            return;
        }
        for c in text.chars() {
            if c.is_whitespace() {
                if !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
                    self.out.push(' ');
                }
            } else {
                self.out.push(c);
            }
        }
    }

    /// Cite the link target after its text.
    ///
    /// Link text that is empty or just repeats the URL is taken back out, so
    /// only the citation remains.
    fn close_anchor(&mut self, anchor: Anchor) {
        let Some(href) = anchor.href else {
            return;
        };

        let label = self.out.get(anchor.start..).unwrap_or_default().trim();
        if label.is_empty() || label == href {
            self.out.truncate(anchor.start);
        }

        if !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
            self.out.push(' ');
        }
        self.out.push('(');
        // Parentheses inside the URL would end the citation early.
        self.out
            .push_str(&href.replace('(', "%28").replace(')', "%29"));
        self.out.push(')');
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
    }

    /// Start a new line unless already at the start of one.
    fn end_line(&mut self) {
        self.trim_trailing_spaces();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn line_break(&mut self) {
        self.trim_trailing_spaces();
        self.out.push('\n');
    }

    fn paragraph_break(&mut self) {
        self.end_line();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        if !self.anchors.is_empty() {
            tracing::debug!(open = self.anchors.len(), "unclosed anchors at end of input");
        }
        self.out
    }
}

/// Trim line ends, collapse blank runs and terminate every line.
fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

fn apply_start_marker(text: String, start_marker: Option<&str>) -> String {
    let Some(marker) = start_marker.filter(|m| !m.is_empty()) else {
        return text;
    };
    match text.find(marker) {
        Some(offset) => text[offset..].to_owned(),
        None => {
            tracing::warn!(marker, "start marker not found, keeping whole document");
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strip(html: &str) -> String {
        strip_html(html, None).unwrap()
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        assert_eq!(strip("<p>One</p><p>Two</p>"), "One\n\nTwo\n");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(
            strip("<p>  lots\n   of \t space  </p>"),
            "lots of space\n"
        );
    }

    #[test]
    fn test_br_breaks_line() {
        assert_eq!(strip("<p>a<br>b<br/>c</p>"), "a\nb\nc\n");
    }

    #[test]
    fn test_head_and_scripts_are_dropped() {
        let html = "<html><head><title>T</title><style>p { x: 1 }</style></head>\
                    <body><script>if (a < b) { go(); }</script><p>Body</p></body></html>";
        assert_eq!(strip(html), "Body\n");
    }

    #[test]
    fn test_anchor_with_url_is_cited() {
        assert_eq!(
            strip(r#"<p>See <a href="http://example.org/a">the article</a>.</p>"#),
            "See the article (http://example.org/a).\n"
        );
    }

    #[test]
    fn test_anchor_repeating_url_is_retracted() {
        assert_eq!(
            strip(r#"<p>Source: <a href="http://x.com">http://x.com</a></p>"#),
            "Source: (http://x.com)\n"
        );
    }

    #[test]
    fn test_empty_anchor_keeps_citation() {
        assert_eq!(
            strip(r#"<p>Icon<a href="https://x.org/"></a> here</p>"#),
            "Icon (https://x.org/) here\n"
        );
    }

    #[test]
    fn test_relative_anchor_keeps_text_only() {
        assert_eq!(
            strip(r##"<p><a href="/about">About</a> and <a href="#top">top</a></p>"##),
            "About and top\n"
        );
    }

    #[test]
    fn test_parentheses_in_href_are_encoded() {
        assert_eq!(
            strip(r#"<a href="https://en.wikipedia.org/wiki/Rust_(language)">Rust</a>"#),
            "Rust (https://en.wikipedia.org/wiki/Rust_%28language%29)\n"
        );
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(
            strip("<p>&ldquo;Fish &amp; chips&rdquo; &#8211; AT&T &lt;3</p>"),
            "\u{201c}Fish & chips\u{201d} \u{2013} AT&T <3\n"
        );
    }

    #[test]
    fn test_list_items_are_bulleted() {
        assert_eq!(
            strip("<ul><li>one</li><li>two</li></ul><p>after</p>"),
            "* one\n* two\nafter\n"
        );
    }

    #[test]
    fn test_pre_keeps_whitespace() {
        assert_eq!(
            strip("<p>x</p><pre>  a\n    b</pre><p>y</p>"),
            "x\n\n  a\n    b\n\ny\n"
        );
    }

    #[test]
    fn test_unclosed_and_mismatched_tags_are_tolerated() {
        assert_eq!(strip("<div><p>open<div>inner</span></div>"), "open\ninner\n");
    }

    #[test]
    fn test_start_marker_drops_preamble() {
        let html = "<p>Navigation junk</p><h1>Title</h1><p>Body text</p>";
        assert_eq!(
            strip_html(html, Some("Title")).unwrap(),
            "Title\n\nBody text\n"
        );
    }

    #[test]
    fn test_missing_start_marker_keeps_everything() {
        assert_eq!(
            strip_html("<p>Only</p>", Some("absent")).unwrap(),
            "Only\n"
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(strip(""), "");
        assert_eq!(strip("<html><body></body></html>"), "");
    }

    #[test]
    fn test_quoted_editorial_bracket_survives() {
        assert_eq!(
            strip("<blockquote>&ldquo;the [new] plan&rdquo;</blockquote>"),
            "\u{201c}the [new] plan\u{201d}\n"
        );
    }
}
