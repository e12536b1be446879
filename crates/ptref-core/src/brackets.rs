//! Bracket classification and line rewriting.
//!
//! A line is scanned left to right. At each position the span shapes are
//! tried in a fixed precedence order and the first one that matches wins:
//!
//! 1. round brackets, optionally preceded by spaces: `  (content)`
//! 2. square brackets inside straight double quotes: `"text [x] text"`
//! 3. square brackets inside curly double quotes: `“text [x] text”`
//! 4. square brackets, optionally preceded by spaces: `  [content]`
//!
//! Round spans whose content is a URL and square spans that are neither
//! quoted nor exempt become footnote markers `[n]`. Everything else is copied
//! through untouched. Scanning resumes after the end of each span, so
//! substituted text is never looked at again.

use std::borrow::Cow;
use std::ops::Range;

use crate::references::ReferenceTable;
use crate::uri::is_url;

/// Square-bracket contents that are editorial markers, never citations.
pub const EXEMPT_MARKERS: &[&str] = &["sic", "sic!"];

const LEFT_CURLY_QUOTE: char = '\u{201c}';
const RIGHT_CURLY_QUOTE: char = '\u{201d}';

/// Classification of a bracketed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Round brackets holding an absolute URL.
    UrlRound,
    /// Round brackets holding anything else.
    PlainRound,
    /// Square brackets inside straight double quotes.
    QuotedSquareStraight,
    /// Square brackets inside curly double quotes.
    QuotedSquareCurly,
    /// Square brackets holding a citation or note.
    PlainSquare,
    /// Square brackets holding an exempt marker such as `sic`.
    ExemptSquare,
}

impl SpanKind {
    /// Whether spans of this kind are replaced by a footnote marker.
    #[must_use]
    pub fn is_citation(self) -> bool {
        matches!(self, Self::UrlRound | Self::PlainSquare)
    }
}

/// A classified bracket span within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketSpan<'a> {
    pub kind: SpanKind,
    /// Byte range of the whole match, including leading spaces and quotes.
    pub range: Range<usize>,
    /// Text between the brackets.
    pub interior: &'a str,
}

/// A citation that resolved to a number already handed out earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeat<'a> {
    pub number: usize,
    pub key: &'a str,
}

/// Output of [`rewrite_line`].
#[derive(Debug)]
pub struct Rewrite<'a> {
    /// The rewritten line; borrowed when nothing changed.
    pub text: Cow<'a, str>,
    /// Citations on this line whose text had been cited before.
    pub repeats: Vec<Repeat<'a>>,
}

/// Find the first bracket span starting at or after byte offset `from`.
///
/// `from` must lie on a char boundary.
#[must_use]
pub fn find_next_span(line: &str, from: usize) -> Option<BracketSpan<'_>> {
    let rest = line.get(from..)?;
    rest.char_indices()
        .find_map(|(offset, _)| span_at(line, from + offset))
}

/// Try every span shape at `pos` in precedence order.
fn span_at(line: &str, pos: usize) -> Option<BracketSpan<'_>> {
    if let Some((end, interior)) = match_delimited(line, pos, '(', ')') {
        let kind = if is_url(interior) {
            SpanKind::UrlRound
        } else {
            SpanKind::PlainRound
        };
        return Some(BracketSpan {
            kind,
            range: pos..end,
            interior,
        });
    }

    if let Some((end, interior)) = match_quoted(line, pos, &STRAIGHT_QUOTES) {
        return Some(BracketSpan {
            kind: SpanKind::QuotedSquareStraight,
            range: pos..end,
            interior,
        });
    }

    if let Some((end, interior)) = match_quoted(line, pos, &CURLY_QUOTES) {
        return Some(BracketSpan {
            kind: SpanKind::QuotedSquareCurly,
            range: pos..end,
            interior,
        });
    }

    if let Some((end, interior)) = match_delimited(line, pos, '[', ']') {
        let kind = if EXEMPT_MARKERS.contains(&interior) {
            SpanKind::ExemptSquare
        } else {
            SpanKind::PlainSquare
        };
        return Some(BracketSpan {
            kind,
            range: pos..end,
            interior,
        });
    }

    None
}

/// Match `[ ]*<open>[^<open><close>]*<close>` at `pos`.
///
/// Returns the end offset of the match and the interior text.
fn match_delimited(line: &str, pos: usize, open: char, close: char) -> Option<(usize, &str)> {
    let after_spaces = pos + count_leading_spaces(&line[pos..]);
    let rest = line[after_spaces..].strip_prefix(open)?;
    let interior_start = after_spaces + open.len_utf8();

    let stop = rest.find([open, close])?;
    if !rest[stop..].starts_with(close) {
        return None;
    }

    let interior_end = interior_start + stop;
    Some((
        interior_end + close.len_utf8(),
        &line[interior_start..interior_end],
    ))
}

/// Characters that delimit a quotation around an editorial bracket.
struct QuoteStyle {
    open: char,
    close: char,
    /// Characters that may not appear between the opening quote and `[`.
    prefix_stops: &'static [char],
    /// Characters that may not appear between `[` and `]`.
    interior_stops: &'static [char],
}

const STRAIGHT_QUOTES: QuoteStyle = QuoteStyle {
    open: '"',
    close: '"',
    prefix_stops: &['"', '['],
    interior_stops: &['"', ']'],
};

const CURLY_QUOTES: QuoteStyle = QuoteStyle {
    open: LEFT_CURLY_QUOTE,
    close: RIGHT_CURLY_QUOTE,
    prefix_stops: &[LEFT_CURLY_QUOTE, RIGHT_CURLY_QUOTE, '['],
    interior_stops: &[RIGHT_CURLY_QUOTE, ']'],
};

/// Match a quotation holding one square-bracketed insertion at `pos`:
/// open quote, text, `[`, non-empty interior, `]`, text, close quote.
fn match_quoted<'a>(line: &'a str, pos: usize, style: &QuoteStyle) -> Option<(usize, &'a str)> {
    let after_open = line[pos..].strip_prefix(style.open)?;
    let mut cursor = pos + style.open.len_utf8();

    let prefix_len = after_open.find(style.prefix_stops)?;
    if !after_open[prefix_len..].starts_with('[') {
        return None;
    }
    cursor += prefix_len + 1;

    let interior_len = line[cursor..].find(style.interior_stops)?;
    if interior_len == 0 || !line[cursor + interior_len..].starts_with(']') {
        return None;
    }
    let interior = &line[cursor..cursor + interior_len];
    cursor += interior_len + 1;

    let suffix_len = line[cursor..].find(style.close)?;
    Some((cursor + suffix_len + style.close.len_utf8(), interior))
}

fn count_leading_spaces(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b' ').count()
}

/// Rewrite one line, replacing citations with footnote markers.
///
/// New citations are added to `table`. Lines without any citation are
/// returned borrowed and unchanged.
pub fn rewrite_line<'a>(line: &'a str, table: &mut ReferenceTable) -> Rewrite<'a> {
    let mut out = String::new();
    let mut copied = 0;
    let mut cursor = 0;
    let mut repeats = Vec::new();

    while let Some(span) = find_next_span(line, cursor) {
        cursor = span.range.end;
        if !span.kind.is_citation() {
            continue;
        }

        let lookup = table.lookup_or_insert(span.interior);
        if !lookup.is_new {
            repeats.push(Repeat {
                number: lookup.number,
                key: span.interior,
            });
        }

        out.push_str(&line[copied..span.range.start]);
        out.push_str(&footnote_marker(lookup.number));
        copied = span.range.end;
    }

    let text = if copied == 0 {
        Cow::Borrowed(line)
    } else {
        out.push_str(&line[copied..]);
        Cow::Owned(out)
    };

    Rewrite { text, repeats }
}

/// Format a footnote marker: `[n]`.
#[must_use]
pub fn footnote_marker(number: usize) -> String {
    format!("[{number}]")
}
