//! Footnote engine for plain-text documents.
//!
//! Converts in-text citations into numbered footnote markers and appends the
//! collected references as an appendix:
//!
//! - round brackets holding an absolute URL: `(http://example.com)`
//! - square brackets holding anything except `sic`/`sic!`: `[a note]`
//!
//! Square brackets inside a quotation (`"he [sic] said"`, `“…[x]…”`) are
//! editorial and left alone, as are round brackets with ordinary text.
//!
//! The appendix is written before the first `--` signature line, or at the
//! end of the document when there is none.
//!
//! # Example
//!
//! ```
//! use ptref_core::{DuplicateMode, convert_str};
//!
//! let (text, report) = convert_str(
//!     "See (http://example.org/a) and [a note].\n",
//!     DuplicateMode::Reuse,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     text,
//!     "See[1] and[2].\n\n\n___\n[1] http://example.org/a\n[2] a note\n"
//! );
//! assert_eq!(report.references, 2);
//! ```

mod appendix;
mod brackets;
mod converter;
mod error;
mod references;
mod uri;

pub use appendix::{
    APPENDIX_SEPARATOR, AppendixEmitter, AppendixPlacement, SIGNATURE_DELIMITER,
    is_signature_line, write_appendix,
};
pub use brackets::{
    BracketSpan, EXEMPT_MARKERS, Repeat, Rewrite, SpanKind, find_next_span, footnote_marker,
    rewrite_line,
};
pub use converter::{
    ConversionReport, Converter, DuplicateReference, UnlistedReference, convert, convert_str,
};
pub use error::ConvertError;
pub use references::{DuplicateMode, Lookup, Reference, ReferenceTable};
pub use uri::is_url;
