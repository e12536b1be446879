//! HTML to plain text conversion.
//!
//! [`strip_html`] turns an HTML document into plain-text lines suitable for
//! the footnote engine in `ptref-core`. Links with absolute URLs are kept as
//! `text (url)` so that the engine turns them into footnotes.
//!
//! # Example
//!
//! ```
//! use ptref_html::strip_html;
//!
//! let html = r#"<p>Read <a href="https://example.org/post">the post</a>.</p>"#;
//! let text = strip_html(html, None).unwrap();
//! assert_eq!(text, "Read the post (https://example.org/post).\n");
//! ```

mod entities;
mod error;
mod strip;

pub use entities::{convert_html_entities, decode_entity};
pub use error::HtmlError;
pub use strip::strip_html;
