//! Error types for HTML stripping.

/// Error while converting HTML to plain text.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HtmlError {
    /// Markup could not be tokenized.
    #[error("HTML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Text could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
}
