//! Error types for document conversion.

/// Error while streaming a document through the converter.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// Reading the input failed, including invalid UTF-8.
    #[error("failed to read input: {0}")]
    Read(#[source] std::io::Error),

    /// Writing the converted text failed.
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
}
