//! CLI error types.

use std::path::PathBuf;

use ptref_config::ConfigError;
use ptref_core::ConvertError;
use ptref_html::HtmlError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Input file exists but cannot be read: {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Input is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Input file is too large: {} ({size} bytes, limit is {limit})", path.display())]
    InputTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{0} conversion is not supported")]
    UnsupportedFormat(&'static str),

    #[error(
        "Unsupported file type: {} (only .txt, .htm/.html and .md files are recognised)",
        .0.display()
    )]
    UnknownExtension(PathBuf),

    #[error("Cannot write output file {}: {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output file would overwrite the input: {}", .0.display())]
    OutputIsInput(PathBuf),

    #[error("{0}")]
    Html(#[from] HtmlError),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),
}
