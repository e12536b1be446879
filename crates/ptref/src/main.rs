//! ptref CLI - turn in-text citations into numbered footnotes.
//!
//! Reads a `.txt` or `.html` document, replaces URL citations in round
//! brackets and notes in square brackets with `[n]` markers, and writes the
//! result with a reference appendix to `<name>_plaintext.<ext>`.

mod commands;
mod document;
mod error;
mod output;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::ConvertArgs;
use output::Output;

/// ptref - convert in-text references to sequentially numbered footnotes.
#[derive(Parser)]
#[command(name = "ptref", version, about)]
struct Cli {
    #[command(flatten)]
    convert: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.convert.verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.convert.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// `--verbose` enables INFO level, otherwise use `RUST_LOG` or default to WARN.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info");
    }
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(rust_log.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_shows_warnings() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(false, Some("")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_rust_log_raises_level() {
        assert_eq!(
            log_filter(false, Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_verbose_enables_info() {
        assert_eq!(
            log_filter(true, Some("error")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
