//! Convert command implementation.

use std::fs::Metadata;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use ptref_config::{CliSettings, Config};
use ptref_core::{AppendixPlacement, ConversionReport, ConvertError, DuplicateMode, convert};
use ptref_html::strip_html;
use tempfile::NamedTempFile;

use crate::document::{self, InputKind};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for converting one document.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Document to convert (.txt, .htm or .html)
    input: PathBuf,

    /// Path to configuration file (default: auto-discover ptref.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the result to this exact path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the generated file (default: next to the input)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Suffix appended to the input file stem
    #[arg(long)]
    suffix: Option<String>,

    /// Drop HTML text before the first occurrence of this marker
    #[arg(long)]
    start_marker: Option<String>,

    /// Give repeated citations a new number instead of reusing the first one
    #[arg(long)]
    renumber_duplicates: bool,

    /// Show detailed progress logs
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading fails, the input cannot be
    /// used, or the output cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            duplicates: self
                .renumber_duplicates
                .then_some(DuplicateMode::Renumber),
            output_dir: self.output_dir.clone(),
            suffix: self.suffix.clone(),
            start_marker: self.start_marker.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let metadata = document::check_input(&self.input, config.input.max_size)?;
        let kind = InputKind::from_path(&self.input)?;
        if kind == InputKind::Markdown {
            return Err(CliError::UnsupportedFormat(kind.label()));
        }

        let target = self.output.clone().unwrap_or_else(|| {
            document::output_path(
                &self.input,
                kind,
                &config.output_resolved.suffix,
                config.output_resolved.directory.as_deref(),
            )
        });
        document::ensure_distinct(&self.input, &target)?;

        tracing::info!(
            input = %self.input.display(),
            output = %target.display(),
            kind = kind.label(),
            "Converting"
        );
        let report = write_converted(&self.input, kind, &metadata, &target, &config)?;

        output.success(&format!("Wrote {}", target.display()));
        report_summary(&output, &report);

        Ok(())
    }
}

/// Convert `input` into a temporary file next to `target`, then move it into place.
fn write_converted(
    input: &Path,
    kind: InputKind,
    metadata: &Metadata,
    target: &Path,
    config: &Config,
) -> Result<ConversionReport, CliError> {
    let unwritable = |source| CliError::OutputUnwritable {
        path: target.to_path_buf(),
        source,
    };

    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let temp = NamedTempFile::new_in(parent).map_err(unwritable)?;
    std::fs::set_permissions(temp.path(), metadata.permissions()).map_err(unwritable)?;

    let mode = config.references.duplicates;
    let file = document::open_input(input)?;
    let mut writer = BufWriter::new(temp);

    let report = match kind {
        InputKind::Text => convert(BufReader::new(file), &mut writer, mode)
            .map_err(|e| conversion_error(e, target))?,
        InputKind::Html => {
            let mut raw = String::new();
            BufReader::new(file)
                .read_to_string(&mut raw)
                .map_err(|e| document::input_error(input, e))?;
            let text = strip_html(&raw, config.html.start_marker.as_deref())?;
            convert(text.as_bytes(), &mut writer, mode)
                .map_err(|e| conversion_error(e, target))?
        }
        InputKind::Markdown => return Err(CliError::UnsupportedFormat(kind.label())),
    };

    writer.flush().map_err(unwritable)?;
    let temp = writer
        .into_inner()
        .map_err(|e| unwritable(e.into_error()))?;
    temp.persist(target).map_err(|e| unwritable(e.error))?;

    Ok(report)
}

/// Failures writing the temporary file are output failures, not conversion ones.
fn conversion_error(err: ConvertError, target: &Path) -> CliError {
    match err {
        ConvertError::Write(source) => CliError::OutputUnwritable {
            path: target.to_path_buf(),
            source,
        },
        other => CliError::Convert(other),
    }
}

fn report_summary(output: &Output, report: &ConversionReport) {
    if !report.unlisted.is_empty() {
        output.warning(&format!(
            "{} citation(s) after the signature are not in the appendix:",
            report.unlisted.len()
        ));
        for unlisted in &report.unlisted {
            output.detail(&format!(
                "line {}: [{}] {}",
                unlisted.line, unlisted.number, unlisted.key
            ));
        }
    }

    if !report.has_references() {
        output.info("No references found");
        return;
    }

    let placement = match report.appendix {
        Some(AppendixPlacement::BeforeSignature) => "before the signature",
        Some(AppendixPlacement::EndOfStream) | None => "at the end",
    };
    output.info(&format!(
        "{} reference(s) collected, appendix {placement}",
        report.references
    ));

    if !report.duplicates.is_empty() {
        output.warning(&format!(
            "{} repeated citation(s):",
            report.duplicates.len()
        ));
        for duplicate in &report.duplicates {
            output.detail(&format!(
                "line {}: [{}] {}",
                duplicate.line, duplicate.number, duplicate.key
            ));
        }
    }
}
