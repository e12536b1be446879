//! Streaming document conversion.
//!
//! [`Converter`] owns all per-document state: the reference table, the
//! signature tracker and the collected diagnostics. A fresh converter is
//! created for every document and consumed by [`Converter::finish`].

use std::io::{BufRead, Write};

use crate::appendix::{AppendixEmitter, AppendixPlacement, is_signature_line};
use crate::brackets::rewrite_line;
use crate::error::ConvertError;
use crate::references::{DuplicateMode, ReferenceTable};

/// A citation that repeated text cited earlier in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReference {
    /// Number printed for the repeated citation.
    pub number: usize,
    /// The repeated reference text.
    pub key: String,
    /// 1-based input line of the repeat.
    pub line: usize,
}

/// A citation numbered after the appendix was already written.
///
/// Its marker appears in the signature block but no appendix line lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlistedReference {
    pub number: usize,
    pub key: String,
    /// 1-based input line.
    pub line: usize,
}

/// Summary of one conversion, for callers that report to users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// Number of references listed in the appendix.
    pub references: usize,
    /// Repeat citations, in input order.
    pub duplicates: Vec<DuplicateReference>,
    /// Citations first numbered after the signature, missing from the appendix.
    pub unlisted: Vec<UnlistedReference>,
    /// Whether a signature delimiter line was found.
    pub signature_found: bool,
    /// Where the appendix was written, `None` when there were no references.
    pub appendix: Option<AppendixPlacement>,
    /// Number of input lines processed.
    pub lines: usize,
}

impl ConversionReport {
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.references > 0
    }
}

/// Line-by-line footnote converter writing into `W`.
pub struct Converter<W: Write> {
    out: W,
    table: ReferenceTable,
    emitter: AppendixEmitter,
    report: ConversionReport,
}

impl<W: Write> Converter<W> {
    /// Create a converter for one document.
    pub fn new(out: W, mode: DuplicateMode) -> Self {
        Self {
            out,
            table: ReferenceTable::new(mode),
            emitter: AppendixEmitter::new(),
            report: ConversionReport::default(),
        }
    }

    /// Process one input line, including its terminator if it has one.
    ///
    /// Every line except the first signature delimiter is rewritten. Below
    /// the signature, known citations keep their numbers and new ones are
    /// recorded as [`UnlistedReference`]s.
    pub fn push_line(&mut self, line: &str) -> Result<(), ConvertError> {
        self.report.lines += 1;

        if !self.emitter.signature_seen() && is_signature_line(line) {
            self.report.signature_found = true;
            self.report.references = self.table.assigned();
            self.report.appendix = self
                .emitter
                .at_signature(&mut self.out, &mut self.table)
                .map_err(ConvertError::Write)?;
            return self.write_text(line);
        }

        let rewrite = rewrite_line(line, &mut self.table);
        let line_number = self.report.lines;
        self.report
            .duplicates
            .extend(rewrite.repeats.iter().map(|repeat| DuplicateReference {
                number: repeat.number,
                key: repeat.key.to_owned(),
                line: line_number,
            }));

        if self.emitter.signature_seen() {
            for reference in self.table.drain_in_insertion_order() {
                tracing::warn!(
                    number = reference.number,
                    reference = %reference.text,
                    line = line_number,
                    "reference after signature is not listed in the appendix"
                );
                self.report.unlisted.push(UnlistedReference {
                    number: reference.number,
                    key: reference.text,
                    line: line_number,
                });
            }
        }

        self.write_text(&rewrite.text)
    }

    fn write_text(&mut self, text: &str) -> Result<(), ConvertError> {
        self.out
            .write_all(text.as_bytes())
            .map_err(ConvertError::Write)
    }

    /// Flush the appendix if still pending and return the sink and report.
    pub fn finish(mut self) -> Result<(W, ConversionReport), ConvertError> {
        if !self.emitter.signature_seen() {
            self.report.references = self.table.assigned();
            self.report.appendix = self
                .emitter
                .at_end(&mut self.out, &mut self.table)
                .map_err(ConvertError::Write)?;
        }
        self.out.flush().map_err(ConvertError::Write)?;

        if self.report.has_references() {
            tracing::debug!(
                references = self.report.references,
                duplicates = self.report.duplicates.len(),
                unlisted = self.report.unlisted.len(),
                "conversion finished"
            );
        } else {
            tracing::debug!("conversion finished without references");
        }

        Ok((self.out, self.report))
    }
}

/// Convert everything readable from `input` into `output`.
///
/// Lines keep their terminators. Invalid UTF-8 in the input is reported as
/// [`ConvertError::Read`] with an I/O error of kind `InvalidData`.
pub fn convert<R: BufRead, W: Write>(
    mut input: R,
    output: W,
    mode: DuplicateMode,
) -> Result<ConversionReport, ConvertError> {
    let mut converter = Converter::new(output, mode);
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line).map_err(ConvertError::Read)? == 0 {
            break;
        }
        converter.push_line(&line)?;
    }

    let (_, report) = converter.finish()?;
    Ok(report)
}

/// Convert an in-memory document.
pub fn convert_str(
    text: &str,
    mode: DuplicateMode,
) -> Result<(String, ConversionReport), ConvertError> {
    let mut converter = Converter::new(Vec::with_capacity(text.len()), mode);
    for line in text.split_inclusive('\n') {
        converter.push_line(line)?;
    }
    let (bytes, report) = converter.finish()?;
    let output = String::from_utf8(bytes).map_err(|e| {
        ConvertError::Write(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    Ok((output, report))
}
