//! Appendix placement relative to an email signature.
//!
//! The appendix goes right before the first `--` signature line, or at the
//! end of the document when no signature appears. Nothing is written when
//! the document has no references.

use std::io::{self, Write};

use crate::references::{Reference, ReferenceTable};

/// Signature delimiter line content, without terminator.
pub const SIGNATURE_DELIMITER: &str = "--";

/// First line of the appendix block. Underscores, because `--` is taken.
pub const APPENDIX_SEPARATOR: &str = "___";

/// Where the appendix ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendixPlacement {
    BeforeSignature,
    EndOfStream,
}

/// Check whether `line` (with terminator) is the signature delimiter.
///
/// Only `--\n` and `--\r\n` qualify: a final `--` without terminator or a
/// `-- ` with trailing space does not.
#[must_use]
pub fn is_signature_line(line: &str) -> bool {
    line.strip_prefix(SIGNATURE_DELIMITER)
        .is_some_and(|rest| rest == "\n" || rest == "\r\n")
}

/// Write the appendix block for `references`.
pub fn write_appendix<W, I>(out: &mut W, references: I) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = Reference>,
{
    writeln!(out, "{APPENDIX_SEPARATOR}")?;
    for reference in references {
        writeln!(out, "[{}] {}", reference.number, reference.text)?;
    }
    Ok(())
}

/// Two-state tracker: before or after the signature delimiter.
#[derive(Debug, Default)]
pub struct AppendixEmitter {
    signature_seen: bool,
}

impl AppendixEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the signature delimiter has been passed.
    #[must_use]
    pub fn signature_seen(&self) -> bool {
        self.signature_seen
    }

    /// Handle the first signature line; the caller writes the line itself.
    ///
    /// Emits a blank line and the appendix when `table` holds references.
    pub fn at_signature<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        table: &mut ReferenceTable,
    ) -> io::Result<Option<AppendixPlacement>> {
        self.signature_seen = true;
        if table.is_empty() {
            return Ok(None);
        }

        out.write_all(b"\n")?;
        write_appendix(out, table.drain_in_insertion_order())?;
        tracing::debug!("appendix written before signature");
        Ok(Some(AppendixPlacement::BeforeSignature))
    }

    /// Handle end of input.
    ///
    /// Appends two line breaks and the appendix when no signature was seen
    /// and `table` holds references.
    pub fn at_end<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        table: &mut ReferenceTable,
    ) -> io::Result<Option<AppendixPlacement>> {
        if self.signature_seen || table.is_empty() {
            return Ok(None);
        }

        out.write_all(b"\n\n")?;
        write_appendix(out, table.drain_in_insertion_order())?;
        tracing::debug!("appendix written at end of document");
        Ok(Some(AppendixPlacement::EndOfStream))
    }
}
