//! Reference table: citation text to footnote number.
//!
//! Numbers are assigned in first-seen order starting at 1 and stay
//! contiguous. Drained entries stay known as keys, so a citation repeated
//! after the appendix was written still resolves to its number.

use std::collections::HashMap;

/// How a citation that was already seen in the document is numbered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DuplicateMode {
    /// Repeat citations collapse onto the number of their first occurrence.
    #[default]
    Reuse,
    /// Every citation gets a fresh number and its own appendix line.
    Renumber,
}

/// Result of [`ReferenceTable::lookup_or_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Footnote number to print for this citation.
    pub number: usize,
    /// `false` when the same reference text was already cited earlier.
    pub is_new: bool,
}

/// One appendix entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub number: usize,
    pub text: String,
}

/// Insertion-ordered, deduplicating map from reference text to number.
#[derive(Debug)]
pub struct ReferenceTable {
    mode: DuplicateMode,
    entries: Vec<Reference>,
    /// First number assigned to each key.
    index: HashMap<String, usize>,
    next_number: usize,
}

impl ReferenceTable {
    /// Create an empty table using the given duplicate policy.
    #[must_use]
    pub fn new(mode: DuplicateMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
            index: HashMap::new(),
            next_number: 1,
        }
    }

    /// Resolve `key` to a footnote number, assigning the next one if needed.
    ///
    /// In [`DuplicateMode::Reuse`] a known key returns its existing number.
    /// In [`DuplicateMode::Renumber`] every call assigns a fresh number;
    /// `is_new` still reports whether the key had been seen before.
    pub fn lookup_or_insert(&mut self, key: &str) -> Lookup {
        let seen = self.index.get(key).copied();

        if let (DuplicateMode::Reuse, Some(number)) = (self.mode, seen) {
            tracing::info!(number, reference = key, "duplicate reference reused");
            return Lookup {
                number,
                is_new: false,
            };
        }

        let number = self.next_number;
        self.next_number += 1;
        self.entries.push(Reference {
            number,
            text: key.to_owned(),
        });

        if let Some(first) = seen {
            tracing::info!(
                number,
                first,
                reference = key,
                "duplicate reference renumbered"
            );
        } else {
            self.index.insert(key.to_owned(), number);
        }

        Lookup {
            number,
            is_new: seen.is_none(),
        }
    }

    /// Number of appendix entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of footnote numbers handed out, including drained ones.
    #[must_use]
    pub fn assigned(&self) -> usize {
        self.next_number - 1
    }

    /// Remove and return all pending entries in assignment order.
    ///
    /// Neither the counter nor the key index is reset: numbers stay unique
    /// for the rest of the document and known keys keep their number.
    pub fn drain_in_insertion_order(&mut self) -> impl Iterator<Item = Reference> + '_ {
        self.entries.drain(..)
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::new(DuplicateMode::default())
    }
}
