use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// The fundamental edit primitive: byte-span replacement with verification.
///
/// Every rule outcome compiles down to this single primitive. Offsets are
/// always relative to the *original* document text the edit was computed
/// against; [`rewrite`] is the only place edits are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until passed to rewrite()"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("before-text verification failed at [{byte_start}, {byte_end}): found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {text_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        text_len: usize,
    },

    #[error("byte offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },
}

impl Edit {
    /// Create a new edit with automatic verification generation.
    pub fn new(
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
        expected_before: impl AsRef<str>,
    ) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(expected_before.as_ref()),
        }
    }

    /// Create a pure insertion at `offset`.
    pub fn insertion(offset: usize, new_text: impl Into<String>) -> Self {
        Self::new(offset, offset, new_text, "")
    }

    pub fn is_insertion(&self) -> bool {
        self.byte_start == self.byte_end
    }

    /// Shift both offsets by `delta`, used to lift region-local edits into
    /// document coordinates.
    pub fn offset_by(mut self, delta: usize) -> Self {
        self.byte_start += delta;
        self.byte_end += delta;
        self
    }

    /// Validate the edit against the text it is anchored to.
    ///
    /// Returns the current text at [byte_start, byte_end) if validation succeeds.
    fn validate<'a>(&self, content: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                text_len: content.len(),
            });
        }

        for offset in [self.byte_start, self.byte_end] {
            if !content.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }

        let current = &content[self.byte_start..self.byte_end];

        // Already applied: current text equals the replacement
        if current == self.new_text {
            return Ok(current);
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(current)
    }
}

/// An edit dropped because it overlaps one accepted earlier in offset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapConflict {
    pub rejected: Edit,
    /// Span of the accepted edit it collided with
    pub accepted_start: usize,
    pub accepted_end: usize,
}

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Rewrite holds the mutated text and any rejected edits"]
pub struct Rewrite {
    pub text: String,
    /// Edits spliced into the output
    pub applied: usize,
    /// Edits whose replacement already matched the original text
    pub already_applied: usize,
    pub conflicts: Vec<OverlapConflict>,
}

/// Apply `edits` to `original` in a single left-to-right pass.
///
/// Edits are sorted by `(byte_start, byte_end)` and the output is assembled
/// into a fresh buffer, copying the original text between edits. Only a
/// read cursor is tracked, so no offset ever needs re-deriving. An edit
/// starting before the cursor overlaps one already accepted and is returned
/// as an [`OverlapConflict`] instead of being applied.
///
/// Every edit is validated up front; a bad range or before-text mismatch
/// fails the whole document so it is never partially rewritten.
pub fn rewrite(original: &str, mut edits: Vec<Edit>) -> Result<Rewrite, EditError> {
    for edit in &edits {
        edit.validate(original)?;
    }

    // Stable sort: insertions at the same offset keep their proposal order
    edits.sort_by(|a, b| {
        a.byte_start
            .cmp(&b.byte_start)
            .then(a.byte_end.cmp(&b.byte_end))
    });

    let growth: usize = edits.iter().map(|e| e.new_text.len()).sum();
    let mut text = String::with_capacity(original.len() + growth);
    let mut cursor = 0;
    let mut last_accepted = (0, 0);
    let mut applied = 0;
    let mut already_applied = 0;
    let mut conflicts = Vec::new();

    for edit in edits {
        if edit.byte_start < cursor {
            conflicts.push(OverlapConflict {
                rejected: edit,
                accepted_start: last_accepted.0,
                accepted_end: last_accepted.1,
            });
            continue;
        }

        text.push_str(&original[cursor..edit.byte_start]);
        text.push_str(&edit.new_text);
        cursor = edit.byte_end;
        last_accepted = (edit.byte_start, edit.byte_end);

        if original[edit.byte_start..edit.byte_end] == edit.new_text {
            already_applied += 1;
        } else {
            applied += 1;
        }
    }

    text.push_str(&original[cursor..]);

    Ok(Rewrite {
        text,
        applied,
        already_applied,
        conflicts,
    })
}
