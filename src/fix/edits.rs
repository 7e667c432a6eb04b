//! Byte-range text edits over the original source.

use thiserror::Error;

/// Replace `start..end` with `text`. An insertion has `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextEdit {
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("edits overlap at bytes {first_end} and {second_start}")]
    Overlap { first_end: usize, second_start: usize },
    #[error("edit {start}..{end} is outside the {len} byte source")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("edit at byte {0} splits a UTF-8 character")]
    CharBoundary(usize),
}

/// Apply non-overlapping edits. Text outside the edited ranges is copied
/// byte for byte.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> Result<String, EditError> {
    // Stable sort keeps insertions at the same offset in the order given.
    edits.sort_by_key(|e| (e.start, e.end));

    for edit in &edits {
        if edit.start > edit.end || edit.end > source.len() {
            return Err(EditError::OutOfBounds {
                start: edit.start,
                end: edit.end,
                len: source.len(),
            });
        }
        for offset in [edit.start, edit.end] {
            if !source.is_char_boundary(offset) {
                return Err(EditError::CharBoundary(offset));
            }
        }
    }
    for pair in edits.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if second.start < first.end {
            return Err(EditError::Overlap {
                first_end: first.end,
                second_start: second.start,
            });
        }
    }

    let mut out = String::with_capacity(source.len() + edits.iter().map(|e| e.text.len()).sum::<usize>());
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}
