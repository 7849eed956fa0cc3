//! Source location tokens.
//!
//! A [`Token`] names a span of characters inside one file. Loaders attach
//! one to every node they build and the evaluator hands them back to callers
//! so failures can be highlighted in the exact place they occur.

use std::fmt;
use std::path::PathBuf;

/// A located span inside a source file.
///
/// `row` and `col` are 1-indexed. `length` counts characters from
/// `(row, col)` and never runs past the end of that line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// File path.
    pub file: PathBuf,
    /// Line (1-indexed).
    pub row: usize,
    /// Column (1-indexed).
    pub col: usize,
    /// Length in characters.
    pub length: usize,
}

impl Token {
    /// Create a token with precise positions.
    pub fn new(file: impl Into<PathBuf>, row: usize, col: usize, length: usize) -> Self {
        Self {
            file: file.into(),
            row: row.max(1),
            col: col.max(1),
            length,
        }
    }

    /// Zero-length token at the very start of a file.
    pub fn file_start(file: impl Into<PathBuf>) -> Self {
        Self::new(file, 1, 1, 0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.row, self.col)
    }
}
