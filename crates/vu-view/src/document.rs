//! Line buffer: the in-memory document.
//!
//! A `Document` is an ordered list of [`Line`]s in file order. Lines are
//! raw bytes with trailing line endings stripped; the viewer never
//! reinterprets or mutates them, so a file that is not valid UTF-8
//! displays exactly as its bytes. There are no edit operations: this is
//! a viewer, and the read-only model keeps every downstream invariant
//! (cursor clamps, scroll bounds) a pure function of what was loaded.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One line of the document: owned bytes, no trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
}

impl Line {
    /// Build a line from raw bytes, stripping any trailing `\n`/`\r`.
    #[must_use]
    pub fn from_bytes(mut bytes: Vec<u8>) -> Self {
        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        Self { bytes }
    }

    /// Length in bytes. Cursor columns on this line range over
    /// `0..=len()`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a blank line.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The line content.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The ordered sequence of lines loaded from a file.
///
/// Insertion order is file order and never changes after load. An
/// unloaded session has zero lines; that is the state the welcome
/// banner keys off.
#[derive(Debug, Default)]
pub struct Document {
    lines: Vec<Line>,
    path: Option<PathBuf>,
}

impl Document {
    /// Create an empty document with no backing file.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            path: None,
        }
    }

    /// Load a document from a file, one [`Line`] per input line.
    ///
    /// Reads byte-wise (no UTF-8 requirement), splitting on `\n` and
    /// stripping trailing `\n`/`\r` from each line. A final line
    /// without a newline is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read. The
    /// caller treats this as fatal and terminates after restoring the
    /// terminal.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();

        loop {
            let mut raw = Vec::new();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            lines.push(Line::from_bytes(raw));
        }

        Ok(Self {
            lines,
            path: Some(path.to_path_buf()),
        })
    }

    /// Build a document from a string. Scratch constructor for tests
    /// and future stdin support; no backing path.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|line| Line::from_bytes(line.as_bytes().to_vec()))
                .collect(),
            path: None,
        }
    }

    /// Total number of lines.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get a line by 0-indexed row. `None` if `row >= line_count()`.
    #[inline]
    #[must_use]
    pub fn line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    /// True when no lines are loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The backing file path, if the document was loaded from one.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
