//! Cursor and viewport: where we are and what is visible.
//!
//! The cursor lives in document coordinates: `line` indexes into the
//! document and `col` is a byte offset within that line. One row past
//! the last line is a legal cursor position (column 0 only), matching
//! the usual feel of paging to the end of a file. The viewport tracks
//! the top-left document coordinate on screen and snaps its offsets so
//! the cursor stays visible.
//!
//! Horizontal motion never wraps across line boundaries. That is a
//! deliberate simplification, not an oversight: a viewer has no
//! insertion point to carry over a line break, and the clamp rules
//! stay local to one line.

use vu_term::terminal::Size;

use crate::document::Document;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A document coordinate: (line, col), both 0-indexed. `col` counts
/// bytes from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin: line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Cursor with one-step motions that stay inside the document.
///
/// Every motion ends by clamping the column to the destination line's
/// length (0 past the last line), so the invariants hold after any
/// sequence of moves:
///
/// - `line <= document.line_count()`
/// - `col <= line length` when the line exists, else `col == 0`
///
/// The clamp mutates the stored column; there is no remembered
/// "desired" column that vertical motion tries to return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pos: Position,
}

impl Cursor {
    /// A cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: Position::ZERO,
        }
    }

    /// A cursor at a specific position. The position is trusted;
    /// useful for tests and restored sessions.
    #[must_use]
    pub const fn at(pos: Position) -> Self {
        Self { pos }
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.pos
    }

    /// Current line (0-indexed).
    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos.line
    }

    /// Current column (0-indexed byte offset).
    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.pos.col
    }

    /// Move up one line. Stops at the first line.
    pub fn move_up(&mut self, doc: &Document) {
        self.pos.line = self.pos.line.saturating_sub(1);
        self.clamp_col(doc);
    }

    /// Move down one line. Stops one row past the last line.
    pub fn move_down(&mut self, doc: &Document) {
        if self.pos.line < doc.line_count() {
            self.pos.line += 1;
        }
        self.clamp_col(doc);
    }

    /// Move left one byte. Stops at column 0; never wraps to the
    /// previous line.
    pub fn move_left(&mut self, doc: &Document) {
        self.pos.col = self.pos.col.saturating_sub(1);
        self.clamp_col(doc);
    }

    /// Move right one byte. Stops at the end of the line; never wraps
    /// to the next line.
    pub fn move_right(&mut self, doc: &Document) {
        if let Some(line) = doc.line(self.pos.line) {
            if self.pos.col < line.len() {
                self.pos.col += 1;
            }
        }
        self.clamp_col(doc);
    }

    /// Clamp the column to the current line's length, or 0 when the
    /// cursor sits past the last line.
    fn clamp_col(&mut self, doc: &Document) {
        let limit = doc.line(self.pos.line).map_or(0, crate::document::Line::len);
        if self.pos.col > limit {
            self.pos.col = limit;
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// The visible window onto the document.
///
/// `top_line`/`left_col` are the document coordinates of the top-left
/// screen cell; `rows`/`cols` are the terminal extents. The scroll
/// containment invariant after
/// [`ensure_cursor_visible`](Self::ensure_cursor_visible):
///
/// ```text
/// top_line <= cursor.line <= top_line + rows - 1
/// left_col <= cursor.col  <= left_col + cols - 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    top_line: usize,
    left_col: usize,
    rows: u16,
    cols: u16,
}

impl Viewport {
    /// A viewport at the document origin with the given screen size.
    #[must_use]
    pub const fn new(size: Size) -> Self {
        Self {
            top_line: 0,
            left_col: 0,
            rows: size.rows,
            cols: size.cols,
        }
    }

    /// First visible document line (0-indexed).
    #[inline]
    #[must_use]
    pub const fn top_line(&self) -> usize {
        self.top_line
    }

    /// First visible byte column (0-indexed).
    #[inline]
    #[must_use]
    pub const fn left_col(&self) -> usize {
        self.left_col
    }

    /// Screen height in rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    /// Screen width in columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    /// Adopt a new terminal size.
    ///
    /// Offsets are left alone; the next
    /// [`ensure_cursor_visible`](Self::ensure_cursor_visible) re-snaps
    /// them if the cursor fell outside the shrunken window.
    pub const fn resize(&mut self, size: Size) {
        self.rows = size.rows;
        self.cols = size.cols;
    }

    /// Snap the scroll offsets so the cursor is on screen.
    ///
    /// Four independent rules, one per screen edge: a cursor above or
    /// left of the window pulls the offset back to itself; a cursor
    /// below or right of the last visible cell pushes the offset to
    /// `cursor - extent + 1`. Pure in (cursor, offsets, extents), and
    /// idempotent: a second application with an unmoved cursor changes
    /// nothing.
    pub fn ensure_cursor_visible(&mut self, cursor: &Cursor) {
        let rows = self.rows as usize;
        let cols = self.cols as usize;
        if rows == 0 || cols == 0 {
            return;
        }

        let line = cursor.line();
        if line < self.top_line {
            self.top_line = line;
        }
        if line >= self.top_line + rows {
            self.top_line = line - rows + 1;
        }

        let col = cursor.col();
        if col < self.left_col {
            self.left_col = col;
        }
        if col >= self.left_col + cols {
            self.left_col = col - cols + 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
