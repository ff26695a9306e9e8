//! Frame rendering: document plus viewport in, escape bytes out.
//!
//! One frame is built start to finish in a [`Frame`] and handed back to
//! the caller for a single atomic write. The layout is the classic
//! full-repaint pager frame: hide the cursor, home, paint every screen
//! row (text slice, `~` filler, or the welcome banner), erase to the
//! end of each row instead of clearing the whole screen up front, then
//! park the terminal cursor on the focused cell and show it again.
//!
//! Rows are separated by `\r\n` (raw mode disables output
//! post-processing, so a bare `\n` would not return the carriage); the
//! last row gets no separator, since writing one would scroll the
//! terminal.

use std::io::Write;

use vu_term::ansi;
use vu_term::output::Frame;

use crate::document::Document;
use crate::viewport::{Cursor, Viewport};

/// Version string shown in the welcome banner.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render one frame of the viewer.
///
/// Reconciles the scroll offsets first, so callers never observe a
/// frame with the cursor off screen. Infallible by construction: every
/// write lands in the in-memory frame, and `Vec`-backed writes do not
/// fail. The caller performs the one real write via
/// [`Frame::flush_stdout`].
#[must_use]
pub fn draw_frame(doc: &Document, cursor: &Cursor, viewport: &mut Viewport) -> Frame {
    viewport.ensure_cursor_visible(cursor);

    let mut frame = Frame::new();
    ansi::cursor_hide(&mut frame).ok();
    ansi::cursor_home(&mut frame).ok();

    draw_rows(&mut frame, doc, viewport);

    // Park the terminal cursor on the focused cell, screen-relative.
    // ensure_cursor_visible snapped both offsets at or below the
    // cursor; saturating covers the degenerate zero-extent screen
    // where reconciliation is skipped.
    #[allow(clippy::cast_possible_truncation)] // Bounded by the u16 screen extents.
    let x = cursor.col().saturating_sub(viewport.left_col()) as u16;
    #[allow(clippy::cast_possible_truncation)]
    let y = cursor.line().saturating_sub(viewport.top_line()) as u16;
    ansi::cursor_to(&mut frame, x, y).ok();

    ansi::cursor_show(&mut frame).ok();
    frame
}

/// Paint every screen row: visible text, banner, or `~` filler.
fn draw_rows(frame: &mut Frame, doc: &Document, viewport: &Viewport) {
    let rows = viewport.rows();
    for y in 0..rows {
        let row = viewport.top_line() + y as usize;
        if let Some(line) = doc.line(row) {
            let visible = visible_slice(line.as_bytes(), viewport.left_col(), viewport.cols());
            frame.write_all(visible).ok();
        } else if doc.is_empty() && y == rows / 3 {
            draw_banner(frame, viewport.cols());
        } else {
            frame.write_all(b"~").ok();
        }

        ansi::clear_line(frame).ok();
        if y + 1 < rows {
            frame.write_all(b"\r\n").ok();
        }
    }
}

/// The on-screen byte range of a line: columns `[left, left + width)`,
/// clipped to the line. Empty when the line ends left of the window.
fn visible_slice(bytes: &[u8], left: usize, width: u16) -> &[u8] {
    let start = left.min(bytes.len());
    let end = left.saturating_add(width as usize).min(bytes.len());
    &bytes[start..end]
}

/// Centered welcome banner for an unloaded session.
fn draw_banner(frame: &mut Frame, cols: u16) {
    let banner = format!("vu viewer -- version {VERSION}");
    // ASCII only, so truncating at a byte count is safe.
    let text = &banner[..banner.len().min(cols as usize)];

    let mut padding = (cols as usize - text.len()) / 2;
    if padding > 0 {
        frame.write_all(b"~").ok();
        padding -= 1;
    }
    for _ in 0..padding {
        frame.write_all(b" ").ok();
    }
    frame.write_all(text.as_bytes()).ok();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
