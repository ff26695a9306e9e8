// SPDX-License-Identifier: MIT
//
// vu: a minimal terminal file viewer.
//
// This is the binary that wires the crates together:
//
//   vu-term → raw mode, key decoding, frame output
//   vu-view → line buffer, cursor/viewport, frame rendering
//
// One synchronous loop: render when state changed, poll for a key (the
// read times out every 100ms so resize signals get a look-in), mutate
// the cursor, repeat until Ctrl+Q. Each keypress flows through:
//
//   stdin → poll_key → handle_key → cursor/viewport mutation
//   draw_frame → Frame → one write to the terminal
//
// All state lives in the `Viewer` struct owned by `run`; nothing is
// global except the resize flag and the termios backup the panic hook
// needs, both owned by vu-term.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use thiserror::Error;

use vu_term::input::{self, KeyCode, KeyEvent, Modifiers, TtyInput};
use vu_term::output::Frame;
use vu_term::terminal::{self, Size, Terminal};
use vu_term::TermError;
use vu_view::document::Document;
use vu_view::render;
use vu_view::viewport::{Cursor, Viewport};

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Anything fatal the viewer can hit. Printed once on stderr after the
/// terminal has been restored; the process then exits 1.
#[derive(Debug, Error)]
enum ViewerError {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ─── Viewer ─────────────────────────────────────────────────────────────────

/// What the key handler tells the main loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Keep running.
    Continue,
    /// Tear down and exit cleanly.
    Quit,
}

/// The whole viewer state: document, cursor, viewport.
struct Viewer {
    document: Document,
    cursor: Cursor,
    viewport: Viewport,
}

impl Viewer {
    fn new(document: Document, size: Size) -> Self {
        Self {
            document,
            cursor: Cursor::new(),
            viewport: Viewport::new(size),
        }
    }

    /// Apply one key event. Arrows move the cursor, Ctrl+Q quits,
    /// everything else is ignored (this is a viewer; there is nothing
    /// to type into).
    fn handle_key(&mut self, key: &KeyEvent) -> Action {
        if key.modifiers.contains(Modifiers::CTRL) {
            if key.code == KeyCode::Char('q') {
                return Action::Quit;
            }
            return Action::Continue;
        }

        match key.code {
            KeyCode::Up => self.cursor.move_up(&self.document),
            KeyCode::Down => self.cursor.move_down(&self.document),
            KeyCode::Left => self.cursor.move_left(&self.document),
            KeyCode::Right => self.cursor.move_right(&self.document),
            _ => {}
        }
        Action::Continue
    }

    /// Render the current state into a frame for the caller to flush.
    fn frame(&mut self) -> Frame {
        render::draw_frame(&self.document, &self.cursor, &mut self.viewport)
    }
}

// ─── Entry ──────────────────────────────────────────────────────────────────

fn run(path: Option<&Path>) -> Result<(), ViewerError> {
    let mut term = Terminal::new();
    term.enter()?;
    terminal::install_resize_handler();

    // Raw mode is active from here on. Every early `?` return drops
    // `term`, which restores the screen and attributes before the
    // caller prints a diagnostic.
    let mut input = TtyInput::new();
    let size = terminal::window_size(&mut input)?;

    let document = match path {
        Some(p) => Document::from_file(p).map_err(|source| ViewerError::Open {
            path: p.to_path_buf(),
            source,
        })?,
        None => Document::new(),
    };

    let mut viewer = Viewer::new(document, size);
    let mut dirty = true;

    loop {
        if terminal::take_resize() {
            viewer.viewport.resize(terminal::window_size(&mut input)?);
            dirty = true;
        }

        if dirty {
            viewer.frame().flush_stdout().map_err(TermError::Write)?;
            dirty = false;
        }

        if let Some(key) = input::poll_key(&mut input)? {
            match viewer.handle_key(&key) {
                Action::Quit => break,
                Action::Continue => dirty = true,
            }
        }
    }

    term.leave()?;
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map(PathBuf::from);

    if let Err(e) = run(path.as_deref()) {
        eprintln!("vu: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use vu_view::viewport::Position;

    // ── Helpers ───────────────────────────────────────────────────────────

    fn viewer_with(text: &str, cols: u16, rows: u16) -> Viewer {
        Viewer::new(Document::from_text(text), Size { cols, rows })
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::plain(code)
    }

    fn feed(viewer: &mut Viewer, keys: &[KeyEvent]) {
        for key in keys {
            assert_eq!(viewer.handle_key(key), Action::Continue);
        }
    }

    // ── Quit ──────────────────────────────────────────────────────────────

    #[test]
    fn ctrl_q_quits() {
        let mut v = viewer_with("", 80, 24);
        assert_eq!(v.handle_key(&KeyEvent::ctrl('q')), Action::Quit);
    }

    #[test]
    fn other_ctrl_keys_are_ignored() {
        let mut v = viewer_with("text\n", 80, 24);
        assert_eq!(v.handle_key(&KeyEvent::ctrl('c')), Action::Continue);
        assert_eq!(v.cursor.position(), Position::ZERO);
    }

    #[test]
    fn plain_q_does_not_quit() {
        let mut v = viewer_with("", 80, 24);
        assert_eq!(v.handle_key(&press(KeyCode::Char('q'))), Action::Continue);
    }

    // ── Navigation ────────────────────────────────────────────────────────

    #[test]
    fn arrows_move_the_cursor() {
        let mut v = viewer_with("one\ntwo\nthree\n", 80, 24);
        feed(
            &mut v,
            &[
                press(KeyCode::Down),
                press(KeyCode::Down),
                press(KeyCode::Right),
                press(KeyCode::Right),
            ],
        );
        assert_eq!(v.cursor.position(), Position::new(2, 2));

        feed(&mut v, &[press(KeyCode::Up), press(KeyCode::Left)]);
        assert_eq!(v.cursor.position(), Position::new(1, 1));
    }

    #[test]
    fn right_clamps_at_line_end() {
        let mut v = viewer_with("hello\n", 80, 24);
        feed(&mut v, &[press(KeyCode::Right); 8]);
        assert_eq!(v.cursor.position(), Position::new(0, 5));
    }

    #[test]
    fn typing_keys_do_nothing() {
        let mut v = viewer_with("abc\n", 80, 24);
        feed(
            &mut v,
            &[
                press(KeyCode::Char('x')),
                press(KeyCode::Enter),
                press(KeyCode::Tab),
                press(KeyCode::Backspace),
                press(KeyCode::Escape),
            ],
        );
        assert_eq!(v.cursor.position(), Position::ZERO);
    }

    // ── Rendering through the viewer ──────────────────────────────────────

    #[test]
    fn scrolling_down_moves_the_viewport() {
        let text = "line\n".repeat(100);
        let mut v = viewer_with(&text, 80, 24);
        feed(&mut v, &[press(KeyCode::Down); 30]);

        // The viewport catches up when a frame is produced.
        let _ = v.frame();
        assert_eq!(v.cursor.line(), 30);
        assert_eq!(v.viewport.top_line(), 30 - 24 + 1);
    }

    #[test]
    fn frame_is_nonempty_and_bounded() {
        let mut v = viewer_with("hello\n", 40, 4);
        let frame = v.frame();
        assert!(!frame.is_empty());
        // Prologue + 4 rows + epilogue comfortably fit in a few
        // hundred bytes; a runaway frame means a broken row loop.
        assert!(frame.len() < 512);
    }

    // ── Error formatting ──────────────────────────────────────────────────

    #[test]
    fn open_error_names_the_file() {
        let err = ViewerError::Open {
            path: PathBuf::from("/no/such/file"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/no/such/file"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn term_error_passes_through() {
        let err = ViewerError::from(TermError::WindowSize);
        assert_eq!(err.to_string(), "could not determine terminal size");
    }
}
