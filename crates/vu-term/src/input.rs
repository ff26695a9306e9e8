// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Key input: timeout reads and escape sequence decoding.
//
// Raw mode hands us a byte stream, not keys. Arrow keys arrive as the
// three-byte CSI sequences `ESC [ A..D`; everything else is a single
// byte. With VMIN=0/VTIME=1 (set by `Terminal::enter`) a read that
// returns no bytes just means the 100ms poll window expired, and that
// timeout is what disambiguates a lone ESC press from the head of an
// escape sequence: if the continuation bytes do not arrive in time,
// the user pressed Escape.
//
// Keys are a dedicated enum rather than sentinel byte values, so a
// decoded arrow can never collide with a literal typed character.

use std::io;

use bitflags::bitflags;

use crate::error::TermError;

// ─── Key Events ─────────────────────────────────────────────────────────────

bitflags! {
    /// Modifier keys attached to a key event.
    ///
    /// The decoder only produces `CTRL` (from the 0x01..=0x1A control
    /// codes); the other flags keep the type compatible with richer
    /// input protocols.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b001;
        const ALT   = 0b010;
        const CTRL  = 0b100;
    }
}

/// Identity of a decoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
}

/// A decoded key event: key identity plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A keypress with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// A Ctrl-modified character (the `byte & 0x1f` control codes).
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self {
            code: KeyCode::Char(ch),
            modifiers: Modifiers::CTRL,
        }
    }
}

// ─── Byte Source ────────────────────────────────────────────────────────────

/// One byte at a time from the terminal, with a poll timeout.
///
/// `Ok(None)` means the timeout expired with nothing to read. It is
/// not an error; the caller decides whether to poll again (waiting for
/// a key) or give up (resolving a pending escape sequence).
pub trait ByteSource {
    /// Read the next byte, or `None` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Read`] for any read failure other than the
    /// timeout itself.
    fn next_byte(&mut self) -> Result<Option<u8>, TermError>;
}

/// The real stdin byte source for a terminal in raw mode.
///
/// Relies on the VMIN=0/VTIME=1 settings applied by
/// [`Terminal::enter`](crate::terminal::Terminal::enter): `read`
/// returns one byte, or zero once the 100ms window closes. EINTR is
/// reported as a timeout so a signal (SIGWINCH, most likely) wakes the
/// main loop instead of killing the session.
#[derive(Debug, Default)]
pub struct TtyInput {
    _private: (),
}

impl TtyInput {
    /// Create the stdin source.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(unix)]
impl ByteSource for TtyInput {
    fn next_byte(&mut self) -> Result<Option<u8>, TermError> {
        let mut byte: u8 = 0;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            // VTIME expired with nothing buffered.
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(TermError::Read(err)),
                }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for TtyInput {
    /// Blocking fallback with no poll timeout. Escape disambiguation
    /// degrades: a lone ESC is only delivered once the next byte
    /// arrives.
    fn next_byte(&mut self) -> Result<Option<u8>, TermError> {
        use std::io::Read;

        let mut byte: u8 = 0;
        match io::stdin().lock().read(std::slice::from_mut(&mut byte)) {
            Ok(1) => Ok(Some(byte)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(TermError::Read(e)),
        }
    }
}

// ─── Decoding ───────────────────────────────────────────────────────────────

/// Poll for one key event.
///
/// Returns `Ok(None)` when the poll interval elapsed with no input, so
/// the caller's loop can service other work (resize flags) between
/// keys. At most one event is produced per call.
///
/// Escape handling: after an ESC byte, up to two continuation bytes
/// are read, each bounded by the same timeout. `[` followed by
/// `A`/`B`/`C`/`D` is an arrow key; anything else, or a timeout at any
/// stage, resolves to a literal Escape press. Continuation bytes
/// consumed on the way to that resolution are discarded.
///
/// # Errors
///
/// Propagates [`TermError::Read`] from the byte source.
pub fn poll_key(src: &mut impl ByteSource) -> Result<Option<KeyEvent>, TermError> {
    let Some(byte) = src.next_byte()? else {
        return Ok(None);
    };

    if byte != 0x1b {
        return Ok(Some(key_from_byte(byte)));
    }

    let escape = KeyEvent::plain(KeyCode::Escape);

    let Some(intro) = src.next_byte()? else {
        return Ok(Some(escape));
    };
    if intro != b'[' {
        return Ok(Some(escape));
    }

    let Some(last) = src.next_byte()? else {
        return Ok(Some(escape));
    };
    let code = match last {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        // Unrecognized CSI final byte. The sequence is swallowed and
        // the original ESC reported.
        _ => KeyCode::Escape,
    };
    Ok(Some(KeyEvent::plain(code)))
}

/// Map a single non-escape byte to a key event.
fn key_from_byte(byte: u8) -> KeyEvent {
    match byte {
        0x0D | 0x0A => KeyEvent::plain(KeyCode::Enter),
        0x09 => KeyEvent::plain(KeyCode::Tab),
        0x08 | 0x7F => KeyEvent::plain(KeyCode::Backspace),
        // Ctrl+letter: the terminal sends letter & 0x1f.
        b @ 0x01..=0x07 | b @ 0x0B..=0x0C | b @ 0x0E..=0x1A => {
            KeyEvent::ctrl((b + b'a' - 1) as char)
        }
        0x00 => KeyEvent::ctrl('@'),
        b => KeyEvent::plain(KeyCode::Char(b as char)),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A scripted byte source: `Some(b)` delivers a byte, `None` is a
    /// timeout. Steps past the end of the script are timeouts too.
    struct Script {
        steps: std::vec::IntoIter<Option<u8>>,
    }

    impl Script {
        fn new(steps: &[Option<u8>]) -> Self {
            Self {
                steps: steps.to_vec().into_iter(),
            }
        }
    }

    impl ByteSource for Script {
        fn next_byte(&mut self) -> Result<Option<u8>, TermError> {
            Ok(self.steps.next().unwrap_or(None))
        }
    }

    /// A source whose reads always fail.
    struct Broken;

    impl ByteSource for Broken {
        fn next_byte(&mut self) -> Result<Option<u8>, TermError> {
            Err(TermError::Read(io::Error::other("gone")))
        }
    }

    fn poll(steps: &[Option<u8>]) -> Option<KeyEvent> {
        poll_key(&mut Script::new(steps)).unwrap()
    }

    // ── Arrow sequences ──────────────────────────────────────────────

    #[test]
    fn csi_a_is_up() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'['), Some(b'A')]),
            Some(KeyEvent::plain(KeyCode::Up))
        );
    }

    #[test]
    fn csi_b_is_down() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'['), Some(b'B')]),
            Some(KeyEvent::plain(KeyCode::Down))
        );
    }

    #[test]
    fn csi_c_is_right() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'['), Some(b'C')]),
            Some(KeyEvent::plain(KeyCode::Right))
        );
    }

    #[test]
    fn csi_d_is_left() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'['), Some(b'D')]),
            Some(KeyEvent::plain(KeyCode::Left))
        );
    }

    // ── Escape disambiguation ────────────────────────────────────────

    #[test]
    fn lone_esc_then_timeout_is_escape() {
        assert_eq!(
            poll(&[Some(0x1b)]),
            Some(KeyEvent::plain(KeyCode::Escape))
        );
    }

    #[test]
    fn esc_with_non_bracket_intro_is_escape() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'O')]),
            Some(KeyEvent::plain(KeyCode::Escape))
        );
    }

    #[test]
    fn esc_bracket_then_timeout_is_escape() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'[')]),
            Some(KeyEvent::plain(KeyCode::Escape))
        );
    }

    #[test]
    fn unknown_csi_final_is_escape() {
        assert_eq!(
            poll(&[Some(0x1b), Some(b'['), Some(b'Z')]),
            Some(KeyEvent::plain(KeyCode::Escape))
        );
    }

    // ── Single bytes ─────────────────────────────────────────────────

    #[test]
    fn printable_char() {
        assert_eq!(
            poll(&[Some(b'x')]),
            Some(KeyEvent::plain(KeyCode::Char('x')))
        );
    }

    #[test]
    fn ctrl_q_is_quit_byte() {
        // 0x11 == 'q' & 0x1f.
        assert_eq!(poll(&[Some(0x11)]), Some(KeyEvent::ctrl('q')));
    }

    #[test]
    fn carriage_return_is_enter() {
        assert_eq!(poll(&[Some(0x0D)]), Some(KeyEvent::plain(KeyCode::Enter)));
        assert_eq!(poll(&[Some(0x0A)]), Some(KeyEvent::plain(KeyCode::Enter)));
    }

    #[test]
    fn tab_and_backspace() {
        assert_eq!(poll(&[Some(0x09)]), Some(KeyEvent::plain(KeyCode::Tab)));
        assert_eq!(
            poll(&[Some(0x7F)]),
            Some(KeyEvent::plain(KeyCode::Backspace))
        );
    }

    // ── Timeouts and errors ──────────────────────────────────────────

    #[test]
    fn timeout_yields_no_event() {
        assert_eq!(poll(&[None]), None);
        assert_eq!(poll(&[]), None);
    }

    #[test]
    fn one_event_per_call() {
        let mut src = Script::new(&[Some(b'a'), Some(b'b')]);
        assert_eq!(
            poll_key(&mut src).unwrap(),
            Some(KeyEvent::plain(KeyCode::Char('a')))
        );
        assert_eq!(
            poll_key(&mut src).unwrap(),
            Some(KeyEvent::plain(KeyCode::Char('b')))
        );
    }

    #[test]
    fn read_failure_is_fatal() {
        assert!(matches!(
            poll_key(&mut Broken),
            Err(TermError::Read(_))
        ));
    }

    // ── Event constructors ───────────────────────────────────────────

    #[test]
    fn plain_has_no_modifiers() {
        assert!(KeyEvent::plain(KeyCode::Up).modifiers.is_empty());
    }

    #[test]
    fn ctrl_sets_only_ctrl() {
        let event = KeyEvent::ctrl('q');
        assert_eq!(event.modifiers, Modifiers::CTRL);
        assert_eq!(event.code, KeyCode::Char('q'));
    }
}
