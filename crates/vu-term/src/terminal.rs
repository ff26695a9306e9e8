// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, screen restore, and geometry.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, sigaction, and raw fd writes.
// These are the standard POSIX interfaces for terminal control; there
// is no safe alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. Entering raw mode turns
// off canonical input, echo, signal keys, and output post-processing,
// and arms a 100ms read timeout (VMIN=0/VTIME=1) so the input layer
// can poll instead of blocking forever. Restoration is guaranteed on
// every exit path: explicitly on clean quit, via Drop on early error
// returns, and via a panic hook that writes a pre-built restore
// sequence directly to fd 1 before the panic message prints. Whatever
// happens, the user gets their shell back with echo on.
//
// Geometry comes from ioctl(TIOCGWINSZ) when the kernel cooperates.
// When it does not, the fallback parks the cursor at the bottom-right
// corner and asks the terminal where it ended up (DSR 6 / CPR reply),
// which measures the screen one escape round trip at a time.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use crate::error::TermError;
use crate::input::ByteSource;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the ioctl fails, or the
/// reported geometry has a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn probe_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn probe_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Determine the terminal size, falling back to an escape round trip.
///
/// Tries [`probe_size`] first. If the ioctl path yields nothing, the
/// cursor is pushed to the bottom-right corner and a cursor position
/// report is requested; the `ESC [ rows ; cols R` reply read back
/// through `input` gives the dimensions. Requires raw mode, since the
/// reply arrives unbuffered on stdin.
///
/// # Errors
///
/// [`TermError::WindowSize`] if neither path yields nonzero
/// dimensions; [`TermError::Write`] / [`TermError::Read`] if the
/// round trip itself fails.
pub fn window_size(input: &mut impl ByteSource) -> Result<Size, TermError> {
    if let Some(size) = probe_size() {
        return Ok(size);
    }
    fallback_size(input)
}

/// The escape round-trip half of [`window_size`].
fn fallback_size(input: &mut impl ByteSource) -> Result<Size, TermError> {
    {
        let mut stdout = io::stdout().lock();
        crate::ansi::cursor_to_corner(&mut stdout).map_err(TermError::Write)?;
        crate::ansi::request_cursor_position(&mut stdout).map_err(TermError::Write)?;
        stdout.flush().map_err(TermError::Write)?;
    }

    // Collect the reply up to the terminating 'R'. A timeout before
    // the terminator means no (complete) reply is coming.
    let mut reply = Vec::with_capacity(16);
    while reply.len() < 32 {
        let Some(byte) = input.next_byte()? else {
            break;
        };
        reply.push(byte);
        if byte == b'R' {
            break;
        }
    }

    parse_cursor_report(&reply).ok_or(TermError::WindowSize)
}

/// Parse a cursor position report: `ESC [ rows ; cols R`.
///
/// Returns `None` for malformed replies and for zero dimensions (a
/// zero-column terminal is unusable and treated as a failed query).
fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let rest = reply.strip_prefix(b"\x1b[")?;
    let semi = rest.iter().position(|&b| b == b';')?;
    let end = rest.iter().position(|&b| b == b'R')?;
    if end < semi {
        return None;
    }

    let rows = parse_dec(&rest[..semi])?;
    let cols = parse_dec(&rest[semi + 1..end])?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(Size { cols, rows })
}

/// Parse an ASCII decimal field. No sign, no whitespace, no overflow.
fn parse_dec(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    let mut value: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(u16::from(b - b'0'))?;
    }
    Some(value)
}

// ─── Resize Signal ──────────────────────────────────────────────────────────

/// Global flag set by the SIGWINCH handler. Checked each loop iteration.
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler only sets the [`RESIZE_PENDING`] flag: storing to an
/// atomic is one of the few operations permitted inside a signal
/// handler. The main loop picks the flag up via [`take_resize`] on its
/// next poll tick.
#[cfg(unix)]
pub fn install_resize_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
pub fn install_resize_handler() {
    // No-op on non-unix platforms.
}

/// Consume a pending resize notification, if any.
#[must_use]
pub fn take_resize() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup, behind a [`Mutex`] rather than
/// `static mut`, lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Screen restore sequence: clear, cursor home, show cursor.
///
/// Show-cursor comes last because a frame interrupted between its hide
/// and show leaves the cursor invisible, and an invisible cursor on a
/// cooked-mode shell is the most confusing artifact we can leave
/// behind.
const SCREEN_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard: the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the
/// error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`SCREEN_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock if the panic happened mid-frame), restores
/// termios, then delegates to the original panic handler so the message
/// prints to a working terminal.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
#[cfg(unix)]
fn emergency_restore() {
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            SCREEN_RESTORE.as_ptr().cast::<libc::c_void>(),
            SCREEN_RESTORE.len(),
        );
    }
}

#[cfg(not(unix))]
fn emergency_restore() {
    let _ = io::stdout().write_all(SCREEN_RESTORE);
    let _ = io::stdout().flush();
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch to raw mode. The terminal is
/// restored when the handle is dropped, even on panic.
///
/// # Example
///
/// ```no_run
/// use vu_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... render frames, poll keys ...
/// term.leave()?;
/// # Ok::<(), vu_term::TermError>(())
/// ```
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether raw mode is currently active.
    active: bool,
}

impl Terminal {
    /// Create a terminal handle. Does not touch the terminal; call
    /// [`enter`](Self::enter) for that.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        }
    }

    /// Whether raw mode is currently active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode.
    ///
    /// Installs the panic hook (once per process), captures the current
    /// attributes, then disables canonical input, echo, signal keys,
    /// and output post-processing, with VMIN=0/VTIME=1 so reads time
    /// out after 100ms. Idempotent: entering while active is a no-op.
    ///
    /// # Errors
    ///
    /// [`TermError::GetAttr`] / [`TermError::SetAttr`] if the termios
    /// calls fail. On failure the original attributes are untouched,
    /// so the terminal stays usable.
    pub fn enter(&mut self) -> Result<(), TermError> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;
        self.active = true;
        Ok(())
    }

    /// Leave raw mode and restore the screen.
    ///
    /// Clears the screen, homes and shows the cursor, then restores the
    /// captured attributes. Idempotent: leaving while inactive is a
    /// no-op. Runs from [`Drop`] as well, so every exit path ends here.
    ///
    /// # Errors
    ///
    /// [`TermError::Write`] if the screen restore cannot be written,
    /// [`TermError::SetAttr`] if the attribute restore fails.
    pub fn leave(&mut self) -> Result<(), TermError> {
        if !self.active {
            return Ok(());
        }

        {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(SCREEN_RESTORE)
                .and_then(|()| stdout.flush())
                .map_err(TermError::Write)?;
        }

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> Result<(), TermError> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(TermError::GetAttr(io::Error::last_os_error()));
            }

            // Save original for restore, plus the global backup for
            // the panic hook.
            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // Raw mode: no break-to-signal, no CR translation, no
            // parity check, no bit stripping, no flow control, no
            // output post-processing, 8-bit chars, no echo, no
            // canonical buffering, no Ctrl+V literal-next, no signal
            // keys.
            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

            // VMIN=0, VTIME=1: read() returns after at most 100ms,
            // possibly with nothing. The input layer leans on this
            // for escape disambiguation and resize responsiveness.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(TermError::SetAttr(io::Error::last_os_error()));
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> Result<(), TermError> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<(), TermError> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(TermError::SetAttr(io::Error::last_os_error()));
                }
            }

            // Restored successfully; the panic hook no longer needs
            // the backup.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<(), TermError> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
