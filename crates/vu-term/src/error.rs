// SPDX-License-Identifier: MIT
//
// Error kinds for the terminal layer.
//
// Each failing operation gets its own variant rather than a bare errno
// sentinel. Timeouts are not errors: the input path reports them as
// `Ok(None)` and they never appear here.

use std::io;

use thiserror::Error;

/// Failures in terminal control or terminal I/O.
///
/// Every variant is fatal to the session. The binary restores the
/// terminal, prints the message on stderr, and exits non-zero.
#[derive(Debug, Error)]
pub enum TermError {
    /// `tcgetattr` failed: the original attributes could not be captured.
    #[error("failed to read terminal attributes: {0}")]
    GetAttr(#[source] io::Error),

    /// `tcsetattr` failed while entering or leaving raw mode.
    #[error("failed to update terminal attributes: {0}")]
    SetAttr(#[source] io::Error),

    /// Neither `ioctl(TIOCGWINSZ)` nor the cursor-report fallback
    /// produced usable dimensions.
    #[error("could not determine terminal size")]
    WindowSize,

    /// A terminal read failed for a reason other than the poll timeout.
    #[error("terminal read failed: {0}")]
    Read(#[source] io::Error),

    /// Writing to the terminal failed.
    #[error("terminal write failed: {0}")]
    Write(#[source] io::Error),
}

// ─── Tests ───────────────────────────────────────────────────────────────────
