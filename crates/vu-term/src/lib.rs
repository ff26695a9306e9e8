// SPDX-License-Identifier: MIT
//
// vu-term: the terminal layer for vu.
//
// Raw-mode lifecycle, key input decoding, and ANSI escape output for a
// viewer that talks to the terminal directly. This crate intentionally
// avoids external TUI frameworks (ratatui, crossterm): the protocol
// surface a pager needs is a handful of escape sequences and one
// termios round trip, and owning them keeps every byte sent to the
// terminal accounted for.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
pub mod terminal;

pub use error::TermError;
