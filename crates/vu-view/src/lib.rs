//! # vu-view: viewer core for vu
//!
//! The pieces between a file on disk and bytes on the wire:
//!
//! - **[`document`]**: `Line` and `Document`, the in-memory line buffer
//! - **[`viewport`]**: `Cursor` and `Viewport`, movement and scrolling
//! - **[`render`]**: turns document plus viewport into one output frame
//!
//! Nothing here touches the terminal. The renderer produces a
//! [`Frame`](vu_term::output::Frame) and hands it back; the binary owns
//! the single write that puts it on screen.

pub mod document;
pub mod render;
pub mod viewport;
