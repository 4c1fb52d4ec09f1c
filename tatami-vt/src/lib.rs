//! Tatami screen model
//!
//! This crate implements a VT100/xterm-compatible virtual terminal: a pure,
//! in-memory model of a character display driven by a byte stream.
//!
//! The model is:
//! - Streaming: accepts arbitrary chunk boundaries
//! - Deterministic: the same bytes always produce the same screen
//! - Total: malformed input never panics; unknown sequences are dropped
//!
//! Supported input:
//! - C0 control characters (BEL, BS, HT, LF, VT, FF, CR, SO, SI, ESC, ...)
//! - ESC sequences (cursor save/restore, index/reverse-index, keypad modes,
//!   charset selection, UTF-8 selection)
//! - CSI sequences (cursor movement, erase, scroll region, SGR, window ops)
//! - DEC private modes (auto-wrap, cursor visibility)
//! - OSC sequences (consumed and discarded)
//! - Incremental UTF-8 and CP437 decoding
//!
//! This crate performs no I/O and can be driven headlessly.

pub mod attr;
pub mod cell;
pub mod charset;
mod dump;
pub mod parser;
pub mod point;
pub mod term;

pub use attr::Attribute;
pub use cell::Cell;
pub use parser::VtMode;
pub use point::{Point, Range};
pub use term::Term;
