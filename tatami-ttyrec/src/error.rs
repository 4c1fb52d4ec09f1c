//! Error types for ttyrec decoding.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtyrecError {
    /// The frame header announced a body larger than the sanity cap;
    /// the recording is corrupt or not a ttyrec at all.
    #[error("ttyrec frame too large: {length} bytes")]
    FrameTooLarge { length: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
