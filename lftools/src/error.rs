//! Fatal conditions that abort a decode pass
//!
//! Running out of bytes at the end of a chunk is not an error: the reader
//! reloads from the same absolute position and retries (see
//! [`de::KeyRead`](crate::de::KeyRead)). Everything here ends the pass, and
//! every mid-stream variant carries the absolute byte offset at which
//! decoding stopped so the malformed region can be inspected afterwards.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input file could not be opened; reported before any decoding
    #[error("cannot open input file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Read or seek failure on the input file
    #[error("i/o error at offset {offset}: {source}")]
    Io { offset: u64, source: io::Error },

    /// A record references a board absent from the supplied configuration
    #[error("board {board} not in the supplied board configuration (offset {offset})")]
    UnknownBoard { board: u16, offset: u64 },

    /// The sink's one-time setup for a board failed; never retried
    #[error("initialization failed for board {board} (offset {offset}): {source}")]
    InitFailed {
        board: u16,
        offset: u64,
        source: anyhow::Error,
    },

    /// An aggregate size matching neither known record format. There is no
    /// safe interpretation of the payload, so the pass stops here instead of
    /// advancing over bytes it cannot classify.
    #[error("aggregate size {size} of board {board} matches no known record format (offset {offset})")]
    UnknownFormat { board: u16, size: u32, offset: u64 },

    /// A record whose declared size runs past the true end of the file.
    /// No reload can complete it.
    #[error("record at offset {offset} runs past end of file ({size} bytes declared, {remaining} remain)")]
    Truncated {
        offset: u64,
        size: u32,
        remaining: u64,
    },

    /// The sink rejected an event
    #[error("sink rejected event at offset {offset}: {source}")]
    Sink { offset: u64, source: anyhow::Error },
}

impl DecodeError {
    /// Absolute byte offset at which the pass stopped, where applicable
    pub fn offset(&self) -> Option<u64> {
        match self {
            DecodeError::Open { .. } => None,
            DecodeError::Io { offset, .. }
            | DecodeError::UnknownBoard { offset, .. }
            | DecodeError::InitFailed { offset, .. }
            | DecodeError::UnknownFormat { offset, .. }
            | DecodeError::Truncated { offset, .. }
            | DecodeError::Sink { offset, .. } => Some(*offset),
        }
    }
}
