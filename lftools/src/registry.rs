//! One-time board initialization against the supplied board configuration
//!
//! The registry is created fresh for every decode pass and owned by the
//! reader; nothing here persists across files.

use std::collections::HashMap;

use crate::error::DecodeError;
use crate::sink::EventSink;
use crate::RecordKind;

/// Per-board state once its first event has triggered setup
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct BoardState {
    /// Configured channel count
    pub channels: u16,
    /// Payload format of the record that triggered setup
    pub kind: RecordKind,
}

enum Slot {
    Unseen,
    Initialized(BoardState),
}

pub struct BoardRegistry {
    /// The externally supplied board id -> channel count map
    boards: HashMap<u16, u16>,
    slots: HashMap<u16, Slot>,
}

impl BoardRegistry {
    pub fn new(boards: HashMap<u16, u16>) -> Self {
        let slots = boards.keys().map(|&b| (b, Slot::Unseen)).collect();
        BoardRegistry { boards, slots }
    }

    /// Fail with `UnknownBoard` unless `board` is in the configuration.
    /// Checked for every record, idle ones included, so the reported offset
    /// is the first record of the offending board.
    pub fn check_known(&self, board: u16, offset: u64) -> Result<u16, DecodeError> {
        match self.boards.get(&board) {
            Some(&channels) => Ok(channels),
            None => Err(DecodeError::UnknownBoard { board, offset }),
        }
    }

    /// Run the sink's one-time setup on first encounter of `board`;
    /// a no-op on every later call. `InitFailed` is fatal and not retried.
    pub fn ensure_initialized(
        &mut self,
        board: u16,
        kind: RecordKind,
        offset: u64,
        sink: &mut impl EventSink,
    ) -> Result<(), DecodeError> {
        let channels = self.check_known(board, offset)?;
        match self.slots.get(&board) {
            Some(Slot::Initialized(_)) => Ok(()),
            _ => {
                sink.init_board(board, channels, kind)
                    .map_err(|source| DecodeError::InitFailed {
                        board,
                        offset,
                        source,
                    })?;
                self.slots
                    .insert(board, Slot::Initialized(BoardState { channels, kind }));
                Ok(())
            }
        }
    }

    /// State of a board, or `None` while it is still unseen
    pub fn state(&self, board: u16) -> Option<&BoardState> {
        match self.slots.get(&board) {
            Some(Slot::Initialized(state)) => Some(state),
            _ => None,
        }
    }
}
