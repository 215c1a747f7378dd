//! Streaming record decode over bounded chunk reads
//!
//! A pass walks the file record by record, loading it in chunks of a tunable
//! size. The only state that survives a chunk reload is the absolute byte
//! cursor: every load re-seeks to exactly the first unconsumed byte, so no
//! record is ever split, duplicated, or misread across a chunk boundary.
//! Decoding ends only when the cursor reaches the true end of the file.

use std::cmp;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::de::{self, KeyRead};
use crate::error::DecodeError;
use crate::registry::BoardRegistry;
use crate::sink::EventSink;
use crate::{RecordKind, KEY_BYTES};

/// Default chunk size for file reads: 100 MB
pub const CHUNK_BYTES: usize = 100_000_000;

/// Counters for one completed decode pass
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Total bytes walked (equals the file length on success)
    pub bytes: u64,
    /// All records seen, idle ones included
    pub records: u64,
    /// Events delivered to the sink
    pub events: u64,
    /// Idle records skipped
    pub idle: u64,
    /// Events per board id
    pub boards: HashMap<u16, u64>,
}

/// Chunked reader decoding one list file per [`read`](LfReader::read) call
///
/// Holds only the pass-independent settings; per-pass state (cursor, board
/// registry) is created inside `read` and dropped with it, so passes never
/// contaminate each other.
pub struct LfReader {
    boards: HashMap<u16, u16>,
    chunk_bytes: usize,
    progress: Option<Box<dyn FnMut(u64, u64)>>,
}

impl LfReader {
    /// A reader for files produced by the given board id -> channel count map
    pub fn new(boards: HashMap<u16, u16>) -> Self {
        LfReader {
            boards,
            chunk_bytes: CHUNK_BYTES,
            progress: None,
        }
    }

    /// Set the chunk size. Anything down to one header length works; the
    /// reader grows a single load beyond this when one record needs it.
    pub fn chunk_bytes(mut self, bytes: usize) -> Self {
        self.chunk_bytes = cmp::max(bytes, KEY_BYTES);
        self
    }

    /// Observe `(cursor, file_length)` at every chunk-load boundary and once
    /// more at end of file. Drives progress bars; the core never prints.
    pub fn on_chunk(mut self, f: impl FnMut(u64, u64) + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Decode one file, forwarding every non-idle record to `sink`
    ///
    /// Synchronous; returns after the whole file is walked or on the first
    /// fatal error. The input handle is dropped on every exit path.
    pub fn read(
        &mut self,
        path: impl AsRef<Path>,
        sink: &mut impl EventSink,
    ) -> Result<PassSummary, DecodeError> {
        let path = path.as_ref();
        let mut input = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let len = input
            .metadata()
            .map_err(|source| DecodeError::Io { offset: 0, source })?
            .len();

        let mut registry = BoardRegistry::new(self.boards.clone());
        let mut summary = PassSummary::default();
        let mut buf = vec![0u8; cmp::min(self.chunk_bytes as u64, len) as usize];
        // Absolute cursor; always the offset of the next undecoded byte
        let mut pos: u64 = 0;
        // Bytes the next load must contain for the pending record
        let mut need = KEY_BYTES;

        while pos < len {
            if let Some(f) = self.progress.as_mut() {
                f(pos, len);
            }
            let want = cmp::min(len - pos, cmp::max(self.chunk_bytes, need) as u64) as usize;
            if buf.len() < want {
                buf.resize(want, 0);
            }
            input
                .seek(SeekFrom::Start(pos))
                .map_err(|source| DecodeError::Io { offset: pos, source })?;
            input
                .read_exact(&mut buf[..want])
                .map_err(|source| DecodeError::Io { offset: pos, source })?;
            debug!(pos, want, "loaded chunk");

            // In-buffer offset; pos + offset is the absolute cursor
            let mut offset = 0usize;
            loop {
                let cursor = pos + offset as u64;
                if cursor == len {
                    break;
                }
                let key = match de::frame_key(&buf[..want], offset) {
                    KeyRead::Key(key) => key,
                    KeyRead::NeedMore => {
                        if cursor + KEY_BYTES as u64 > len {
                            // Not even a header remains in the file
                            return Err(DecodeError::Truncated {
                                offset: cursor,
                                size: KEY_BYTES as u32,
                                remaining: len - cursor,
                            });
                        }
                        need = KEY_BYTES;
                        break;
                    }
                };
                if (key.bytes as usize) < KEY_BYTES {
                    // A size this small can never advance the cursor
                    return Err(DecodeError::UnknownFormat {
                        board: key.board,
                        size: key.bytes,
                        offset: cursor,
                    });
                }
                let agg = key.bytes as usize;
                if cursor + agg as u64 > len {
                    return Err(DecodeError::Truncated {
                        offset: cursor,
                        size: key.bytes,
                        remaining: len - cursor,
                    });
                }
                if offset + agg > want {
                    // Header read speculatively; the record as a whole is not
                    // in this chunk. Reload from the same byte.
                    need = agg;
                    break;
                }

                registry.check_known(key.board, cursor)?;

                if key.idle {
                    summary.records += 1;
                    summary.idle += 1;
                    offset += agg;
                    continue;
                }

                let kind = match RecordKind::from_size(key.bytes) {
                    Some(kind) => kind,
                    None => {
                        return Err(DecodeError::UnknownFormat {
                            board: key.board,
                            size: key.bytes,
                            offset: cursor,
                        })
                    }
                };
                registry.ensure_initialized(key.board, kind, cursor, sink)?;

                let payload = de::payload(&buf, offset, kind);
                sink.record_event(key.board, &key, &payload)
                    .map_err(|source| DecodeError::Sink { offset: cursor, source })?;

                summary.records += 1;
                summary.events += 1;
                *summary.boards.entry(key.board).or_insert(0) += 1;
                offset += agg;
                need = KEY_BYTES;
            }
            pos += offset as u64;
        }

        if let Some(f) = self.progress.as_mut() {
            f(len, len);
        }
        summary.bytes = pos;
        sink.finalize()
            .map_err(|source| DecodeError::Sink { offset: len, source })?;
        info!(
            bytes = summary.bytes,
            records = summary.records,
            events = summary.events,
            idle = summary.idle,
            "decode pass complete"
        );
        Ok(summary)
    }
}

/// Decode one list file with default chunking
pub fn decode(
    path: impl AsRef<Path>,
    boards: HashMap<u16, u16>,
    sink: &mut impl EventSink,
) -> Result<PassSummary, DecodeError> {
    LfReader::new(boards).read(path, sink)
}
