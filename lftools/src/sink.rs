//! The capability a decode pass delivers into
//!
//! The reader owns decoding and cursor discipline; everything downstream of
//! a decoded event (tables, histograms, storage) lives behind [`EventSink`].
//! Events arrive in strictly increasing file-offset order, exactly once each.

use anyhow::Result;
use std::io::Write;

use crate::{EventPayload, FrameKey, RecordKind};

pub trait EventSink {
    /// One-time setup for a board, called before its first event is
    /// delivered. `channels` is the configured channel count for the board
    /// and `kind` the payload format of the record that triggered setup.
    fn init_board(&mut self, board: u16, channels: u16, kind: RecordKind) -> Result<()>;

    /// Deliver one decoded event
    fn record_event(&mut self, board: u16, key: &FrameKey, payload: &EventPayload) -> Result<()>;

    /// Called once, after the pass reaches end of file
    fn finalize(&mut self) -> Result<()>;
}

/// Sink that discards everything. Decoding into it validates a file.
pub struct NullSink;

impl EventSink for NullSink {
    fn init_board(&mut self, _board: u16, _channels: u16, _kind: RecordKind) -> Result<()> {
        Ok(())
    }

    fn record_event(&mut self, _board: u16, _key: &FrameKey, _payload: &EventPayload) -> Result<()> {
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink writing one tab-separated row per event
///
/// Columns: board, channel, timestamp, pu, satu, lost, kind, cfd, then
/// energy for PHA rows or qshort and qlong for PSD rows.
pub struct TsvSink<W: Write> {
    wtr: csv::Writer<W>,
}

impl<W: Write> TsvSink<W> {
    pub fn new(wtr: W) -> Self {
        TsvSink {
            wtr: csv::WriterBuilder::new()
                .has_headers(false)
                .delimiter(b'\t')
                .flexible(true)
                .from_writer(wtr),
        }
    }
}

impl<W: Write> EventSink for TsvSink<W> {
    fn init_board(&mut self, _board: u16, _channels: u16, _kind: RecordKind) -> Result<()> {
        Ok(())
    }

    fn record_event(&mut self, board: u16, key: &FrameKey, payload: &EventPayload) -> Result<()> {
        let mut row = vec![
            board.to_string(),
            key.channel.to_string(),
            key.timestamp.to_string(),
            (key.pileup as u8).to_string(),
            (key.saturated as u8).to_string(),
            (key.lost as u8).to_string(),
        ];
        match payload {
            EventPayload::Pha(ev) => {
                row.push("pha".to_string());
                row.push(ev.cfd.to_string());
                row.push(ev.energy.to_string());
            }
            EventPayload::Psd(ev) => {
                row.push("psd".to_string());
                row.push(ev.cfd.to_string());
                row.push(ev.qshort.to_string());
                row.push(ev.qlong.to_string());
            }
        }
        self.wtr.write_record(&row)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }
}
