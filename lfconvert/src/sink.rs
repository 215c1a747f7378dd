//! The conversion sink: event table, channel filter, optional histograms

use anyhow::{bail, Result};
use std::io::Write;

use lftools::bit::{self, BitOps};
use lftools::sink::{EventSink, TsvSink};
use lftools::{EventPayload, FrameKey, RecordKind};

use crate::hist::Histograms;

pub struct ConvertSink<W: Write> {
    table: TsvSink<W>,
    /// Channels kept in the event table; 0 keeps every channel
    chmask: u64,
    hists: Option<Histograms>,
    /// Events dropped from the table by the channel filter
    pub filtered: u64,
}

impl<W: Write> ConvertSink<W> {
    /// Fails if the filter names a channel the mask cannot express
    pub fn new(wtr: W, channels: &[u8], histograms: bool) -> Result<Self> {
        if let Some(ch) = channels.iter().find(|&&ch| ch >= bit::MASK_CHANNELS) {
            bail!(
                "filter channel {} out of range (0-{})",
                ch,
                bit::MASK_CHANNELS - 1
            );
        }
        Ok(ConvertSink {
            table: TsvSink::new(wtr),
            chmask: bit::chans_to_mask(channels),
            hists: if histograms { Some(Histograms::default()) } else { None },
            filtered: 0,
        })
    }

    pub fn histograms(&self) -> Option<&Histograms> {
        self.hists.as_ref()
    }

    /// The effective filter, sorted and deduplicated; empty keeps all
    pub fn channels(&self) -> Vec<u8> {
        bit::mask_to_chans(self.chmask)
    }

    fn keep(&self, channel: u16) -> bool {
        self.chmask == 0
            || (channel < bit::MASK_CHANNELS as u16 && self.chmask.check(channel as usize))
    }
}

impl<W: Write> EventSink for ConvertSink<W> {
    fn init_board(&mut self, board: u16, channels: u16, kind: RecordKind) -> Result<()> {
        if let Some(hists) = self.hists.as_mut() {
            hists.init_board(board, channels, kind);
        }
        self.table.init_board(board, channels, kind)
    }

    fn record_event(&mut self, board: u16, key: &FrameKey, payload: &EventPayload) -> Result<()> {
        // Histograms see every channel; the filter is for the table only
        if let Some(hists) = self.hists.as_mut() {
            hists.fill(board, key, payload)?;
        }
        if self.keep(key.channel) {
            self.table.record_event(board, key, payload)
        } else {
            self.filtered += 1;
            Ok(())
        }
    }

    fn finalize(&mut self) -> Result<()> {
        self.table.finalize()
    }
}
