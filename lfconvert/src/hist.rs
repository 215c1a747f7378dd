//! Per-channel histograms of pulse metrics
//!
//! PHA boards get one energy histogram per channel, PSD boards one qshort
//! and one qlong, with the unit-width binning the acquisition software
//! uses. Written as `(bin, count)` TSV, one file per histogram.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use lftools::{Bin, EventPayload, FrameKey, RecordKind};

pub const ENERGY_BINS: usize = 32768;
pub const QSHORT_BINS: usize = 32768;
pub const QLONG_BINS: usize = 65536;

/// One histogram with unit-width bins starting at zero
pub struct Hist {
    counts: Vec<u64>,
}

impl Hist {
    fn new(bins: usize) -> Self {
        Hist { counts: vec![0; bins] }
    }

    /// Count a value; values beyond the last bin are dropped, as the
    /// acquisition software drops overflow
    pub fn fill(&mut self, x: u16) {
        if let Some(c) = self.counts.get_mut(x as usize) {
            *c += 1;
        }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Write `(bin, count)` rows as TSV
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let f = File::create(path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_writer(BufWriter::new(f));
        for (x, &y) in self.counts.iter().enumerate() {
            let bin = Bin { x, y };
            wtr.write_record(&[bin.x.to_string(), bin.y.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

enum ChannelHists {
    Pha { energy: Hist },
    Psd { qshort: Hist, qlong: Hist },
}

/// Histograms for every (board, channel) pair seen in a pass
#[derive(Default)]
pub struct Histograms {
    by_channel: HashMap<(u16, u16), ChannelHists>,
}

impl Histograms {
    /// Create the per-channel histograms for a board, by its record kind
    pub fn init_board(&mut self, board: u16, channels: u16, kind: RecordKind) {
        for ch in 0..channels {
            let h = match kind {
                RecordKind::Pha => ChannelHists::Pha { energy: Hist::new(ENERGY_BINS) },
                RecordKind::Psd => ChannelHists::Psd {
                    qshort: Hist::new(QSHORT_BINS),
                    qlong: Hist::new(QLONG_BINS),
                },
            };
            self.by_channel.insert((board, ch), h);
        }
    }

    /// Count one event into its channel's histograms
    pub fn fill(&mut self, board: u16, key: &FrameKey, payload: &EventPayload) -> Result<()> {
        let h = match self.by_channel.get_mut(&(board, key.channel)) {
            Some(h) => h,
            None => bail!(
                "channel {} of board {} is beyond its configured channel count",
                key.channel,
                board
            ),
        };
        match (h, payload) {
            (ChannelHists::Pha { energy }, EventPayload::Pha(ev)) => energy.fill(ev.energy),
            (ChannelHists::Psd { qshort, qlong }, EventPayload::Psd(ev)) => {
                qshort.fill(ev.qshort);
                qlong.fill(ev.qlong);
            }
            _ => bail!(
                "record kind of board {} changed mid-file at offset of channel {}",
                board,
                key.channel
            ),
        }
        Ok(())
    }

    /// Write every histogram as `<stem>_<name>_<board>_<channel>.tsv` in `dir`
    pub fn write(&self, dir: &Path, stem: &str) -> Result<()> {
        let mut keys = self.by_channel.keys().copied().collect::<Vec<_>>();
        keys.sort_unstable();
        for (board, ch) in keys {
            match &self.by_channel[&(board, ch)] {
                ChannelHists::Pha { energy } => {
                    energy.write_tsv(&dir.join(format!("{}_energy_{}_{}.tsv", stem, board, ch)))?;
                }
                ChannelHists::Psd { qshort, qlong } => {
                    qshort.write_tsv(&dir.join(format!("{}_qshort_{}_{}.tsv", stem, board, ch)))?;
                    qlong.write_tsv(&dir.join(format!("{}_qlong_{}_{}.tsv", stem, board, ch)))?;
                }
            }
        }
        Ok(())
    }
}
