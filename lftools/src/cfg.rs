//! Configuration tools: declaring a conversion and recording what it did
//!
//! A conversion is declared in a JSON file deserialized into [`Run`]. The
//! only required field is `boards`, the board id -> channel count map the
//! decoder validates every record against. After a pass the same structure,
//! with `timestamp` and `summary` filled in, is written back out as the run
//! record.

use chrono::{offset::Local, DateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::reader::PassSummary;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Run {
    /// Free-form name; set it to something useful
    #[serde(default)]
    pub name: String,
    /// Filled in when recording a completed conversion
    pub timestamp: Option<DateTime<Local>>,
    /// Board id -> configured channel count. Records from any board not
    /// listed here abort the pass.
    pub boards: HashMap<u16, u16>,
    /// Channels (0-indexed, at most 63) to keep in the event table; empty
    /// keeps all
    #[serde(default = "emptyvec", skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<u8>,
    /// Accumulate and write per-channel histograms
    pub histograms: Option<bool>,
    /// Compress the event table with zstd
    pub compress: Option<bool>,
    /// Counters of the completed pass, filled in when recording
    pub summary: Option<PassSummary>,
}

fn emptyvec<T>() -> Vec<T> {
    Vec::new()
}

impl Default for Run {
    fn default() -> Self {
        Run {
            name: String::new(),
            timestamp: None,
            boards: HashMap::new(),
            channels: Vec::new(),
            histograms: None,
            compress: None,
            summary: None,
        }
    }
}
