pub mod bit;
pub mod cfg;
pub mod de;
pub mod error;
pub mod reader;
pub mod registry;
pub mod ser;
pub mod sink;

/// Length in bytes of the record header preceding every aggregate
pub const KEY_BYTES: usize = 24;
/// Total length in bytes of a PHA record (header + payload)
pub const PHA_BYTES: usize = 32;
/// Total length in bytes of a PSD record (header + payload)
pub const PSD_BYTES: usize = 36;

/// The fixed-layout header of one record in a list file
///
/// Every record declares its own total length in `bytes`; the decode cursor
/// always advances by that amount, whatever the payload turns out to be.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct FrameKey {
    /// Digitizer board id
    pub board: u16,
    /// Channel (0-indexed) of the board that triggered
    pub channel: u16,
    /// Counter in device clock ticks from the start of the acquisition
    pub timestamp: u64,
    /// Fine-time (CFD) interpolation fraction
    pub cfd: u16,
    /// Pile-up detected on this event
    pub pileup: bool,
    /// Input saturated during this event
    pub saturated: bool,
    /// Events were lost before this one
    pub lost: bool,
    /// Header-only housekeeping record carrying no payload
    pub idle: bool,
    /// Aggregate size: total record length in bytes, header included
    pub bytes: u32,
}

/// Pulse-height event: a single integrated energy
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct PhaEvent {
    pub energy: u16,
    pub cfd: u16,
}

/// Pulse-shape event: long- and short-gate integrated charges
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct PsdEvent {
    pub qshort: u16,
    pub qlong: u16,
    pub cfd: u16,
}

/// A decoded payload of either known kind
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum EventPayload {
    Pha(PhaEvent),
    Psd(PsdEvent),
}

/// The two payload formats a board can produce, selected per record by its
/// aggregate size. Sizes matching neither kind have no safe interpretation.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum RecordKind {
    Pha,
    Psd,
}

impl RecordKind {
    /// Classify an aggregate size, or `None` if it matches neither format
    pub fn from_size(bytes: u32) -> Option<RecordKind> {
        match bytes as usize {
            PHA_BYTES => Some(RecordKind::Pha),
            PSD_BYTES => Some(RecordKind::Psd),
            _ => None,
        }
    }
}

/// Representation for two-dimensional data like histograms, etc.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct Bin<T, U> {
    pub x: T,
    pub y: U,
}
