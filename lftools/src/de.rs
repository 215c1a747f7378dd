//! Decoding of list-file records from raw bytes
//!
//! Layout version 1, all fields little-endian. The 24-byte header:
//!
//! | offset | width | field |
//! |--------|-------|-------|
//! | 0      | u16   | board id |
//! | 2      | u16   | channel |
//! | 4      | u64   | timestamp |
//! | 12     | u16   | cfd |
//! | 14     | u16   | flags: bit 0 pile-up, 1 saturated, 2 lost, 3 idle |
//! | 16     | u32   | aggregate size in bytes, header included |
//! | 20     | u32   | reserved |
//!
//! A PHA payload follows as `u16 energy, u16 cfd, u32 extras` (record total
//! 32 bytes); a PSD payload as `u16 qshort, u16 qlong, u16 cfd, u16
//! reserved, u32 extras` (record total 36 bytes). Idle records are
//! header-only.

use byteorder::{ByteOrder, LittleEndian};

use crate::bit::BitOps;
use crate::{EventPayload, FrameKey, PhaEvent, PsdEvent, RecordKind, KEY_BYTES};

/// Outcome of attempting to read a header at an in-buffer offset
pub enum KeyRead {
    Key(FrameKey),
    /// Not enough bytes remain in this buffer for a full header. Recoverable:
    /// reload starting at the same absolute position and retry.
    NeedMore,
}

/// Decode the record header at `offset` into `buf`
///
/// No side effects; the caller owns the cursor and decides what the absolute
/// position of `offset` is.
pub fn frame_key(buf: &[u8], offset: usize) -> KeyRead {
    if offset + KEY_BYTES > buf.len() {
        return KeyRead::NeedMore;
    }
    let b = &buf[offset..offset + KEY_BYTES];
    let flags = LittleEndian::read_u16(&b[14..16]);
    KeyRead::Key(FrameKey {
        board: LittleEndian::read_u16(&b[0..2]),
        channel: LittleEndian::read_u16(&b[2..4]),
        timestamp: LittleEndian::read_u64(&b[4..12]),
        cfd: LittleEndian::read_u16(&b[12..14]),
        pileup: flags.check(0),
        saturated: flags.check(1),
        lost: flags.check(2),
        idle: flags.check(3),
        bytes: LittleEndian::read_u32(&b[16..20]),
    })
}

/// Decode the payload immediately following the header at `offset`
///
/// The caller must already have verified that the whole record lies inside
/// `buf`; fields are read at fixed positions without further bounds checks.
pub fn payload(buf: &[u8], offset: usize, kind: RecordKind) -> EventPayload {
    let b = &buf[offset + KEY_BYTES..];
    match kind {
        RecordKind::Pha => EventPayload::Pha(PhaEvent {
            energy: LittleEndian::read_u16(&b[0..2]),
            cfd: LittleEndian::read_u16(&b[2..4]),
        }),
        RecordKind::Psd => EventPayload::Psd(PsdEvent {
            qshort: LittleEndian::read_u16(&b[0..2]),
            qlong: LittleEndian::read_u16(&b[2..4]),
            cfd: LittleEndian::read_u16(&b[4..6]),
        }),
    }
}
