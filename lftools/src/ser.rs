//! Serialization of list-file records
//!
//! The inverse of [`de`](crate::de), used to build list files from decoded
//! events (see `tsv2lf`) and synthetic streams in tests. Field layout is
//! documented in `de`.

use anyhow::{ensure, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::bit::BitOps;
use crate::{EventPayload, FrameKey, PhaEvent, PsdEvent, KEY_BYTES, PHA_BYTES, PSD_BYTES};

/// Write one record header
///
/// `key.bytes` is written as declared; the caller is responsible for
/// following it with a payload of matching length.
pub fn frame_key(wtr: &mut impl Write, key: &FrameKey) -> Result<()> {
    let mut flags = 0u16;
    flags.change(0, key.pileup);
    flags.change(1, key.saturated);
    flags.change(2, key.lost);
    flags.change(3, key.idle);
    wtr.write_u16::<LittleEndian>(key.board)?;
    wtr.write_u16::<LittleEndian>(key.channel)?;
    wtr.write_u64::<LittleEndian>(key.timestamp)?;
    wtr.write_u16::<LittleEndian>(key.cfd)?;
    wtr.write_u16::<LittleEndian>(flags)?;
    wtr.write_u32::<LittleEndian>(key.bytes)?;
    wtr.write_u32::<LittleEndian>(0)?; // reserved
    Ok(())
}

/// Write a complete PHA record (header + payload)
pub fn pha(wtr: &mut impl Write, key: &FrameKey, ev: &PhaEvent) -> Result<()> {
    ensure!(key.bytes as usize == PHA_BYTES, "key does not declare a PHA record");
    frame_key(wtr, key)?;
    wtr.write_u16::<LittleEndian>(ev.energy)?;
    wtr.write_u16::<LittleEndian>(ev.cfd)?;
    wtr.write_u32::<LittleEndian>(0)?; // extras
    Ok(())
}

/// Write a complete PSD record (header + payload)
pub fn psd(wtr: &mut impl Write, key: &FrameKey, ev: &PsdEvent) -> Result<()> {
    ensure!(key.bytes as usize == PSD_BYTES, "key does not declare a PSD record");
    frame_key(wtr, key)?;
    wtr.write_u16::<LittleEndian>(ev.qshort)?;
    wtr.write_u16::<LittleEndian>(ev.qlong)?;
    wtr.write_u16::<LittleEndian>(ev.cfd)?;
    wtr.write_u16::<LittleEndian>(0)?; // reserved
    wtr.write_u32::<LittleEndian>(0)?; // extras
    Ok(())
}

/// Write a header-only idle record
pub fn idle(wtr: &mut impl Write, key: &FrameKey) -> Result<()> {
    ensure!(key.idle, "key is not marked idle");
    ensure!(key.bytes as usize == KEY_BYTES, "idle records are header-only");
    frame_key(wtr, key)
}

/// Write a complete record of either payload kind
pub fn event(wtr: &mut impl Write, key: &FrameKey, payload: &EventPayload) -> Result<()> {
    match payload {
        EventPayload::Pha(ev) => pha(wtr, key, ev),
        EventPayload::Psd(ev) => psd(wtr, key, ev),
    }
}
