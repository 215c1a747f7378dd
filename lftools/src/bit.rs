//! Bitmask tools for status flags and channel selections

use bit_iter::BitIter;

/// Convert channels (0-indexed, as the digitizer numbers them) into a bitmask
///
/// Callers validate that every channel fits the mask (< 64) before building
/// one; see `MASK_CHANNELS`.
pub fn chans_to_mask(chs: &[u8]) -> u64 {
    let mut m = 0;
    for ch in chs {
        m |= 1 << ch;
    }
    return m;
}

/// Channels a mask can express
pub const MASK_CHANNELS: u8 = 64;

/// Returns all channels in mask
pub fn mask_to_chans(m: u64) -> Vec<u8> {
    let mut chs = Vec::new();
    for b in BitIter::from(m) {
        chs.push(b as u8);
    }
    return chs;
}

use num_traits::{FromPrimitive, PrimInt, Unsigned};
use std::ops::{BitAndAssign, BitOrAssign};

/// Bitwise set/clear/check/change operations for the flag words in headers
pub trait BitOps: PrimInt + BitAndAssign + BitOrAssign + FromPrimitive + Unsigned {
    fn set(&mut self, b: usize);
    fn clear(&mut self, b: usize);
    fn change(&mut self, b: usize, x: bool);
    fn check(self, b: usize) -> bool;
}

impl BitOps for u16 {
    #[inline]
    fn set(&mut self, b: usize) {
        *self |= 1 << b;
    }

    #[inline]
    fn clear(&mut self, b: usize) {
        *self &= !(1 << b);
    }

    #[inline]
    fn change(&mut self, b: usize, x: bool) {
        *self = (*self & !(1 << b)) | ((x as u16) << b);
    }

    #[inline]
    fn check(self, b: usize) -> bool {
        return self >> b & 1 == 1;
    }
}

impl BitOps for u32 {
    #[inline]
    fn set(&mut self, b: usize) {
        *self |= 1 << b;
    }

    #[inline]
    fn clear(&mut self, b: usize) {
        *self &= !(1 << b);
    }

    #[inline]
    fn change(&mut self, b: usize, x: bool) {
        *self = (*self & !(1 << b)) | ((x as u32) << b);
    }

    #[inline]
    fn check(self, b: usize) -> bool {
        return self >> b & 1 == 1;
    }
}

impl BitOps for u64 {
    #[inline]
    fn set(&mut self, b: usize) {
        *self |= 1 << b;
    }

    #[inline]
    fn clear(&mut self, b: usize) {
        *self &= !(1 << b);
    }

    #[inline]
    fn change(&mut self, b: usize, x: bool) {
        *self = (*self & !(1 << b)) | ((x as u64) << b);
    }

    #[inline]
    fn check(self, b: usize) -> bool {
        return self >> b & 1 == 1;
    }
}
