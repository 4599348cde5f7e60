//! Hash word abstraction: the index is generic over the machine representation
//! of a hash so the same engine serves single-word (`u64`) and extended
//! multi-word (`u128`) key widths.

use std::fmt::Debug;
use std::ops::{BitAnd, BitOr, Shl, Shr};

/// Fixed-width unsigned word holding a hash key or a stored remainder.
///
/// Bucket addressing shifts the top bits down; for `u128` that shift crosses
/// the native word boundary, which is how the extended variant consumes hash
/// bits beyond 64 without a separate code path.
pub trait HashWord:
    Copy
    + Ord
    + Eq
    + Default
    + Debug
    + Send
    + Sync
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
    + BitOr<Output = Self>
    + BitAnd<Output = Self>
    + 'static
{
    /// Width of the word in bits.
    const BITS: u32;
    /// The all-zero word.
    const ZERO: Self;

    /// Widen a `u64` into this word type.
    fn from_u64(v: u64) -> Self;
    /// Low 64 bits of the word.
    fn low_u64(self) -> u64;
    /// Mask selecting the low `width` bits (`width <= Self::BITS`).
    fn mask(width: u32) -> Self;

    /// Byte `pass` of the word (little-endian byte order), for radix passes.
    #[inline]
    fn radix_byte(self, pass: u32) -> usize {
        ((self >> (pass * 8)).low_u64() & 0xFF) as usize
    }
}

impl HashWord for u64 {
    const BITS: u32 = 64;
    const ZERO: Self = 0;

    #[inline]
    fn from_u64(v: u64) -> Self {
        v
    }
    #[inline]
    fn low_u64(self) -> u64 {
        self
    }
    #[inline]
    fn mask(width: u32) -> Self {
        debug_assert!(width <= 64);
        if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
    }
}

impl HashWord for u128 {
    const BITS: u32 = 128;
    const ZERO: Self = 0;

    #[inline]
    fn from_u64(v: u64) -> Self {
        v as u128
    }
    #[inline]
    fn low_u64(self) -> u64 {
        self as u64
    }
    #[inline]
    fn mask(width: u32) -> Self {
        debug_assert!(width <= 128);
        if width >= 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        }
    }
}
