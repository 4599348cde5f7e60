//! Existence pre-filter: projects the high-order bits of a hash onto a slot of
//! a [`BitVec`]. With `addr_bits == hash_bits` it is an exact membership
//! bitmap; with `addr_bits < hash_bits` it is a single-hash-function
//! approximate filter with no false negatives and possible false positives
//! (distinct hashes sharing top bits alias to one slot).

use crate::bits::BitVec;
use crate::error::IndexError;
use crate::word::HashWord;

/// Bit vector addressed by the top `addr_bits` of a `hash_bits`-wide hash.
pub struct HashBits {
    bits: BitVec,
    hash_bits: u32,
    addr_bits: u32,
    shift: u32,
}

impl HashBits {
    /// Create an all-absent filter for `hash_bits`-wide hashes, addressed by
    /// their top `addr_bits` bits. A zero-width hash configuration is legal
    /// and always reports absent.
    pub fn new(hash_bits: u32, addr_bits: u32) -> Result<Self, IndexError> {
        if addr_bits > 48 {
            return Err(IndexError::InvalidParameter(format!(
                "presence address width {addr_bits} exceeds 48 bits"
            )));
        }
        let (len, shift) = if hash_bits == 0 {
            (0u64, 0u32)
        } else {
            (1u64 << addr_bits, hash_bits.saturating_sub(addr_bits))
        };
        Ok(HashBits {
            bits: BitVec::new(len),
            hash_bits,
            addr_bits,
            shift,
        })
    }

    /// Slot addressed by `hash`'s top bits. A shift of the full word width
    /// (zero address bits over a full-width hash) projects everything onto
    /// slot 0.
    #[inline]
    fn slot<W: HashWord>(&self, hash: W) -> u64 {
        if self.shift >= W::BITS {
            return 0;
        }
        (hash >> self.shift).low_u64() & u64::mask(self.addr_bits)
    }

    /// Mark `hash` present.
    #[inline]
    pub fn set<W: HashWord>(&mut self, hash: W) {
        if self.hash_bits == 0 {
            return;
        }
        let slot = self.slot(hash);
        self.set_direct(slot);
    }

    /// Whether `hash` may be present. `false` is definitive.
    #[inline]
    pub fn get<W: HashWord>(&self, hash: W) -> bool {
        if self.hash_bits == 0 {
            return false;
        }
        self.get_direct(self.slot(hash))
    }

    /// Set slot `i` without the hash projection.
    #[inline]
    pub fn set_direct(&mut self, i: u64) {
        self.bits.set(i);
    }

    /// Read slot `i` without the hash projection.
    #[inline]
    pub fn get_direct(&self, i: u64) -> bool {
        self.bits.get(i)
    }

    /// Clear slot `i` without the hash projection.
    #[inline]
    pub fn reset_direct(&mut self, i: u64) {
        self.bits.reset(i);
    }

    /// Address width in bits.
    #[inline]
    pub fn addr_bits(&self) -> u32 {
        self.addr_bits
    }

    /// Whether the projection is exact (no aliasing possible).
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.addr_bits >= self.hash_bits
    }

    /// Occupied slots.
    pub fn count_ones(&self) -> u64 {
        self.bits.count_ones()
    }

    /// Heap bytes of the backing vector.
    pub fn bytes(&self) -> u64 {
        self.bits.bytes()
    }
}
