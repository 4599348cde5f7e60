//! Dense bit vector with two backings: a single flat word array for ordinary
//! lengths, and a chunked array-of-arrays for bit counts large enough that one
//! contiguous allocation is undesirable. The backing is an internal detail;
//! both expose the same positional contract.
//!
//! Out-of-range access is a fatal range failure (panic), never a wraparound.

/// Bits per chunk in the chunked backing (4 MiB of words per chunk).
const CHUNK_BITS: u64 = 1 << 25;
const CHUNK_WORDS: usize = (CHUNK_BITS / 64) as usize;

/// Flat backing is used up to this many bits (256 MiB of words).
const FLAT_LIMIT_BITS: u64 = 1 << 31;

enum Backing {
    Flat(Vec<u64>),
    Chunked(Vec<Vec<u64>>),
}

/// Fixed-length dense bitset addressed by `u64` bit positions.
pub struct BitVec {
    len: u64,
    backing: Backing,
}

impl BitVec {
    /// Create a zeroed bit vector, choosing the backing by length.
    pub fn new(len_bits: u64) -> Self {
        if len_bits <= FLAT_LIMIT_BITS {
            Self::flat(len_bits)
        } else {
            Self::chunked(len_bits)
        }
    }

    /// Create a zeroed bit vector with the flat backing.
    pub fn flat(len_bits: u64) -> Self {
        let words = len_bits.div_ceil(64) as usize;
        BitVec {
            len: len_bits,
            backing: Backing::Flat(vec![0u64; words]),
        }
    }

    /// Create a zeroed bit vector with the chunked backing.
    pub fn chunked(len_bits: u64) -> Self {
        let words = len_bits.div_ceil(64);
        let full = (words / CHUNK_WORDS as u64) as usize;
        let rem = (words % CHUNK_WORDS as u64) as usize;
        let mut chunks: Vec<Vec<u64>> = (0..full).map(|_| vec![0u64; CHUNK_WORDS]).collect();
        if rem > 0 {
            chunks.push(vec![0u64; rem]);
        }
        BitVec {
            len: len_bits,
            backing: Backing::Chunked(chunks),
        }
    }

    /// Number of addressable bits.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when no bits are addressable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Heap bytes held by the backing.
    pub fn bytes(&self) -> u64 {
        match &self.backing {
            Backing::Flat(w) => (w.len() * 8) as u64,
            Backing::Chunked(c) => c.iter().map(|w| (w.len() * 8) as u64).sum(),
        }
    }

    #[inline]
    fn check(&self, i: u64) {
        assert!(i < self.len, "bit index {i} out of range (len {})", self.len);
    }

    /// Read bit `i`.
    #[inline]
    pub fn get(&self, i: u64) -> bool {
        self.check(i);
        let (word, bit) = (i / 64, i % 64);
        let w = match &self.backing {
            Backing::Flat(v) => v[word as usize],
            Backing::Chunked(c) => {
                c[(word / CHUNK_WORDS as u64) as usize][(word % CHUNK_WORDS as u64) as usize]
            }
        };
        (w >> bit) & 1 == 1
    }

    /// Set bit `i`.
    #[inline]
    pub fn set(&mut self, i: u64) {
        self.check(i);
        let (word, bit) = (i / 64, i % 64);
        let w = match &mut self.backing {
            Backing::Flat(v) => &mut v[word as usize],
            Backing::Chunked(c) => {
                &mut c[(word / CHUNK_WORDS as u64) as usize][(word % CHUNK_WORDS as u64) as usize]
            }
        };
        *w |= 1u64 << bit;
    }

    /// Clear bit `i`.
    #[inline]
    pub fn reset(&mut self, i: u64) {
        self.check(i);
        let (word, bit) = (i / 64, i % 64);
        let w = match &mut self.backing {
            Backing::Flat(v) => &mut v[word as usize],
            Backing::Chunked(c) => {
                &mut c[(word / CHUNK_WORDS as u64) as usize][(word % CHUNK_WORDS as u64) as usize]
            }
        };
        *w &= !(1u64 << bit);
    }

    /// Total set bits.
    pub fn count_ones(&self) -> u64 {
        match &self.backing {
            Backing::Flat(v) => v.iter().map(|w| w.count_ones() as u64).sum(),
            Backing::Chunked(c) => c
                .iter()
                .flat_map(|w| w.iter())
                .map(|w| w.count_ones() as u64)
                .sum(),
        }
    }
}
