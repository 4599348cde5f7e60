//! 2-bit k-mer text encoding for the repeat-blacklist loader.
//!
//! Codes are LSB-aligned in the low `2k` bits, which matches the hash keys the
//! index stores. Canonicalization takes the lexicographic minimum of a code
//! and its reverse complement.

/// 256-entry LUT: ASCII base to 2-bit code (A=0, C=1, G=2, T/U=3), 0xFF for
/// anything ambiguous.
pub static BASE_LUT: [u8; 256] = {
    const X: u8 = 0xFF;
    let mut t = [X; 256];
    t[b'A' as usize] = 0;
    t[b'a' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'c' as usize] = 1;
    t[b'G' as usize] = 2;
    t[b'g' as usize] = 2;
    t[b'T' as usize] = 3;
    t[b't' as usize] = 3;
    t[b'U' as usize] = 3;
    t[b'u' as usize] = 3;
    t
};

/// 2-bit code of one base, `None` if ambiguous.
#[inline]
pub fn map_base(b: u8) -> Option<u8> {
    let v = BASE_LUT[b as usize];
    if v <= 3 { Some(v) } else { None }
}

/// Encode a k-mer window into the low `2k` bits of a `u64`. `None` if the
/// window is empty, longer than 32 bases, or contains an ambiguous base.
#[inline]
pub fn encode_kmer(window: &[u8]) -> Option<u64> {
    let k = window.len();
    if k == 0 || k > 32 {
        return None;
    }
    let mut code: u64 = 0;
    for &b in window {
        code = (code << 2) | map_base(b)? as u64;
    }
    Some(code)
}

/// Reverse-complement an LSB-aligned code over `k` bases.
#[inline]
pub fn revcomp(code: u64, k: usize) -> u64 {
    debug_assert!(k <= 32);
    let mut rc: u64 = 0;
    for i in 0..k {
        let base = (code >> (i * 2)) & 0b11;
        rc |= (base ^ 0b11) << ((k - 1 - i) * 2);
    }
    rc
}

/// Canonical LSB-aligned code: min(code, revcomp(code)).
#[inline]
pub fn canonical(code: u64, k: usize) -> u64 {
    code.min(revcomp(code, k))
}
