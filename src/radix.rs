//! Stable LSD radix sort for hash words with a paired id array.
//! 8-bit passes, bounded by the declared key width. Stable via counting +
//! prefix sums, so ids keep insertion order within equal keys.

use crate::word::HashWord;

/// Sort `keys` ascending and permute `ids` accordingly. Only the low
/// `key_bits` of each key are significant; passes beyond them are skipped.
pub fn radix_sort_pairs<W: HashWord>(keys: &mut [W], ids: &mut [u64], key_bits: u32) {
    debug_assert_eq!(keys.len(), ids.len());
    let n = keys.len();
    if n <= 1 || key_bits == 0 {
        return;
    }

    let passes = key_bits.div_ceil(8);
    let mut tmp_keys = vec![W::ZERO; n];
    let mut tmp_ids = vec![0u64; n];

    for pass in 0..passes {
        let mut counts = [0usize; 256];
        for &k in keys.iter() {
            counts[k.radix_byte(pass)] += 1;
        }

        // prefix sums -> scatter positions
        let mut sum = 0usize;
        for c in counts.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        for i in 0..n {
            let b = keys[i].radix_byte(pass);
            let pos = counts[b];
            tmp_keys[pos] = keys[i];
            tmp_ids[pos] = ids[i];
            counts[b] = pos + 1;
        }

        keys.copy_from_slice(&tmp_keys);
        ids.copy_from_slice(&tmp_ids);
    }
}
