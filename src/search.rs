//! Search primitives over sorted sequential containers: lower/upper bound,
//! exact binary search, interpolation search, and bracket search over a
//! monotone offset table (find the run enclosing a position).

/// First position whose element is `>= key`.
pub fn lower_bound<T: Ord>(xs: &[T], key: &T) -> usize {
    let mut lo = 0usize;
    let mut hi = xs.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if xs[mid] < *key { lo = mid + 1 } else { hi = mid }
    }
    lo
}

/// First position whose element is `> key`.
pub fn upper_bound<T: Ord>(xs: &[T], key: &T) -> usize {
    let mut lo = 0usize;
    let mut hi = xs.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if xs[mid] <= *key { lo = mid + 1 } else { hi = mid }
    }
    lo
}

/// Some position holding `key`, or `None`. The position is not guaranteed to
/// be the first of an equal run.
pub fn binary_search<T: Ord>(xs: &[T], key: &T) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = xs.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        match xs[mid].cmp(key) {
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid,
            std::cmp::Ordering::Equal => return Some(mid),
        }
    }
    None
}

/// Interpolation search over an ascending `u64` slice. Falls back to halving
/// when the value distribution defeats the interpolation step.
pub fn interpolation_search(xs: &[u64], key: u64) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = xs.len();
    while lo < hi {
        let (a, b) = (xs[lo], xs[hi - 1]);
        if key < a || key > b {
            return None;
        }
        let mid = if a == b {
            lo
        } else {
            // position estimate from the value spread
            let frac = (key - a) as f64 / (b - a) as f64;
            let est = lo + (frac * (hi - lo - 1) as f64) as usize;
            est.clamp(lo, hi - 1)
        };
        match xs[mid].cmp(&key) {
            std::cmp::Ordering::Equal => return Some(mid),
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid,
        }
    }
    None
}

/// Index `k` with `offsets[k] <= pos < offsets[k + 1]`, over a monotone
/// non-decreasing offset table (`offsets.len() >= 2`, `pos < *offsets.last()`).
///
/// Seeds with an interpolation probe on the assumption of roughly uniform run
/// sizes, then narrows by binary search. Empty runs (equal adjacent offsets)
/// are never returned: the last bracket starting at or before `pos` wins.
pub fn bracket(offsets: &[u64], pos: u64) -> usize {
    debug_assert!(offsets.len() >= 2);
    debug_assert!(pos < offsets[offsets.len() - 1]);
    let mut lo = 0usize;
    let mut hi = offsets.len() - 1; // candidate brackets are 0..len-1
    // one interpolation probe to shrink the window
    let total = offsets[hi];
    if total > 0 {
        let est = ((pos as u128 * hi as u128) / total as u128) as usize;
        let est = est.min(hi - 1);
        if offsets[est] <= pos {
            lo = est;
        } else {
            hi = est;
        }
    }
    while lo + 1 < hi {
        let mid = (lo + hi) / 2;
        if offsets[mid] <= pos { lo = mid } else { hi = mid }
    }
    lo
}
