//! The hash index engine: bucketed posting storage with a single irreversible
//! freeze into a sorted, compacted, optionally filtered, queryable layout.
//!
//! Two variants share this one type. The *plain* variant stores full hash
//! words and accumulates adds into one growing array, routing entries to
//! buckets at freeze. The *compressed* variant stores only the in-bucket
//! remainder, so bucket extents must be known before any write: its `PRE_ADD`
//! phase counts per-bucket occurrences, the first `freeze()` converts counts
//! into a prefix-sum layout, and the caller replays the identical add sequence
//! to place entries. The variant split is carried by [`KeyCodec`], the phase
//! by [`Phase`]; there is no shared mutability after `FROZEN`, so a frozen
//! index is safe for unlimited concurrent readers.

use std::ops::Range;

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::IndexError;
use crate::filter::{FilterPolicy, FreezeStats};
use crate::hashbits::HashBits;
use crate::histogram::FrequencyHistogram;
use crate::radix::radix_sort_pairs;
use crate::search::{binary_search, bracket};
use crate::word::HashWord;

/// Saturating occurrence-count bins kept in the frozen statistics.
pub const OCC_BINS: usize = 16;

/// Construction-time configuration, builder style.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    max_entries: u64,
    hash_bits: u32,
    bucket_bits: u32,
    compress: bool,
    presence: bool,
    presence_bits: Option<u32>,
    threads: usize,
}

impl IndexConfig {
    /// Declared maximum entry count and hash width in bits. Bucket address
    /// width defaults to `min(hash_bits, 12)`.
    pub fn new(max_entries: u64, hash_bits: u32) -> Self {
        IndexConfig {
            max_entries,
            hash_bits,
            bucket_bits: hash_bits.min(12),
            compress: false,
            presence: false,
            presence_bits: None,
            threads: 0,
        }
    }

    /// Number of high hash bits routing an entry to its bucket.
    pub fn with_bucket_bits(mut self, b: u32) -> Self {
        self.bucket_bits = b;
        self
    }
    /// Store in-bucket remainders instead of full hashes (two-phase build).
    pub fn compressed(mut self, yes: bool) -> Self {
        self.compress = yes;
        self
    }
    /// Build an existence bit vector at freeze.
    pub fn with_presence(mut self, yes: bool) -> Self {
        self.presence = yes;
        self
    }
    /// Address width of the existence bit vector (implies `with_presence`).
    /// Default: `min(hash_bits, 24)`.
    pub fn with_presence_bits(mut self, bits: u32) -> Self {
        self.presence = true;
        self.presence_bits = Some(bits);
        self
    }
    /// Worker count for the freeze fan-out; 0 uses the ambient rayon pool.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = n;
        self
    }

    /// Declared maximum entry count.
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }
    /// Hash width in bits.
    pub fn hash_bits(&self) -> u32 {
        self.hash_bits
    }
    /// Bucket address width in bits.
    pub fn bucket_bits(&self) -> u32 {
        self.bucket_bits
    }
    /// Whether the compressed (remainder-storing) variant is selected.
    pub fn is_compressed(&self) -> bool {
        self.compress
    }

    fn presence_addr_bits(&self) -> u32 {
        self.presence_bits.unwrap_or(self.hash_bits.min(24))
    }

    fn validated<W: HashWord>(mut self) -> Result<Self, IndexError> {
        if self.max_entries == 0 {
            return Err(IndexError::InvalidParameter(
                "declared capacity must be positive".into(),
            ));
        }
        if self.hash_bits == 0 || self.hash_bits > W::BITS {
            return Err(IndexError::InvalidParameter(format!(
                "hash width {} outside 1..={} bits",
                self.hash_bits,
                W::BITS
            )));
        }
        if self.bucket_bits > 32 {
            return Err(IndexError::InvalidParameter(format!(
                "bucket address width {} exceeds 32 bits",
                self.bucket_bits
            )));
        }
        if self.bucket_bits > self.hash_bits {
            warn!(
                "adjusted bucket_bits {} down to hash width {}",
                self.bucket_bits, self.hash_bits
            );
            self.bucket_bits = self.hash_bits;
        }
        if self.presence && self.presence_addr_bits() > 48 {
            return Err(IndexError::InvalidParameter(format!(
                "presence address width {} exceeds 48 bits",
                self.presence_addr_bits()
            )));
        }
        Ok(self)
    }
}

/// Lifecycle phase. Entered in order, each exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Compressed variant only: counting adds, no storage writes.
    PreAdd,
    /// Accepting entry placement.
    Add,
    /// Immutable, queryable.
    Frozen,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::PreAdd => "PRE_ADD",
            Phase::Add => "ADD",
            Phase::Frozen => "FROZEN",
        }
    }
}

/// Per-variant stored-key strategy: full hash or in-bucket remainder.
#[derive(Clone, Copy, Debug)]
enum KeyCodec {
    Full,
    Remainder { rem_bits: u32 },
}

impl KeyCodec {
    /// Word written into storage for `hash`.
    #[inline]
    fn stored<W: HashWord>(self, hash: W) -> W {
        match self {
            KeyCodec::Full => hash,
            KeyCodec::Remainder { rem_bits } => hash & W::mask(rem_bits),
        }
    }

    /// Reconstruct the full hash from a bucket id and a stored word.
    #[inline]
    fn decode<W: HashWord>(self, bucket: u64, stored: W) -> W {
        match self {
            KeyCodec::Full => stored,
            KeyCodec::Remainder { rem_bits } => {
                if rem_bits >= W::BITS {
                    stored
                } else {
                    (W::from_u64(bucket) << rem_bits) | stored
                }
            }
        }
    }

    /// Significant bits of a stored word (bounds the radix passes).
    #[inline]
    fn key_bits(self, hash_bits: u32) -> u32 {
        match self {
            KeyCodec::Full => hash_bits,
            KeyCodec::Remainder { rem_bits } => rem_bits,
        }
    }
}

/// Frozen-index statistics, accumulated during compaction.
#[derive(Clone, Debug, Default)]
struct IndexStats {
    entries_added: u64,
    entries: u64,
    hashes: u64,
    max_occurrences: u64,
    occ_bins: [u64; OCC_BINS],
    histogram: FrequencyHistogram,
}

/// Bucketed hash index over `W`-wide keys. See the module docs for the
/// lifecycle; all queries require the `FROZEN` phase.
pub struct HashIndex<W: HashWord = u64> {
    cfg: IndexConfig,
    phase: Phase,
    codec: KeyCodec,
    buckets: usize,
    bucket_shift: u32,
    keys: Vec<W>,
    values: Vec<u64>,
    /// `buckets + 1` monotone offsets once the bucket layout exists.
    boundaries: Vec<u64>,
    /// Compressed PRE_ADD: per-bucket occurrence counts.
    pre_counts: Vec<u64>,
    /// Compressed ADD: per-bucket next free slot.
    cursors: Vec<u64>,
    filter: Option<Box<dyn FilterPolicy<W>>>,
    presence: Option<HashBits>,
    stats: IndexStats,
}

impl<W: HashWord> HashIndex<W> {
    /// Create an unfiltered index.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        Self::build(cfg, None)
    }

    /// Create an index whose freeze consults `filter` per distinct hash.
    pub fn with_filter(
        cfg: IndexConfig,
        filter: Box<dyn FilterPolicy<W>>,
    ) -> Result<Self, IndexError> {
        Self::build(cfg, Some(filter))
    }

    fn build(cfg: IndexConfig, filter: Option<Box<dyn FilterPolicy<W>>>) -> Result<Self, IndexError> {
        let cfg = cfg.validated::<W>()?;
        let buckets = 1usize << cfg.bucket_bits;
        let bucket_shift = cfg.hash_bits - cfg.bucket_bits;
        let codec = if cfg.compress {
            KeyCodec::Remainder {
                rem_bits: bucket_shift,
            }
        } else {
            KeyCodec::Full
        };
        let (phase, pre_counts) = if cfg.compress {
            (Phase::PreAdd, vec![0u64; buckets])
        } else {
            (Phase::Add, Vec::new())
        };
        Ok(HashIndex {
            cfg,
            phase,
            codec,
            buckets,
            bucket_shift,
            keys: Vec::new(),
            values: Vec::new(),
            boundaries: Vec::new(),
            pre_counts,
            cursors: Vec::new(),
            filter,
            presence: None,
            stats: IndexStats::default(),
        })
    }

    /// Bucket addressed by the top `bucket_bits` of `hash`. With a zero
    /// bucket width everything routes to bucket 0; the shift would be the
    /// full word width there, which `Shr` does not permit.
    #[inline]
    fn bucket_of(&self, hash: W) -> usize {
        if self.cfg.bucket_bits == 0 {
            return 0;
        }
        ((hash >> self.bucket_shift).low_u64() & u64::mask(self.cfg.bucket_bits)) as usize
    }

    /// Route one `(hash, id)` pair. Valid outside `FROZEN` only; in the
    /// compressed `PRE_ADD` phase this is a count, not a write.
    pub fn add(&mut self, hash: W, id: u64) -> Result<(), IndexError> {
        match self.phase {
            Phase::Frozen => Err(IndexError::IllegalState {
                op: "add",
                phase: self.phase.name(),
            }),
            Phase::PreAdd => {
                let b = self.bucket_of(hash);
                self.pre_counts[b] += 1;
                Ok(())
            }
            Phase::Add => {
                match self.codec {
                    KeyCodec::Full => {
                        self.keys.push(hash);
                        self.values.push(id);
                    }
                    KeyCodec::Remainder { .. } => {
                        let b = self.bucket_of(hash);
                        let slot = self.cursors[b];
                        if slot >= self.boundaries[b + 1] {
                            return Err(IndexError::CapacityExceeded(format!(
                                "bucket {b} overflow: placement pass diverges from counting pass"
                            )));
                        }
                        self.keys[slot as usize] = self.codec.stored(hash);
                        self.values[slot as usize] = id;
                        self.cursors[b] = slot + 1;
                    }
                }
                self.stats.entries_added += 1;
                Ok(())
            }
        }
    }

    /// Advance the lifecycle. Compressed `PRE_ADD`: lay out bucket extents and
    /// open the placement phase (caller replays the identical add sequence).
    /// `ADD` (either variant): sort, filter, compact, and enter `FROZEN`.
    pub fn freeze(&mut self) -> Result<(), IndexError> {
        match self.phase {
            Phase::Frozen => Err(IndexError::IllegalState {
                op: "freeze",
                phase: self.phase.name(),
            }),
            Phase::PreAdd => self.freeze_layout(),
            Phase::Add => self.freeze_final(),
        }
    }

    /// First freeze of the compressed variant: counts -> prefix sums,
    /// storage allocation, cursors at bucket starts.
    fn freeze_layout(&mut self) -> Result<(), IndexError> {
        let mut bounds = Vec::with_capacity(self.buckets + 1);
        bounds.push(0u64);
        let mut sum = 0u64;
        for &c in &self.pre_counts {
            sum += c;
            bounds.push(sum);
        }
        self.boundaries = bounds;
        self.cursors = self.boundaries[..self.buckets].to_vec();
        self.keys = vec![W::ZERO; sum as usize];
        self.values = vec![0u64; sum as usize];
        self.pre_counts = Vec::new();
        self.phase = Phase::Add;
        debug!("laid out {} entries across {} buckets", sum, self.buckets);
        Ok(())
    }

    /// Final freeze: capacity check, bucket routing (plain), parallel
    /// per-bucket sort, filter consultation, compaction, presence vector,
    /// storage trim.
    fn freeze_final(&mut self) -> Result<(), IndexError> {
        let total = self.keys.len() as u64;
        if total > self.cfg.max_entries {
            return Err(IndexError::CapacityExceeded(format!(
                "{total} entries exceed declared capacity {}",
                self.cfg.max_entries
            )));
        }
        if let KeyCodec::Remainder { .. } = self.codec {
            for b in 0..self.buckets {
                if self.cursors[b] != self.boundaries[b + 1] {
                    return Err(IndexError::CapacityExceeded(format!(
                        "bucket {b} placement incomplete: {} of {} entries",
                        self.cursors[b] - self.boundaries[b],
                        self.boundaries[b + 1] - self.boundaries[b],
                    )));
                }
            }
        } else {
            self.route_buckets();
        }

        let pool = match self.cfg.threads {
            0 => None,
            n => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        IndexError::InvalidParameter(format!("worker pool: {e}"))
                    })?,
            ),
        };
        let workers = match &pool {
            Some(p) => p.current_num_threads(),
            None => rayon::current_num_threads(),
        };
        let parts = partition_buckets(&self.boundaries, workers);
        let sizes: Vec<usize> = parts
            .iter()
            .map(|r| (self.boundaries[r.end] - self.boundaries[r.start]) as usize)
            .collect();
        let key_bits = self.codec.key_bits(self.cfg.hash_bits);

        // (a) sort each bucket's range, one contiguous run of buckets per
        // worker, and collect per-run occurrence counts for the histogram
        let histogram = {
            let bounds = &self.boundaries;
            let key_chunks = split_mut_by(&mut self.keys, &sizes);
            let val_chunks = split_mut_by(&mut self.values, &sizes);
            let work = || {
                key_chunks
                    .into_par_iter()
                    .zip(val_chunks)
                    .zip(&parts)
                    .map(|((ks, vs), part)| {
                        let freqs = sort_chunk(ks, vs, part.clone(), bounds, key_bits);
                        FrequencyHistogram::from_individual_frequencies(&freqs)
                    })
                    .collect::<Vec<_>>()
            };
            let partials = match &pool {
                Some(p) => p.install(work),
                None => work(),
            };
            partials
                .iter()
                .fold(FrequencyHistogram::new(), |acc, h| {
                    FrequencyHistogram::merge(&acc, h)
                })
        };

        // filter threshold derivation sees the pre-compaction statistics
        if let Some(f) = &mut self.filter {
            f.initialize(&FreezeStats {
                histogram: &histogram,
                total_entries: total,
            })?;
        }

        // (c) compact retained runs to the front of each bucket
        let outcomes = {
            let bounds = &self.boundaries;
            let codec = self.codec;
            let key_chunks = split_mut_by(&mut self.keys, &sizes);
            let val_chunks = split_mut_by(&mut self.values, &sizes);
            let filters: Vec<Option<Box<dyn FilterPolicy<W>>>> = parts
                .iter()
                .map(|_| self.filter.as_ref().map(|f| f.thread_clone()))
                .collect();
            let work = || {
                key_chunks
                    .into_par_iter()
                    .zip(val_chunks)
                    .zip(&parts)
                    .zip(filters)
                    .map(|(((ks, vs), part), f)| {
                        compact_chunk(ks, vs, part.clone(), bounds, codec, f.as_deref())
                    })
                    .collect::<Vec<_>>()
            };
            match &pool {
                Some(p) => p.install(work),
                None => work(),
            }
        };

        // slide compacted bucket prefixes to the global front
        let mut new_bounds = vec![0u64; self.buckets + 1];
        let mut write = 0u64;
        for (part, out) in parts.iter().zip(&outcomes) {
            for (i, b) in part.clone().enumerate() {
                let start = self.boundaries[b] as usize;
                let len = out.lens[i] as usize;
                if len > 0 && write as usize != start {
                    self.keys.copy_within(start..start + len, write as usize);
                    self.values.copy_within(start..start + len, write as usize);
                }
                write += len as u64;
                new_bounds[b + 1] = write;
            }
        }
        self.boundaries = new_bounds;
        // (e) trim backing storage to the occupied length
        self.keys.truncate(write as usize);
        self.keys.shrink_to_fit();
        self.values.truncate(write as usize);
        self.values.shrink_to_fit();
        self.cursors = Vec::new();

        self.stats.entries = write;
        self.stats.hashes = outcomes.iter().map(|o| o.hashes).sum();
        self.stats.max_occurrences = outcomes.iter().map(|o| o.max_occ).max().unwrap_or(0);
        for out in &outcomes {
            for (bin, v) in self.stats.occ_bins.iter_mut().zip(out.bins) {
                *bin += v;
            }
        }
        self.stats.histogram = histogram;

        // (d) existence bit vector over retained, decompressed hashes
        if self.cfg.presence {
            let mut pres = HashBits::new(self.cfg.hash_bits, self.cfg.presence_addr_bits())?;
            for b in 0..self.buckets {
                let lo = self.boundaries[b] as usize;
                let hi = self.boundaries[b + 1] as usize;
                let mut i = lo;
                while i < hi {
                    pres.set(self.codec.decode(b as u64, self.keys[i]));
                    let mut j = i + 1;
                    while j < hi && self.keys[j] == self.keys[i] {
                        j += 1;
                    }
                    i = j;
                }
            }
            self.presence = Some(pres);
        }

        self.phase = Phase::Frozen;
        debug!(
            "froze index: {} entries retained of {} added, {} distinct hashes, max occurrence {}",
            self.stats.entries, self.stats.entries_added, self.stats.hashes,
            self.stats.max_occurrences
        );
        Ok(())
    }

    /// Plain variant: counting-sort entries into bucket-major order and
    /// compute the boundary table (count -> prefix sum -> cursor).
    fn route_buckets(&mut self) {
        let mut counts = vec![0u64; self.buckets];
        for &k in &self.keys {
            counts[self.bucket_of(k)] += 1;
        }
        let mut bounds = Vec::with_capacity(self.buckets + 1);
        bounds.push(0u64);
        let mut sum = 0u64;
        for &c in &counts {
            sum += c;
            bounds.push(sum);
        }
        let mut cursors: Vec<u64> = bounds[..self.buckets].to_vec();
        let mut keys = vec![W::ZERO; self.keys.len()];
        let mut values = vec![0u64; self.values.len()];
        for i in 0..self.keys.len() {
            let b = self.bucket_of(self.keys[i]);
            let pos = cursors[b] as usize;
            keys[pos] = self.keys[i];
            values[pos] = self.values[i];
            cursors[b] += 1;
        }
        self.keys = keys;
        self.values = values;
        self.boundaries = bounds;
    }

    #[inline]
    fn require_frozen(&self, op: &'static str) -> Result<(), IndexError> {
        if self.phase == Phase::Frozen {
            Ok(())
        } else {
            Err(IndexError::IllegalState {
                op,
                phase: self.phase.name(),
            })
        }
    }

    /// Storage range of the equal run for `hash`, if retained. Frozen only.
    fn run_of(&self, hash: W) -> Option<Range<usize>> {
        if let Some(p) = &self.presence {
            if !p.get(hash) {
                return None;
            }
        }
        let b = self.bucket_of(hash);
        let lo = self.boundaries[b] as usize;
        let hi = self.boundaries[b + 1] as usize;
        let slice = &self.keys[lo..hi];
        let stored = self.codec.stored(hash);
        let pos = binary_search(slice, &stored)?;
        // widen to the full equal run
        let mut start = pos;
        while start > 0 && slice[start - 1] == stored {
            start -= 1;
        }
        let mut end = pos + 1;
        while end < slice.len() && slice[end] == stored {
            end += 1;
        }
        Some(lo + start..lo + end)
    }

    /// Visit every id associated with `hash` in storage order; the visitor
    /// returns `false` to stop early. Returns the number of ids visited.
    pub fn search<F: FnMut(u64) -> bool>(&self, hash: W, mut found: F) -> Result<u64, IndexError> {
        self.require_frozen("search")?;
        let Some(run) = self.run_of(hash) else {
            return Ok(0);
        };
        let mut visited = 0u64;
        for &id in &self.values[run] {
            visited += 1;
            if !found(id) {
                break;
            }
        }
        Ok(visited)
    }

    /// Visit every retained `(hash, id)` pair in bucket-major (ascending hash)
    /// order. No early-stop signal.
    pub fn scan<F: FnMut(W, u64)>(&self, mut found: F) -> Result<(), IndexError> {
        self.require_frozen("scan")?;
        for b in 0..self.buckets {
            let lo = self.boundaries[b] as usize;
            let hi = self.boundaries[b + 1] as usize;
            for i in lo..hi {
                found(self.codec.decode(b as u64, self.keys[i]), self.values[i]);
            }
        }
        Ok(())
    }

    /// Whether `hash` was retained.
    pub fn contains(&self, hash: W) -> Result<bool, IndexError> {
        self.require_frozen("contains")?;
        Ok(self.run_of(hash).is_some())
    }

    /// Number of ids associated with `hash`.
    pub fn count(&self, hash: W) -> Result<u64, IndexError> {
        self.require_frozen("count")?;
        Ok(self.run_of(hash).map_or(0, |r| r.len() as u64))
    }

    /// Storage position of the first entry for `hash`, if retained.
    pub fn first(&self, hash: W) -> Result<Option<u64>, IndexError> {
        self.require_frozen("first")?;
        Ok(self.run_of(hash).map(|r| r.start as u64))
    }

    /// Decompressed hash at storage position `pos`.
    pub fn get_hash(&self, pos: u64) -> Result<W, IndexError> {
        self.require_frozen("get_hash")?;
        let len = self.keys.len() as u64;
        if pos >= len {
            return Err(IndexError::RangeViolation { pos, len });
        }
        let b = bracket(&self.boundaries, pos);
        Ok(self.codec.decode(b as u64, self.keys[pos as usize]))
    }

    /// Id at storage position `pos`.
    pub fn get_value(&self, pos: u64) -> Result<u64, IndexError> {
        self.require_frozen("get_value")?;
        let len = self.values.len() as u64;
        if pos >= len {
            return Err(IndexError::RangeViolation { pos, len });
        }
        Ok(self.values[pos as usize])
    }

    /// Retained entries (occupied storage length). Never fails.
    pub fn number_entries(&self) -> u64 {
        self.keys.len() as u64
    }

    /// Distinct retained hashes. Never fails; 0 before freeze.
    pub fn number_hashes(&self) -> u64 {
        self.stats.hashes
    }

    /// Largest retained occurrence count. 0 before freeze.
    pub fn max_occurrences(&self) -> u64 {
        self.stats.max_occurrences
    }

    /// Entries routed through `add` placement (pre-filter volume).
    pub fn entries_added(&self) -> u64 {
        self.stats.entries_added
    }

    /// Raw (pre-filter) occurrence-frequency histogram from the last freeze.
    pub fn frequency_histogram(&self) -> &FrequencyHistogram {
        &self.stats.histogram
    }

    /// Existence bit vector, when configured and frozen.
    pub fn presence(&self) -> Option<&HashBits> {
        self.presence.as_ref()
    }

    /// Whether the index has reached `FROZEN`.
    pub fn is_frozen(&self) -> bool {
        self.phase == Phase::Frozen
    }

    /// Human-readable statistics line. Never fails; degrades to a placeholder
    /// before freeze.
    pub fn stats_string(&self) -> String {
        if self.phase != Phase::Frozen {
            return "index statistics unavailable (not frozen)".to_string();
        }
        format!(
            "entries {} (added {}), distinct hashes {}, max occurrence {}, buckets {}, occurrence bins {:?}",
            self.stats.entries,
            self.stats.entries_added,
            self.stats.hashes,
            self.stats.max_occurrences,
            self.buckets,
            self.stats.occ_bins,
        )
    }
}

/// Contiguous bucket ranges with roughly balanced entry counts, one per
/// worker. Always covers every bucket; never returns an empty partitioning.
fn partition_buckets(boundaries: &[u64], workers: usize) -> Vec<Range<usize>> {
    let buckets = boundaries.len() - 1;
    let total = boundaries[buckets];
    let workers = workers.clamp(1, buckets.max(1));
    let target = (total.div_ceil(workers as u64)).max(1);
    let mut parts = Vec::with_capacity(workers);
    let mut start = 0usize;
    let mut acc = 0u64;
    for b in 0..buckets {
        acc += boundaries[b + 1] - boundaries[b];
        if acc >= target && parts.len() + 1 < workers {
            parts.push(start..b + 1);
            start = b + 1;
            acc = 0;
        }
    }
    if start < buckets || parts.is_empty() {
        parts.push(start..buckets);
    }
    parts
}

/// Split one mutable slice into consecutive disjoint sub-slices of `sizes`.
fn split_mut_by<'a, T>(mut s: &'a mut [T], sizes: &[usize]) -> Vec<&'a mut [T]> {
    let mut out = Vec::with_capacity(sizes.len());
    for &n in sizes {
        let (head, tail) = s.split_at_mut(n);
        out.push(head);
        s = tail;
    }
    out
}

/// Sort each bucket range of one worker's chunk and return the per-run
/// occurrence counts observed. Slice offsets are chunk-local.
fn sort_chunk<W: HashWord>(
    keys: &mut [W],
    ids: &mut [u64],
    bucket_range: Range<usize>,
    boundaries: &[u64],
    key_bits: u32,
) -> Vec<u64> {
    let base = boundaries[bucket_range.start];
    let mut freqs = Vec::new();
    for b in bucket_range {
        let lo = (boundaries[b] - base) as usize;
        let hi = (boundaries[b + 1] - base) as usize;
        radix_sort_pairs(&mut keys[lo..hi], &mut ids[lo..hi], key_bits);
        let mut i = lo;
        while i < hi {
            let mut j = i + 1;
            while j < hi && keys[j] == keys[i] {
                j += 1;
            }
            freqs.push((j - i) as u64);
            i = j;
        }
    }
    freqs
}

/// Per-chunk compaction outcome.
struct ChunkOutcome {
    /// Retained length per bucket, in bucket order.
    lens: Vec<u64>,
    hashes: u64,
    max_occ: u64,
    bins: [u64; OCC_BINS],
}

/// Collapse equal-key runs within each bucket of one worker's chunk, dropping
/// runs the filter rejects and compacting the rest to the bucket front.
fn compact_chunk<W: HashWord>(
    keys: &mut [W],
    ids: &mut [u64],
    bucket_range: Range<usize>,
    boundaries: &[u64],
    codec: KeyCodec,
    filter: Option<&dyn FilterPolicy<W>>,
) -> ChunkOutcome {
    let base = boundaries[bucket_range.start];
    let mut out = ChunkOutcome {
        lens: Vec::with_capacity(bucket_range.len()),
        hashes: 0,
        max_occ: 0,
        bins: [0u64; OCC_BINS],
    };
    for b in bucket_range {
        let lo = (boundaries[b] - base) as usize;
        let hi = (boundaries[b + 1] - base) as usize;
        let mut write = lo;
        let mut i = lo;
        while i < hi {
            let mut j = i + 1;
            while j < hi && keys[j] == keys[i] {
                j += 1;
            }
            let occ = (j - i) as u64;
            let keep = match filter {
                Some(f) => f.keep_hash(codec.decode(b as u64, keys[i]), occ),
                None => true,
            };
            if keep {
                if write != i {
                    keys.copy_within(i..j, write);
                    ids.copy_within(i..j, write);
                }
                write += j - i;
                out.hashes += 1;
                out.max_occ = out.max_occ.max(occ);
                out.bins[(occ.min(OCC_BINS as u64) - 1) as usize] += 1;
            }
            i = j;
        }
        out.lens.push((write - lo) as u64);
    }
    out
}
