//! Repeat-frequency filter policies consulted during freeze-time compaction.
//!
//! A policy sees each distinct hash once, with its occurrence count, and votes
//! keep/drop. `initialize` runs once per freeze, after the raw bucket sort and
//! before compaction, with the index's frequency statistics in hand;
//! `thread_clone` hands each compaction worker an independent copy.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::encode::{canonical, encode_kmer};
use crate::engine::{HashIndex, IndexConfig};
use crate::error::IndexError;
use crate::histogram::FrequencyHistogram;
use crate::word::HashWord;

/// Freeze-time statistics handed to [`FilterPolicy::initialize`].
pub struct FreezeStats<'a> {
    /// Occurrence-frequency histogram over all raw (pre-filter) hashes.
    pub histogram: &'a FrequencyHistogram,
    /// Total raw entries in the index being frozen.
    pub total_entries: u64,
}

/// Keep/drop vote per distinct hash, consulted once per hash at compaction.
pub trait FilterPolicy<W: HashWord>: Send + Sync {
    /// Called once per freeze, before compaction. Default: nothing to derive.
    fn initialize(&mut self, _stats: &FreezeStats<'_>) -> Result<(), IndexError> {
        Ok(())
    }

    /// Whether a hash seen `occurrences` times is retained.
    fn keep_hash(&self, hash: W, occurrences: u64) -> bool;

    /// Independent copy for a parallel compaction worker.
    fn thread_clone(&self) -> Box<dyn FilterPolicy<W>>;
}

/// Keep hashes occurring at most a fixed number of times.
#[derive(Clone)]
pub struct FixedFilter {
    threshold: u64,
}

impl FixedFilter {
    /// Threshold must be positive.
    pub fn new(threshold: u64) -> Result<Self, IndexError> {
        if threshold == 0 {
            return Err(IndexError::InvalidParameter(
                "fixed filter threshold must be positive".into(),
            ));
        }
        Ok(FixedFilter { threshold })
    }
}

impl<W: HashWord> FilterPolicy<W> for FixedFilter {
    fn keep_hash(&self, _hash: W, occurrences: u64) -> bool {
        occurrences <= self.threshold
    }

    fn thread_clone(&self) -> Box<dyn FilterPolicy<W>> {
        Box::new(self.clone())
    }
}

/// Derive the threshold at freeze time from the frequency histogram and a
/// target discard percentage, clamped into `[min, max]` where those bounds are
/// positive.
#[derive(Clone)]
pub struct ProportionalFilter {
    discard_percent: f64,
    min_threshold: u64,
    max_threshold: u64,
    threshold: u64,
}

impl ProportionalFilter {
    /// `discard_percent` must lie in `(0, 100)`; a zero bound disables that
    /// side of the clamp.
    pub fn new(
        discard_percent: f64,
        min_threshold: u64,
        max_threshold: u64,
    ) -> Result<Self, IndexError> {
        if !(discard_percent > 0.0 && discard_percent < 100.0) {
            return Err(IndexError::InvalidParameter(format!(
                "discard percentage {discard_percent} outside (0, 100)"
            )));
        }
        if max_threshold > 0 && min_threshold > max_threshold {
            return Err(IndexError::InvalidParameter(format!(
                "threshold bounds inverted: [{min_threshold}, {max_threshold}]"
            )));
        }
        Ok(ProportionalFilter {
            discard_percent,
            min_threshold,
            max_threshold,
            // keep-all until initialized
            threshold: u64::MAX,
        })
    }

    /// Threshold in effect (after `initialize`).
    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

impl<W: HashWord> FilterPolicy<W> for ProportionalFilter {
    fn initialize(&mut self, stats: &FreezeStats<'_>) -> Result<(), IndexError> {
        let mut t = stats
            .histogram
            .cutoff_for_discard(stats.total_entries, self.discard_percent);
        if self.min_threshold > 0 {
            t = t.max(self.min_threshold);
        }
        if self.max_threshold > 0 {
            t = t.min(self.max_threshold);
        }
        log::debug!(
            "proportional filter: cutoff {} for {}% of {} entries",
            t,
            self.discard_percent,
            stats.total_entries
        );
        self.threshold = t;
        Ok(())
    }

    fn keep_hash(&self, _hash: W, occurrences: u64) -> bool {
        occurrences <= self.threshold
    }

    fn thread_clone(&self) -> Box<dyn FilterPolicy<W>> {
        Box::new(self.clone())
    }
}

/// Drop hashes listed in an externally supplied bad-hash set, regardless of
/// their occurrence count. The set is held as a small frozen auxiliary index
/// built at construction time.
pub struct BlacklistFilter<W: HashWord> {
    bad: Arc<HashIndex<W>>,
}

impl<W: HashWord> Clone for BlacklistFilter<W> {
    fn clone(&self) -> Self {
        BlacklistFilter {
            bad: Arc::clone(&self.bad),
        }
    }
}

impl<W: HashWord> BlacklistFilter<W> {
    /// Build the auxiliary membership index from `hash_bits`-wide bad hashes.
    pub fn from_hashes(hashes: &[W], hash_bits: u32) -> Result<Self, IndexError> {
        let cfg = IndexConfig::new(hashes.len().max(1) as u64, hash_bits)
            .with_bucket_bits(hash_bits.min(8))
            .with_presence(true);
        let mut bad = HashIndex::new(cfg)?;
        for &h in hashes {
            bad.add(h, 0)?;
        }
        bad.freeze()?;
        Ok(BlacklistFilter { bad: Arc::new(bad) })
    }

    /// Number of blacklisted hashes.
    pub fn len(&self) -> u64 {
        self.bad.number_hashes()
    }

    /// Whether the blacklist is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<W: HashWord> FilterPolicy<W> for BlacklistFilter<W> {
    fn keep_hash(&self, hash: W, _occurrences: u64) -> bool {
        // the auxiliary index is frozen by construction, contains cannot fail
        !self.bad.contains(hash).unwrap_or(false)
    }

    fn thread_clone(&self) -> Box<dyn FilterPolicy<W>> {
        Box::new(self.clone())
    }
}

/// Conjunction of delegate policies: a hash is kept only when every delegate
/// votes to keep it.
pub struct UnionFilter<W: HashWord> {
    members: Vec<Box<dyn FilterPolicy<W>>>,
}

impl<W: HashWord> UnionFilter<W> {
    /// At least one delegate is required.
    pub fn new(members: Vec<Box<dyn FilterPolicy<W>>>) -> Result<Self, IndexError> {
        if members.is_empty() {
            return Err(IndexError::InvalidParameter(
                "union filter needs at least one member".into(),
            ));
        }
        Ok(UnionFilter { members })
    }
}

impl<W: HashWord> FilterPolicy<W> for UnionFilter<W> {
    fn initialize(&mut self, stats: &FreezeStats<'_>) -> Result<(), IndexError> {
        for m in &mut self.members {
            m.initialize(stats)?;
        }
        Ok(())
    }

    fn keep_hash(&self, hash: W, occurrences: u64) -> bool {
        self.members.iter().all(|m| m.keep_hash(hash, occurrences))
    }

    fn thread_clone(&self) -> Box<dyn FilterPolicy<W>> {
        Box::new(UnionFilter {
            members: self.members.iter().map(|m| m.thread_clone()).collect(),
        })
    }
}

/// Load a flat `(k-mer text, occurrence count)` listing, one record per line,
/// whitespace-separated, `#` comments and blank lines skipped. K-mers are
/// canonicalized and records below `min_count` are dropped.
pub fn load_blacklist(path: &Path, k: usize, min_count: u64) -> Result<Vec<u64>, IndexError> {
    if k == 0 || k > 32 {
        return Err(IndexError::InvalidParameter(format!(
            "blacklist word size {k} outside 1..=32"
        )));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut hashes = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (text, count) = match (parts.next(), parts.next()) {
            (Some(t), Some(c)) => (t, c),
            _ => {
                return Err(IndexError::Parse(format!(
                    "line {}: expected <kmer> <count>",
                    lineno + 1
                )));
            }
        };
        let count: u64 = count
            .parse()
            .map_err(|_| IndexError::Parse(format!("line {}: bad count {count:?}", lineno + 1)))?;
        if count < min_count {
            continue;
        }
        if text.len() != k {
            return Err(IndexError::Parse(format!(
                "line {}: k-mer length {} != {k}",
                lineno + 1,
                text.len()
            )));
        }
        let code = encode_kmer(text.as_bytes()).ok_or_else(|| {
            IndexError::Parse(format!("line {}: unencodable k-mer {text:?}", lineno + 1))
        })?;
        hashes.push(canonical(code, k));
    }
    hashes.sort_unstable();
    hashes.dedup();
    Ok(hashes)
}
