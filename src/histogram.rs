//! Sparse occurrence-frequency histogram: ascending `(frequency, count)` pairs
//! meaning `count` distinct hashes occurred exactly `frequency` times. Built
//! transiently during freeze and used to derive percentile discard cutoffs.

use crate::error::IndexError;

/// One histogram row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistEntry {
    /// Occurrence frequency.
    pub frequency: u64,
    /// Distinct hashes with exactly this frequency.
    pub count: u64,
}

/// Sparse frequency histogram with strictly ascending frequencies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyHistogram {
    entries: Vec<HistEntry>,
}

impl FrequencyHistogram {
    /// Empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` hashes at `frequency`. Frequencies must arrive in
    /// non-decreasing order; a repeated frequency accumulates its count.
    pub fn add(&mut self, frequency: u64, count: u64) -> Result<(), IndexError> {
        if count == 0 {
            return Ok(());
        }
        match self.entries.last_mut() {
            Some(last) if last.frequency == frequency => {
                last.count += count;
            }
            Some(last) if last.frequency > frequency => {
                return Err(IndexError::InvalidParameter(format!(
                    "histogram frequency {frequency} after {}",
                    last.frequency
                )));
            }
            _ => self.entries.push(HistEntry { frequency, count }),
        }
        Ok(())
    }

    /// Linear two-pointer merge of two ascending histograms, combining equal
    /// frequencies.
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut out = Vec::with_capacity(a.entries.len() + b.entries.len());
        let (mut i, mut j) = (0usize, 0usize);
        while i < a.entries.len() && j < b.entries.len() {
            let (ea, eb) = (a.entries[i], b.entries[j]);
            if ea.frequency < eb.frequency {
                out.push(ea);
                i += 1;
            } else if ea.frequency > eb.frequency {
                out.push(eb);
                j += 1;
            } else {
                out.push(HistEntry {
                    frequency: ea.frequency,
                    count: ea.count + eb.count,
                });
                i += 1;
                j += 1;
            }
        }
        out.extend_from_slice(&a.entries[i..]);
        out.extend_from_slice(&b.entries[j..]);
        FrequencyHistogram { entries: out }
    }

    /// Sort and run-length-encode raw per-hash frequencies.
    pub fn from_individual_frequencies(values: &[u64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let mut h = FrequencyHistogram::new();
        for v in sorted {
            // ascending, so add cannot fail
            let _ = h.add(v, 1);
        }
        h
    }

    /// Rows, ascending by frequency.
    pub fn entries(&self) -> &[HistEntry] {
        &self.entries
    }

    /// Total entry volume: sum of `frequency * count`.
    pub fn total_volume(&self) -> u64 {
        self.entries.iter().map(|e| e.frequency * e.count).sum()
    }

    /// Distinct hashes: sum of counts.
    pub fn distinct(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// Highest frequency such that discarding all hashes with a strictly
    /// greater frequency removes at most `percent` % of `total_entries`.
    ///
    /// Scans from the highest frequency downward, accumulating
    /// `frequency * count`; the cutoff is the frequency whose inclusion would
    /// first push the running volume past the target.
    pub fn cutoff_for_discard(&self, total_entries: u64, percent: f64) -> u64 {
        let limit = total_entries as f64 * percent / 100.0;
        let mut volume = 0.0f64;
        for e in self.entries.iter().rev() {
            volume += (e.frequency * e.count) as f64;
            if volume > limit {
                return e.frequency;
            }
        }
        // Everything fits under the target; the lowest frequency caps discard.
        self.entries.first().map_or(0, |e| e.frequency)
    }
}
