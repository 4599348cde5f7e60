//! Bucketed hash index for k-mer / protein-window postings, in modern Rust
//! (edition 2024).
//!
//! The engine ingests `(hash, id)` pairs, freezes once into a sorted,
//! bucketed, optionally remainder-compressed and repeat-filtered layout, and
//! then answers point and full-scan queries from immutable storage:
//!
//! - plain variant: `add* -> freeze() -> query*`
//! - compressed variant: `add* -> freeze() -> add* (same sequence) ->
//!   freeze() -> query*`
//!
//! Repeat-frequency filtering (fixed, percentile-proportional, blacklist, or
//! their conjunction) runs during the final freeze; a configurable existence
//! bit vector gives queries a no-false-negative fast reject. A frozen index
//! is safe for unlimited concurrent readers.

pub mod bits;
pub mod encode;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hashbits;
pub mod histogram;
pub mod radix;
pub mod search;
pub mod word;

pub use bits::BitVec;
pub use engine::{HashIndex, IndexConfig, OCC_BINS};
pub use error::IndexError;
pub use filter::{
    BlacklistFilter, FilterPolicy, FixedFilter, FreezeStats, ProportionalFilter, UnionFilter,
    load_blacklist,
};
pub use hashbits::HashBits;
pub use histogram::{FrequencyHistogram, HistEntry};
pub use word::HashWord;
