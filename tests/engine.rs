use hashdex::engine::{HashIndex, IndexConfig};
use hashdex::error::IndexError;
use hashdex::filter::{BlacklistFilter, FilterPolicy, FixedFilter, ProportionalFilter, UnionFilter};

/// Scenario data: hashes [5,5,5,9,9,2] with ids [0..6].
const PAIRS: [(u64, u64); 6] = [(5, 0), (5, 1), (5, 2), (9, 3), (9, 4), (2, 5)];

fn scan_pairs(idx: &HashIndex) -> Vec<(u64, u64)> {
    let mut out = Vec::new();
    idx.scan(|h, id| out.push((h, id))).unwrap();
    out
}

fn search_ids(idx: &HashIndex, hash: u64) -> Vec<u64> {
    let mut out = Vec::new();
    idx.search(hash, |id| {
        out.push(id);
        true
    })
    .unwrap();
    out
}

#[test]
fn test_plain_single_bucket_lifecycle() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(0);
    let mut idx = HashIndex::new(cfg).unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    idx.freeze().unwrap();

    assert_eq!(
        scan_pairs(&idx),
        vec![(2, 5), (5, 0), (5, 1), (5, 2), (9, 3), (9, 4)]
    );
    assert_eq!(search_ids(&idx, 5), vec![0, 1, 2]);
    assert_eq!(search_ids(&idx, 7), Vec::<u64>::new());
    assert_eq!(idx.count(9).unwrap(), 2);
    assert_eq!(idx.count(7).unwrap(), 0);
    assert_eq!(idx.number_hashes(), 3);
    assert_eq!(idx.number_entries(), 6);
    assert_eq!(idx.max_occurrences(), 3);
}

#[test]
fn test_compressed_two_phase_matches_plain() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(2).compressed(true);
    let mut idx = HashIndex::new(cfg).unwrap();
    // counting pass
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    idx.freeze().unwrap();
    // identical placement pass
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    idx.freeze().unwrap();

    assert_eq!(
        scan_pairs(&idx),
        vec![(2, 5), (5, 0), (5, 1), (5, 2), (9, 3), (9, 4)]
    );
    assert_eq!(search_ids(&idx, 5), vec![0, 1, 2]);
    assert!(idx.contains(2).unwrap());
    assert!(!idx.contains(6).unwrap());
    assert_eq!(idx.number_entries(), 6);
    assert_eq!(idx.number_hashes(), 3);
}

#[test]
fn test_fixed_filter_discards_whole_posting_list() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(0);
    let filter = Box::new(FixedFilter::new(2).unwrap());
    let mut idx = HashIndex::with_filter(cfg, filter).unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    idx.freeze().unwrap();

    // hash 5 occurred 3 times and is gone entirely
    assert_eq!(idx.number_entries(), 3);
    assert!(!idx.contains(5).unwrap());
    assert_eq!(scan_pairs(&idx), vec![(2, 5), (9, 3), (9, 4)]);
    assert_eq!(idx.entries_added(), 6);
}

#[test]
fn test_compressed_capacity_exceeded_at_final_freeze() {
    let cfg = IndexConfig::new(4, 4).with_bucket_bits(1).compressed(true);
    let mut idx = HashIndex::new(cfg).unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    // layout freeze accepts the counts
    idx.freeze().unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    let err = idx.freeze().unwrap_err();
    assert!(matches!(err, IndexError::CapacityExceeded(_)));
}

#[test]
fn test_plain_capacity_exceeded_at_freeze() {
    let cfg = IndexConfig::new(3, 4).with_bucket_bits(0);
    let mut idx = HashIndex::new(cfg).unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    assert!(matches!(
        idx.freeze(),
        Err(IndexError::CapacityExceeded(_))
    ));
}

#[test]
fn test_lifecycle_violations() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(0);
    let mut idx: HashIndex = HashIndex::new(cfg).unwrap();
    idx.add(1, 0).unwrap();

    // queries before freeze
    assert!(matches!(
        idx.contains(1),
        Err(IndexError::IllegalState { .. })
    ));
    assert!(matches!(
        idx.search(1, |_| true),
        Err(IndexError::IllegalState { .. })
    ));
    assert!(matches!(idx.scan(|_, _| ()), Err(IndexError::IllegalState { .. })));
    assert!(matches!(idx.get_hash(0), Err(IndexError::IllegalState { .. })));

    idx.freeze().unwrap();

    // add after freeze, double freeze
    assert!(matches!(idx.add(2, 1), Err(IndexError::IllegalState { .. })));
    assert!(matches!(idx.freeze(), Err(IndexError::IllegalState { .. })));
}

#[test]
fn test_positional_accessors_and_range_violation() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(2).compressed(true);
    let mut idx = HashIndex::new(cfg).unwrap();
    for _ in 0..2 {
        for (h, id) in PAIRS {
            idx.add(h, id).unwrap();
        }
        idx.freeze().unwrap();
    }

    // storage order is ascending hash: 2,5,5,5,9,9
    let hashes: Vec<u64> = (0..6).map(|p| idx.get_hash(p).unwrap()).collect();
    assert_eq!(hashes, vec![2, 5, 5, 5, 9, 9]);
    let values: Vec<u64> = (0..6).map(|p| idx.get_value(p).unwrap()).collect();
    assert_eq!(values, vec![5, 0, 1, 2, 3, 4]);
    assert_eq!(idx.first(5).unwrap(), Some(1));
    assert_eq!(idx.first(7).unwrap(), None);
    assert!(matches!(
        idx.get_hash(6),
        Err(IndexError::RangeViolation { pos: 6, len: 6 })
    ));
}

#[test]
fn test_search_early_stop() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(0);
    let mut idx = HashIndex::new(cfg).unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    idx.freeze().unwrap();

    let mut seen = Vec::new();
    let visited = idx
        .search(5, |id| {
            seen.push(id);
            false
        })
        .unwrap();
    assert_eq!(visited, 1);
    assert_eq!(seen, vec![0]);
}

#[test]
fn test_presence_vector_soundness() {
    let cfg = IndexConfig::new(64, 16)
        .with_bucket_bits(4)
        .compressed(true)
        .with_presence_bits(8);
    let filter = Box::new(FixedFilter::new(2).unwrap());
    let mut idx: HashIndex = HashIndex::with_filter(cfg, filter).unwrap();
    let pairs: Vec<(u64, u64)> = vec![(0x1234, 0), (0x1234, 1), (0x1234, 2), (0xBEEF, 3)];
    for _ in 0..2 {
        for &(h, id) in &pairs {
            idx.add(h, id).unwrap();
        }
        idx.freeze().unwrap();
    }

    let presence = idx.presence().unwrap();
    // retained hash is flagged
    assert!(presence.get(0xBEEFu64));
    assert!(idx.contains(0xBEEF).unwrap());
    // 0x1234 was filtered out and nothing else shares its slot
    assert!(!presence.get(0x1234u64));
    assert!(!idx.contains(0x1234).unwrap());
    // no false negatives: absent bit implies absent hash
    for h in 0u64..0x200 {
        if !presence.get(h) {
            assert!(!idx.contains(h).unwrap());
        }
    }
}

#[test]
fn test_proportional_filter_end_to_end() {
    // hash 7 dominates with 6 of 10 entries; max bound forces it out
    let cfg = IndexConfig::new(32, 4).with_bucket_bits(0);
    let filter = Box::new(ProportionalFilter::new(30.0, 0, 5).unwrap());
    let mut idx: HashIndex = HashIndex::with_filter(cfg, filter).unwrap();
    for id in 0..6 {
        idx.add(7, id).unwrap();
    }
    for (id, h) in [1u64, 2, 3, 4].into_iter().enumerate() {
        idx.add(h, 100 + id as u64).unwrap();
    }
    idx.freeze().unwrap();

    assert!(!idx.contains(7).unwrap());
    assert_eq!(idx.number_entries(), 4);
    assert_eq!(idx.number_hashes(), 4);
}

#[test]
fn test_blacklist_and_union_filters_end_to_end() {
    let black =
        Box::new(BlacklistFilter::from_hashes(&[5u64], 4).unwrap()) as Box<dyn FilterPolicy<u64>>;
    let fixed = Box::new(FixedFilter::new(2).unwrap()) as Box<dyn FilterPolicy<u64>>;
    let union = UnionFilter::new(vec![fixed, black]).unwrap();

    let cfg = IndexConfig::new(16, 4).with_bucket_bits(1);
    let mut idx = HashIndex::with_filter(cfg, Box::new(union)).unwrap();
    for (h, id) in PAIRS {
        idx.add(h, id).unwrap();
    }
    idx.freeze().unwrap();

    // 5 is blacklisted (and over threshold); 9 and 2 pass both votes
    assert!(!idx.contains(5).unwrap());
    assert!(idx.contains(9).unwrap());
    assert!(idx.contains(2).unwrap());
    assert_eq!(idx.number_entries(), 3);
}

#[test]
fn test_parallel_freeze_matches_sequential() {
    let _ = env_logger::builder().is_test(true).try_init();
    let pairs: Vec<(u64, u64)> = (0..5_000u64)
        .map(|i| ((i * 2_654_435_761) % (1 << 20), i))
        .collect();

    let build = |threads: usize| {
        let cfg = IndexConfig::new(8_192, 20)
            .with_bucket_bits(6)
            .threads(threads);
        let mut idx = HashIndex::new(cfg).unwrap();
        for &(h, id) in &pairs {
            idx.add(h, id).unwrap();
        }
        idx.freeze().unwrap();
        idx
    };

    let seq = build(1);
    let par = build(4);
    let mut a = Vec::new();
    seq.scan(|h, id| a.push((h, id))).unwrap();
    let mut b = Vec::new();
    par.scan(|h, id| b.push((h, id))).unwrap();
    assert_eq!(a, b);
    assert_eq!(seq.number_hashes(), par.number_hashes());
}

#[test]
fn test_scan_is_sorted_and_remainders_contiguous() {
    let pairs: Vec<(u64, u64)> = (0..2_000u64)
        .map(|i| ((i * 48_271) % 512, i))
        .collect();
    let cfg = IndexConfig::new(4_096, 9).with_bucket_bits(3).compressed(true);
    let mut idx = HashIndex::new(cfg).unwrap();
    for _ in 0..2 {
        for &(h, id) in &pairs {
            idx.add(h, id).unwrap();
        }
        idx.freeze().unwrap();
    }

    let mut last: Option<u64> = None;
    let mut seen = std::collections::BTreeSet::new();
    idx.scan(|h, _| {
        if let Some(prev) = last {
            assert!(h >= prev, "scan must be non-decreasing in hash");
        }
        seen.insert(h);
        last = Some(h);
    })
    .unwrap();
    assert_eq!(seen.len() as u64, idx.number_hashes());
    // every hash decompresses back through get_hash at each of its positions
    for pos in 0..idx.number_entries() {
        let h = idx.get_hash(pos).unwrap();
        assert!(idx.contains(h).unwrap());
    }
}

#[test]
fn test_extended_multiword_hashes() {
    // 72-bit hashes: bucket addressing consumes bits above the native word
    let cfg = IndexConfig::new(16, 72).with_bucket_bits(12).compressed(true);
    let mut idx: HashIndex<u128> = HashIndex::new(cfg).unwrap();
    let h1 = (1u128 << 70) | 5;
    let h2 = 3u128;
    let pairs = [(h1, 0u64), (h1, 1), (h2, 2)];
    for _ in 0..2 {
        for &(h, id) in &pairs {
            idx.add(h, id).unwrap();
        }
        idx.freeze().unwrap();
    }

    assert_eq!(idx.count(h1).unwrap(), 2);
    assert!(idx.contains(h2).unwrap());
    assert!(!idx.contains(7u128).unwrap());
    let mut out = Vec::new();
    idx.scan(|h, id| out.push((h, id))).unwrap();
    assert_eq!(out, vec![(h2, 2), (h1, 0), (h1, 1)]);
    assert_eq!(idx.get_hash(1).unwrap(), h1);
}

#[test]
fn test_full_width_hash_single_bucket() {
    // hash width equal to the word width with one bucket: the bucket shift
    // degenerates to the full word and must route everything to bucket 0
    let pairs = [(u64::MAX, 0u64), (u64::MAX, 1), (3u64, 2)];

    let cfg = IndexConfig::new(8, 64).with_bucket_bits(0);
    let mut plain = HashIndex::new(cfg).unwrap();
    for &(h, id) in &pairs {
        plain.add(h, id).unwrap();
    }
    plain.freeze().unwrap();
    assert_eq!(plain.count(u64::MAX).unwrap(), 2);
    assert_eq!(search_ids(&plain, u64::MAX), vec![0, 1]);
    assert_eq!(
        scan_pairs(&plain),
        vec![(3, 2), (u64::MAX, 0), (u64::MAX, 1)]
    );

    let cfg = IndexConfig::new(8, 64).with_bucket_bits(0).compressed(true);
    let mut comp = HashIndex::new(cfg).unwrap();
    for _ in 0..2 {
        for &(h, id) in &pairs {
            comp.add(h, id).unwrap();
        }
        comp.freeze().unwrap();
    }
    assert_eq!(scan_pairs(&comp), scan_pairs(&plain));
    assert!(comp.contains(u64::MAX).unwrap());
    assert!(!comp.contains(7).unwrap());
    assert_eq!(comp.get_hash(2).unwrap(), u64::MAX);
}

#[test]
fn test_stats_string_degrades_before_freeze() {
    let cfg = IndexConfig::new(16, 4).with_bucket_bits(0);
    let mut idx: HashIndex = HashIndex::new(cfg).unwrap();
    assert!(idx.stats_string().contains("unavailable"));
    idx.add(1, 0).unwrap();
    idx.freeze().unwrap();
    let s = idx.stats_string();
    assert!(s.contains("entries 1"));
    assert!(s.contains("distinct hashes 1"));
}

#[test]
fn test_config_validation() {
    assert!(HashIndex::<u64>::new(IndexConfig::new(0, 4)).is_err());
    assert!(HashIndex::<u64>::new(IndexConfig::new(4, 0)).is_err());
    assert!(HashIndex::<u64>::new(IndexConfig::new(4, 65)).is_err());
    assert!(HashIndex::<u64>::new(IndexConfig::new(4, 16).with_bucket_bits(33)).is_err());
    // bucket width above hash width is clamped, not rejected
    assert!(HashIndex::<u64>::new(IndexConfig::new(4, 4).with_bucket_bits(8)).is_ok());
}
