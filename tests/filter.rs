use hashdex::filter::{
    BlacklistFilter, FilterPolicy, FixedFilter, FreezeStats, ProportionalFilter, UnionFilter,
    load_blacklist,
};
use hashdex::histogram::FrequencyHistogram;

fn hist(pairs: &[(u64, u64)]) -> FrequencyHistogram {
    let mut h = FrequencyHistogram::new();
    for &(f, c) in pairs {
        h.add(f, c).unwrap();
    }
    h
}

#[test]
fn test_fixed_filter_votes_by_threshold() {
    let f = FixedFilter::new(2).unwrap();
    assert!(FilterPolicy::<u64>::keep_hash(&f, 5, 1));
    assert!(FilterPolicy::<u64>::keep_hash(&f, 5, 2));
    assert!(!FilterPolicy::<u64>::keep_hash(&f, 5, 3));
}

#[test]
fn test_fixed_filter_rejects_zero_threshold() {
    assert!(FixedFilter::new(0).is_err());
}

#[test]
fn test_proportional_filter_derives_cutoff() {
    // 2 hashes at frequency 100 carry 200 of 1250 entries
    let h = hist(&[(1, 1000), (10, 5), (100, 2)]);
    let mut f = ProportionalFilter::new(10.0, 0, 0).unwrap();
    FilterPolicy::<u64>::initialize(
        &mut f,
        &FreezeStats { histogram: &h, total_entries: 1250 },
    )
    .unwrap();
    assert_eq!(f.threshold(), 100);
    assert!(FilterPolicy::<u64>::keep_hash(&f, 7, 100));
    assert!(!FilterPolicy::<u64>::keep_hash(&f, 7, 101));
}

#[test]
fn test_proportional_filter_clamps_to_min_threshold() {
    // computed cutoff would be 1; min bound lifts it to 3
    let h = hist(&[(1, 10)]);
    let mut f = ProportionalFilter::new(50.0, 3, 0).unwrap();
    FilterPolicy::<u64>::initialize(
        &mut f,
        &FreezeStats { histogram: &h, total_entries: 10 },
    )
    .unwrap();
    assert_eq!(f.threshold(), 3);
}

#[test]
fn test_proportional_filter_clamps_to_max_threshold() {
    let h = hist(&[(1, 1), (50, 1)]);
    let mut f = ProportionalFilter::new(1.0, 0, 20).unwrap();
    FilterPolicy::<u64>::initialize(
        &mut f,
        &FreezeStats { histogram: &h, total_entries: 51 },
    )
    .unwrap();
    assert_eq!(f.threshold(), 20);
}

#[test]
fn test_proportional_filter_parameter_validation() {
    assert!(ProportionalFilter::new(0.0, 0, 0).is_err());
    assert!(ProportionalFilter::new(100.0, 0, 0).is_err());
    assert!(ProportionalFilter::new(10.0, 5, 2).is_err());
}

#[test]
fn test_blacklist_filter_ignores_occurrence_count() {
    let f = BlacklistFilter::from_hashes(&[5u64, 9], 8).unwrap();
    assert_eq!(f.len(), 2);
    assert!(!f.keep_hash(5u64, 1));
    assert!(!f.keep_hash(9u64, 1_000));
    assert!(f.keep_hash(7u64, 1_000_000));
}

#[test]
fn test_union_filter_is_a_conjunction() {
    let fixed = Box::new(FixedFilter::new(2).unwrap()) as Box<dyn FilterPolicy<u64>>;
    let black =
        Box::new(BlacklistFilter::from_hashes(&[5u64], 8).unwrap()) as Box<dyn FilterPolicy<u64>>;
    let u = UnionFilter::new(vec![fixed, black]).unwrap();
    assert!(u.keep_hash(9u64, 2)); // passes both
    assert!(!u.keep_hash(9u64, 3)); // fixed drops
    assert!(!u.keep_hash(5u64, 1)); // blacklist drops
}

#[test]
fn test_union_filter_requires_members() {
    assert!(UnionFilter::<u64>::new(Vec::new()).is_err());
}

#[test]
fn test_thread_clone_votes_identically() {
    let f = FixedFilter::new(3).unwrap();
    let c = FilterPolicy::<u64>::thread_clone(&f);
    assert_eq!(
        FilterPolicy::<u64>::keep_hash(&f, 1, 3),
        c.keep_hash(1, 3)
    );
    assert_eq!(
        FilterPolicy::<u64>::keep_hash(&f, 1, 4),
        c.keep_hash(1, 4)
    );
}

#[test]
fn test_load_blacklist_filters_and_canonicalizes() {
    let path = std::env::temp_dir().join(format!("hashdex_blacklist_{}.txt", std::process::id()));
    std::fs::write(
        &path,
        "# known repeats, word size 4\nACGT 12\nAAAA 1\nTTTT 30\n\n",
    )
    .unwrap();
    let hashes = load_blacklist(&path, 4, 10).unwrap();
    std::fs::remove_file(&path).ok();
    // AAAA falls below min_count; TTTT canonicalizes to AAAA's code (0)
    let acgt = hashdex::encode::encode_kmer(b"ACGT").unwrap();
    assert_eq!(hashes, vec![0, acgt]);
}

#[test]
fn test_load_blacklist_rejects_malformed_lines() {
    let path = std::env::temp_dir().join(format!("hashdex_badlist_{}.txt", std::process::id()));
    std::fs::write(&path, "ACGT\n").unwrap();
    let res = load_blacklist(&path, 4, 0);
    std::fs::remove_file(&path).ok();
    assert!(res.is_err());
}
