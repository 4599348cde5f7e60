use hashdex::encode::*;

#[test]
fn test_encode_revcomp_canonical() {
    let s = b"AC";
    let k = 2;
    let code = encode_kmer(s).unwrap();
    assert_eq!(code, 0b0001);

    let rc = revcomp(code, k);
    assert_eq!(rc, 0b1011); // GT

    // AC sorts below GT
    assert_eq!(canonical(code, k), 0b0001);
    assert_eq!(canonical(rc, k), 0b0001);
}

#[test]
fn test_map_base_and_ambiguity() {
    assert_eq!(map_base(b'a'), Some(0));
    assert_eq!(map_base(b'T'), Some(3));
    assert_eq!(map_base(b'U'), Some(3));
    assert_eq!(map_base(b'N'), None);

    assert!(encode_kmer(b"ACGN").is_none());
    assert!(encode_kmer(b"").is_none());
    assert!(encode_kmer(&[b'A'; 33]).is_none());
}

#[test]
fn test_palindrome_is_its_own_canonical() {
    let code = encode_kmer(b"ACGT").unwrap();
    assert_eq!(revcomp(code, 4), code);
    assert_eq!(canonical(code, 4), code);
}
