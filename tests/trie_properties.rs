//! Property- and scenario-level coverage of `ZFastTrie` that doesn't belong
//! alongside the unit tests of any single module: random build/lookup
//! scenarios, serialization round trips, and the boundary behaviours the
//! design calls out explicitly.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zfast_trie::{io, BitVector, ZFastTrie};

fn bits(s: &str) -> BitVector {
    s.chars().map(|c| c == '1').collect()
}

fn random_distinct_keys(n: usize, bits_per_key: u64, seed: u64) -> Vec<BitVector> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let v: BitVector = (0..bits_per_key).map(|_| rng.gen::<bool>()).collect();
        if seen.insert(v.clone()) {
            keys.push(v);
        }
    }
    keys
}

#[test]
fn empty_trie_boundary_behaviour() {
    let t = ZFastTrie::new();
    assert!(!t.contains(&bits("0")));
    assert_eq!(t.pred(&bits("0")), None);
    assert_eq!(t.succ(&bits("0")), None);
}

#[test]
fn singleton_trie_boundary_behaviour() {
    let mut t = ZFastTrie::new();
    let k = bits("1011");
    t.add(k.clone()).unwrap();

    assert!(t.contains(&k));
    assert_eq!(t.pred(&k), Some(k.clone()));
    assert_eq!(t.succ(&k), Some(k.clone()));

    // A probe strictly below the sole leaf locates it as successor.
    assert_eq!(t.pred(&bits("0000")), None);
    assert_eq!(t.succ(&bits("0000")), Some(k.clone()));

    // A probe strictly above the sole leaf locates it as predecessor.
    assert_eq!(t.pred(&bits("1111")), Some(k.clone()));
    assert_eq!(t.succ(&bits("1111")), None);
}

#[test]
fn keys_diverging_deep_in_a_shared_prefix_stay_ordered() {
    let mut t = ZFastTrie::new();
    // Both keys share a five-bit prefix and diverge only in their last bit,
    // exercising a split right at the edge of an existing leaf's extent.
    t.add(bits("101011")).unwrap();
    t.add(bits("101000")).unwrap();
    assert!(t.contains(&bits("101011")));
    assert!(t.contains(&bits("101000")));
    assert_eq!(t.len(), 2);
    assert_eq!(t.pred(&bits("101010")), Some(bits("101000")));
    assert_eq!(t.succ(&bits("101010")), Some(bits("101011")));
}

#[test]
fn insert_idempotence_preserves_size() {
    let mut t = ZFastTrie::new();
    let keys = random_distinct_keys(200, 12, 1);
    for k in &keys {
        t.add(k.clone()).unwrap();
    }
    let size_before = t.len();
    for k in &keys {
        assert_eq!(t.add(k.clone()), Ok(false));
    }
    assert_eq!(t.len(), size_before);
}

#[test]
fn random_build_then_membership_scenario() {
    // Seed scenario 5: 1000 distinct random 10-bit strings.
    let keys = random_distinct_keys(1000, 10, 0xBEEF);
    let mut t = ZFastTrie::new();
    for k in &keys {
        assert_eq!(t.add(k.clone()), Ok(true));
    }
    assert_eq!(t.len(), keys.len());

    for k in &keys {
        assert!(t.contains(k), "{k:?} missing after insertion");
    }

    let present: HashSet<&BitVector> = keys.iter().collect();
    let mut rng = StdRng::seed_from_u64(0xFACE);
    let mut checked_absent = 0;
    while checked_absent < 500 {
        let probe: BitVector = (0..10).map(|_| rng.gen::<bool>()).collect();
        if present.contains(&probe) {
            continue;
        }
        assert!(!t.contains(&probe));
        checked_absent += 1;
    }
}

#[test]
fn serialize_then_deserialize_scenario() {
    // Seed scenario 6: serialize/deserialize round trip over a random build.
    let keys = random_distinct_keys(1000, 10, 0x1234);
    let mut t = ZFastTrie::new();
    for k in &keys {
        t.add(k.clone()).unwrap();
    }

    let mut buf = Vec::new();
    io::write(&t, &mut buf).unwrap();
    let restored = io::read(&mut buf.as_slice()).unwrap();

    assert_eq!(restored.len(), t.len());

    let mut rng = StdRng::seed_from_u64(0x5678);
    for _ in 0..1000 {
        let probe: BitVector = (0..10).map(|_| rng.gen::<bool>()).collect();
        assert_eq!(t.contains(&probe), restored.contains(&probe));
        assert_eq!(t.pred(&probe), restored.pred(&probe));
        assert_eq!(t.succ(&probe), restored.succ(&probe));
    }
}
