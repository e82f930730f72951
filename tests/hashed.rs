use linkmap::{Error, HashConfig, HashedMap, HashedMultiMap, HashedMultiSet, HashedSet};
use std::hash::{BuildHasher, Hasher};

#[test]
fn cursor_walk_visits_insertion_order() {
    let mut m: HashedMap<&str, i32> = HashedMap::new();
    for (i, k) in ["zulu", "alpha", "mike"].into_iter().enumerate() {
        m.insert(k, i as i32);
    }

    let mut cur = m.begin();
    let mut seen = Vec::new();
    while cur != m.end() {
        seen.push(*m.get_at(cur).unwrap().0);
        cur = m.next(cur).unwrap();
    }
    assert_eq!(seen, vec!["zulu", "alpha", "mike"]);
}

#[test]
fn handles_survive_growth() {
    let mut m: HashedMap<i32, i32> = HashedMap::with_config(HashConfig {
        initial_buckets: 1,
        max_load_factor: 1.0,
    });
    let (h0, _) = m.insert(0, 1000);
    for i in 1..200 {
        m.insert(i, i);
    }
    assert!(m.bucket_count() >= 200);
    assert_eq!(m.get_at(h0), Some((&0, &1000)));
    assert_eq!(m.find(&0), Some(h0));
}

#[test]
fn reinsertion_moves_to_the_tail() {
    let mut s: HashedSet<&str> = HashedSet::new();
    s.insert("a");
    s.insert("b");
    s.insert("c");
    assert!(s.remove(&"a"));
    s.insert("a");
    let order: Vec<&str> = s.iter().copied().collect();
    assert_eq!(order, vec!["b", "c", "a"]);
}

// A hasher that buckets integers by their low three bits, so tests can
// predict collisions without depending on RandomState.
#[derive(Clone, Default)]
struct LowBits;
struct LowBitsHasher(u64);
impl BuildHasher for LowBits {
    type Hasher = LowBitsHasher;
    fn build_hasher(&self) -> Self::Hasher {
        LowBitsHasher(0)
    }
}
impl Hasher for LowBitsHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_shl(8) | u64::from(b);
        }
    }
    fn finish(&self) -> u64 {
        self.0 & 0b111
    }
}

#[test]
fn custom_hasher_controls_bucket_placement() {
    let mut m: HashedMultiMap<u8, i32, LowBits> = HashedMultiMap::with_hasher_and_config(
        LowBits,
        HashConfig {
            initial_buckets: 8,
            max_load_factor: 100.0,
        },
    );
    // 1, 9 and 17 share low bits; 2 does not.
    m.insert(1, 10);
    m.insert(2, 20);
    m.insert(9, 90);
    m.insert(17, 170);

    assert_eq!(m.bucket(&1), m.bucket(&9));
    assert_eq!(m.bucket(&1), m.bucket(&17));
    assert_ne!(m.bucket(&1), m.bucket(&2));
    assert_eq!(m.bucket_len(m.bucket(&1)), 3);

    let chain: Vec<u8> = m.bucket_iter(m.bucket(&1)).map(|(k, _)| *k).collect();
    assert_eq!(chain, vec![1, 9, 17]);

    // Global iteration is untouched by bucket geography.
    let order: Vec<u8> = m.keys().copied().collect();
    assert_eq!(order, vec![1, 2, 9, 17]);
}

#[test]
fn multiset_collision_runs() {
    let mut s: HashedMultiSet<u8, LowBits> = HashedMultiSet::with_hasher(LowBits);
    s.insert(1);
    s.insert(9);
    s.insert(1);
    s.insert(1);
    assert_eq!(s.count(&1), 3);
    assert_eq!(s.count(&9), 1);

    let b = s.bucket(&1);
    let chain: Vec<u8> = s.bucket_iter(b).map(|(k, _)| *k).collect();
    assert_eq!(chain, vec![1, 1, 1, 9], "runs stay contiguous in the chain");

    assert_eq!(s.remove_all(&1), 3);
    assert_eq!(s.len(), 1);
}

#[test]
fn rehash_and_reserve_accounting() {
    let mut m: HashedMap<i32, i32> = HashedMap::with_config(HashConfig {
        initial_buckets: 4,
        max_load_factor: 2.0,
    });
    for i in 0..6 {
        m.insert(i, i);
    }
    assert_eq!(m.max_load_factor(), 2.0);
    assert!(m.load_factor() <= m.max_load_factor());

    let before = m.bucket_count();
    m.reserve(1000);
    assert!(m.bucket_count() > before);
    assert!(m.bucket_count() as f32 * m.max_load_factor() >= 1000.0);

    // Bucket lengths always sum to the element count.
    let total: usize = (0..m.bucket_count()).map(|i| m.bucket_len(i)).sum();
    assert_eq!(total, m.len());

    assert_eq!(
        m.set_max_load_factor(-1.0).unwrap_err(),
        Error::InvalidArgument
    );
}

#[test]
fn erase_while_iterating() {
    let mut m: HashedMap<i32, i32> = HashedMap::new();
    for i in 0..10 {
        m.insert(i, i);
    }
    let mut cur = m.begin();
    while cur != m.end() {
        let k = *m.get_at(cur).unwrap().0;
        let next = m.next(cur).unwrap();
        if k % 2 == 1 {
            m.remove_at(cur).unwrap();
        }
        cur = next;
    }
    let left: Vec<i32> = m.keys().copied().collect();
    assert_eq!(left, vec![0, 2, 4, 6, 8]);
}

#[test]
fn debug_formats_in_insertion_order() {
    let mut m: HashedMap<&str, i32> = HashedMap::new();
    m.insert("b", 2);
    m.insert("a", 1);
    assert_eq!(format!("{m:?}"), r#"{"b": 2, "a": 1}"#);
}
