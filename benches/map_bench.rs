use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use linkmap::{Handle, HashedMap, OrderedMap};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_ordered_insert_100k(c: &mut Criterion) {
    c.bench_function("ordered::insert_random_100k", |b| {
        b.iter_batched(
            OrderedMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_ordered_find_hit_10k(c: &mut Criterion) {
    c.bench_function("ordered::find_hit_10k_on_100k", |b| {
        let mut m: OrderedMap<String, u64> = OrderedMap::new();
        let keys: Vec<_> = lcg(7).take(100_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_ordered_remove_10k(c: &mut Criterion) {
    c.bench_function("ordered::remove_at_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m: OrderedMap<String, u64> = OrderedMap::new();
                let handles: Vec<Handle> = lcg(5)
                    .take(110_000)
                    .enumerate()
                    .map(|(i, x)| m.insert(key(x), i as u64).0)
                    .collect();
                let n = handles.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let to_remove: Vec<Handle> = sel.into_iter().map(|i| handles[i]).collect();
                (m, to_remove)
            },
            |(mut m, to_remove)| {
                for h in to_remove {
                    let _ = m.remove_at(h);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_ordered_iter_100k(c: &mut Criterion) {
    c.bench_function("ordered::iter_all_100k", |b| {
        let mut m: OrderedMap<String, u64> = OrderedMap::new();
        for (i, x) in lcg(999).take(100_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_hashed_insert_100k(c: &mut Criterion) {
    c.bench_function("hashed::insert_fresh_100k", |b| {
        b.iter_batched(
            HashedMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_hashed_insert_reserved_100k(c: &mut Criterion) {
    c.bench_function("hashed::insert_reserved_100k", |b| {
        b.iter_batched(
            || {
                let mut m = HashedMap::<String, u64>::new();
                m.reserve(100_000);
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_hashed_find_hit_10k(c: &mut Criterion) {
    c.bench_function("hashed::find_hit_10k_on_100k", |b| {
        let mut m: HashedMap<String, u64> = HashedMap::new();
        let keys: Vec<_> = lcg(7).take(100_000).map(key).collect();
        for (i, k) in keys.iter().enumerate() {
            m.insert(k.clone(), i as u64);
        }
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_hashed_find_miss_10k(c: &mut Criterion) {
    c.bench_function("hashed::find_miss_10k_on_100k", |b| {
        let mut m: HashedMap<String, u64> = HashedMap::new();
        for (i, x) in lcg(11).take(100_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(m.find(k.as_str()));
            }
        })
    });
}

fn bench_hashed_iter_100k(c: &mut Criterion) {
    c.bench_function("hashed::iter_all_100k", |b| {
        let mut m: HashedMap<String, u64> = HashedMap::new();
        for (i, x) in lcg(999).take(100_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_ordered;
    config = bench_config();
    targets = bench_ordered_insert_100k,
              bench_ordered_find_hit_10k,
              bench_ordered_remove_10k,
              bench_ordered_iter_100k
}
criterion_group! {
    name = benches_hashed;
    config = bench_config();
    targets = bench_hashed_insert_100k,
              bench_hashed_insert_reserved_100k,
              bench_hashed_find_hit_10k,
              bench_hashed_find_miss_10k,
              bench_hashed_iter_100k
}
criterion_main!(benches_ordered, benches_hashed);
