use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rc_treemap::{LinkedTreeSet, Owned, Scalar, StrongRef, TreeMap};
use std::sync::Arc;
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

fn bench_add_owned_strings_100k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(1).take(100_000).map(key).collect();
    c.bench_function("map::add_owned_str_100k", |b| {
        b.iter_batched(
            TreeMap::<Owned<str>, Scalar<u64>>::new,
            |mut m| {
                for (i, k) in keys.iter().enumerate() {
                    let _ = m.add(k, &(i as u64));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_and_navigate_10k(c: &mut Criterion) {
    let mut m: TreeMap<Owned<str>, Scalar<u64>> = TreeMap::new();
    for (i, x) in lcg(7).take(100_000).enumerate() {
        let _ = m.add(&key(x), &(i as u64));
    }
    let probes: Vec<String> = lcg(0xdead_beef).take(10_000).map(key).collect();
    c.bench_function("map::get_miss_10k_on_100k", |b| {
        b.iter(|| {
            for k in &probes {
                black_box(m.get(k).ok());
            }
        })
    });
    c.bench_function("map::floor_10k_on_100k", |b| {
        b.iter(|| {
            for k in &probes {
                black_box(m.floor(k).ok());
            }
        })
    });
}

fn bench_strong_values_clear_100k(c: &mut Criterion) {
    let shared: Vec<Arc<u64>> = lcg(11).take(1_000).map(Arc::new).collect();
    c.bench_function("map::strong_values_add_then_clear_100k", |b| {
        b.iter_batched(
            TreeMap::<Scalar<u32>, StrongRef<u64>>::new,
            |mut m| {
                for i in 0..100_000u32 {
                    let _ = m.add(&i, &shared[i as usize % shared.len()]);
                }
                m.clear();
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_linked_append_remove_50k(c: &mut Criterion) {
    c.bench_function("linked::append_then_remove_50k", |b| {
        b.iter_batched(
            LinkedTreeSet::<Scalar<u64>>::new,
            |mut s| {
                let xs: Vec<u64> = lcg(13).take(50_000).collect();
                for x in &xs {
                    let _ = s.append(x);
                }
                for x in xs.iter().step_by(2) {
                    let _ = s.remove(x);
                }
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_map;
    config = bench_config();
    targets = bench_add_owned_strings_100k,
              bench_get_and_navigate_10k,
              bench_strong_values_clear_100k
}
criterion_group! {
    name = benches_linked;
    config = bench_config();
    targets = bench_linked_append_remove_50k
}
criterion_main!(benches_map, benches_linked);
