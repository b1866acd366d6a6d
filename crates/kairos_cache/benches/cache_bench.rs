use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kairos_cache::{CacheKey, CacheValue, ManualClock, TieredCache, TieredCacheConfig};
use serde_json::json;

fn key_bench(c: &mut Criterion) {
    let args = json!({
        "body": "mars",
        "target_deg": 123.456,
        "jd_start": 2_460_000.5,
        "max_crossings": 3,
    });

    let mut group = c.benchmark_group("cache_key");
    group.bench_function("transit_args", |b| {
        b.iter(|| CacheKey::new(black_box("find_next_transit"), black_box(&args)).expect("key"))
    });
    group.finish();
}

fn tiered_bench(c: &mut Criterion) {
    let cache = TieredCache::new(
        &TieredCacheConfig::default(),
        Arc::new(ManualClock::default()),
    )
    .expect("valid config");
    let keys: Vec<CacheKey> = (0..512u32)
        .map(|n| CacheKey::new("bench", &n).expect("key"))
        .collect();
    let value: CacheValue = Arc::from(vec![7u8; 256]);
    for k in &keys {
        cache.put(k.clone(), Arc::clone(&value), None);
    }

    let mut group = c.benchmark_group("tiered_cache");
    group.bench_function("get_tier1_hit", |b| {
        b.iter(|| cache.get(black_box(&keys[511])))
    });
    group.bench_function("get_tier2_promote", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            cache.get(black_box(&keys[i]))
        })
    });
    group.bench_function("put", |b| {
        b.iter(|| cache.put(black_box(keys[3].clone()), Arc::clone(&value), None))
    });
    group.finish();
}

criterion_group!(benches, key_bench, tiered_bench);
criterion_main!(benches);
