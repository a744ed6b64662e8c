//! Concurrent Cache Benchmarks
//!
//! Measures engine throughput under multi-threaded access, with and without
//! the background sweep running.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use freqcache::{CacheConfig, CacheEngine, FixedLoad, LoadSample};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const CACHE_SIZE: usize = 10_000;
const OPS_PER_THREAD: usize = 1_000;

fn make_engine(cap: usize) -> Arc<CacheEngine<usize, usize>> {
    let config = CacheConfig::new(cap)
        .with_base_sweep_interval(Duration::from_millis(50))
        .with_min_sweep_interval(Duration::from_millis(5));
    let cache = CacheEngine::builder(config)
        .load_source(FixedLoad(LoadSample::IDLE))
        .build()
        .unwrap();
    for i in 0..cap {
        cache.put(i, i).unwrap();
    }
    Arc::new(cache)
}

fn run_concurrent_reads(cache: &Arc<CacheEngine<usize, usize>>, threads: usize, ops: usize) {
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let cache = Arc::clone(cache);
            thread::spawn(move || {
                for i in 0..ops {
                    black_box(cache.get(&((t * ops + i) % CACHE_SIZE)).unwrap());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn run_concurrent_mixed(cache: &Arc<CacheEngine<usize, usize>>, threads: usize, ops: usize) {
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let cache = Arc::clone(cache);
            thread::spawn(move || {
                for i in 0..ops {
                    let key = (t * ops + i) % (CACHE_SIZE * 2);
                    if i % 4 == 0 {
                        cache
                            .put_with_ttl(key, i, Some(Duration::from_millis(10)))
                            .unwrap();
                    } else {
                        black_box(cache.get(&key).unwrap());
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

/// Benchmark concurrent reads across thread counts
fn concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Reads");
    let cache = make_engine(CACHE_SIZE);

    for threads in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements((threads * OPS_PER_THREAD) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| run_concurrent_reads(&cache, threads, OPS_PER_THREAD));
        });
    }

    group.finish();
}

/// Benchmark a 25% write mix with the sweeper stopped and running
fn concurrent_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Mixed");
    group.throughput(Throughput::Elements((8 * OPS_PER_THREAD) as u64));

    let idle = make_engine(CACHE_SIZE);
    group.bench_function("sweeper stopped", |b| {
        b.iter(|| run_concurrent_mixed(&idle, 8, OPS_PER_THREAD));
    });

    let swept = make_engine(CACHE_SIZE);
    swept.start().unwrap();
    group.bench_function("sweeper running", |b| {
        b.iter(|| run_concurrent_mixed(&swept, 8, OPS_PER_THREAD));
    });
    swept.stop().unwrap();

    group.finish();
}

criterion_group!(benches, concurrent_reads, concurrent_mixed);
criterion_main!(benches);
