//! Ring buffer benchmarks: uncontended put/get and contended drain.

use criterion::{criterion_group, criterion_main, Criterion};
use simtemp_device::ring::SampleRing;
use simtemp_device::SampleRecord;
use std::hint::black_box;
use std::sync::{Arc, Barrier};
use std::thread;

fn sample(n: u64) -> SampleRecord {
    SampleRecord {
        timestamp_ns: n,
        temp_mc: 35_000,
        flags: 0x01,
    }
}

fn bench_put_get(c: &mut Criterion) {
    let ring = SampleRing::new(64);

    c.bench_function("ring_put_get", |b| {
        b.iter(|| {
            ring.put(black_box(sample(1)));
            black_box(ring.get());
        });
    });
}

fn bench_overflow_put(c: &mut Criterion) {
    let ring = SampleRing::new(64);
    // Pre-fill so every put takes the drop-oldest path.
    for n in 0..64 {
        ring.put(sample(n));
    }

    c.bench_function("ring_put_full", |b| {
        b.iter(|| {
            ring.put(black_box(sample(1)));
        });
    });
}

fn bench_contended_drain(c: &mut Criterion) {
    c.bench_function("ring_drain_4_readers", |b| {
        b.iter(|| {
            let ring = Arc::new(SampleRing::new(1024));
            for n in 0..1000 {
                ring.put(sample(n));
            }

            let barrier = Arc::new(Barrier::new(4));
            let mut handles = Vec::new();
            for _ in 0..4 {
                let ring = Arc::clone(&ring);
                let barrier = Arc::clone(&barrier);
                handles.push(thread::spawn(move || {
                    barrier.wait();
                    let mut count = 0u32;
                    while ring.get().is_some() {
                        count += 1;
                    }
                    count
                }));
            }

            let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
            black_box(total);
        });
    });
}

criterion_group!(
    benches,
    bench_put_get,
    bench_overflow_put,
    bench_contended_drain
);
criterion_main!(benches);
