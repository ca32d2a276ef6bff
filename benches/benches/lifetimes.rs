// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_lifetimes`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use understory_lifetimes::{
    Identity, LifetimeEvent, LifetimeRegistry, Notification, Source, SourceExt, Subject, diff,
};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }
}

/// `count` snapshots of `n` keys each, where roughly `churn_pct` percent of
/// the keys are replaced from one snapshot to the next.
fn churning_snapshots(n: u32, churn_pct: u32, count: usize, seed: u64) -> Vec<Vec<u32>> {
    let mut rng = Lcg::new(seed);
    let mut next_key = n;
    let mut current: Vec<u32> = (0..n).collect();
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(current.clone());
        for key in &mut current {
            if rng.next_u32() % 100 < churn_pct {
                *key = next_key;
                next_key += 1;
            }
        }
    }
    out
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_lifetimes/diff");

    for &(n, churn_pct) in &[(64_u32, 0_u32), (64, 10), (4_096, 0), (4_096, 10), (4_096, 100)] {
        let snapshots = churning_snapshots(n, churn_pct, 2, 0x11FE_0000_0000_0001);
        let mut registry = LifetimeRegistry::new();
        for &key in &snapshots[0] {
            registry.insert(key, ()).expect("keys are unique");
        }
        let next = &snapshots[1];

        group.bench_with_input(
            BenchmarkId::new(format!("churn={churn_pct}%"), n),
            next,
            |b, next| {
                b.iter(|| {
                    let changes =
                        diff::<u32, (), _, _, _>(&registry, next.iter().copied(), &Identity);
                    black_box(changes);
                });
            },
        );
    }

    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_lifetimes/stream");
    group.sample_size(50);

    for &(n, churn_pct) in &[(64_u32, 10_u32), (1_024, 10), (1_024, 50)] {
        let snapshots = churning_snapshots(n, churn_pct, 32, 0x11FE_0000_0000_0002);

        group.bench_function(format!("emit_32(n={n},churn={churn_pct}%)"), |b| {
            b.iter_batched(
                || snapshots.clone(),
                |snapshots| {
                    let subject = Subject::<Vec<u32>, ()>::new();
                    let subscription = subject.clone().lifetimes().subscribe(
                        |n: Notification<LifetimeEvent<u32>, ()>| {
                            if let Notification::Value(event) = n {
                                event.removal.on_fire(move || {
                                    black_box(event.element);
                                });
                            }
                        },
                    );
                    for snapshot in snapshots {
                        subject.emit(snapshot).expect("subject is live");
                    }
                    subscription.unsubscribe();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_diff, bench_stream);
criterion_main!(benches);
