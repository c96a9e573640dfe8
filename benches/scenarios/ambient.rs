//! Benchmarks for a running ambient session.
//!
//! Covers the full graph: reverb send, wind, three pads, plus however many
//! chimes are ringing at the time.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use snowdrift::{io::OfflineDevice, AmbientConfig, AmbientEngine};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn running_engine(config: AmbientConfig) -> AmbientEngine<OfflineDevice> {
    let mut engine = AmbientEngine::new(OfflineDevice::new(SAMPLE_RATE), config);
    engine.toggle().unwrap();
    engine
}

pub fn bench_ambient(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/ambient");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size * 2];

        // Steady state: wind and pads into the default 6 s reverb
        let engine = running_engine(AmbientConfig::default().seed(1));
        let graph = engine.context().unwrap().graph().clone();
        group.bench_with_input(BenchmarkId::new("session", size), &size, |b, _| {
            b.iter(|| {
                snowdrift::graph::lock_graph(&graph).render(black_box(&mut buffer), 2);
            })
        });

        // Chimes every second so several overlap
        let mut engine = running_engine(AmbientConfig::default().seed(2).chime_interval(1.0, 1.5));
        engine.advance(10.0);
        let graph = engine.context().unwrap().graph().clone();
        group.bench_with_input(BenchmarkId::new("session_with_chimes", size), &size, |b, _| {
            b.iter(|| {
                snowdrift::graph::lock_graph(&graph).render(black_box(&mut buffer), 2);
            })
        });
    }

    group.finish();
}
