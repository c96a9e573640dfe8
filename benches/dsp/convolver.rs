//! Benchmarks for partitioned convolution.
//!
//! Cost scales with the impulse response length, so the IR sweep matters
//! more than the block size here.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use snowdrift::dsp::{
    convolver::{PartitionedConvolver, DEFAULT_PARTITION},
    impulse::decaying_noise,
    noise::white_noise,
};

use crate::SAMPLE_RATE;

const IR_SECONDS: &[f32] = &[0.5, 2.0, 6.0];
const BLOCK: usize = 1024;

pub fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolver");
    let mut rng = Pcg64::seed_from_u64(2);

    let mut input = vec![0.0f32; BLOCK];
    white_noise(&mut rng, &mut input);
    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];

    for &seconds in IR_SECONDS {
        let ir = decaying_noise(&mut rng, SAMPLE_RATE, seconds, 2);
        let mut convolver = PartitionedConvolver::new(&ir, DEFAULT_PARTITION);

        group.bench_with_input(
            BenchmarkId::new("stereo_ir", format!("{seconds}s")),
            &seconds,
            |b, _| {
                b.iter(|| {
                    convolver.process(black_box(&input), &mut left, &mut right);
                })
            },
        );
    }

    group.finish();
}
