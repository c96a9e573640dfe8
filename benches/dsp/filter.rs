//! Benchmarks for state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg64;
use snowdrift::dsp::{filter::SVFilter, noise::white_noise};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let mut rng = Pcg64::seed_from_u64(1);

    for &size in BLOCK_SIZES {
        let mut input = vec![0.0f32; size];
        white_noise(&mut rng, &mut input);

        // Lowpass - wind and pads
        let mut filter = SVFilter::lowpass(900.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), SAMPLE_RATE);
            })
        });

        // Lowpass with the cutoff moving every block, as under the wind LFO
        let mut filter = SVFilter::lowpass(900.0);
        let mut cutoff = 300.0;
        group.bench_with_input(BenchmarkId::new("lowpass_swept", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 1500.0 { 300.0 } else { cutoff + 7.0 };
                filter.set_cutoff(cutoff);
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), SAMPLE_RATE);
            })
        });

        // Highpass - chimes
        let mut filter = SVFilter::highpass(400.0);
        group.bench_with_input(BenchmarkId::new("highpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
