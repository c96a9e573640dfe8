//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use snowdrift::dsp::oscillator::OscillatorBlock;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - the pads, chimes and every LFO
        let mut osc = OscillatorBlock::sine();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // Per-sample path used when frequency is modulated
        let mut osc = OscillatorBlock::sine();
        group.bench_with_input(BenchmarkId::new("sine_per_sample", size), &size, |b, _| {
            b.iter(|| {
                for (i, out) in buffer.iter_mut().enumerate() {
                    let frequency = 110.0 + i as f32 * 0.01;
                    *out = osc.next_sample(black_box(frequency), SAMPLE_RATE);
                }
            })
        });

        let mut osc = OscillatorBlock::square();
        group.bench_with_input(BenchmarkId::new("square", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
