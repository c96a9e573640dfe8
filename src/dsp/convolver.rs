//! Convolution - Applying a Recorded (or Synthesized) Space
//!
//! Convolution reverb runs the dry signal through an impulse response (IR):
//! every input sample triggers a scaled copy of the whole IR. Direct
//! convolution costs `len(IR)` multiplies per sample, which for a six second
//! IR at 48 kHz is 288 000 per sample: far too slow.
//!
//! # Uniformly Partitioned Overlap-Save
//!
//! ```text
//!            IR:  [ h0 | h1 | h2 | ... | hP-1 ]   (P partitions of B samples)
//!                   |    |    |          |
//!    FFT each once  H0   H1   H2   ...   HP-1     (zero-padded to N = 2B)
//!
//!  input blocks:  x[k]  x[k-1]  x[k-2] ...         (frequency-domain delay line)
//!                   \      \       \
//!                    Y = X[k]H0 + X[k-1]H1 + X[k-2]H2 + ...
//!                    y = last B samples of IFFT(Y)
//! ```
//!
//! Each input block is transformed once, stored in a ring of spectra, and
//! multiplied against every IR partition. The cost per sample is roughly
//! `2 * len(IR) / B` complex multiplies, and the output is delayed by one
//! partition (`B` samples).
//!
//! All buffers and FFT scratch space are allocated in [`PartitionedConvolver::new`];
//! [`PartitionedConvolver::process`] never allocates.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::dsp::buffer::AudioBuffer;

/// Partition size used by graph convolver nodes.
pub const DEFAULT_PARTITION: usize = 1024;

pub struct PartitionedConvolver {
    partition: usize,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// IR spectra, `[channel][partition][bin]`
    ir_spectra: Vec<Vec<Vec<Complex<f32>>>>,
    /// Ring of past input spectra, newest at `fdl_head`
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,
    /// Previous block followed by the block being collected
    history: Vec<f32>,
    fill: usize,
    spectrum: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
    /// Output for the block currently being emitted, per IR channel
    output: Vec<Vec<f32>>,
}

impl PartitionedConvolver {
    /// Prepare a convolver for `ir`. Every IR channel yields one output
    /// channel fed from the same (mono) input.
    pub fn new(ir: &AudioBuffer, partition: usize) -> Self {
        let partition = partition.max(1);
        let size = partition * 2;
        let partitions = ir.len().div_ceil(partition).max(1);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let mut scratch = vec![Complex::default(); scratch_len];

        let mut ir_spectra = Vec::with_capacity(ir.num_channels());
        for channel in ir.channels() {
            let mut spectra = Vec::with_capacity(partitions);
            for p in 0..partitions {
                let mut bins = vec![Complex::default(); size];
                let start = p * partition;
                let end = (start + partition).min(channel.len());
                if start < end {
                    for (bin, &tap) in bins.iter_mut().zip(&channel[start..end]) {
                        *bin = Complex::new(tap, 0.0);
                    }
                }
                fft.process_with_scratch(&mut bins, &mut scratch);
                spectra.push(bins);
            }
            ir_spectra.push(spectra);
        }

        Self {
            partition,
            fft,
            ifft,
            scratch,
            ir_spectra,
            fdl: vec![vec![Complex::default(); size]; partitions],
            fdl_head: 0,
            history: vec![0.0; size],
            fill: 0,
            spectrum: vec![Complex::default(); size],
            accum: vec![Complex::default(); size],
            output: vec![vec![0.0; partition]; ir.num_channels()],
        }
    }

    /// Processing delay in samples.
    pub fn latency(&self) -> usize {
        self.partition
    }

    pub fn num_channels(&self) -> usize {
        self.output.len()
    }

    /// Convolve `input`, writing IR channel 0 to `left` and the last IR
    /// channel to `right`. All three slices must have the same length.
    pub fn process(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        let b = self.partition;
        let last = self.output.len() - 1;

        for (i, &x) in input.iter().enumerate() {
            self.history[b + self.fill] = x;
            left[i] = self.output[0][self.fill];
            right[i] = self.output[last][self.fill];

            self.fill += 1;
            if self.fill == b {
                self.flush_block();
                self.fill = 0;
            }
        }
    }

    pub fn reset(&mut self) {
        for spectrum in &mut self.fdl {
            spectrum.fill(Complex::default());
        }
        self.history.fill(0.0);
        for channel in &mut self.output {
            channel.fill(0.0);
        }
        self.fill = 0;
        self.fdl_head = 0;
    }

    fn flush_block(&mut self) {
        let b = self.partition;
        let partitions = self.fdl.len();

        for (bin, &s) in self.spectrum.iter_mut().zip(&self.history) {
            *bin = Complex::new(s, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        self.fdl_head = (self.fdl_head + partitions - 1) % partitions;
        self.fdl[self.fdl_head].copy_from_slice(&self.spectrum);

        let norm = 1.0 / (2 * b) as f32;
        for (channel, spectra) in self.ir_spectra.iter().enumerate() {
            self.accum.fill(Complex::default());
            for (p, h) in spectra.iter().enumerate() {
                let x = &self.fdl[(self.fdl_head + p) % partitions];
                for ((acc, &xk), &hk) in self.accum.iter_mut().zip(x).zip(h) {
                    *acc += xk * hk;
                }
            }
            self.ifft
                .process_with_scratch(&mut self.accum, &mut self.scratch);

            for (out, bin) in self.output[channel].iter_mut().zip(&self.accum[b..]) {
                *out = bin.re * norm;
            }
        }

        self.history.copy_within(b.., 0);
    }
}
