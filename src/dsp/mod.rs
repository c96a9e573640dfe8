//! Low-level DSP primitives used by the graph nodes.
//!
//! Everything here works on plain slices and owns its state, so graph nodes
//! can embed these structs directly. Allocation happens at construction time
//! only; the per-block `render`/`process` paths are allocation-free.

/// Multi-channel sample storage.
pub mod buffer;
/// Uniformly partitioned FFT convolution.
pub mod convolver;
/// State-variable filter with lowpass and highpass responses.
pub mod filter;
/// Synthetic reverb impulse responses and convolver normalization.
pub mod impulse;
/// White noise generation.
pub mod noise;
/// Periodic waveforms.
pub mod oscillator;
/// Automatable parameter values (set, linear and exponential ramps).
pub mod param;

pub use buffer::AudioBuffer;
pub use param::AudioParam;

/// Average of a block of samples, used for block-rate parameter updates.
#[inline]
pub fn block_average(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}
