use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Phase-Accumulator Oscillator
============================

Every waveform here is a function of a single normalized phase in [0, 1).
Each sample the phase advances by `frequency / sample_rate` and wraps:

    phase += f / sr
    phase -= floor(phase)

Because the increment is recomputed per sample, frequency can change every
sample (pitch wobble from an LFO, detune sweeps) without clicks: the phase
stays continuous, only its speed changes.

Shapes (all bipolar, all start at 0 and rise except Square):

  Sine       sin(2pi p)
  Triangle   4p              for p < 1/4
             2 - 4p          for 1/4 <= p < 3/4
             4p - 4          otherwise
  Sawtooth   2((p + 1/2) mod 1) - 1
  Square     +1 for p < 1/2, -1 otherwise

The same block drives audible tones (pads, bells) and sub-audio LFOs
(0.02 Hz wind sweep); only the frequency differs.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorWaveform {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Sawtooth)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce one sample at `frequency` and advance the phase.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let p = self.phase;
        let value = match self.waveform {
            OscillatorWaveform::Sine => (TAU * p).sin(),
            OscillatorWaveform::Triangle => {
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            OscillatorWaveform::Sawtooth => 2.0 * (p + 0.5).fract() - 1.0,
            OscillatorWaveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };

        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        value
    }

    /// Fill `out` with a constant-frequency tone.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }
}
