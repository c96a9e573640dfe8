use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type      | passes       | rejects      | used for                        |
| --------- | ------------ | ------------ | ------------------------------- |
| low-pass  | below cutoff | above cutoff | wind colour, pad warmth         |
| high-pass | above cutoff | below cutoff | thinning chimes                 |
*/

/// Fixed resonance giving a Butterworth-like (Q ~ 0.707) response.
pub const RESONANCE: f32 = 0.29;

/// Lowest cutoff the filter accepts.
const MIN_CUTOFF_HZ: f32 = 10.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
}

/// Per-block coefficients, derived from the cutoff.
#[derive(Debug, Clone, Copy)]
struct Coefficients {
    g: f32,
    k: f32,
    h: f32,
}

/// Topology-preserving state-variable filter.
pub struct SVFilter {
    s1: f32,
    s2: f32,
    cutoff: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff: f32) -> Self {
        Self {
            s1: 0.0,
            s2: 0.0,
            cutoff,
            filter_type,
        }
    }

    pub fn lowpass(cutoff: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff)
    }

    pub fn highpass(cutoff: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// The cutoff is held below Nyquist so the prewarp stays finite when
    /// modulation pushes it high.
    fn coefficients(&self, sample_rate: f32) -> Coefficients {
        let cutoff = self.cutoff.clamp(MIN_CUTOFF_HZ, sample_rate * 0.49);
        let g = (PI * cutoff / sample_rate).tan();
        let k = 2.0 - 2.0 * RESONANCE;
        Coefficients {
            g,
            k,
            h: 1.0 / (1.0 + g * (g + k)),
        }
    }

    #[inline]
    fn tick(&mut self, x: f32, c: Coefficients) -> f32 {
        let band = c.h * (self.s1 + c.g * (x - self.s2));
        let low = self.s2 + c.g * band;
        self.s1 = 2.0 * band - self.s1;
        self.s2 = 2.0 * low - self.s2;

        match self.filter_type {
            FilterType::LowPass => low,
            FilterType::HighPass => x - c.k * band - low,
        }
    }

    /// Filter `buffer` in place. Cutoff is sampled once per call.
    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let c = self.coefficients(sample_rate);
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample, c);
        }
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff = cutoff;
    }
}
