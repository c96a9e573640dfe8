//! Tunables for the ambient soundscape.
//!
//! Defaults reproduce the stock sound. With the `serde` feature a config can
//! be loaded from TOML; any field left out keeps its default:
//!
//! ```toml
//! volume = 0.3
//! seed = 7
//!
//! [chimes]
//! interval = { low = 6.0, high = 10.0 }
//! ```

#[cfg(feature = "serde")]
use std::path::Path;

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::ConfigError;

/// A value drawn uniformly from `[low, high)` each time it is used.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomRange {
    pub low: f32,
    pub high: f32,
}

impl RandomRange {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.low + (self.high - self.low) * rng.random::<f32>()
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientConfig {
    /// Initial master volume
    pub volume: f32,
    /// Fixed RNG seed; `None` seeds from the OS
    pub seed: Option<u64>,
    pub reverb: ReverbConfig,
    pub wind: WindConfig,
    pub pads: PadConfig,
    pub chimes: ChimeConfig,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReverbConfig {
    /// Impulse response length
    pub seconds: f32,
    /// Wet level into the master bus
    pub return_gain: f32,
    pub normalize: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct WindConfig {
    /// Length of the looped noise buffer
    pub buffer_seconds: f32,
    pub cutoff: f32,
    pub lfo_rate: f32,
    /// Cutoff swing in Hz
    pub lfo_depth: f32,
    pub level: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct PadConfig {
    pub roots: [f32; 3],
    /// Total relative spread of the root frequency (0.01 = +/-0.5 %)
    pub frequency_jitter: f32,
    /// Total spread of the static detune, in cents
    pub detune_spread: f32,
    /// Peak gain of the first pad; pad `i` peaks at `level / (i + 1)`
    pub level: f32,
    /// Gain the swell starts from
    pub floor: f32,
    pub swell: RandomRange,
    pub cutoff: RandomRange,
    pub lfo_rate: RandomRange,
    /// Detune swing in cents
    pub lfo_depth: RandomRange,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChimeConfig {
    /// Seconds between chimes, drawn once per session
    pub interval: RandomRange,
    pub base_frequency: f32,
    /// Multiplier applied to `base_frequency`
    pub ratio: RandomRange,
    pub peak: RandomRange,
    pub attack: f32,
    pub decay: RandomRange,
    /// Oscillator stop time after the strike
    pub stop: RandomRange,
    /// Level the decay ends at
    pub floor: f32,
    pub highpass: f32,
    /// Nodes are released this long after the chime spawns
    pub cleanup_after: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            volume: 0.5,
            seed: None,
            reverb: ReverbConfig::default(),
            wind: WindConfig::default(),
            pads: PadConfig::default(),
            chimes: ChimeConfig::default(),
        }
    }
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            seconds: 6.0,
            return_gain: 0.8,
            normalize: true,
        }
    }
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: 6.0,
            cutoff: 900.0,
            lfo_rate: 0.02,
            lfo_depth: 600.0,
            level: 0.06,
        }
    }
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            roots: [55.0, 82.4, 110.0],
            frequency_jitter: 0.01,
            detune_spread: 25.0,
            level: 0.12,
            floor: 0.0001,
            swell: RandomRange::new(3.0, 6.0),
            cutoff: RandomRange::new(700.0, 1000.0),
            lfo_rate: RandomRange::new(0.03, 0.09),
            lfo_depth: RandomRange::new(6.0, 14.0),
        }
    }
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self {
            interval: RandomRange::new(12.0, 24.0),
            base_frequency: 880.0,
            ratio: RandomRange::new(0.5, 2.0),
            peak: RandomRange::new(0.18, 0.30),
            attack: 0.01,
            decay: RandomRange::new(3.0, 6.0),
            stop: RandomRange::new(4.0, 7.0),
            floor: 0.0001,
            highpass: 400.0,
            cleanup_after: 8.0,
        }
    }
}

impl AmbientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the reverb impulse response length.
    pub fn reverb_seconds(mut self, seconds: f32) -> Self {
        self.reverb.seconds = seconds;
        self
    }

    pub fn chime_interval(mut self, low: f32, high: f32) -> Self {
        self.chimes.interval = RandomRange::new(low, high);
        self
    }

    pub fn wind(mut self, wind: WindConfig) -> Self {
        self.wind = wind;
        self
    }

    pub fn pads(mut self, pads: PadConfig) -> Self {
        self.pads = pads;
        self
    }

    pub fn chimes(mut self, chimes: ChimeConfig) -> Self {
        self.chimes = chimes;
        self
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
