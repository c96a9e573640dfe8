/// A block of audio held in memory, one `Vec` per channel.
///
/// Used for looped noise sources and convolver impulse responses. All
/// channels have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: f32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Silent buffer with `channels` channels of `len` frames.
    pub fn new(channels: usize, len: usize, sample_rate: f32) -> Self {
        Self {
            sample_rate,
            channels: vec![vec![0.0; len]; channels.max(1)],
        }
    }

    /// Wrap existing channel data. Shorter channels are zero-padded to the
    /// longest one.
    pub fn from_channels(mut channels: Vec<Vec<f32>>, sample_rate: f32) -> Self {
        if channels.is_empty() {
            channels.push(Vec::new());
        }
        let len = channels.iter().map(Vec::len).max().unwrap_or(0);
        for channel in &mut channels {
            channel.resize(len, 0.0);
        }
        Self {
            sample_rate,
            channels,
        }
    }

    /// Number of frames needed to hold `seconds` of audio.
    pub fn frames_for(sample_rate: f32, seconds: f32) -> usize {
        (sample_rate * seconds).round().max(1.0) as usize
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length in seconds.
    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Multiply every sample by `gain`.
    pub fn scale(&mut self, gain: f32) {
        for channel in &mut self.channels {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }
}
