use rand::Rng;

use crate::dsp::{buffer::AudioBuffer, noise::white_noise};

/*
Synthetic Reverb Impulse Response
=================================

A real room's impulse response is, to a first approximation, dense random
reflections whose energy dies away over time. We fake that directly:

    h[i] = noise[i] * (1 - i / len)^3

The cubic envelope starts at full level and reaches exactly zero at the end
of the buffer, so the tail fades smoothly instead of being truncated (no
click) and there is no periodic structure to ring metallically.

Each channel gets its own noise, so left and right decorrelate and the
reverb sounds wide rather than collapsing to the centre.

Normalization
-------------

Convolving with a long noise IR adds a lot of energy. Before use, the IR is
scaled by the RMS rule browsers apply to convolvers:

    power = sqrt(sum(h^2) / (channels * len))     (floored at 0.000125)
    scale = 0.00125 / power * (44100 / sample_rate)
    scale *= 0.5 for 4-channel (true stereo) responses

which keeps perceived loudness roughly independent of IR length and rate.
*/

const GAIN_CALIBRATION: f32 = 0.00125;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44_100.0;
const MIN_POWER: f32 = 0.000125;

/// Generate a `channels`-channel decaying-noise impulse response.
pub fn decaying_noise<R: Rng + ?Sized>(
    rng: &mut R,
    sample_rate: f32,
    seconds: f32,
    channels: usize,
) -> AudioBuffer {
    let len = AudioBuffer::frames_for(sample_rate, seconds);
    let mut ir = AudioBuffer::new(channels, len, sample_rate);

    for channel in 0..ir.num_channels() {
        let data = ir.channel_mut(channel);
        white_noise(rng, data);
        for (i, sample) in data.iter_mut().enumerate() {
            *sample *= (1.0 - i as f32 / len as f32).powi(3);
        }
    }

    ir
}

/// Gain applied to an impulse response before convolution.
pub fn normalization_scale(ir: &AudioBuffer) -> f32 {
    let energy: f32 = ir
        .channels()
        .map(|channel| channel.iter().map(|s| s * s).sum::<f32>())
        .sum();

    let mut power = (energy / (ir.num_channels() * ir.len()) as f32).sqrt();
    if !power.is_finite() || power < MIN_POWER {
        power = MIN_POWER;
    }

    let mut scale = GAIN_CALIBRATION / power;
    if ir.sample_rate() > 0.0 {
        scale *= GAIN_CALIBRATION_SAMPLE_RATE / ir.sample_rate();
    }
    if ir.num_channels() == 4 {
        scale *= 0.5;
    }
    scale
}
