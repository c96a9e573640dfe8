use rand::Rng;

use crate::dsp::buffer::AudioBuffer;

/// Fill `out` with uniform white noise in [-1, 1).
pub fn white_noise<R: Rng + ?Sized>(rng: &mut R, out: &mut [f32]) {
    for sample in out.iter_mut() {
        *sample = rng.random_range(-1.0..1.0);
    }
}

/// A mono buffer of white noise, `seconds` long. Looped, it makes a
/// steady broadband bed that a filter can colour into wind.
pub fn noise_buffer<R: Rng + ?Sized>(rng: &mut R, sample_rate: f32, seconds: f32) -> AudioBuffer {
    let mut buffer = AudioBuffer::new(1, AudioBuffer::frames_for(sample_rate, seconds), sample_rate);
    white_noise(rng, buffer.channel_mut(0));
    buffer
}
