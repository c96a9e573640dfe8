use std::sync::Arc;

use rand::Rng;

use crate::{
    config::{ChimeConfig, PadConfig, ReverbConfig, WindConfig},
    dsp::{impulse, noise, AudioBuffer},
    engine::session::{ChimeEvent, PadVoice, ReverbSend, WindVoice, Wiring},
    error::GraphError,
    graph::{BufferSourceNode, ConvolverNode, FilterNode, GainNode, NodeId, OscillatorNode, ParamKind},
};

/*
Voice Recipes
=============

Every voice is plain Web Audio style wiring, built with randomness drawn
at construction time:

  reverb  stereo decaying noise IR, independent noise per channel
          sample i = noise * (1 - i/len)^3

  wind    looped noise ──► LP 900 Hz ──► x0.06 ──► master
          0.02 Hz sine ──► x600 ──► LP cutoff (sweeps 300..1500 Hz)
          raw noise also feeds the reverb

  pad i   sine (root * (1 +/- 0.5 %), detune +/- 12.5 cents)
            ──► gain 0.0001 ─linear over 3..6 s─► 0.12/(i+1)
            ──► LP 700..1000 Hz ──► master + reverb
          0.03..0.09 Hz sine ──► x(6..14) ──► detune

  chime   sine 440..1760 Hz ──► env ──► HP 400 Hz ──► master + reverb

            gain
        0.3 ┤ ╱╲
            │╱  ╲__
            │       ╲____
      0.0001┼────────────────── stop at +4..7 s, released at +8 s
             0.01   3..6 s
*/

/// Where voices send their output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bus {
    pub master: NodeId,
    /// Reverb input, if the session still has one
    pub reverb: Option<NodeId>,
}

impl Bus {
    fn send(&self, wiring: &mut Wiring<'_>, from: NodeId) -> Result<(), GraphError> {
        wiring.connect(from, self.master)?;
        if let Some(reverb) = self.reverb {
            wiring.connect(from, reverb)?;
        }
        Ok(())
    }
}

/// A value in `[-0.5, 0.5)`.
fn centered<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random::<f32>() - 0.5
}

/// Synthesize the reverb IR and plan its convolution. Expensive: call it
/// before taking the graph lock.
pub fn reverb_convolver<R: Rng + ?Sized>(
    config: &ReverbConfig,
    rng: &mut R,
    sample_rate: f32,
) -> ConvolverNode {
    let ir = impulse::decaying_noise(rng, sample_rate, config.seconds, 2);
    ConvolverNode::new(&ir, config.normalize)
}

/// Mono noise for the wind loop. Also built outside the graph lock.
pub fn wind_noise<R: Rng + ?Sized>(
    config: &WindConfig,
    rng: &mut R,
    sample_rate: f32,
) -> Arc<AudioBuffer> {
    Arc::new(noise::noise_buffer(rng, sample_rate, config.buffer_seconds))
}

pub fn reverb_send(
    wiring: &mut Wiring<'_>,
    config: &ReverbConfig,
    convolver: ConvolverNode,
    master: NodeId,
) -> Result<ReverbSend, GraphError> {
    let convolver = wiring.processor(convolver);
    let wet = wiring.processor(GainNode::new(config.return_gain));

    wiring.connect(convolver, wet)?;
    wiring.connect(wet, master)?;
    Ok(ReverbSend { convolver, wet })
}

pub fn wind(
    wiring: &mut Wiring<'_>,
    config: &WindConfig,
    noise: Arc<AudioBuffer>,
    bus: Bus,
    now: f64,
) -> Result<WindVoice, GraphError> {
    let source = wiring.generator(BufferSourceNode::new(noise).looping(true));
    let filter = wiring.processor(FilterNode::lowpass(config.cutoff));
    let gain = wiring.processor(GainNode::new(config.level));
    let lfo = wiring.generator(OscillatorNode::sine(config.lfo_rate));
    let lfo_gain = wiring.processor(GainNode::new(config.lfo_depth));

    wiring.connect(lfo, lfo_gain)?;
    wiring.connect_param(lfo_gain, filter, ParamKind::Frequency)?;
    wiring.connect(source, filter)?;
    wiring.connect(filter, gain)?;
    wiring.connect(gain, bus.master)?;
    if let Some(reverb) = bus.reverb {
        wiring.connect(source, reverb)?;
    }

    wiring.start(source, now)?;
    wiring.start(lfo, now)?;
    Ok(WindVoice {
        source,
        filter,
        gain,
        lfo,
        lfo_gain,
    })
}

pub fn pad<R: Rng + ?Sized>(
    wiring: &mut Wiring<'_>,
    config: &PadConfig,
    rng: &mut R,
    index: usize,
    root: f32,
    bus: Bus,
    now: f64,
) -> Result<PadVoice, GraphError> {
    let frequency = root * (1.0 + centered(rng) * config.frequency_jitter);
    let detune = centered(rng) * config.detune_spread;
    let cutoff = config.cutoff.sample(rng);
    let level = config.level / (index + 1) as f32;
    let ramp_end = now + config.swell.sample(rng) as f64;

    let oscillator = wiring.generator(OscillatorNode::sine(frequency).detune(detune));
    let gain = wiring.processor(GainNode::new(0.0));
    let filter = wiring.processor(FilterNode::lowpass(cutoff));
    wiring.connect(oscillator, gain)?;
    wiring.connect(gain, filter)?;
    bus.send(wiring, filter)?;

    let envelope = wiring.param_mut(gain, ParamKind::Gain)?;
    envelope.set_value_at_time(config.floor, now);
    envelope.linear_ramp_to_value_at_time(level, ramp_end);
    wiring.start(oscillator, now)?;

    let lfo = wiring.generator(OscillatorNode::sine(config.lfo_rate.sample(rng)));
    let lfo_gain = wiring.processor(GainNode::new(config.lfo_depth.sample(rng)));
    wiring.connect(lfo, lfo_gain)?;
    wiring.connect_param(lfo_gain, oscillator, ParamKind::Detune)?;
    wiring.start(lfo, now)?;

    Ok(PadVoice {
        oscillator,
        gain,
        filter,
        lfo,
        lfo_gain,
        level,
        ramp_end,
    })
}

/// Strike a chime at `at`. The oscillator stops itself; releasing the
/// nodes is up to the caller.
pub fn chime<R: Rng + ?Sized>(
    wiring: &mut Wiring<'_>,
    config: &ChimeConfig,
    rng: &mut R,
    bus: Bus,
    at: f64,
) -> Result<ChimeEvent, GraphError> {
    let frequency = config.base_frequency * config.ratio.sample(rng);
    let peak = config.peak.sample(rng);
    let decay_end = at + config.decay.sample(rng) as f64;
    let stop_at = at + config.stop.sample(rng) as f64;

    let oscillator = wiring.generator(OscillatorNode::sine(frequency));
    let gain = wiring.processor(GainNode::new(0.0));
    let highpass = wiring.processor(FilterNode::highpass(config.highpass));
    wiring.connect(oscillator, gain)?;
    wiring.connect(gain, highpass)?;
    bus.send(wiring, highpass)?;

    let envelope = wiring.param_mut(gain, ParamKind::Gain)?;
    envelope.cancel_scheduled_values(at);
    envelope.set_value_at_time(0.0, at);
    envelope.linear_ramp_to_value_at_time(peak, at + config.attack as f64);
    envelope.exponential_ramp_to_value_at_time(config.floor, decay_end)?;

    wiring.start(oscillator, at)?;
    wiring.stop(oscillator, stop_at)?;
    Ok(ChimeEvent {
        oscillator,
        gain,
        highpass,
        frequency,
        started_at: at,
        stop_at,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::graph::AudioGraph;

    fn graph_with_master() -> (AudioGraph, NodeId) {
        let mut graph = AudioGraph::new(8_000.0);
        let master = graph.add(GainNode::new(1.0));
        graph.connect(master, graph.destination()).unwrap();
        (graph, master)
    }

    #[test]
    fn test_pad_levels_fall_with_index() {
        let (mut graph, master) = graph_with_master();
        let mut rng = Pcg64::seed_from_u64(9);
        let config = PadConfig::default();
        let bus = Bus {
            master,
            reverb: None,
        };

        let mut wiring = Wiring::new(&mut graph);
        let pads: Vec<_> = (0..3)
            .map(|i| pad(&mut wiring, &config, &mut rng, i, config.roots[i], bus, 0.0).unwrap())
            .collect();

        assert!((pads[0].level - 0.12).abs() < 1e-6);
        assert!((pads[1].level - 0.06).abs() < 1e-6);
        assert!((pads[2].level - 0.04).abs() < 1e-6);
        for pad in &pads {
            assert!((3.0..=6.0).contains(&pad.ramp_end), "ramp end {}", pad.ramp_end);
        }
    }

    #[test]
    fn test_pad_frequency_and_detune_ranges() {
        let (mut graph, master) = graph_with_master();
        let mut rng = Pcg64::seed_from_u64(11);
        let config = PadConfig::default();
        let bus = Bus {
            master,
            reverb: None,
        };

        for _ in 0..20 {
            let mut wiring = Wiring::new(&mut graph);
            let voice = pad(&mut wiring, &config, &mut rng, 0, 55.0, bus, 0.0).unwrap();
            let frequency = graph.param(voice.oscillator, ParamKind::Frequency).unwrap().value();
            let detune = graph.param(voice.oscillator, ParamKind::Detune).unwrap().value();
            assert!((55.0 * 0.995..=55.0 * 1.005).contains(&frequency));
            assert!((-12.5..=12.5).contains(&detune));
        }
    }

    #[test]
    fn test_chime_envelope_and_timing() {
        let (mut graph, master) = graph_with_master();
        let mut rng = Pcg64::seed_from_u64(5);
        let config = ChimeConfig::default();
        let bus = Bus {
            master,
            reverb: None,
        };

        let mut wiring = Wiring::new(&mut graph);
        let event = chime(&mut wiring, &config, &mut rng, bus, 20.0).unwrap();

        assert!((440.0..=1760.0).contains(&event.frequency));
        assert!((24.0..=27.0).contains(&event.stop_at));

        let envelope = graph.param(event.gain, ParamKind::Gain).unwrap();
        assert_eq!(envelope.value_at(20.0), 0.0);
        let peak = envelope.value_at(20.0 + config.attack as f64);
        assert!((0.18..=0.30).contains(&peak), "peak {peak}");
        assert!((envelope.value_at(30.0) - 0.0001).abs() < 1e-7);
        assert!(graph.is_connected(event.highpass, master));
    }

    #[test]
    fn test_wind_feeds_reverb_with_raw_noise() {
        let (mut graph, master) = graph_with_master();
        let reverb = graph.add(GainNode::new(1.0));
        let mut rng = Pcg64::seed_from_u64(2);
        let bus = Bus {
            master,
            reverb: Some(reverb),
        };

        let config = WindConfig::default();
        let noise = wind_noise(&config, &mut rng, 8_000.0);
        let mut wiring = Wiring::new(&mut graph);
        let voice = wind(&mut wiring, &config, noise, bus, 0.0).unwrap();

        assert!(graph.is_connected(voice.source, reverb));
        assert!(graph.is_connected(voice.gain, master));
        assert!(!graph.is_connected(voice.filter, reverb));
        assert_eq!(graph.active_generators(), 2);
    }
}
