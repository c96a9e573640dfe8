use crate::{
    dsp::{
        oscillator::{OscillatorBlock, OscillatorWaveform},
        AudioParam,
    },
    graph::node::{
        resolve_param, GraphNode, ParamInputs, ParamKind, RenderCtx, SourceSchedule, StereoBlock,
    },
    RENDER_QUANTUM,
};

/*
Oscillator Source
=================

A scheduled tone generator with two automatable parameters:

  frequency   base pitch in Hz
  detune      offset in cents, 100 cents = 1 semitone

The pitch actually played each sample is

    f = frequency * 2^(detune / 1200)

so +1200 cents is one octave up and +6 cents is the faint beating that
makes three pads sound like an ensemble instead of one tone.

An oscillator is also the LFO: a 0.03 Hz sine through a gain of 8 connected
to another oscillator's Detune param wobbles that pitch by +/- 8 cents.

    ┌──────────┐    ┌───────┐
    │ LFO 0.03 ├───►│ x 8.0 ├───► pad.detune
    └──────────┘    └───────┘

Sources start silent, play from `start` until `stop`, then stay silent.
*/

pub struct OscillatorNode {
    osc: OscillatorBlock,
    frequency: AudioParam,
    detune: AudioParam,
    schedule: SourceSchedule,
    frequencies: Vec<f32>,
    detunes: Vec<f32>,
}

impl OscillatorNode {
    pub fn new(waveform: OscillatorWaveform, frequency: f32) -> Self {
        Self {
            osc: OscillatorBlock::new(waveform),
            frequency: AudioParam::new(frequency),
            detune: AudioParam::new(0.0),
            schedule: SourceSchedule::default(),
            frequencies: vec![0.0; RENDER_QUANTUM],
            detunes: vec![0.0; RENDER_QUANTUM],
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(OscillatorWaveform::Sine, frequency)
    }

    /// Start with a fixed detune, in cents.
    pub fn detune(mut self, cents: f32) -> Self {
        self.detune.set_value(cents);
        self
    }
}

impl GraphNode for OscillatorNode {
    fn process(
        &mut self,
        _input: &StereoBlock,
        params: &ParamInputs,
        out: &mut StereoBlock,
        ctx: &RenderCtx,
    ) {
        if !self.schedule.overlaps(ctx.time, ctx.end_time()) {
            out.clear();
            return;
        }

        let (frequency, detune) = (ParamKind::Frequency, ParamKind::Detune);
        resolve_param(&mut self.frequency, frequency, params, ctx, &mut self.frequencies);
        resolve_param(&mut self.detune, detune, params, ctx, &mut self.detunes);

        for i in 0..RENDER_QUANTUM {
            let sample = if self.schedule.gate(ctx.frame_time(i)) {
                let pitch = self.frequencies[i] * (self.detunes[i] / 1200.0).exp2();
                self.osc.next_sample(pitch, ctx.sample_rate)
            } else {
                0.0
            };
            out.left[i] = sample;
            out.right[i] = sample;
        }
    }

    fn name(&self) -> &'static str {
        "oscillator"
    }

    fn param(&self, kind: ParamKind) -> Option<&AudioParam> {
        match kind {
            ParamKind::Frequency => Some(&self.frequency),
            ParamKind::Detune => Some(&self.detune),
            ParamKind::Gain => None,
        }
    }

    fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        match kind {
            ParamKind::Frequency => Some(&mut self.frequency),
            ParamKind::Detune => Some(&mut self.detune),
            ParamKind::Gain => None,
        }
    }

    fn schedule(&self) -> Option<&SourceSchedule> {
        Some(&self.schedule)
    }

    fn schedule_mut(&mut self) -> Option<&mut SourceSchedule> {
        Some(&mut self.schedule)
    }
}
