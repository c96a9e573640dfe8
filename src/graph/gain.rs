use crate::{
    dsp::AudioParam,
    graph::node::{resolve_param, GraphNode, ParamInputs, ParamKind, RenderCtx, StereoBlock},
    RENDER_QUANTUM,
};

/*
Gain
====

Multiplies its input by an automatable gain parameter. Every level in the
ambient mix is a gain node:

  master          volume control, feeds the destination
  envelopes       pad swell and chime strike are ramps on a gain
  reverb return   wet level of the convolver
  LFO depth       scales a unit LFO into Hz or cents before it reaches a param

    input ──► [ x gain(t) ] ──► output
                   ▲
                   └── automation + anything connected to the Gain param
*/

pub struct GainNode {
    gain: AudioParam,
    values: Vec<f32>,
}

impl GainNode {
    pub fn new(gain: f32) -> Self {
        Self {
            gain: AudioParam::new(gain),
            values: vec![0.0; RENDER_QUANTUM],
        }
    }
}

impl GraphNode for GainNode {
    fn process(
        &mut self,
        input: &StereoBlock,
        params: &ParamInputs,
        out: &mut StereoBlock,
        ctx: &RenderCtx,
    ) {
        resolve_param(&mut self.gain, ParamKind::Gain, params, ctx, &mut self.values);

        for (i, &gain) in self.values.iter().enumerate() {
            out.left[i] = input.left[i] * gain;
            out.right[i] = input.right[i] * gain;
        }
    }

    fn name(&self) -> &'static str {
        "gain"
    }

    fn param(&self, kind: ParamKind) -> Option<&AudioParam> {
        (kind == ParamKind::Gain).then_some(&self.gain)
    }

    fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        (kind == ParamKind::Gain).then_some(&mut self.gain)
    }
}
