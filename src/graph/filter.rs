use crate::{
    dsp::{
        block_average,
        filter::{FilterType, SVFilter},
        AudioParam,
    },
    graph::node::{resolve_param, GraphNode, ParamInputs, ParamKind, RenderCtx, StereoBlock},
    RENDER_QUANTUM,
};

/*
Filter Node
===========

Wraps a pair of state-variable filters (one per channel) and exposes the
cutoff as the Frequency param, so an LFO can sweep it:

    noise ──► [ LP 900 Hz ] ──► gain
                   ▲
    LFO 0.02 Hz ──► x 600 ──┘     cutoff wanders 300..1500 Hz

The cutoff is read once per render quantum (the block average of the
automated and modulated values). At 128 frames that is ~2.7 ms at 48 kHz,
far finer than the slow sweeps used here.
*/

pub struct FilterNode {
    filters: [SVFilter; 2],
    frequency: AudioParam,
    values: Vec<f32>,
}

impl FilterNode {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            filters: [
                SVFilter::new(filter_type, cutoff_hz),
                SVFilter::new(filter_type, cutoff_hz),
            ],
            frequency: AudioParam::new(cutoff_hz),
            values: vec![0.0; RENDER_QUANTUM],
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filters[0].filter_type()
    }
}

impl GraphNode for FilterNode {
    fn process(
        &mut self,
        input: &StereoBlock,
        params: &ParamInputs,
        out: &mut StereoBlock,
        ctx: &RenderCtx,
    ) {
        let kind = ParamKind::Frequency;
        resolve_param(&mut self.frequency, kind, params, ctx, &mut self.values);
        let cutoff = block_average(&self.values);

        out.left.copy_from_slice(&input.left);
        out.right.copy_from_slice(&input.right);

        let [left, right] = &mut self.filters;
        left.set_cutoff(cutoff);
        right.set_cutoff(cutoff);
        left.render(&mut out.left, ctx.sample_rate);
        right.render(&mut out.right, ctx.sample_rate);
    }

    fn name(&self) -> &'static str {
        match self.filter_type() {
            FilterType::LowPass => "lowpass",
            FilterType::HighPass => "highpass",
        }
    }

    fn param(&self, kind: ParamKind) -> Option<&AudioParam> {
        (kind == ParamKind::Frequency).then_some(&self.frequency)
    }

    fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        (kind == ParamKind::Frequency).then_some(&mut self.frequency)
    }
}
