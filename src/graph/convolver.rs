use crate::{
    dsp::{
        convolver::{PartitionedConvolver, DEFAULT_PARTITION},
        impulse, AudioBuffer,
    },
    graph::node::{GraphNode, ParamInputs, RenderCtx, StereoBlock},
    RENDER_QUANTUM,
};

/// Convolution reverb node.
///
/// The input is folded to mono and convolved with every channel of the
/// impulse response; a stereo IR yields decorrelated left and right tails.
/// Output is delayed by one convolver partition.
pub struct ConvolverNode {
    convolver: PartitionedConvolver,
    mono: Vec<f32>,
}

impl ConvolverNode {
    /// With `normalize` set the IR is scaled to a consistent loudness
    /// regardless of its length or level.
    pub fn new(ir: &AudioBuffer, normalize: bool) -> Self {
        Self::with_partition(ir, normalize, DEFAULT_PARTITION)
    }

    pub fn with_partition(ir: &AudioBuffer, normalize: bool, partition: usize) -> Self {
        let convolver = if normalize {
            let mut scaled = ir.clone();
            scaled.scale(impulse::normalization_scale(ir));
            PartitionedConvolver::new(&scaled, partition)
        } else {
            PartitionedConvolver::new(ir, partition)
        };

        Self {
            convolver,
            mono: vec![0.0; RENDER_QUANTUM],
        }
    }

    pub fn latency(&self) -> usize {
        self.convolver.latency()
    }
}

impl GraphNode for ConvolverNode {
    fn process(
        &mut self,
        input: &StereoBlock,
        _params: &ParamInputs,
        out: &mut StereoBlock,
        _ctx: &RenderCtx,
    ) {
        for (i, sample) in self.mono.iter_mut().enumerate() {
            *sample = input.mono(i);
        }
        self.convolver
            .process(&self.mono, &mut out.left, &mut out.right);
    }

    fn name(&self) -> &'static str {
        "convolver"
    }
}
