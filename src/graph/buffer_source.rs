use std::sync::Arc;

use crate::{
    dsp::AudioBuffer,
    graph::node::{GraphNode, ParamInputs, RenderCtx, SourceSchedule, StereoBlock},
    RENDER_QUANTUM,
};

/// Plays a shared [`AudioBuffer`], optionally looping it forever.
///
/// Mono buffers go to both channels. A non-looping source stops generating
/// once it reaches the end of the buffer.
pub struct BufferSourceNode {
    buffer: Arc<AudioBuffer>,
    looping: bool,
    position: usize,
    ended: bool,
    schedule: SourceSchedule,
}

impl BufferSourceNode {
    pub fn new(buffer: Arc<AudioBuffer>) -> Self {
        let ended = buffer.is_empty();
        Self {
            buffer,
            looping: false,
            position: 0,
            ended,
            schedule: SourceSchedule::default(),
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl GraphNode for BufferSourceNode {
    fn process(
        &mut self,
        _input: &StereoBlock,
        _params: &ParamInputs,
        out: &mut StereoBlock,
        ctx: &RenderCtx,
    ) {
        if self.ended || !self.schedule.overlaps(ctx.time, ctx.end_time()) {
            out.clear();
            return;
        }

        let len = self.buffer.len();
        let left = self.buffer.channel(0);
        let right = self.buffer.channel(self.buffer.num_channels() - 1);

        for i in 0..RENDER_QUANTUM {
            if self.ended || !self.schedule.gate(ctx.frame_time(i)) {
                out.left[i] = 0.0;
                out.right[i] = 0.0;
                continue;
            }

            out.left[i] = left[self.position];
            out.right[i] = right[self.position];
            self.position += 1;
            if self.position >= len {
                if self.looping {
                    self.position = 0;
                } else {
                    self.ended = true;
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "buffer-source"
    }

    fn schedule(&self) -> Option<&SourceSchedule> {
        Some(&self.schedule)
    }

    fn schedule_mut(&mut self) -> Option<&mut SourceSchedule> {
        Some(&mut self.schedule)
    }

    fn is_generating(&self, time: f64) -> bool {
        !self.ended && self.schedule.is_active_at(time)
    }
}
