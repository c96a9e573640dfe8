use std::fmt;

use crate::{dsp::AudioParam, RENDER_QUANTUM};

/// Handle to a node in an [`AudioGraph`](super::AudioGraph).
///
/// Ids carry a generation: once a node is removed its slot may be reused,
/// but the old id keeps pointing at nothing instead of at the newcomer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Automatable parameters a node may expose as a modulation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Linear amplitude multiplier
    Gain,
    /// Oscillator pitch or filter cutoff, in Hz
    Frequency,
    /// Pitch offset in cents (100 cents = 1 semitone)
    Detune,
}

impl ParamKind {
    pub const COUNT: usize = 3;

    #[inline]
    pub fn index(self) -> usize {
        match self {
            ParamKind::Gain => 0,
            ParamKind::Frequency => 1,
            ParamKind::Detune => 2,
        }
    }
}

/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Audio-clock time of the first frame in the block, in seconds
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Time of frame `index` within the block.
    #[inline]
    pub fn frame_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }

    /// Time just past the last frame of a render quantum.
    pub fn end_time(&self) -> f64 {
        self.frame_time(RENDER_QUANTUM)
    }
}

/// One render quantum of stereo audio.
#[derive(Debug, Clone)]
pub struct StereoBlock {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBlock {
    pub fn new() -> Self {
        Self {
            left: vec![0.0; RENDER_QUANTUM],
            right: vec![0.0; RENDER_QUANTUM],
        }
    }

    pub fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
    }

    /// Sum `other` into this block.
    pub fn accumulate(&mut self, other: &StereoBlock) {
        for (dst, src) in self.left.iter_mut().zip(&other.left) {
            *dst += src;
        }
        for (dst, src) in self.right.iter_mut().zip(&other.right) {
            *dst += src;
        }
    }

    /// Write the same signal to both channels.
    pub fn fill_mono(&mut self, samples: &[f32]) {
        self.left.copy_from_slice(samples);
        self.right.copy_from_slice(samples);
    }

    /// Average of both channels.
    #[inline]
    pub fn mono(&self, index: usize) -> f32 {
        0.5 * (self.left[index] + self.right[index])
    }
}

impl Default for StereoBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Signals connected into node parameters for the current block.
pub struct ParamInputs {
    buffers: [Vec<f32>; ParamKind::COUNT],
    connected: [bool; ParamKind::COUNT],
}

impl ParamInputs {
    pub fn new() -> Self {
        Self {
            buffers: std::array::from_fn(|_| vec![0.0; RENDER_QUANTUM]),
            connected: [false; ParamKind::COUNT],
        }
    }

    pub fn clear(&mut self) {
        for (buffer, connected) in self.buffers.iter_mut().zip(&mut self.connected) {
            if *connected {
                buffer.fill(0.0);
                *connected = false;
            }
        }
    }

    /// Add the mono sum of `block` to the modulation for `kind`.
    pub fn accumulate(&mut self, kind: ParamKind, block: &StereoBlock) {
        let buffer = &mut self.buffers[kind.index()];
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot += block.mono(i);
        }
        self.connected[kind.index()] = true;
    }

    /// Modulation for `kind`, or `None` when nothing is connected to it.
    pub fn get(&self, kind: ParamKind) -> Option<&[f32]> {
        self.connected[kind.index()].then(|| self.buffers[kind.index()].as_slice())
    }
}

impl Default for ParamInputs {
    fn default() -> Self {
        Self::new()
    }
}

/// When a source node plays. A source is silent before `start`, plays
/// until `stop`, and cannot be restarted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceSchedule {
    start: Option<f64>,
    stop: Option<f64>,
}

impl SourceSchedule {
    pub fn start_time(&self) -> Option<f64> {
        self.start
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    /// Whether the source is sounding at `time`.
    #[inline]
    pub fn gate(&self, time: f64) -> bool {
        self.start.is_some_and(|start| time >= start) && self.stop.map_or(true, |stop| time < stop)
    }

    /// Started and not yet past its stop time.
    pub fn is_active_at(&self, time: f64) -> bool {
        self.is_started() && self.stop.map_or(true, |stop| time < stop)
    }

    /// Whether any part of `[from, to)` falls inside the playing window.
    pub fn overlaps(&self, from: f64, to: f64) -> bool {
        match self.start {
            Some(start) => start < to && self.stop.map_or(true, |stop| stop > from),
            None => false,
        }
    }

    pub(crate) fn set_start(&mut self, when: f64) {
        self.start = Some(when);
    }

    /// A source never stops later than it already was going to.
    pub(crate) fn set_stop(&mut self, when: f64) {
        let when = self.start.map_or(when, |start| when.max(start));
        self.stop = Some(self.stop.map_or(when, |stop| stop.min(when)));
    }
}

/// Core trait for audio graph nodes
///
/// The graph sums every connected input into `input`, every connection
/// into a parameter into `params`, and asks the node to fill `out` for one
/// render quantum.
pub trait GraphNode: Send {
    fn process(
        &mut self,
        input: &StereoBlock,
        params: &ParamInputs,
        out: &mut StereoBlock,
        ctx: &RenderCtx,
    );

    /// Short label for logs and debugging.
    fn name(&self) -> &'static str;

    fn param(&self, _kind: ParamKind) -> Option<&AudioParam> {
        None
    }

    fn param_mut(&mut self, _kind: ParamKind) -> Option<&mut AudioParam> {
        None
    }

    /// Present on source nodes only.
    fn schedule(&self) -> Option<&SourceSchedule> {
        None
    }

    fn schedule_mut(&mut self) -> Option<&mut SourceSchedule> {
        None
    }

    /// Check if this node is a generator still producing sound at `time`
    fn is_generating(&self, time: f64) -> bool {
        self.schedule().is_some_and(|s| s.is_active_at(time))
    }
}

/// Per-sample values of `param` for this block: its automation plus any
/// modulation connected to `kind`.
pub fn resolve_param(
    param: &mut AudioParam,
    kind: ParamKind,
    params: &ParamInputs,
    ctx: &RenderCtx,
    out: &mut [f32],
) {
    param.fill(ctx.time, ctx.sample_rate, out);
    if let Some(modulation) = params.get(kind) {
        for (value, offset) in out.iter_mut().zip(modulation) {
            *value += offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_gate() {
        let mut schedule = SourceSchedule::default();
        assert!(!schedule.gate(0.0));

        schedule.set_start(1.0);
        assert!(!schedule.gate(0.5));
        assert!(schedule.gate(1.0));

        schedule.set_stop(2.0);
        assert!(schedule.gate(1.999));
        assert!(!schedule.gate(2.0));
        assert!(!schedule.is_active_at(2.5));
    }

    #[test]
    fn test_stop_before_start_clamps_to_start() {
        let mut schedule = SourceSchedule::default();
        schedule.set_start(3.0);
        schedule.set_stop(1.0);
        assert_eq!(schedule.stop_time(), Some(3.0));
        assert!(!schedule.gate(3.0));
    }

    #[test]
    fn test_second_stop_cannot_extend() {
        let mut schedule = SourceSchedule::default();
        schedule.set_start(0.0);
        schedule.set_stop(2.0);
        schedule.set_stop(5.0);
        assert_eq!(schedule.stop_time(), Some(2.0));
        schedule.set_stop(1.0);
        assert_eq!(schedule.stop_time(), Some(1.0));
    }

    #[test]
    fn test_overlaps_block() {
        let mut schedule = SourceSchedule::default();
        schedule.set_start(1.0);
        assert!(!schedule.overlaps(0.0, 0.5));
        assert!(schedule.overlaps(0.9, 1.1));
        schedule.set_stop(2.0);
        assert!(!schedule.overlaps(2.0, 2.5));
    }

    #[test]
    fn test_param_inputs_only_report_connected() {
        let mut inputs = ParamInputs::new();
        assert!(inputs.get(ParamKind::Gain).is_none());

        let mut block = StereoBlock::new();
        block.fill_mono(&[0.25; RENDER_QUANTUM]);
        inputs.accumulate(ParamKind::Detune, &block);
        inputs.accumulate(ParamKind::Detune, &block);

        let detune = inputs.get(ParamKind::Detune).unwrap();
        assert!(detune.iter().all(|&v| (v - 0.5).abs() < 1e-6));
        assert!(inputs.get(ParamKind::Gain).is_none());

        inputs.clear();
        assert!(inputs.get(ParamKind::Detune).is_none());
    }
}
