use std::sync::Arc;

use rand::Rng;
use tracing::trace;

use crate::{
    config::AmbientConfig,
    dsp::{AudioBuffer, AudioParam},
    engine::{
        scheduler::TimerId,
        voices::{self, Bus},
    },
    error::GraphError,
    graph::{AudioGraph, ConvolverNode, GraphNode, NodeId, ParamKind},
};

/*
Session Anatomy
===============

One AmbientSession owns every node it wires up:

  ReverbSend   convolver ──► wet gain ──► master
  WindVoice    noise ──► LP ──► gain ──► master          noise ──► reverb
               LFO ──► depth ──► LP.frequency
  PadVoice x3  sine ──► envelope ──► LP ──► master       LP ──► reverb
               LFO ──► depth ──► sine.detune
  ChimeEvent   sine ──► envelope ──► HP ──► master       HP ──► reverb

The reverb IR, its FFT partitions and the wind noise loop are prepared as
SessionAssets before the graph is locked. The render callback shares that
lock, so only node insertion and wiring happen while it is held.

Teardown walks the session as a flat list of Disposable handles. A
generator is stopped before it is disconnected and removed; a processor is
only disconnected and removed. Every step may fail (a node released twice,
a source never started) and every failure is ignored: teardown always runs
to the end.
*/

/// A node the session must release on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposable {
    /// A scheduled source: stopped, then released
    Generator(NodeId),
    /// Anything else: released
    Processor(NodeId),
}

impl Disposable {
    pub fn id(&self) -> NodeId {
        match *self {
            Disposable::Generator(id) | Disposable::Processor(id) => id,
        }
    }

    /// Stop (generators only), disconnect and remove the node.
    pub fn release(self, graph: &mut AudioGraph, now: f64) {
        let id = self.id();
        if let Disposable::Generator(_) = self {
            ignore(graph.stop(id, now), id, "stop");
        }
        ignore(graph.disconnect(id), id, "disconnect");
        ignore(graph.remove(id), id, "remove");
    }
}

fn ignore(result: Result<(), GraphError>, node: NodeId, action: &'static str) {
    if let Err(err) = result {
        trace!(%node, action, %err, "teardown step failed");
    }
}

/// Release every handle, best effort.
pub fn release_all(handles: impl IntoIterator<Item = Disposable>, graph: &mut AudioGraph, now: f64) {
    for handle in handles {
        handle.release(graph, now);
    }
}

/// Graph edits for one voice or session. Remembers every node it adds so a
/// failure part way through can release what was already built.
pub struct Wiring<'g> {
    graph: &'g mut AudioGraph,
    created: Vec<Disposable>,
}

impl<'g> Wiring<'g> {
    pub fn new(graph: &'g mut AudioGraph) -> Self {
        Self {
            graph,
            created: Vec::new(),
        }
    }

    pub fn generator<N: GraphNode + 'static>(&mut self, node: N) -> NodeId {
        let id = self.graph.add(node);
        self.created.push(Disposable::Generator(id));
        id
    }

    pub fn processor<N: GraphNode + 'static>(&mut self, node: N) -> NodeId {
        let id = self.graph.add(node);
        self.created.push(Disposable::Processor(id));
        id
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.graph.connect(from, to)
    }

    pub fn connect_param(
        &mut self,
        from: NodeId,
        to: NodeId,
        param: ParamKind,
    ) -> Result<(), GraphError> {
        self.graph.connect_param(from, to, param)
    }

    pub fn param_mut(&mut self, id: NodeId, kind: ParamKind) -> Result<&mut AudioParam, GraphError> {
        self.graph.param_mut(id, kind)
    }

    pub fn start(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        self.graph.start(id, when)
    }

    pub fn stop(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        self.graph.stop(id, when)
    }

    /// Keep the result of `build`, or release everything it added if it
    /// failed.
    pub fn finish<T>(self, now: f64, result: Result<T, GraphError>) -> Result<T, GraphError> {
        if result.is_err() {
            trace!(nodes = self.created.len(), "releasing partially built voice");
            release_all(self.created, self.graph, now);
        }
        result
    }
}

/// Convolution reverb shared by every voice of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSend {
    /// Send target; voices connect here
    pub convolver: NodeId,
    pub wet: NodeId,
}

impl ReverbSend {
    pub fn handles(&self) -> [Disposable; 2] {
        [
            Disposable::Processor(self.convolver),
            Disposable::Processor(self.wet),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindVoice {
    pub source: NodeId,
    pub filter: NodeId,
    pub gain: NodeId,
    pub lfo: NodeId,
    pub lfo_gain: NodeId,
}

impl WindVoice {
    pub fn handles(&self) -> [Disposable; 5] {
        [
            Disposable::Generator(self.source),
            Disposable::Processor(self.filter),
            Disposable::Processor(self.gain),
            Disposable::Generator(self.lfo),
            Disposable::Processor(self.lfo_gain),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadVoice {
    pub oscillator: NodeId,
    pub gain: NodeId,
    pub filter: NodeId,
    pub lfo: NodeId,
    pub lfo_gain: NodeId,
    /// Gain the swell settles at
    pub level: f32,
    /// When the swell reaches `level`
    pub ramp_end: f64,
}

impl PadVoice {
    pub fn handles(&self) -> [Disposable; 5] {
        [
            Disposable::Generator(self.oscillator),
            Disposable::Processor(self.gain),
            Disposable::Processor(self.filter),
            Disposable::Generator(self.lfo),
            Disposable::Processor(self.lfo_gain),
        ]
    }
}

/// One bell strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChimeEvent {
    pub oscillator: NodeId,
    pub gain: NodeId,
    pub highpass: NodeId,
    pub frequency: f32,
    pub started_at: f64,
    pub stop_at: f64,
}

impl ChimeEvent {
    pub fn handles(&self) -> [Disposable; 3] {
        [
            Disposable::Generator(self.oscillator),
            Disposable::Processor(self.gain),
            Disposable::Processor(self.highpass),
        ]
    }
}

/// A chime together with the timer that will release it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingChime {
    pub event: ChimeEvent,
    pub cleanup: TimerId,
}

/// The expensive parts of a session, built without touching the graph.
pub struct SessionAssets {
    pub reverb: ConvolverNode,
    pub wind_noise: Arc<AudioBuffer>,
    /// Seconds between chimes for the session
    pub chime_interval: f64,
}

impl SessionAssets {
    pub fn prepare<R: Rng + ?Sized>(config: &AmbientConfig, rng: &mut R, sample_rate: f32) -> Self {
        Self {
            reverb: voices::reverb_convolver(&config.reverb, rng, sample_rate),
            wind_noise: voices::wind_noise(&config.wind, rng, sample_rate),
            chime_interval: config.chimes.interval.sample(rng) as f64,
        }
    }
}

/// Everything one start/stop cycle created.
#[derive(Debug, Clone)]
pub struct AmbientSession {
    pub started_at: f64,
    pub reverb: ReverbSend,
    pub wind: WindVoice,
    pub pads: Vec<PadVoice>,
    pub chime_timer: TimerId,
    /// Seconds between chimes for this session
    pub chime_interval: f64,
    pub chimes: Vec<PendingChime>,
}

impl AmbientSession {
    /// Wire reverb, wind and pads into `master`, starting every source at
    /// `now`. On failure nothing built so far is left in the graph.
    pub fn build<R: Rng + ?Sized>(
        graph: &mut AudioGraph,
        config: &AmbientConfig,
        assets: SessionAssets,
        rng: &mut R,
        master: NodeId,
        now: f64,
        chime_timer: TimerId,
    ) -> Result<Self, GraphError> {
        let mut wiring = Wiring::new(graph);
        let result = Self::wire(&mut wiring, config, assets, rng, master, now, chime_timer);
        wiring.finish(now, result)
    }

    fn wire<R: Rng + ?Sized>(
        wiring: &mut Wiring<'_>,
        config: &AmbientConfig,
        assets: SessionAssets,
        rng: &mut R,
        master: NodeId,
        now: f64,
        chime_timer: TimerId,
    ) -> Result<Self, GraphError> {
        let SessionAssets {
            reverb,
            wind_noise,
            chime_interval,
        } = assets;

        let reverb = voices::reverb_send(wiring, &config.reverb, reverb, master)?;
        let bus = Bus {
            master,
            reverb: Some(reverb.convolver),
        };
        let wind = voices::wind(wiring, &config.wind, wind_noise, bus, now)?;
        let pads = config
            .pads
            .roots
            .iter()
            .enumerate()
            .map(|(index, &root)| voices::pad(wiring, &config.pads, rng, index, root, bus, now))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            started_at: now,
            reverb,
            wind,
            pads,
            chime_timer,
            chime_interval,
            chimes: Vec::new(),
        })
    }

    /// Every continuous node: reverb, wind and pads. Chimes are released
    /// separately.
    pub fn handles(&self) -> Vec<Disposable> {
        let mut handles = Vec::with_capacity(2 + 5 + 5 * self.pads.len());
        handles.extend(self.reverb.handles());
        handles.extend(self.wind.handles());
        for pad in &self.pads {
            handles.extend(pad.handles());
        }
        handles
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use super::*;
    use crate::graph::{GainNode, OscillatorNode};

    #[test]
    fn test_release_stops_and_removes_generator() {
        let mut graph = AudioGraph::new(8_000.0);
        let osc = graph.add(OscillatorNode::sine(440.0));
        graph.connect(osc, graph.destination()).unwrap();
        graph.start(osc, 0.0).unwrap();

        Disposable::Generator(osc).release(&mut graph, 0.0);
        assert!(!graph.contains(osc));
        assert_eq!(graph.active_generators(), 0);
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut graph = AudioGraph::new(8_000.0);
        let gain = graph.add(GainNode::new(1.0));
        Disposable::Processor(gain).release(&mut graph, 0.0);
        Disposable::Processor(gain).release(&mut graph, 0.0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_unstarted_generator_is_still_removed() {
        let mut graph = AudioGraph::new(8_000.0);
        let osc = graph.add(OscillatorNode::sine(440.0));
        Disposable::Generator(osc).release(&mut graph, 0.0);
        assert!(!graph.contains(osc));
    }

    #[test]
    fn test_failed_wiring_releases_partial_work() {
        let mut graph = AudioGraph::new(8_000.0);
        let mut wiring = Wiring::new(&mut graph);
        let a = wiring.processor(GainNode::new(1.0));
        let b = wiring.processor(GainNode::new(1.0));
        let result = wiring.connect(a, b).and_then(|_| wiring.connect(b, a));
        assert!(wiring.finish(0.0, result).is_err());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_session_handles_cover_every_node() {
        let mut graph = AudioGraph::new(8_000.0);
        let master = graph.add(GainNode::new(0.5));
        graph.connect(master, graph.destination()).unwrap();

        let config = AmbientConfig::default().reverb_seconds(0.25);
        let mut rng = Pcg64::seed_from_u64(3);
        let mut scheduler = crate::engine::scheduler::Scheduler::new();
        let timer = scheduler.schedule_repeating(12.0, 12.0, ());
        let assets = SessionAssets::prepare(&config, &mut rng, 8_000.0);
        let session =
            AmbientSession::build(&mut graph, &config, assets, &mut rng, master, 0.0, timer).unwrap();

        let handles = session.handles();
        assert_eq!(handles.len(), 2 + 5 + 15);
        assert_eq!(graph.node_count(), 2 + handles.len());
        assert_eq!(graph.active_generators(), 8);

        release_all(handles, &mut graph, 0.0);
        assert_eq!(graph.node_count(), 2);
        assert!(graph.is_connected(master, graph.destination()));
    }

    #[test]
    fn test_build_uses_prepared_assets() {
        let mut graph = AudioGraph::new(8_000.0);
        let master = graph.add(GainNode::new(0.5));
        graph.connect(master, graph.destination()).unwrap();

        let config = AmbientConfig::default().reverb_seconds(0.25);
        let mut rng = Pcg64::seed_from_u64(4);
        let assets = SessionAssets::prepare(&config, &mut rng, 8_000.0);
        let noise = Arc::clone(&assets.wind_noise);
        assert_eq!(noise.len(), 6 * 8_000);
        assert!((12.0..=24.0).contains(&assets.chime_interval));
        let interval = assets.chime_interval;

        let mut scheduler = crate::engine::scheduler::Scheduler::new();
        let timer = scheduler.schedule_repeating(interval, interval, ());
        let session =
            AmbientSession::build(&mut graph, &config, assets, &mut rng, master, 0.0, timer).unwrap();

        assert_eq!(
            Arc::strong_count(&noise),
            2,
            "the wind loop plays the prepared buffer instead of a fresh one"
        );
        assert_eq!(session.chime_interval, interval);
        assert_eq!(graph.node_name(session.reverb.convolver), Ok("convolver"));
    }
}
