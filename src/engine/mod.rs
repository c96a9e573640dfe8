//! The ambient engine: lazily opens an audio context, wires and tears down
//! sessions, and drives chime timers from the audio clock.
//!
//! ```text
//!                 toggle()                      toggle()
//!   Idle ─────────────────────────► Active ─────────────────► Idle
//!    │  open context + master bus    │  chime timer fires       stop voices,
//!    │  (first time only)            │  every 12..24 s          cancel timer,
//!    │  resume if suspended          │                          release nodes
//! ```
//!
//! The host calls [`AmbientEngine::poll`] from its frame loop so due timers
//! run on the control thread.

/// Audio-clock timers polled by the host.
pub mod scheduler;
/// Node handles owned by a running session.
pub mod session;
/// Builders for reverb, wind, pads and chimes.
pub mod voices;

use std::sync::MutexGuard;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::{debug, info, warn};

use crate::{
    config::AmbientConfig,
    error::{DeviceError, EngineError},
    graph::{AudioGraph, GainNode, NodeId, ParamKind},
    io::{AudioContext, AudioDevice, ContextState, OfflineDevice},
};

use self::{
    scheduler::{Scheduler, TimerId},
    session::{release_all, AmbientSession, ChimeEvent, PendingChime, SessionAssets, Wiring},
    voices::Bus,
};

pub const START_LABEL: &str = "Start Ambient";
pub const STOP_LABEL: &str = "Stop Ambient";

/// Frames rendered between timer polls in [`AmbientEngine::run_for`].
const OFFLINE_POLL_FRAMES: usize = 512;

/// Deferred work keyed to the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Task {
    SpawnChime,
    ReleaseChime(ChimeEvent),
}

pub struct AmbientEngine<D: AudioDevice> {
    device: D,
    config: AmbientConfig,
    context: Option<AudioContext<D::Stream>>,
    master: Option<NodeId>,
    session: Option<AmbientSession>,
    scheduler: Scheduler<Task>,
    volume: f32,
    rng: Pcg64,
    chimes_spawned: usize,
}

impl<D: AudioDevice> AmbientEngine<D> {
    pub fn new(device: D, config: AmbientConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_rng(&mut rand::rng()),
        };
        Self {
            device,
            volume: config.volume,
            config,
            context: None,
            master: None,
            session: None,
            scheduler: Scheduler::new(),
            rng,
            chimes_spawned: 0,
        }
    }

    /// Text for the toggle control.
    pub fn label(&self) -> &'static str {
        if self.is_active() {
            STOP_LABEL
        } else {
            START_LABEL
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Last requested volume, whether or not a context exists.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn config(&self) -> &AmbientConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn context(&self) -> Option<&AudioContext<D::Stream>> {
        self.context.as_ref()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(AudioContext::state)
    }

    /// Lock the live graph, if a context exists.
    pub fn graph(&self) -> Option<MutexGuard<'_, AudioGraph>> {
        self.context.as_ref().map(AudioContext::lock)
    }

    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    /// Current gain of the master bus.
    pub fn master_gain(&self) -> Option<f32> {
        let master = self.master?;
        let graph = self.graph()?;
        let gain = graph.param(master, ParamKind::Gain).ok()?;
        Some(gain.value_at(graph.current_time()))
    }

    pub fn session(&self) -> Option<&AmbientSession> {
        self.session.as_ref()
    }

    pub fn current_time(&self) -> Option<f64> {
        self.context.as_ref().map(AudioContext::current_time)
    }

    /// Chimes spawned since the engine was created.
    pub fn chimes_spawned(&self) -> usize {
        self.chimes_spawned
    }

    /// Pending chime-spawning timers: one while a session is active.
    pub fn pending_chime_timers(&self) -> usize {
        self.scheduler.count(|task| *task == Task::SpawnChime)
    }

    /// Chimes still waiting for their deferred release.
    pub fn pending_cleanups(&self) -> usize {
        self.scheduler
            .count(|task| matches!(task, Task::ReleaseChime(_)))
    }

    pub fn next_chime_at(&self) -> Option<f64> {
        self.scheduler.due_of(self.session.as_ref()?.chime_timer)
    }

    /// Open the context and master bus on first use. A closed context is
    /// replaced by a fresh one.
    fn ensure_context(&mut self) -> Result<&mut AudioContext<D::Stream>, EngineError> {
        let context = match self.context.take() {
            Some(context) if context.state() != ContextState::Closed => context,
            _ => {
                let context = self.device.open()?;
                let master = {
                    let mut graph = context.lock();
                    let master = graph.add(GainNode::new(self.volume));
                    let destination = graph.destination();
                    graph.connect(master, destination)?;
                    master
                };
                info!(
                    sample_rate = context.sample_rate(),
                    volume = self.volume,
                    "audio context created"
                );
                self.master = Some(master);
                context
            }
        };
        Ok(self.context.insert(context))
    }

    /// Resume a suspended context, then start if idle or stop if active.
    pub fn toggle(&mut self) -> Result<(), EngineError> {
        let context = self.ensure_context()?;
        if context.state() == ContextState::Suspended {
            context.resume()?;
        }

        if self.is_active() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Build a session and start every continuous voice. Does nothing
    /// while a session is already running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.session.is_some() {
            return Ok(());
        }
        self.ensure_context()?;

        let master = self.master.ok_or(DeviceError::Closed)?;
        let context = self.context.as_ref().ok_or(DeviceError::Closed)?;

        // The render callback shares the graph lock; keep IR synthesis and
        // FFT setup outside it.
        let assets = SessionAssets::prepare(&self.config, &mut self.rng, context.sample_rate());
        let interval = assets.chime_interval;

        let mut graph = context.lock();
        let now = graph.current_time();
        let chime_timer = self
            .scheduler
            .schedule_repeating(now + interval, interval, Task::SpawnChime);

        let built = AmbientSession::build(
            &mut graph,
            &self.config,
            assets,
            &mut self.rng,
            master,
            now,
            chime_timer,
        );
        let session = match built {
            Ok(session) => session,
            Err(err) => {
                self.scheduler.cancel(chime_timer);
                return Err(err.into());
            }
        };

        info!(
            at = now,
            chime_interval = interval,
            nodes = graph.node_count(),
            "ambient session started"
        );
        self.session = Some(session);
        Ok(())
    }

    /// Stop every voice, cancel the chime timer and release the session's
    /// nodes. Chimes still ringing are left to finish and are released by
    /// their own cleanup timers. Does nothing when idle.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.scheduler.cancel(session.chime_timer);

        let Some(context) = self.context.as_ref() else {
            return;
        };
        let mut graph = context.lock();
        let now = graph.current_time();

        release_all(session.handles(), &mut graph, now);

        let mut ringing = 0;
        for pending in &session.chimes {
            if pending.event.stop_at <= now {
                self.scheduler.cancel(pending.cleanup);
                release_all(pending.event.handles(), &mut graph, now);
            } else {
                ringing += 1;
            }
        }

        info!(
            at = now,
            ringing,
            nodes = graph.node_count(),
            "ambient session stopped"
        );
    }

    /// Record `volume` and apply it to the master bus if one exists. The
    /// value is not clamped.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;

        let (Some(context), Some(master)) = (self.context.as_ref(), self.master) else {
            return;
        };
        let mut graph = context.lock();
        match graph.param_mut(master, ParamKind::Gain) {
            Ok(gain) => gain.set_value(volume),
            Err(err) => warn!(%err, "master bus missing"),
        }
    }

    /// Pause the output device, freezing the audio clock and every timer.
    pub fn suspend(&mut self) -> Result<(), EngineError> {
        if let Some(context) = self.context.as_mut() {
            context.suspend()?;
        }
        Ok(())
    }

    /// Run every timer that has come due on the audio clock.
    pub fn poll(&mut self) {
        let Some(now) = self.current_time() else {
            return;
        };

        while let Some((timer, task)) = self.scheduler.pop_due(now) {
            match task {
                Task::SpawnChime => self.spawn_chime(),
                Task::ReleaseChime(event) => self.release_chime(timer, event),
            }
        }
    }

    /// Stop the session and close the context. Safe to call repeatedly; a
    /// later `toggle` opens a new context.
    pub fn shutdown(&mut self) {
        self.stop();
        self.scheduler.clear();
        if let Some(mut context) = self.context.take() {
            context.close();
            info!("audio context closed");
        }
        self.master = None;
    }

    fn spawn_chime(&mut self) {
        let (Some(context), Some(session), Some(master)) =
            (self.context.as_ref(), self.session.as_mut(), self.master)
        else {
            return;
        };
        if context.state() == ContextState::Closed {
            return;
        }

        let mut graph = context.lock();
        let at = graph.current_time();
        let bus = Bus {
            master,
            reverb: Some(session.reverb.convolver),
        };

        let mut wiring = Wiring::new(&mut graph);
        let result = voices::chime(&mut wiring, &self.config.chimes, &mut self.rng, bus, at);
        match wiring.finish(at, result) {
            Ok(event) => {
                let release_at = at + self.config.chimes.cleanup_after as f64;
                let cleanup = self
                    .scheduler
                    .schedule_once(release_at, Task::ReleaseChime(event));
                session.chimes.push(PendingChime { event, cleanup });
                self.chimes_spawned += 1;
                debug!(
                    at,
                    frequency = event.frequency,
                    stop_at = event.stop_at,
                    "chime"
                );
            }
            Err(err) => warn!(%err, "failed to spawn chime"),
        }
    }

    fn release_chime(&mut self, timer: TimerId, event: ChimeEvent) {
        if let Some(session) = self.session.as_mut() {
            session.chimes.retain(|pending| pending.cleanup != timer);
        }
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let mut graph = context.lock();
        let now = graph.current_time();
        release_all(event.handles(), &mut graph, now);
        debug!(at = now, started_at = event.started_at, "chime released");
    }
}

impl<D: AudioDevice> Drop for AmbientEngine<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl AmbientEngine<OfflineDevice> {
    /// Render `seconds` of audio, polling timers between steps. `sink`
    /// receives interleaved stereo. While no context is running the clock
    /// stays put and `sink` receives silence.
    pub fn run_for(&mut self, seconds: f64, mut sink: impl FnMut(&[f32])) {
        let sample_rate = self.device.sample_rate() as f64;
        let mut remaining = (seconds * sample_rate).round() as usize;
        let mut buffer = vec![0.0f32; OFFLINE_POLL_FRAMES * 2];

        while remaining > 0 {
            let frames = remaining.min(OFFLINE_POLL_FRAMES);
            let block = &mut buffer[..frames * 2];
            match self.context.as_ref() {
                Some(context) => context.render(block, 2),
                None => block.fill(0.0),
            }
            sink(block);
            self.poll();
            remaining -= frames;
        }
    }

    /// [`run_for`](Self::run_for) discarding the audio.
    pub fn advance(&mut self, seconds: f64) {
        self.run_for(seconds, |_| {});
    }
}
