use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, warn};

use crate::{
    error::DeviceError,
    graph::{lock_graph, AudioGraph, SharedGraph},
    io::OutputStream,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Stream paused, audio clock frozen
    Suspended,
    Running,
    /// Stream released; the context cannot be resumed
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContextState::Suspended => "suspended",
            ContextState::Running => "running",
            ContextState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// A graph and the stream that plays it.
pub struct AudioContext<S> {
    graph: SharedGraph,
    stream: Option<S>,
    state: ContextState,
    sample_rate: f32,
}

impl<S: OutputStream> AudioContext<S> {
    /// Wrap an already-paused stream rendering `graph`.
    pub fn new(graph: SharedGraph, stream: S) -> Self {
        let sample_rate = lock_graph(&graph).sample_rate();
        Self {
            graph,
            stream: Some(stream),
            state: ContextState::Suspended,
            sample_rate,
        }
    }

    /// Context around a fresh graph, for devices that build their stream
    /// after the graph exists.
    pub fn with_graph(sample_rate: f32, build: impl FnOnce(&SharedGraph) -> S) -> Self {
        let graph: SharedGraph = Arc::new(Mutex::new(AudioGraph::new(sample_rate)));
        let stream = build(&graph);
        Self::new(graph, stream)
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn lock(&self) -> MutexGuard<'_, AudioGraph> {
        lock_graph(&self.graph)
    }

    pub fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    pub fn resume(&mut self) -> Result<(), DeviceError> {
        match self.state {
            ContextState::Running => Ok(()),
            ContextState::Closed => Err(DeviceError::Closed),
            ContextState::Suspended => {
                self.stream
                    .as_mut()
                    .ok_or(DeviceError::Closed)?
                    .resume()?;
                self.state = ContextState::Running;
                debug!("audio context resumed");
                Ok(())
            }
        }
    }

    pub fn suspend(&mut self) -> Result<(), DeviceError> {
        match self.state {
            ContextState::Suspended => Ok(()),
            ContextState::Closed => Err(DeviceError::Closed),
            ContextState::Running => {
                self.stream
                    .as_mut()
                    .ok_or(DeviceError::Closed)?
                    .suspend()?;
                self.state = ContextState::Suspended;
                debug!("audio context suspended");
                Ok(())
            }
        }
    }

    /// Stop and release the stream.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if self.state == ContextState::Running {
                if let Err(err) = stream.suspend() {
                    warn!(%err, "failed to pause stream while closing");
                }
            }
        }
        self.state = ContextState::Closed;
        debug!("audio context closed");
    }

    /// Pull interleaved audio from the graph by hand. Outside the running
    /// state this writes silence and the clock does not move.
    pub fn render(&self, out: &mut [f32], channels: usize) {
        if self.state == ContextState::Running {
            self.lock().render(out, channels);
        } else {
            out.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::OfflineStream;

    fn context() -> AudioContext<OfflineStream> {
        AudioContext::with_graph(8_000.0, |_| OfflineStream)
    }

    #[test]
    fn test_starts_suspended() {
        let ctx = context();
        assert_eq!(ctx.state(), ContextState::Suspended);
        assert_eq!(ctx.sample_rate(), 8_000.0);
    }

    #[test]
    fn test_suspended_clock_is_frozen() {
        let mut ctx = context();
        let mut out = vec![1.0; 256];
        ctx.render(&mut out, 2);
        assert_eq!(ctx.current_time(), 0.0);
        assert!(out.iter().all(|&s| s == 0.0));

        ctx.resume().unwrap();
        ctx.render(&mut out, 2);
        assert!(ctx.current_time() > 0.0);
    }

    #[test]
    fn test_closed_context_cannot_resume() {
        let mut ctx = context();
        ctx.resume().unwrap();
        ctx.close();
        assert_eq!(ctx.state(), ContextState::Closed);
        assert!(matches!(ctx.resume(), Err(DeviceError::Closed)));
        assert!(matches!(ctx.suspend(), Err(DeviceError::Closed)));
    }

    #[test]
    fn test_resume_and_suspend_are_idempotent() {
        let mut ctx = context();
        ctx.resume().unwrap();
        ctx.resume().unwrap();
        assert_eq!(ctx.state(), ContextState::Running);
        ctx.suspend().unwrap();
        ctx.suspend().unwrap();
        assert_eq!(ctx.state(), ContextState::Suspended);
    }
}
