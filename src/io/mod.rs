//! Output devices and the audio context that owns the running graph.
//!
//! An [`AudioDevice`] opens an [`AudioContext`]: a shared [`AudioGraph`]
//! plus the stream that pulls audio out of it. [`CpalDevice`] plays through
//! the default sound card; [`OfflineDevice`] has no stream at all and is
//! rendered by hand, which keeps tests and WAV bounces deterministic.
//!
//! [`AudioGraph`]: crate::graph::AudioGraph

/// Context lifecycle: suspended, running, closed.
pub mod context;
/// Hand-driven device for tests and offline rendering.
pub mod offline;
/// Sound card output via cpal.
pub mod output;

pub use context::{AudioContext, ContextState};
pub use offline::{OfflineDevice, OfflineStream};
pub use output::{CpalDevice, CpalStream};

use crate::error::DeviceError;

/// A stream pulling audio from a context's graph.
pub trait OutputStream {
    fn resume(&mut self) -> Result<(), DeviceError>;
    fn suspend(&mut self) -> Result<(), DeviceError>;
}

/// Opens audio contexts. Contexts start suspended.
pub trait AudioDevice {
    type Stream: OutputStream;

    fn open(&mut self) -> Result<AudioContext<Self::Stream>, DeviceError>;
}
