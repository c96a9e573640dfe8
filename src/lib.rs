pub mod config;
pub mod dsp; // Signal primitives: oscillators, filters, noise, convolution
pub mod engine; // Ambient session lifecycle and chime scheduling
pub mod error;
pub mod graph; // Declarative audio graph rendered by the output device
pub mod io; // Output devices and the audio context
pub mod particles; // Snowfall simulation for the overlay

pub use config::AmbientConfig;
pub use engine::AmbientEngine;
pub use error::{ConfigError, DeviceError, EngineError, GraphError};
pub use particles::Snowfield;

/// Frames rendered by one pass over the graph.
pub const RENDER_QUANTUM: usize = 128;
