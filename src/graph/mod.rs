//! A small Web Audio style node graph.
//!
//! The control thread adds nodes, connects them, and schedules parameter
//! automation; the output device renders the graph one quantum at a time.
//! Sources (oscillators, buffer players) are scheduled with start and stop
//! times on the audio clock, and any node's output can be routed into
//! another node's parameter for modulation.

/// Arena of nodes, connections, and the render loop.
pub mod audio_graph;
/// Looping or one-shot playback of an in-memory buffer.
pub mod buffer_source;
/// Convolution reverb.
pub mod convolver;
/// Low-pass and high-pass filters with a modulatable cutoff.
pub mod filter;
/// Automatable gain, used for levels and envelopes.
pub mod gain;
/// Core traits shared by all graph nodes.
pub mod node;
/// Scheduled oscillators, audible or sub-audio.
pub mod oscillator;

pub use audio_graph::{lock_graph, AudioGraph, Edge, SharedGraph};
pub use buffer_source::BufferSourceNode;
pub use convolver::ConvolverNode;
pub use filter::FilterNode;
pub use gain::GainNode;
pub use node::{GraphNode, NodeId, ParamInputs, ParamKind, RenderCtx, SourceSchedule, StereoBlock};
pub use oscillator::OscillatorNode;
