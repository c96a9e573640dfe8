use thiserror::Error;

use crate::graph::{NodeId, ParamKind};

/// Failures raised while editing or scheduling the audio graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("node {0} does not exist (already released?)")]
    UnknownNode(NodeId),
    #[error("node {0} is not a source and cannot be started or stopped")]
    NotASource(NodeId),
    #[error("source {0} was already started")]
    AlreadyStarted(NodeId),
    #[error("source {0} was stopped before being started")]
    NotStarted(NodeId),
    #[error("connecting {from} to {to} would create a cycle")]
    Cycle { from: NodeId, to: NodeId },
    #[error("node {node} has no {param:?} parameter")]
    NoSuchParam { node: NodeId, param: ParamKind },
    #[error("the destination node cannot be removed")]
    RemoveDestination,
    #[error("exponential ramp target must be positive, got {0}")]
    InvalidRamp(f32),
}

/// Failures from the output device layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no default output device available")]
    NoOutputDevice,
    #[error("failed to fetch default output config")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to resume output stream")]
    Play(#[from] cpal::PlayStreamError),
    #[error("failed to suspend output stream")]
    Pause(#[from] cpal::PauseStreamError),
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error("audio context is closed")]
    Closed,
}

/// Errors surfaced by [`AmbientEngine`](crate::AmbientEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Errors loading an [`AmbientConfig`](crate::AmbientConfig) from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("invalid config")]
    Toml(#[from] toml::de::Error),
}
