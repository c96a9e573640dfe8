use crate::{
    error::DeviceError,
    io::{AudioContext, AudioDevice, OutputStream},
};

/// A device with no sound card. Its contexts advance only when rendered
/// with [`AudioContext::render`].
#[derive(Debug, Clone)]
pub struct OfflineDevice {
    sample_rate: f32,
    opened: usize,
}

impl OfflineDevice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            opened: 0,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// How many contexts this device has opened.
    pub fn opened(&self) -> usize {
        self.opened
    }
}

/// Stream of an [`OfflineDevice`]; resuming and suspending only flip the
/// context state.
#[derive(Debug, Default)]
pub struct OfflineStream;

impl OutputStream for OfflineStream {
    fn resume(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl AudioDevice for OfflineDevice {
    type Stream = OfflineStream;

    fn open(&mut self) -> Result<AudioContext<OfflineStream>, DeviceError> {
        self.opened += 1;
        Ok(AudioContext::with_graph(self.sample_rate, |_| OfflineStream))
    }
}
