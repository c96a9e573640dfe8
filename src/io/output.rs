use std::sync::{Arc, Mutex};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, SampleFormat, SizedSample, StreamConfig,
};
use tracing::{error, info};

use crate::{
    error::DeviceError,
    graph::{lock_graph, AudioGraph, SharedGraph},
    io::{AudioContext, AudioDevice, OutputStream},
    RENDER_QUANTUM,
};

/*
Sound Card Output
=================

    ┌──────────────┐  lock   ┌────────────┐  interleaved  ┌──────────┐
    │ cpal callback├────────►│ AudioGraph ├──────────────►│ device   │
    └──────┬───────┘         └────────────┘   f32/i16/u16 └──────────┘
           │ mono copy (optional, drop when full)
           ▼
      rtrb ring ──► UI scope

The callback renders in chunks of one render quantum per channel, converts
to whatever sample format the device wants, and optionally pushes a mono
copy into a lock-free ring for the oscilloscope. The ring never blocks: if
the UI falls behind, samples are dropped.

The tap outlives any single stream: each stream holds a shared handle, so
a context reopened after shutdown keeps feeding the same scope. Only one
stream exists at a time; the callback uses try_lock and skips the copy
rather than wait.

The stream is paused right after it is built so the context starts
suspended, matching a browser that refuses to play before a user gesture.
*/

#[cfg(feature = "rtrb")]
type Tap = Option<Arc<Mutex<rtrb::Producer<f32>>>>;
#[cfg(not(feature = "rtrb"))]
type Tap = ();

/// The system's default output device.
#[derive(Default)]
pub struct CpalDevice {
    tap: Tap,
}

impl CpalDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the mono mix of everything played into `tap`, across every
    /// context this device opens.
    #[cfg(feature = "rtrb")]
    pub fn with_tap(mut self, tap: rtrb::Producer<f32>) -> Self {
        self.tap = Some(Arc::new(Mutex::new(tap)));
        self
    }
}

pub struct CpalStream {
    stream: cpal::Stream,
}

impl OutputStream for CpalStream {
    fn resume(&mut self) -> Result<(), DeviceError> {
        self.stream.play()?;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), DeviceError> {
        self.stream.pause()?;
        Ok(())
    }
}

impl AudioDevice for CpalDevice {
    type Stream = CpalStream;

    fn open(&mut self) -> Result<AudioContext<CpalStream>, DeviceError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(DeviceError::NoOutputDevice)?;
        let supported = device.default_output_config()?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0 as f32;
        info!(
            sample_rate,
            channels = config.channels,
            ?sample_format,
            "opening output device"
        );

        let graph: SharedGraph = Arc::new(Mutex::new(AudioGraph::new(sample_rate)));
        let tap = self.tap.clone();
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, graph.clone(), tap)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, graph.clone(), tap)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, graph.clone(), tap)?,
            other => return Err(DeviceError::UnsupportedFormat(other)),
        };
        stream.pause()?;

        Ok(AudioContext::new(graph, CpalStream { stream }))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    graph: SharedGraph,
    tap: Tap,
) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels.max(1) as usize;
    let mut render_buf = vec![0.0f32; RENDER_QUANTUM * channels];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut graph = lock_graph(&graph);
            for chunk in data.chunks_mut(render_buf.len()) {
                let block = &mut render_buf[..chunk.len()];
                graph.render(block, channels);

                for (out, &sample) in chunk.iter_mut().zip(block.iter()) {
                    *out = T::from_sample(sample);
                }
                feed_tap(&tap, block, channels);
            }
        },
        |err| error!(%err, "output stream error"),
        None,
    )?;
    Ok(stream)
}

#[cfg(feature = "rtrb")]
fn feed_tap(tap: &Tap, block: &[f32], channels: usize) {
    let Some(tap) = tap.as_ref() else { return };
    let Ok(mut producer) = tap.try_lock() else {
        return;
    };
    for frame in block.chunks(channels) {
        let mono = frame.iter().sum::<f32>() / frame.len() as f32;
        if producer.push(mono).is_err() {
            break;
        }
    }
}

#[cfg(not(feature = "rtrb"))]
fn feed_tap(_tap: &Tap, _block: &[f32], _channels: usize) {}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;

    #[test]
    fn test_tap_survives_reopen() {
        let (producer, mut consumer) = rtrb::RingBuffer::<f32>::new(16);
        let device = CpalDevice::new().with_tap(producer);

        // Each opened stream gets its own clone of the device's tap
        let first = device.tap.clone();
        feed_tap(&first, &[0.2, 0.4], 2);
        drop(first);
        let second = device.tap.clone();
        feed_tap(&second, &[1.0, 0.0, 0.5, 0.5], 2);

        let received: Vec<f32> = std::iter::from_fn(|| consumer.pop().ok()).collect();
        assert_eq!(received.len(), 3);
        assert!((received[0] - 0.3).abs() < 1e-6);
        assert!((received[1] - 0.5).abs() < 1e-6);
        assert!((received[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_full_tap_drops_instead_of_blocking() {
        let (producer, mut consumer) = rtrb::RingBuffer::<f32>::new(2);
        let tap = CpalDevice::new().with_tap(producer).tap;
        feed_tap(&tap, &[0.1, 0.2, 0.3, 0.4], 1);
        assert_eq!(consumer.pop(), Ok(0.1));
        assert_eq!(consumer.pop(), Ok(0.2));
        assert!(consumer.pop().is_err());
    }
}
