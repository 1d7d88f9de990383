/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! Audio device streaming implementation for [cpal](https://crates.io/crates/cpal).
//!
//! Requires the "cpal" feature to be enabled. Unlike the teacher library,
//! which streamed whichever sample format the host device preferred,
//! [AudioFrameSampler][zxcore_core::audio::AudioFrameSampler] always renders
//! 8-bit unsigned PCM, so this backend only ever opens a `u8` output stream.
#[allow(unused_imports)]
use log::{debug, error};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    BuildStreamError, DefaultStreamConfigError, PauseStreamError, PlayStreamError, Stream,
};

use crate::ring::{ring, Producer};
pub use super::{AudioHandleError, AudioHandleErrorKind};

/// An open audio output stream plus the [Producer] half feeding it.
pub struct AudioHandle {
    pub sample_rate: u32,
    pub channels: u8,
    pub producer: Producer,
    stream: Stream,
}

impl AudioHandle {
    /// Opens the default output device at its default configuration.
    ///
    /// `ring_capacity` is the ring buffer's size in samples; a few video
    /// frames' worth absorbs host scheduling jitter without adding
    /// perceptible latency.
    pub fn create(host: &cpal::Host, ring_capacity: usize) -> Result<Self, AudioHandleError> {
        let device = host
            .default_output_device()
            .ok_or_else(|| ("no default output device".to_string(), AudioHandleErrorKind::AudioSubsystem))?;
        Self::create_with_device(&device, ring_capacity)
    }

    pub fn create_with_device(device: &cpal::Device, ring_capacity: usize) -> Result<Self, AudioHandleError> {
        let config = device.default_output_config()?.config();
        let channels: u8 = config
            .channels
            .try_into()
            .map_err(|_| (format!("channel count {} exceeds u8", config.channels), AudioHandleErrorKind::InvalidArguments))?;
        let sample_rate = config.sample_rate.0;

        let (producer, consumer) = ring(ring_capacity);

        let data_fn = move |out: &mut [u8], _: &_| {
            consumer.fill(out);
        };
        let err_fn = |err| error!("an error occurred on the audio stream: {}", err);

        let stream = device.build_output_stream(&config, data_fn, err_fn, None)?;

        Ok(AudioHandle { sample_rate, channels, producer, stream })
    }

    pub fn play(&self) -> Result<(), AudioHandleError> {
        self.stream.play().map_err(From::from)
    }

    pub fn pause(&self) -> Result<(), AudioHandleError> {
        self.stream.pause().map_err(From::from)
    }
}

impl From<PlayStreamError> for AudioHandleError {
    fn from(e: PlayStreamError) -> Self {
        let kind = match e {
            PlayStreamError::DeviceNotAvailable => AudioHandleErrorKind::AudioSubsystem,
            _ => AudioHandleErrorKind::AudioStream,
        };
        (e.to_string(), kind).into()
    }
}

impl From<PauseStreamError> for AudioHandleError {
    fn from(e: PauseStreamError) -> Self {
        let kind = match e {
            PauseStreamError::DeviceNotAvailable => AudioHandleErrorKind::AudioSubsystem,
            _ => AudioHandleErrorKind::AudioStream,
        };
        (e.to_string(), kind).into()
    }
}

impl From<DefaultStreamConfigError> for AudioHandleError {
    fn from(e: DefaultStreamConfigError) -> Self {
        let kind = match e {
            DefaultStreamConfigError::StreamTypeNotSupported => AudioHandleErrorKind::InvalidArguments,
            _ => AudioHandleErrorKind::AudioSubsystem,
        };
        (e.to_string(), kind).into()
    }
}

impl From<BuildStreamError> for AudioHandleError {
    fn from(e: BuildStreamError) -> Self {
        let kind = match e {
            BuildStreamError::DeviceNotAvailable => AudioHandleErrorKind::AudioSubsystem,
            BuildStreamError::StreamConfigNotSupported | BuildStreamError::InvalidArgument => {
                AudioHandleErrorKind::InvalidArguments
            }
            _ => AudioHandleErrorKind::AudioStream,
        };
        (e.to_string(), kind).into()
    }
}
