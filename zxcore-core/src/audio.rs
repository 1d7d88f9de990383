/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! The audio host contract and the running-mean sampler the ULA uses to turn
//! ear/mic toggles into 8-bit PCM.
use std::error::Error;
use std::fmt;

/// The host surface audio frames are pushed to. `write` may block (e.g. a
/// bounded ring buffer under backpressure); a sustained failure should be
/// reported once via `Err` so the caller can fall back to silent playback.
pub trait AudioSink {
    type Err: fmt::Debug;
    /// Pushes one frame of 8-bit PCM samples, always `samples_per_frame()` long.
    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Err>;
}

/// Failure pushing a rendered audio frame to the host sink.
#[derive(Debug)]
pub struct AudioBackendError(pub String);

impl fmt::Display for AudioBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio backend error: {}", self.0)
    }
}

impl Error for AudioBackendError {}

/// Accumulates ear/mic toggles across a frame and renders them into a fixed-size
/// 8-bit PCM buffer, sampling at a rate derived from `tstates_per_frame / samples_per_frame`
/// rather than a hard-coded value, so every model gets a correctly paced sample rate.
pub struct AudioFrameSampler {
    tstates_per_frame: u32,
    samples_per_frame: usize,
    buf: Vec<u8>,
    last_tstate: u32,
    last_level: u8,
}

impl AudioFrameSampler {
    /// `sample_rate_hz` follows from `tstates_per_frame * 50 / samples_per_frame`; callers
    /// pick `samples_per_frame` to target a sample rate (e.g. 448 samples/frame @ 50 Hz ~= 22.4 kHz,
    /// 882 samples/frame ~= 44.1 kHz) and this sampler renders exactly that many samples every frame.
    pub fn new(tstates_per_frame: u32, samples_per_frame: usize) -> Self {
        AudioFrameSampler {
            tstates_per_frame,
            samples_per_frame,
            buf: vec![128; samples_per_frame],
            last_tstate: 0,
            last_level: 128,
        }
    }

    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    /// The Nyquist-safe sample rate implied by this sampler's T-states-per-frame and
    /// samples-per-frame, assuming 50 fields/second.
    pub fn sample_rate_hz(&self) -> u32 {
        self.tstates_per_frame * 50 / self.samples_per_frame as u32
    }

    /// Records an ear/mic level change (`ear_out || mic_out`, combined into one 8-bit
    /// level by the caller) taking effect at absolute T-state `tstate` within the frame.
    /// Fills every sample slot between the previous change and this one with the
    /// previous level (a running mean of a single bit is just the held level, since
    /// actual averaging across a sample period is unnecessary at this bit depth).
    pub fn set_level(&mut self, tstate: u32, level: u8) {
        self.fill_up_to(tstate, self.last_level);
        self.last_level = level;
        self.last_tstate = tstate;
    }

    fn fill_up_to(&mut self, tstate: u32, level: u8) {
        let start_sample = self.sample_index(self.last_tstate);
        let end_sample = self.sample_index(tstate).min(self.samples_per_frame);
        for s in &mut self.buf[start_sample..end_sample] {
            *s = level;
        }
    }

    fn sample_index(&self, tstate: u32) -> usize {
        ((tstate as u64 * self.samples_per_frame as u64) / self.tstates_per_frame as u64) as usize
    }

    /// Finalizes the current frame: fills any remaining samples with the held level
    /// and returns the rendered buffer, resetting internal state for the next frame.
    pub fn end_frame(&mut self) -> &[u8] {
        self.fill_up_to(self.tstates_per_frame, self.last_level);
        self.last_tstate = 0;
        &self.buf
    }
}
