/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! A bounded SPSC ring buffer carrying rendered 8-bit PCM frames from the
//! emulator thread to a host playback thread, with the sleep-and-retry
//! backpressure policy described for the audio producer: when the ring is
//! full the producer sleeps briefly and retries rather than dropping or
//! blocking indefinitely.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::warn;
use zxcore_core::audio::AudioSink;

/// How long the producer sleeps between retries while the ring is full.
const RETRY_SLEEP: Duration = Duration::from_millis(1);
/// How many retries before giving up and reporting a backend failure.
const MAX_RETRIES: u32 = 200; // ~200ms, well over one 20ms video frame

struct Shared {
    buf: VecDeque<u8>,
    capacity: usize,
    closed: bool,
}

/// Shared state between a [Producer] and [Consumer] pair. `capacity` is
/// measured in samples, not frames; size it to a few video frames' worth
/// (e.g. `samples_per_frame * 3`) to absorb host scheduling jitter.
pub fn ring(capacity: usize) -> (Producer, Consumer) {
    let shared = Arc::new(Mutex::new(Shared {
        buf: VecDeque::with_capacity(capacity),
        capacity,
        closed: false,
    }));
    (Producer { shared: shared.clone() }, Consumer { shared })
}

/// The emulator-side half: implements [AudioSink] so a [Machine][zxcore_core]
/// frame loop can push a rendered frame directly.
pub struct Producer {
    shared: Arc<Mutex<Shared>>,
}

/// The host-side half: a playback callback pulls samples out as they're needed.
pub struct Consumer {
    shared: Arc<Mutex<Shared>>,
}

impl AudioSink for Producer {
    type Err = RingClosed;

    fn write(&mut self, frame: &[u8]) -> Result<(), Self::Err> {
        let mut retries = 0;
        let mut offset = 0;
        while offset < frame.len() {
            let mut guard = self.shared.lock().unwrap();
            if guard.closed {
                return Err(RingClosed);
            }
            let room = guard.capacity.saturating_sub(guard.buf.len());
            if room == 0 {
                drop(guard);
                retries += 1;
                if retries > MAX_RETRIES {
                    warn!("audio ring buffer full after {} retries, dropping frame", MAX_RETRIES);
                    return Err(RingClosed);
                }
                thread::sleep(RETRY_SLEEP);
                continue;
            }
            let take = room.min(frame.len() - offset);
            guard.buf.extend(&frame[offset..offset + take]);
            offset += take;
        }
        Ok(())
    }
}

impl Consumer {
    /// Fills `out` with queued samples, padding any shortfall with `128`
    /// (audio center / silence) so a starved consumer never reads garbage.
    pub fn fill(&self, out: &mut [u8]) {
        let mut guard = self.shared.lock().unwrap();
        let n = guard.buf.len().min(out.len());
        for slot in out.iter_mut().take(n) {
            *slot = guard.buf.pop_front().unwrap();
        }
        for slot in out.iter_mut().skip(n) {
            *slot = 128;
        }
    }

    pub fn close(&self) {
        self.shared.lock().unwrap().closed = true;
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.shared.lock().unwrap().closed = true;
    }
}

/// Returned when the ring's consumer has gone away or the producer gave up
/// after sustained backpressure; the caller should fall back to silent audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingClosed;

impl std::fmt::Display for RingClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "audio ring buffer consumer is gone")
    }
}

impl std::error::Error for RingClosed {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_samples() {
        let (mut producer, consumer) = ring(8);
        producer.write(&[1, 2, 3, 4]).unwrap();
        let mut out = [0u8; 4];
        consumer.fill(&mut out);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn underrun_pads_with_silence() {
        let (_producer, consumer) = ring(8);
        let mut out = [9u8; 4];
        consumer.fill(&mut out);
        assert_eq!(out, [128, 128, 128, 128]);
    }

    #[test]
    fn closed_consumer_reports_error() {
        let (mut producer, consumer) = ring(4);
        consumer.close();
        assert!(producer.write(&[1]).is_err());
    }
}
