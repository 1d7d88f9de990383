/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! The ULA: screen rendering, border/ear/mic port, keyboard port-in and the
//! beam clock that drives contention.
//!
//! One concrete [Ula] serves every model. The teacher library split this into
//! a separate generic chipset per model (`ula.rs`, `ula128.rs`, `ula3.rs`,
//! `scld.rs`) because its `Memory`/`BusDevice`/`VideoFrame` triad was generic
//! over them; here `crate::memory::Memory` already folds the per-model paging
//! differences away and `crate::clock::FrameClock` folds the per-model timing
//! differences away, so the ULA logic above those two is identical across
//! models and does not need to be repeated per chipset.
use log::warn;

use crate::audio::AudioFrameSampler;
use crate::bus::BusDevice;
use crate::clock::FrameClock;
use crate::io::keyboard::ZXKeyboardMap;
use crate::memory::{Memory, ZxMemory};
use crate::video::{packed_palette, Attribute, BorderColor, VideoOut};

/// Width, in T-states, of one 8x8-cell screen-fetch row: 16 bitmap/attribute
/// pairs, 4 T-states apart (see [crate::SPEC_FULL] section 4.3 for the exact
/// beam pattern); kept local since only [Ula::catch_up] needs it.
const SCREEN_FETCH_SPAN: u32 = 128;

/// Number of fields between flash-phase flips.
const FLASH_PERIOD: u32 = 16;

/// The ULA chipset: owns the beam clock, the keyboard matrix, border/ear/mic
/// port latches and the audio sampler, and drives a [VideoOut]/[crate::audio::AudioSink]
/// pair each frame. [crate::machine::Machine] owns one of these plus a [Memory]
/// and a [crate::cpu's][zxcore_core::cpu::Cpu] worth of CPU state.
pub struct Ula {
    clock: FrameClock,
    keyboard: ZXKeyboardMap,
    border: BorderColor,
    ear_in: bool,
    mic_out: bool,
    ear_out: bool,
    last_rendered_tstate: u32,
    frame_counter: u64,
    sampler: AudioFrameSampler,
}

impl Ula {
    pub fn new(clock: FrameClock, samples_per_frame: usize) -> Self {
        let tstates_per_frame = clock.timing().tstates_per_frame();
        Ula {
            clock,
            keyboard: ZXKeyboardMap::empty(),
            border: BorderColor::BLACK,
            ear_in: false,
            mic_out: false,
            ear_out: false,
            last_rendered_tstate: 0,
            frame_counter: 0,
            sampler: AudioFrameSampler::new(tstates_per_frame, samples_per_frame),
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut FrameClock {
        &mut self.clock
    }

    pub fn set_key_state(&mut self, keymap: ZXKeyboardMap) {
        self.keyboard = keymap;
    }

    pub fn key_state(&self) -> ZXKeyboardMap {
        self.keyboard
    }

    /// Latches an external ear-in sample (tape playback), read back through
    /// port `0xFE` bit 6.
    pub fn set_ear_in(&mut self, level: bool) {
        self.ear_in = level;
    }

    fn flash_phase(&self) -> bool {
        (self.frame_counter / FLASH_PERIOD as u64) % 2 != 0
    }

    /// Decodes a `0xFE`-bit port write: border in bits 0-2, mic-out bit 3,
    /// ear-out bit 4. Any other port is the caller's problem (see [BusDevice]).
    pub fn port_out_fe(&mut self, val: u8) {
        self.border = BorderColor::from_port_fe(val);
        self.mic_out = val & 0x08 != 0;
        self.ear_out = val & 0x10 != 0;
        self.sampler.set_level(self.clock.tstates(), self.ear_mic_level());
    }

    fn ear_mic_level(&self) -> u8 {
        if self.ear_out || self.mic_out {
            224
        } else {
            32
        }
    }

    /// Decodes a `0xFE`-bit port read: keyboard matrix bits 0-4 (selected by
    /// the inverted high byte of `port`), ear-in on bit 6, open bits set.
    pub fn port_in_fe(&self, port: u16) -> u8 {
        let row_select = (port >> 8) as u8;
        let mut val = self.keyboard.read_keyboard(row_select) & 0x1F;
        val |= 0xA0; // bits 5 and 7 float high, matching the common "open bus" approximation
        if self.ear_in {
            val |= 0x40;
        }
        val
    }

    pub fn border(&self) -> BorderColor {
        self.border
    }

    /// Renders every beam position from the last call up to (and including)
    /// `tstate`, reading screen memory at the exact T-states those bytes
    /// would be fetched. Called by [crate::machine::Machine] before every CPU
    /// memory/IO access so writes to screen memory reorder visible output
    /// the same way real hardware would.
    pub fn catch_up(&mut self, memory: &Memory, video: &mut dyn VideoOut, tstate: u32) {
        let timing = self.clock.timing();
        let from = self.last_rendered_tstate;
        let to = tstate.min(timing.tstates_per_frame());
        if to <= from {
            return;
        }
        for t in from..to {
            let (line, column) = self.clock.line_column_at(t);
            self.render_dot(memory, video, line, column);
        }
        self.last_rendered_tstate = to;
    }

    fn render_dot(&self, memory: &Memory, video: &mut dyn VideoOut, line: u32, column: u32) {
        let timing = self.clock.timing();
        let x = column as i64 * 2 - 2 * timing.contention_start as i64;
        let screen_line = line as i64 - timing.first_screen_line as i64;
        let in_screen_rows = (0..192).contains(&screen_line);
        let in_screen_cols = (0..SCREEN_FETCH_SPAN as i64).contains(&x);
        let color = if in_screen_rows && in_screen_cols {
            self.screen_pixel_color(memory, screen_line as u16, x as u16)
        } else {
            self.border.index()
        };
        let px = (column * 2) as u16;
        let py = line as u16;
        video.rect(px, py, px + 2, py + 1, color);
    }

    /// Standard ZX Spectrum bit-interleaved bitmap addressing: the 8 pixel
    /// rows within a character cell are not stored contiguously, so `y`'s
    /// bits are scattered into the address rather than simply multiplied.
    fn screen_pixel_color(&self, memory: &Memory, y: u16, x: u16) -> u8 {
        let x_byte = x / 8;
        let bit_col = x % 8;
        let bitmap_addr = ((y & 0b1100_0000) << 5) | ((y & 0b0000_0111) << 8) | ((y & 0b0011_1000) << 2) | x_byte;
        let attr_addr = 0x1800 + (y / 8) * 32 + x_byte;
        let byte = memory.read_screen(0, bitmap_addr);
        let attr = Attribute(memory.read_screen(0, attr_addr));
        let bit = byte & (0x80 >> bit_col) != 0;
        attr.color_index(bit, self.flash_phase())
    }

    /// Asserts INT for the opening window of the next frame, advances the
    /// flash/field counters, pushes the finished audio frame and resets the
    /// beam position for the frame that follows.
    pub fn end_frame(&mut self, memory: &Memory, video: &mut dyn VideoOut) -> &[u8] {
        self.catch_up(memory, video, self.clock.timing().tstates_per_frame());
        video.end_field();
        self.clock.start_next_frame();
        self.last_rendered_tstate = 0;
        self.frame_counter += 1;
        self.sampler.end_frame()
    }

    /// `true` during the first 32 T-states of a frame, the documented INT
    /// assertion window.
    pub fn int_asserted(&self) -> bool {
        self.clock.tstates() < 32
    }

    pub fn init_video(&self, video: &mut dyn VideoOut) {
        video.set_palette(&packed_palette());
    }
}

/// Routes a port access that the ULA itself does not own to the attached bus
/// device, logging a floating-bus read at debug level so an unexpected port
/// access shows up without adding overhead in hot paths.
pub fn forward_unclaimed_read(bus: &mut dyn BusDevice, port: u16, tstates: u64) -> u8 {
    bus.read_io(port, tstates).unwrap_or_else(|| {
        warn!("read from unclaimed port {:#06x}: returning open bus 0xFF", port);
        0xFF
    })
}
