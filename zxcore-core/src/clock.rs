/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! A concrete per-model T-state counter that normalizes into (line, column)
//! and knows when a frame ends.

/// Per-model timing constants (T-states per line, lines per frame, contention window).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSpec {
    /// T-states per scanline.
    pub tstates_per_line: u32,
    /// Scanlines per frame, including vertical blank.
    pub lines_per_frame: u32,
    /// First scanline of the visible screen area (attribute/bitmap fetches happen at or after this line).
    pub first_screen_line: u32,
    /// T-state offset within a line where contended screen fetches begin.
    pub contention_start: u32,
    /// Number of contended columns per 8 T-state screen-fetch group.
    pub contention_span: u32,
}

impl TimingSpec {
    /// T-states in a single frame.
    pub const fn tstates_per_frame(&self) -> u32 {
        self.tstates_per_line * self.lines_per_frame
    }
}

/// Pentagon-less ZX48K timing: 69,888 T-states/frame (224 T-states/line * 312 lines).
pub const TIMING_48K: TimingSpec = TimingSpec {
    tstates_per_line: 224,
    lines_per_frame: 312,
    first_screen_line: 64,
    contention_start: 1,
    contention_span: 6,
};

/// ZX128K/+2 timing: 70,908 T-states/frame (228 T-states/line * 311 lines).
pub const TIMING_128K: TimingSpec = TimingSpec {
    tstates_per_line: 228,
    lines_per_frame: 311,
    first_screen_line: 63,
    contention_start: 2,
    contention_span: 6,
};

/// +2A/+3 timing, identical frame shape to 128K but with a one-T-state-later
/// contention window due to the extra memory bus buffering in those models.
pub const TIMING_PLUS3: TimingSpec = TimingSpec {
    tstates_per_line: 228,
    lines_per_frame: 311,
    first_screen_line: 63,
    contention_start: 1,
    contention_span: 6,
};

/// The repeating contention penalty pattern within a contended column group: `6,5,4,3,2,1,0,0`.
pub const CONTENTION_PATTERN: [u8; 8] = [6, 5, 4, 3, 2, 1, 0, 0];

/// A monotonic T-state counter for a single frame, plus the bookkeeping needed
/// to answer "where is the beam" and "are we in the contended screen window".
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    timing: TimingSpec,
    /// T-states elapsed since the start of the current frame. Never decreases
    /// within a frame; wraps back towards zero (by subtracting the frame length)
    /// in [FrameClock::start_next_frame].
    tstates: u32,
}

impl FrameClock {
    pub fn new(timing: TimingSpec) -> Self {
        FrameClock { timing, tstates: 0 }
    }

    pub fn timing(&self) -> TimingSpec {
        self.timing
    }

    /// Current T-state offset within the frame.
    pub fn tstates(&self) -> u32 {
        self.tstates
    }

    /// Advances the clock by `delta` T-states. The ULA must never be driven backwards,
    /// so `delta` is always non-negative by construction (it comes from CPU instruction costs).
    pub fn advance(&mut self, delta: u32) {
        self.tstates += delta;
    }

    /// `true` once the clock has reached or passed the end of the frame.
    pub fn is_frame_over(&self) -> bool {
        self.tstates >= self.timing.tstates_per_frame()
    }

    /// Subtracts one frame's worth of T-states, carrying any overrun into the new frame.
    pub fn start_next_frame(&mut self) {
        self.tstates -= self.timing.tstates_per_frame();
    }

    /// Decomposes the current T-state count into `(line, column)`.
    pub fn line_column(&self) -> (u32, u32) {
        let t = self.tstates;
        (t / self.timing.tstates_per_line, t % self.timing.tstates_per_line)
    }

    /// Decomposes an arbitrary absolute T-state count into `(line, column)`.
    pub fn line_column_at(&self, tstates: u32) -> (u32, u32) {
        (tstates / self.timing.tstates_per_line, tstates % self.timing.tstates_per_line)
    }

    /// Contention penalty, in T-states, for an access to a contended memory slot
    /// happening at the given absolute T-state offset within the frame.
    pub fn contention_delay(&self, tstates: u32) -> u32 {
        let (line, column) = self.line_column_at(tstates);
        if line < self.timing.first_screen_line
            || line >= self.timing.first_screen_line + 192
        {
            return 0;
        }
        if column < self.timing.contention_start {
            return 0;
        }
        let rel = column - self.timing.contention_start;
        let screen_span = 128; // 128 T-states of screen fetch per scanline row
        if rel >= screen_span {
            return 0;
        }
        CONTENTION_PATTERN[(rel % self.timing.contention_span as u32) as usize % 8] as u32
    }
}
