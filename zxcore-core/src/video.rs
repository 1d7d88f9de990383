/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! The video host contract: the [VideoOut] trait a collaborator implements,
//! and the small value types the ULA feeds through it.
use bitflags::bitflags;

bitflags! {
    /// The three border-color bits latched from port `0xFE` plus the mic/ear
    /// output bits that share the same port.
    #[derive(Default)]
    pub struct BorderColor: u8 {
        const BLACK   = 0b000;
        const BLUE    = 0b001;
        const RED     = 0b010;
        const MAGENTA = 0b011;
        const GREEN   = 0b100;
        const CYAN    = 0b101;
        const YELLOW  = 0b110;
        const WHITE   = 0b111;
    }
}

impl BorderColor {
    /// Extracts the border color (0..=7) from a raw port `0xFE` output value.
    pub fn from_port_fe(val: u8) -> Self {
        BorderColor::from_bits_truncate(val & 0x07)
    }

    pub fn index(self) -> u8 {
        self.bits() & 0x07
    }
}

/// Standard ZX Spectrum display geometry: 32x24 attribute cells over a
/// 256x192 bitmap, with a border on all four sides.
pub trait VideoFrame {
    /// Visible bitmap width in pixels.
    const SCREEN_WIDTH: u16 = 256;
    /// Visible bitmap height in pixels.
    const SCREEN_HEIGHT: u16 = 192;
    /// Border width in pixels on the left/right (and used for top/bottom scaling).
    const BORDER_WIDTH: u16 = 48;
}

/// The host surface the core writes pixels to. Implementations typically
/// blit into a framebuffer or an SDL/wgpu texture; the core only ever calls
/// these three methods, always from the single machine thread.
pub trait VideoOut {
    /// Sets the 16-entry RGB palette (indices 0..=15: normal ink/paper 0..=7,
    /// bright ink/paper 8..=15), `3*16` bytes of packed R,G,B.
    fn set_palette(&mut self, pal: &[u8; 3 * 16]);
    /// Plots a single pixel using a palette index.
    fn pixel(&mut self, x: u16, y: u16, color_index: u8);
    /// Fills a rectangle (inclusive `x0,y0`, exclusive `x1,y1`) with a palette index;
    /// used for border runs, which are usually many pixels wide.
    fn rect(&mut self, x0: u16, y0: u16, x1: u16, y1: u16, color_index: u8);
    /// Signals that a full field has been rendered (frame boundary for non-interlaced output).
    fn end_field(&mut self);
}

/// An `Ink 0..=7, Paper 0..=7, Bright 0/1, Flash 0/1` attribute byte,
/// as stored one per 8x8 screen cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute(pub u8);

impl Attribute {
    pub fn ink(self) -> u8 {
        self.0 & 0x07
    }
    pub fn paper(self) -> u8 {
        (self.0 >> 3) & 0x07
    }
    pub fn bright(self) -> bool {
        self.0 & 0x40 != 0
    }
    pub fn flash(self) -> bool {
        self.0 & 0x80 != 0
    }
    /// Palette index for a given bitmap bit (`true` = ink), honouring the current
    /// flash phase (flash toggles ink/paper every 16 fields) and bright offset.
    pub fn color_index(self, bit: bool, flash_phase: bool) -> u8 {
        let swapped = self.flash() && flash_phase;
        let is_ink = bit != swapped;
        let base = if is_ink { self.ink() } else { self.paper() };
        base + if self.bright() { 8 } else { 0 }
    }
}
