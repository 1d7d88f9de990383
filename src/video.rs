/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! Video types re-exported from `zxcore-core`, plus the standard 16-entry
//! RGB palette `Machine` hands to a [VideoOut] implementation at start-up.
pub use zxcore_core::video::{Attribute, BorderColor, VideoFrame, VideoOut};

/// Standard ZX Spectrum RGB palette: indices 0..=7 are normal intensity
/// ink/paper colors in `BorderColor` bit order (black, blue, red, magenta,
/// green, cyan, yellow, white); 8..=15 are the same colors at bright
/// intensity.
pub const PALETTE: [[u8; 3]; 16] = [
    [0x00, 0x00, 0x00], [0x00, 0x00, 0xCD], [0xCD, 0x00, 0x00], [0xCD, 0x00, 0xCD],
    [0x00, 0xCD, 0x00], [0x00, 0xCD, 0xCD], [0xCD, 0xCD, 0x00], [0xCD, 0xCD, 0xCD],
    [0x00, 0x00, 0x00], [0x00, 0x00, 0xFF], [0xFF, 0x00, 0x00], [0xFF, 0x00, 0xFF],
    [0x00, 0xFF, 0x00], [0x00, 0xFF, 0xFF], [0xFF, 0xFF, 0x00], [0xFF, 0xFF, 0xFF],
];

/// Flattens [PALETTE] into the packed `3*16`-byte form [VideoOut::set_palette] expects.
pub fn packed_palette() -> [u8; 3 * 16] {
    let mut out = [0u8; 3 * 16];
    for (i, rgb) in PALETTE.iter().enumerate() {
        out[i * 3..i * 3 + 3].copy_from_slice(rgb);
    }
    out
}
