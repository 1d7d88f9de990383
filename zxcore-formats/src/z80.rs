/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! **Z80** snapshot format decoding (versions 1, 2 and 3).
//!
//! A V1 file is a fixed 30-byte header followed by a single (optionally
//! RLE-compressed) 48 KiB memory block. `PC == 0` in that header is the V1
//! escape hatch: it means an extended header follows instead, whose 16-bit
//! length field (23, 54 or 55) identifies V2 vs V3, and memory instead comes
//! as a sequence of length-prefixed, per-page blocks.
use zxcore_core::cpu::{InterruptMode, Registers};
use zxcore_core::video::BorderColor;

use crate::error::{FormatError, Result};

const HEADER_LEN: usize = 30;
const PAGE_SIZE: usize = 0x4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Z80Version {
    V1,
    V2,
    V3,
}

/// Which hardware family an `hw_mode` byte named. This crate has no
/// dependency on the workspace's concrete memory-layout model, so it hands
/// back this format-local hint for the caller to map onto its own model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareHint {
    Spectrum48,
    Spectrum128,
    Plus2,
    Plus2A,
    Plus3,
}

#[derive(Debug, Clone)]
pub struct Z80Snapshot {
    pub version: Z80Version,
    pub regs: Registers,
    pub border: BorderColor,
    pub hardware: HardwareHint,
    /// `(Sinclair RAM bank number, 16 KiB page contents)`.
    pub pages: Vec<(u8, Vec<u8>)>,
    /// Last write to port `0x7FFD`, present on every 128k-family file.
    pub port_7ffd: Option<u8>,
    /// Last write to port `0x1FFD`, present only on a V3 +2A/+3 file that recorded one.
    pub port_1ffd: Option<u8>,
}

fn decompress(data: &[u8], want: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(want);
    let mut i = 0;
    while out.len() < want && i < data.len() {
        if data[i] == 0xED && i + 1 < data.len() && data[i + 1] == 0xED {
            if i + 3 < data.len() {
                let count = data[i + 2] as usize;
                let fill = data[i + 3];
                out.extend(std::iter::repeat(fill).take(count));
                i += 4;
            } else {
                // truncated escape sequence at end of block: discard the rest.
                break;
            }
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out.truncate(want.min(out.len()));
    out
}

fn mix_r(r7: u8, flags1: u8) -> u8 {
    (r7 & 0x7F) | ((flags1 & 0x01) << 7)
}

fn border_of(flags1: u8) -> Result<BorderColor> {
    let color = (flags1 >> 1) & 0x07;
    Ok(BorderColor::from_bits_truncate(color))
}

fn parse_v1_header(b: &[u8]) -> Result<(Registers, u8, bool)> {
    if b.len() < HEADER_LEN {
        return Err(FormatError::Truncated);
    }
    let mut r = Registers::default();
    r.a = b[0];
    r.f = b[1];
    r.c = b[2];
    r.b = b[3];
    r.l = b[4];
    r.h = b[5];
    r.pc = u16::from_le_bytes([b[6], b[7]]);
    r.sp = u16::from_le_bytes([b[8], b[9]]);
    r.i = b[10];
    let flags1 = if b[12] == 0xFF { 1 } else { b[12] };
    r.r = mix_r(b[11], flags1);
    r.e = b[13];
    r.d = b[14];
    r.c_ = b[15];
    r.b_ = b[16];
    r.e_ = b[17];
    r.d_ = b[18];
    r.l_ = b[19];
    r.h_ = b[20];
    r.a_ = b[21];
    r.f_ = b[22];
    r.iy = u16::from_le_bytes([b[23], b[24]]);
    r.ix = u16::from_le_bytes([b[25], b[26]]);
    r.iff1 = b[27] != 0;
    r.iff2 = b[28] != 0;
    r.im = match b[29] & 0x03 {
        0 => InterruptMode::Im0,
        1 => InterruptMode::Im1,
        _ => InterruptMode::Im2,
    };
    let is_compressed = flags1 & 0x20 != 0;
    Ok((r, flags1, is_compressed))
}

struct HeaderEx {
    pc: u16,
    hw_mode: u8,
    port1: u8,
    flags3: u8,
    port2: u8,
}

fn parse_header_ex(b: &[u8]) -> Result<(Z80Version, HeaderEx, usize)> {
    if b.len() < 2 {
        return Err(FormatError::Truncated);
    }
    let len = u16::from_le_bytes([b[0], b[1]]);
    let version = match len {
        23 => Z80Version::V2,
        54 | 55 => Z80Version::V3,
        other => return Err(FormatError::UnsupportedVersion(other)),
    };
    let body = &b[2..];
    if body.len() < len as usize {
        return Err(FormatError::Truncated);
    }
    let pc = u16::from_le_bytes([body[0], body[1]]);
    let hw_mode = body[2];
    let port1 = body[3];
    let flags3 = body[6];
    let port2 = if version == Z80Version::V3 && body.len() > 35 { body[35] } else { 0 };
    Ok((version, HeaderEx { pc, hw_mode, port1, flags3, port2 }, 2 + len as usize))
}

fn select_hardware(version: Z80Version, hw_mode: u8, flags3: u8) -> Result<HardwareHint> {
    let alt = flags3 & 0x80 != 0;
    use HardwareHint::*;
    use Z80Version::*;
    Ok(match (hw_mode, version) {
        (0, _) | (1, _) | (2, _) => Spectrum48,
        (3, V2) | (4, V3) => if alt { Plus2 } else { Spectrum128 },
        (4, V2) | (5, V3) | (6, V3) => Spectrum128,
        (7, _) | (8, _) => if alt { Plus2A } else { Plus3 },
        (12, _) => Plus2,
        (13, _) => Plus2A,
        (other, _) => return Err(FormatError::Corrupt(corrupt_hw_mode(other))),
    })
}

const fn corrupt_hw_mode(_mode: u8) -> &'static str {
    "unsupported or Non-goal Z80 hardware mode (Timex/SAM/Pentagon/Scorpion)"
}

fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let len = data.len();
    if len == 0 {
        return out;
    }
    let terminator_ch = data[len - 1].wrapping_add(1);
    let mut index = 0usize;
    let mut count: u8 = 1;
    let mut prev = data[0];
    for pos in 1..=len {
        let ch = if pos < len { data[pos] } else { terminator_ch };
        if prev == ch && count < u8::MAX {
            count += 1;
        } else {
            if count > 4 || (prev == 0xED && count > 1) {
                let rep_start = pos - count as usize;
                if rep_start > index {
                    out.extend_from_slice(&data[index..rep_start]);
                }
                out.extend_from_slice(&[0xED, 0xED, count, prev]);
                index = pos;
            }
            prev = ch;
            count = 1;
        }
    }
    if index < len {
        out.extend_from_slice(&data[index..]);
    }
    out
}

fn v1_header_bytes(regs: &Registers, border: BorderColor) -> [u8; HEADER_LEN] {
    let mut b = [0u8; HEADER_LEN];
    b[0] = regs.a;
    b[1] = regs.f;
    b[2] = regs.c;
    b[3] = regs.b;
    b[4] = regs.l;
    b[5] = regs.h;
    // b[6..8] left at 0: PC == 0 signals that an extended header follows.
    b[8..10].copy_from_slice(&regs.sp.to_le_bytes());
    b[10] = regs.i;
    b[11] = regs.r & 0x7F;
    b[12] = ((regs.r >> 7) & 1) | (border.index() << 1);
    b[13] = regs.e;
    b[14] = regs.d;
    b[15] = regs.c_;
    b[16] = regs.b_;
    b[17] = regs.e_;
    b[18] = regs.d_;
    b[19] = regs.l_;
    b[20] = regs.h_;
    b[21] = regs.a_;
    b[22] = regs.f_;
    b[23..25].copy_from_slice(&regs.iy.to_le_bytes());
    b[25..27].copy_from_slice(&regs.ix.to_le_bytes());
    b[27] = if regs.iff1 { 0xFF } else { 0 };
    b[28] = if regs.iff2 { 0xFF } else { 0 };
    b[29] = match regs.im {
        InterruptMode::Im0 => 0,
        InterruptMode::Im1 => 1,
        InterruptMode::Im2 => 2,
    };
    b
}

/// Always a 55-byte V3 extended header (the richest the decoder understands).
fn ex_header_bytes(snapshot: &Z80Snapshot) -> [u8; 55] {
    let mut b = [0u8; 55];
    b[0..2].copy_from_slice(&snapshot.regs.pc.to_le_bytes());
    b[2] = match snapshot.hardware {
        HardwareHint::Spectrum48 => 0,
        HardwareHint::Spectrum128 => 4,
        HardwareHint::Plus2 => 12,
        HardwareHint::Plus2A => 13,
        HardwareHint::Plus3 => 7,
    };
    b[3] = snapshot.port_7ffd.unwrap_or(0);
    if matches!(snapshot.hardware, HardwareHint::Plus2A | HardwareHint::Plus3) {
        b[35] = snapshot.port_1ffd.unwrap_or(0);
    }
    b
}

/// The inverse of [page_to_ram_bank]: maps a Sinclair RAM bank number back
/// onto the `.z80` page byte used to tag its memory block.
fn ram_bank_to_page(bank: u8, is_128k: bool) -> Option<u8> {
    if is_128k {
        if bank <= 7 {
            Some(bank + 3)
        } else {
            None
        }
    } else {
        match bank {
            5 => Some(4),
            2 => Some(5),
            0 => Some(8),
            _ => None,
        }
    }
}

/// Encodes `snapshot` back into a `.z80` file, always as a V3 extended
/// header (the richest one [load_z80] understands) with every RAM page
/// RLE-compressed the way [load_z80]'s own decompressor expects.
pub fn save_z80(snapshot: &Z80Snapshot) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + 2 + 55);
    out.extend_from_slice(&v1_header_bytes(&snapshot.regs, snapshot.border));
    let ex = ex_header_bytes(snapshot);
    out.extend_from_slice(&(ex.len() as u16).to_le_bytes());
    out.extend_from_slice(&ex);

    let is_128k = !matches!(snapshot.hardware, HardwareHint::Spectrum48);
    for (bank, page) in &snapshot.pages {
        if page.len() != PAGE_SIZE {
            return Err(FormatError::Corrupt("Z80: RAM page is not exactly 16 KiB"));
        }
        let z80_page = ram_bank_to_page(*bank, is_128k)
            .ok_or(FormatError::Corrupt("Z80: RAM bank does not map onto a page byte for this hardware"))?;
        let compressed = compress(page);
        // 0xFFFF is the "stored verbatim" sentinel length; a compressed block
        // that happened to land exactly there would be misread as one, so
        // fall back to the uncompressed page in that (astronomically rare) case.
        let (marker, bytes) = if compressed.len() >= 0xFFFF {
            (0xFFFFu16, page.as_slice())
        } else {
            (compressed.len() as u16, compressed.as_slice())
        };
        out.extend_from_slice(&marker.to_le_bytes());
        out.push(z80_page);
        out.extend_from_slice(bytes);
    }
    Ok(out)
}

/// Maps a V2/V3 memory block's `page` byte onto a Sinclair RAM bank number.
/// Pages naming ROM banks (0, 1, 2, 11 and friends) carry no RAM content
/// and are skipped by [load_z80]; restoring a snapshot's ROM paging state
/// from file is out of scope, ROMs come from the caller's own blobs.
fn page_to_ram_bank(page: u8, is_128k: bool) -> Option<u8> {
    if is_128k {
        match page {
            3..=10 => Some(page - 3),
            _ => None,
        }
    } else {
        match page {
            4 => Some(5),
            5 => Some(2),
            8 => Some(0),
            _ => None,
        }
    }
}

/// Decodes a `.z80` file (V1, V2 or V3).
pub fn load_z80(data: &[u8]) -> Result<Z80Snapshot> {
    let (mut regs, flags1, v1_compressed) = parse_v1_header(data)?;
    let border = border_of(flags1)?;

    if regs.pc != 0 {
        // V1: single 48 KiB RAM block follows immediately, banks 0,1,2 in Sinclair
        // numbering 5,2,0, in that fixed address order.
        let body = &data[HEADER_LEN..];
        let raw = if v1_compressed {
            let trimmed = match body {
                [.., 0x00, 0xED, 0xED, 0x00] => &body[..body.len() - 4],
                _ => body,
            };
            decompress(trimmed, 3 * PAGE_SIZE)
        } else {
            body.to_vec()
        };
        if raw.len() < 3 * PAGE_SIZE {
            return Err(FormatError::Truncated);
        }
        let pages = vec![
            (5u8, raw[0..PAGE_SIZE].to_vec()),
            (2u8, raw[PAGE_SIZE..2 * PAGE_SIZE].to_vec()),
            (0u8, raw[2 * PAGE_SIZE..3 * PAGE_SIZE].to_vec()),
        ];
        return Ok(Z80Snapshot {
            version: Z80Version::V1,
            regs,
            border,
            hardware: HardwareHint::Spectrum48,
            pages,
            port_7ffd: None,
            port_1ffd: None,
        });
    }

    let (version, head_ex, ex_len) = parse_header_ex(&data[HEADER_LEN..])?;
    regs.pc = head_ex.pc;
    let hardware = select_hardware(version, head_ex.hw_mode, head_ex.flags3)?;
    let is_128k = !matches!(hardware, HardwareHint::Spectrum48);

    let mut off = HEADER_LEN + ex_len;
    let mut pages = Vec::new();
    while off + 3 <= data.len() {
        let length = u16::from_le_bytes([data[off], data[off + 1]]);
        let page = data[off + 2];
        off += 3;
        let (block_len, compressed) = if length == 0xFFFF {
            (PAGE_SIZE, false)
        } else {
            (length as usize, true)
        };
        if off + block_len > data.len() {
            return Err(FormatError::Truncated);
        }
        let block = &data[off..off + block_len];
        off += block_len;
        if let Some(bank) = page_to_ram_bank(page, is_128k) {
            let content = if compressed { decompress(block, PAGE_SIZE) } else { block.to_vec() };
            if content.len() != PAGE_SIZE {
                return Err(FormatError::Truncated);
            }
            pages.push((bank, content));
        }
    }

    let port_7ffd = if is_128k { Some(head_ex.port1) } else { None };
    let port_1ffd = if matches!(hardware, HardwareHint::Plus2A | HardwareHint::Plus3)
        && version == Z80Version::V3
        && head_ex.port2 != 0
    {
        Some(head_ex.port2)
    } else {
        None
    };

    Ok(Z80Snapshot { version, regs, border, hardware, pages, port_7ffd, port_1ffd })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompress_expands_rle_runs() {
        let out = decompress(&[0xED, 0xED, 7, 42, 96, 0xED, 0xED, 2, 0xED], 10);
        assert_eq!(out, vec![42, 42, 42, 42, 42, 42, 42, 96, 0xED, 0xED]);
    }

    #[test]
    fn decompress_handles_truncated_escape() {
        let out = decompress(&[33, 0xED, 0xED], 5);
        assert_eq!(out, vec![33]);
    }

    #[test]
    fn v1_header_with_nonzero_pc_parses_plain() {
        let mut data = vec![0u8; HEADER_LEN + 3 * PAGE_SIZE];
        data[6] = 0x34;
        data[7] = 0x12; // PC = 0x1234
        data[12] = 2 << 1; // red border, not compressed
        let snap = load_z80(&data).unwrap();
        assert_eq!(snap.version, Z80Version::V1);
        assert_eq!(snap.regs.pc, 0x1234);
        assert_eq!(snap.hardware, HardwareHint::Spectrum48);
        assert_eq!(snap.pages.len(), 3);
    }

    #[test]
    fn v2_header_selects_128k_hardware() {
        let mut data = vec![0u8; HEADER_LEN];
        // PC == 0 signals an extended header.
        let mut ex = vec![0u8; 2 + 23];
        ex[0..2].copy_from_slice(&23u16.to_le_bytes());
        ex[2..4].copy_from_slice(&0x5678u16.to_le_bytes()); // ex.pc
        ex[4] = 4; // hw_mode = Spectrum128 (v2)
        data.extend_from_slice(&ex);
        let snap = load_z80(&data).unwrap();
        assert_eq!(snap.version, Z80Version::V2);
        assert_eq!(snap.regs.pc, 0x5678);
        assert_eq!(snap.hardware, HardwareHint::Spectrum128);
        assert!(snap.pages.is_empty());
    }

    #[test]
    fn compress_expands_to_the_same_bytes_decompress_would_recover() {
        let data = vec![1u8, 2, 2, 3, 3, 3, 4, 4, 4, 5, 5, 5, 5, 5, 6, 6, 6, 6, 6, 6];
        let packed = compress(&data);
        assert_eq!(decompress(&packed, data.len()), data);
    }

    #[test]
    fn compress_rle_encodes_long_runs_and_any_run_of_0xed() {
        assert_eq!(compress(&[0u8; 255]), vec![0xED, 0xED, 255, 0]);
        assert_eq!(compress(&[0xED, 0xED]), vec![0xED, 0xED, 2, 0xED]);
        assert_eq!(compress(&[1, 2, 3, 42, 77]), vec![1, 2, 3, 42, 77]);
    }

    fn sample_snapshot(hardware: HardwareHint, pages: Vec<(u8, Vec<u8>)>, port_7ffd: Option<u8>) -> Z80Snapshot {
        let mut regs = Registers::default();
        regs.pc = 0x8000;
        regs.sp = 0xFF00;
        regs.a = 0x12;
        regs.b_ = 0x34;
        regs.c_ = 0x56;
        regs.r = 0x81;
        regs.iff1 = true;
        regs.iff2 = true;
        regs.im = InterruptMode::Im1;
        Z80Snapshot {
            version: Z80Version::V3,
            regs,
            border: BorderColor::CYAN,
            hardware,
            pages,
            port_7ffd,
            port_1ffd: None,
        }
    }

    fn varied_page(seed: u8) -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        for (i, b) in page.iter_mut().enumerate() {
            *b = (i as u8).wrapping_add(seed);
        }
        page
    }

    #[test]
    fn saving_then_loading_a_48k_snapshot_round_trips_registers_and_pages() {
        let pages = vec![(5u8, varied_page(1)), (2u8, vec![0u8; PAGE_SIZE]), (0u8, varied_page(3))];
        let snap = sample_snapshot(HardwareHint::Spectrum48, pages, None);
        let bytes = save_z80(&snap).unwrap();
        let loaded = load_z80(&bytes).unwrap();
        assert_eq!(loaded.version, Z80Version::V3);
        assert_eq!(loaded.regs.pc, snap.regs.pc);
        assert_eq!(loaded.regs.sp, snap.regs.sp);
        assert_eq!(loaded.regs.a, snap.regs.a);
        assert_eq!(loaded.regs.r, snap.regs.r);
        assert_eq!(loaded.regs.im, snap.regs.im);
        assert_eq!(loaded.border, snap.border);
        assert_eq!(loaded.hardware, HardwareHint::Spectrum48);
        assert_eq!(loaded.pages.len(), snap.pages.len());
        for (bank, page) in &snap.pages {
            let decoded = loaded.pages.iter().find(|(b, _)| b == bank).unwrap();
            assert_eq!(&decoded.1, page);
        }
    }

    #[test]
    fn saving_then_loading_a_128k_snapshot_preserves_every_bank_and_the_paging_port() {
        let pages: Vec<(u8, Vec<u8>)> = (0u8..8).map(|b| (b, varied_page(b))).collect();
        let snap = sample_snapshot(HardwareHint::Spectrum128, pages, Some(0x07));
        let bytes = save_z80(&snap).unwrap();
        let loaded = load_z80(&bytes).unwrap();
        assert_eq!(loaded.hardware, HardwareHint::Spectrum128);
        assert_eq!(loaded.port_7ffd, Some(0x07));
        assert_eq!(loaded.pages.len(), 8);
        for bank in 0u8..8 {
            let decoded = loaded.pages.iter().find(|(b, _)| *b == bank).unwrap();
            assert_eq!(decoded.1, varied_page(bank));
        }
    }

    #[test]
    fn save_z80_rejects_a_ram_bank_with_the_wrong_page_size() {
        let pages = vec![(5u8, vec![0u8; 10])];
        let snap = sample_snapshot(HardwareHint::Spectrum48, pages, None);
        assert!(matches!(save_z80(&snap), Err(FormatError::Corrupt(_))));
    }
}
