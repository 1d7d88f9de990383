//! Memory bank addressing: the error type, the [ZxMemory] trait and small
//! helper types shared by every concrete memory layout in the workspace.
use core::fmt;
use std::error::Error;
use std::io;

/// Size of a single memory bank (ROM or RAM) in bytes.
pub const BANK_SIZE: usize = 0x4000;
/// Number of 16 KiB address slots in the Z80's 64 KiB address space.
pub const SLOTS: usize = 4;

/// Errors returned by [ZxMemory] implementations.
#[derive(Debug)]
pub enum ZxMemoryError {
    /// A `page`/`rom_bank`/`ram_bank` argument was out of range for this layout.
    InvalidBankIndex,
    /// A `screen_bank` argument does not exist in this layout.
    InvalidScreenBank,
    /// This memory layout does not support external ROM paging.
    UnsupportedExRomPaging,
    /// ROM blob size did not match this model's expected aggregate ROM size.
    BadRomSize { expected: usize, got: usize },
    /// Underlying I/O error while loading memory content.
    Io(io::Error),
}

impl fmt::Display for ZxMemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZxMemoryError::InvalidBankIndex => write!(f, "memory bank index out of range"),
            ZxMemoryError::InvalidScreenBank => write!(f, "screen bank does not exist on this model"),
            ZxMemoryError::UnsupportedExRomPaging => write!(f, "this memory layout does not support EX-ROM paging"),
            ZxMemoryError::BadRomSize { expected, got } => {
                write!(f, "ROM image size mismatch: expected {} bytes, got {}", expected, got)
            }
            ZxMemoryError::Io(e) => write!(f, "memory I/O error: {}", e),
        }
    }
}

impl Error for ZxMemoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ZxMemoryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ZxMemoryError {
    fn from(e: io::Error) -> Self {
        ZxMemoryError::Io(e)
    }
}

pub type Result<T> = core::result::Result<T, ZxMemoryError>;

/// What kind of bank is currently mapped at a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryKind {
    Rom,
    Ram,
}

/// A trait for interfacing ZX Spectrum's various memory layouts.
///
/// Implementations own a flat byte store split into 16 KiB banks and a
/// four-entry slot table mapping each of the four 16 KiB address regions
/// to a bank. Exactly one bank is visible per slot at any time.
pub trait ZxMemory {
    /// Total number of ROM banks available to page in (1, 2 or 4 on the emulated models).
    const ROM_BANKS_MAX: usize;
    /// Total number of RAM banks available to page in (8 or 16 on the emulated models).
    const RAM_BANKS_MAX: usize;
    /// Total number of distinct screen banks (1 on 16K/48K, 2 on 128K-family models).
    const SCR_BANKS_MAX: usize;

    /// Resets the slot table to its power-on layout. Bank contents are left untouched.
    fn reset(&mut self);
    /// Reads a byte through the current slot mapping.
    fn read(&self, addr: u16) -> u8;
    /// Reads a little-endian word through the current slot mapping, wrapping at 0xFFFF.
    fn read16(&self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        lo | (hi << 8)
    }
    /// Writes a byte through the current slot mapping. A write into a ROM-mapped slot
    /// is silently dropped.
    fn write(&mut self, addr: u16, val: u8);
    /// Writes a little-endian word through the current slot mapping, wrapping at 0xFFFF.
    fn write16(&mut self, addr: u16, val: u16) {
        self.write(addr, val as u8);
        self.write(addr.wrapping_add(1), (val >> 8) as u8);
    }
    /// Reads a byte from screen memory. `addr` is in screen address space (0 addresses
    /// the first byte of screen memory), independent of the current paging state.
    fn read_screen(&self, screen_bank: usize, addr: u16) -> u8;
    /// Returns what kind of memory is currently paged at the given 16 KiB `slot` (0..=3).
    fn page_kind(&self, slot: u8) -> Result<MemoryKind>;
    /// Returns a reference to the contents of an entire ROM bank, regardless of paging.
    fn rom_bank_ref(&self, rom_bank: usize) -> Result<&[u8]>;
    /// Returns a mutable reference to the contents of an entire ROM bank.
    fn rom_bank_mut(&mut self, rom_bank: usize) -> Result<&mut [u8]>;
    /// Returns a reference to the contents of an entire RAM bank, regardless of paging.
    fn ram_bank_ref(&self, ram_bank: usize) -> Result<&[u8]>;
    /// Returns a mutable reference to the contents of an entire RAM bank.
    fn ram_bank_mut(&mut self, ram_bank: usize) -> Result<&mut [u8]>;
    /// Pages `rom_bank` in at the given 16 KiB `slot` (read-only).
    fn map_rom_bank(&mut self, rom_bank: usize, slot: u8) -> Result<()>;
    /// Pages `ram_bank` in at the given 16 KiB `slot` (writable).
    fn map_ram_bank(&mut self, ram_bank: usize, slot: u8) -> Result<()>;
    /// Expected aggregate size in bytes of a ROM blob for this layout (`ROM_BANKS_MAX * BANK_SIZE`).
    fn rom_image_size(&self) -> usize {
        Self::ROM_BANKS_MAX * BANK_SIZE
    }
    /// Populates `rom0..romR` from a flat byte blob. Refuses blobs of the wrong size
    /// rather than truncating or zero-padding.
    fn load_rom(&mut self, blob: &[u8]) -> Result<()> {
        let expected = self.rom_image_size();
        if blob.len() != expected {
            return Err(ZxMemoryError::BadRomSize { expected, got: blob.len() });
        }
        for (bank, chunk) in blob.chunks(BANK_SIZE).enumerate() {
            self.rom_bank_mut(bank)?.copy_from_slice(chunk);
        }
        Ok(())
    }
}
