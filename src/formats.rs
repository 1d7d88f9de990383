//! Glue between the format-neutral decoders in `zxcore-formats` and this
//! crate's concrete [Memory]/[Model]. Kept separate from that crate because
//! its decoders can't depend on our memory layout (this crate depends on
//! it, not the other way around); this module is what maps a decoder's
//! `(Sinclair RAM bank number, page bytes)` output onto actual bank slots.
use zxcore_core::cpu::Registers;
use zxcore_core::memory::ZxMemory;
use zxcore_core::video::BorderColor;
use zxcore_formats::sna::{load_sna, save_sna, SnaSnapshot};
use zxcore_formats::z80::{load_z80, save_z80, HardwareHint, Z80Snapshot};

use crate::error::EmulatorError;
use crate::memory::{Memory, Model};

/// Registers, border and populated memory decoded from a snapshot, plus the
/// model the file was recorded for (relevant for `.z80`, which names it;
/// irrelevant for `.sna`, which doesn't).
pub struct LoadedSnapshot {
    pub model: Model,
    pub regs: Registers,
    pub border: BorderColor,
    pub memory: Memory,
}

/// Sinclair RAM bank numbers are almost always also the concrete `Memory`
/// bank index, the one exception being 48K machines, whose three banks
/// (5, 2, 0 in that address order) are stored at indices 0, 1, 2.
fn bank_index(model: Model, sinclair_bank: u8) -> Option<usize> {
    if model == Model::Zx48 {
        match sinclair_bank {
            5 => Some(0),
            2 => Some(1),
            0 => Some(2),
            _ => None,
        }
    } else if (sinclair_bank as usize) < model.ram_banks() {
        Some(sinclair_bank as usize)
    } else {
        None
    }
}

fn hardware_to_model(hw: HardwareHint) -> Model {
    match hw {
        HardwareHint::Spectrum48 => Model::Zx48,
        HardwareHint::Spectrum128 => Model::Zx128,
        HardwareHint::Plus2 => Model::Plus2,
        HardwareHint::Plus2A => Model::Plus2A,
        HardwareHint::Plus3 => Model::Plus3,
    }
}

/// The inverse of [bank_index]: the Sinclair bank number stored at a given
/// `Memory` bank index.
fn sinclair_bank(model: Model, index: usize) -> u8 {
    if model == Model::Zx48 {
        [5, 2, 0][index]
    } else {
        index as u8
    }
}

fn model_to_hardware(model: Model) -> HardwareHint {
    match model {
        Model::Zx48 => HardwareHint::Spectrum48,
        Model::Zx128 => HardwareHint::Spectrum128,
        Model::Plus2 => HardwareHint::Plus2,
        Model::Plus2A => HardwareHint::Plus2A,
        Model::Plus3 => HardwareHint::Plus3,
    }
}

/// Reads every RAM bank back out of `memory`, tagged with its Sinclair bank
/// number, in the order [populate] expects to find them.
fn extract_pages(memory: &Memory) -> Result<Vec<(u8, Vec<u8>)>, EmulatorError> {
    let model = memory.model();
    (0..model.ram_banks())
        .map(|idx| Ok((sinclair_bank(model, idx), memory.ram_bank_ref(idx)?.to_vec())))
        .collect()
}

fn populate(model: Model, pages: Vec<(u8, Vec<u8>)>) -> Result<Memory, EmulatorError> {
    let mut mem = Memory::new(model);
    for (bank, bytes) in pages {
        let idx = bank_index(model, bank)
            .ok_or(EmulatorError::UnsupportedFormat("RAM bank does not exist on this model"))?;
        if bytes.len() != mem.ram_bank_ref(idx)?.len() {
            return Err(EmulatorError::TruncatedImage);
        }
        mem.ram_bank_mut(idx)?.copy_from_slice(&bytes);
    }
    Ok(mem)
}

/// Decodes a `.sna` file. The caller already knows which model they want
/// (a plain `.sna` never names one); pass `Model::Zx48` for the 48k form or
/// any 128k-family model for the extended form — a mismatch between the
/// file's own shape (48k vs 128k-extended) and the requested model is an error.
pub fn load_sna_into(data: &[u8], model: Model) -> Result<LoadedSnapshot, EmulatorError> {
    let snap = load_sna(data)?;
    let is_128k_file = snap.port_7ffd.is_some();
    if is_128k_file == (model == Model::Zx48) {
        return Err(EmulatorError::UnsupportedFormat("SNA file shape does not match the requested model"));
    }
    let mut memory = populate(model, snap.pages)?;
    if let Some(val) = snap.port_7ffd {
        memory.port_out_7ffd(val);
    }
    Ok(LoadedSnapshot { model, regs: snap.regs, border: snap.border, memory })
}

/// Decodes a `.z80` file. Unlike `.sna`, the model is determined by the file
/// itself (the `hw_mode` byte), not requested by the caller.
pub fn load_z80_into(data: &[u8]) -> Result<LoadedSnapshot, EmulatorError> {
    let snap = load_z80(data)?;
    let model = hardware_to_model(snap.hardware);
    let mut memory = populate(model, snap.pages)?;
    if let Some(val) = snap.port_7ffd {
        memory.port_out_7ffd(val);
    }
    if let Some(val) = snap.port_1ffd {
        memory.port_out_1ffd(val);
    }
    Ok(LoadedSnapshot { model, regs: snap.regs, border: snap.border, memory })
}

/// Encodes the given registers/border/memory as a `.sna` file. 48k models
/// produce the plain 27-byte-header form; every 128k-family model produces
/// the extended form, tagged with the model's current `0x7FFD` value.
pub fn save_sna_from(regs: &Registers, border: BorderColor, memory: &Memory) -> Result<Vec<u8>, EmulatorError> {
    let port_7ffd = (memory.model() != Model::Zx48).then(|| memory.port_7ffd);
    let snap = SnaSnapshot {
        regs: regs.clone(),
        border,
        pages: extract_pages(memory)?,
        port_7ffd,
        tr_dos_rom_paged_in: false,
    };
    Ok(save_sna(&snap)?)
}

/// Encodes the given registers/border/memory as a `.z80` (V3 extended header) file.
pub fn save_z80_from(regs: &Registers, border: BorderColor, memory: &Memory) -> Result<Vec<u8>, EmulatorError> {
    let model = memory.model();
    let is_128k_family = model != Model::Zx48;
    let snap = Z80Snapshot {
        version: zxcore_formats::z80::Z80Version::V3,
        regs: regs.clone(),
        border,
        hardware: model_to_hardware(model),
        pages: extract_pages(memory)?,
        port_7ffd: is_128k_family.then(|| memory.port_7ffd),
        port_1ffd: model.has_special_paging().then(|| memory.port_1ffd),
    };
    Ok(save_z80(&snap)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_index_translates_48k_sinclair_numbering() {
        assert_eq!(bank_index(Model::Zx48, 5), Some(0));
        assert_eq!(bank_index(Model::Zx48, 2), Some(1));
        assert_eq!(bank_index(Model::Zx48, 0), Some(2));
        assert_eq!(bank_index(Model::Zx48, 1), None);
    }

    #[test]
    fn bank_index_is_identity_on_128k_family() {
        for bank in 0u8..8 {
            assert_eq!(bank_index(Model::Plus3, bank), Some(bank as usize));
        }
        assert_eq!(bank_index(Model::Zx128, 8), None);
    }

    #[test]
    fn extract_pages_inverts_populate_on_48k() {
        let pages: Vec<(u8, Vec<u8>)> =
            vec![(5, vec![0x11; 0x4000]), (2, vec![0x22; 0x4000]), (0, vec![0x33; 0x4000])];
        let memory = populate(Model::Zx48, pages.clone()).unwrap();
        let mut extracted = extract_pages(&memory).unwrap();
        extracted.sort_by_key(|(bank, _)| *bank);
        let mut expected = pages;
        expected.sort_by_key(|(bank, _)| *bank);
        assert_eq!(extracted, expected);
    }

    #[test]
    fn save_sna_from_round_trips_through_load_sna_into() {
        let pages: Vec<(u8, Vec<u8>)> =
            vec![(5, vec![0xAA; 0x4000]), (2, vec![0xBB; 0x4000]), (0, vec![0xCC; 0x4000])];
        let memory = populate(Model::Zx48, pages).unwrap();
        let mut regs = Registers::default();
        regs.sp = 0x8000;
        let bytes = save_sna_from(&regs, BorderColor::CYAN, &memory).unwrap();
        let loaded = load_sna_into(&bytes, Model::Zx48).unwrap();
        assert_eq!(loaded.border, BorderColor::CYAN);
        for bank in [5u8, 2, 0] {
            let idx = bank_index(Model::Zx48, bank).unwrap();
            assert_eq!(loaded.memory.ram_bank_ref(idx).unwrap(), memory.ram_bank_ref(idx).unwrap());
        }
    }
}
