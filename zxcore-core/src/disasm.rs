/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! A pure Z80 disassembler: four decode tables (base, CB, ED, DD/FD plus
//! DDCB/FDCB) and a cursor-driven decoder that renders one instruction as
//! text plus its length in bytes. No CPU state is touched; this is the
//! single source of truth for instruction length used by debuggers and by
//! the snapshot loaders when they need to locate an instruction boundary.
mod tables;

use tables::{ArgMode, OpEntry, BASE_TABLE, CB_TABLE, ED_TABLE};

/// A decoded instruction: its rendered text and how many bytes it occupied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembled {
    pub text: String,
    pub length: u8,
}

/// Disassembles a single instruction starting at `bytes[0]`, following any
/// prefix chain (`CB`/`ED`/`DD`/`FD`/`DDCB`/`FDCB`). `bytes` must contain at
/// least enough bytes for the longest possible encoding (4); shorter slices
/// are padded conceptually with `0x00` (a `NOP`), matching how the corpus's
/// "unknown opcode" failure semantics never actually fail.
pub fn disassemble(bytes: &[u8]) -> Disassembled {
    let get = |i: usize| -> u8 { bytes.get(i).copied().unwrap_or(0) };
    let mut cursor = 0usize;
    let mut index_reg: Option<&'static str> = None;

    let mut opcode = get(cursor);
    cursor += 1;
    loop {
        match opcode {
            0xDD => {
                index_reg = Some("IX");
                opcode = get(cursor);
                cursor += 1;
            }
            0xFD => {
                index_reg = Some("IY");
                opcode = get(cursor);
                cursor += 1;
            }
            _ => break,
        }
    }

    match opcode {
        0xCB => {
            if let Some(reg) = index_reg {
                let d = get(cursor) as i8;
                cursor += 1;
                let sub = get(cursor);
                cursor += 1;
                let entry = &CB_TABLE[sub as usize];
                let text = render_indexed_cb(entry, reg, d);
                Disassembled { text, length: cursor as u8 }
            } else {
                let sub = get(cursor);
                cursor += 1;
                let entry = &CB_TABLE[sub as usize];
                let text = render(entry, &get_bytes(bytes, cursor), None, &mut 0);
                Disassembled { text, length: cursor as u8 }
            }
        }
        0xED => {
            let sub = get(cursor);
            cursor += 1;
            let entry = &ED_TABLE[sub as usize];
            let mut extra = cursor;
            let text = render(entry, &get_bytes(bytes, cursor), None, &mut extra);
            Disassembled { text, length: extra as u8 }
        }
        _ => {
            let entry = &BASE_TABLE[opcode as usize];
            let mut extra = cursor;
            let text = render(entry, &get_bytes(bytes, cursor), index_reg, &mut extra);
            Disassembled { text, length: extra as u8 }
        }
    }
}

fn get_bytes<'a>(bytes: &'a [u8], from: usize) -> &'a [u8] {
    if from >= bytes.len() {
        &[]
    } else {
        &bytes[from..]
    }
}

fn operand_text(mode: ArgMode, bytes: &[u8], idx: &mut usize, index_reg: Option<&str>) -> String {
    let get = |i: usize| -> u8 { bytes.get(i).copied().unwrap_or(0) };
    match mode {
        ArgMode::None => String::new(),
        ArgMode::Imm8 => {
            let v = get(*idx);
            *idx += 1;
            format!("{:#04X}", v)
        }
        ArgMode::Imm16 => {
            let lo = get(*idx) as u16;
            let hi = get(*idx + 1) as u16;
            *idx += 2;
            format!("{:#06X}", lo | (hi << 8))
        }
        ArgMode::Imm16Mem => {
            let lo = get(*idx) as u16;
            let hi = get(*idx + 1) as u16;
            *idx += 2;
            format!("({:#06X})", lo | (hi << 8))
        }
        ArgMode::Imm16MemReg(reg) => {
            let lo = get(*idx) as u16;
            let hi = get(*idx + 1) as u16;
            *idx += 2;
            format!("({:#06X}),{}", lo | (hi << 8), reg)
        }
        ArgMode::RelJump => {
            let d = get(*idx) as i8;
            *idx += 1;
            format!("${:+}", d as i16 + 2)
        }
        ArgMode::IndexedMem => {
            let reg = index_reg.unwrap_or("HL");
            if reg == "HL" {
                format!("({})", reg)
            } else {
                let d = get(*idx) as i8;
                *idx += 1;
                format!("({}{:+})", reg, d)
            }
        }
        ArgMode::Port8 => {
            let v = get(*idx);
            *idx += 1;
            format!("({:#04X})", v)
        }
    }
}

fn render(entry: &OpEntry, bytes: &[u8], index_reg: Option<&str>, idx: &mut usize) -> String {
    let a1 = operand_text(entry.arg1, bytes, idx, index_reg);
    let a2 = operand_text(entry.arg2, bytes, idx, index_reg);
    let mnemonic = substitute_index(entry.mnemonic, index_reg);
    match (a1.is_empty(), a2.is_empty()) {
        (true, true) => mnemonic,
        (false, true) => format!("{} {}", mnemonic, a1),
        (false, false) => format!("{} {},{}", mnemonic, a1, a2),
        (true, false) => format!("{} {}", mnemonic, a2),
    }
}

/// Substitutes a literal `HL` appearing in a mnemonic string for the active
/// index register, e.g. turning `"LD HL,nn"` into `"LD IX,nn"` under a `DD`
/// prefix. Mnemonics that reference `(HL)` are handled via [ArgMode::IndexedMem]
/// instead and are left untouched here.
fn substitute_index(mnemonic: &str, index_reg: Option<&str>) -> String {
    match index_reg {
        None => mnemonic.to_string(),
        Some(reg) if !mnemonic.contains("(HL)") => mnemonic.replace("HL", reg),
        Some(_) => mnemonic.to_string(),
    }
}

fn render_indexed_cb(entry: &OpEntry, reg: &str, d: i8) -> String {
    format!("{} ({}{:+})", entry.mnemonic, reg, d)
}
