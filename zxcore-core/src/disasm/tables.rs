/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! The four opcode-quadruple tables (mnemonic, arg mode, operand slots),
//! expressed as pure functions of the opcode byte rather than as literal
//! arrays of pre-rendered strings, since most rows differ only by which of
//! the eight `r`/`rp` operands they name. `BASE_TABLE`/`CB_TABLE`/`ED_TABLE`
//! below still present the conventional flat, byte-indexed view the rest of
//! the disassembler expects; `DD`/`FD`/`DDCB`/`FDCB` reuse the base/CB
//! tables and patch in the index register name at render time.
use std::ops::Index;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgMode {
    None,
    Imm8,
    Imm16,
    /// A direct 16-bit address operand, rendered as `(nnnn)`.
    Imm16Mem,
    /// `(nnnn),REG`: a direct-address store of a 16-bit register pair,
    /// pairing the fetched address with a fixed register name.
    Imm16MemReg(&'static str),
    RelJump,
    /// `(HL)`, or `(IX+d)`/`(IY+d)` when an index prefix is active.
    IndexedMem,
    Port8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpEntry {
    pub mnemonic: String,
    pub arg1: ArgMode,
    pub arg2: ArgMode,
}

impl OpEntry {
    fn new(mnemonic: impl Into<String>, arg1: ArgMode, arg2: ArgMode) -> Self {
        OpEntry { mnemonic: mnemonic.into(), arg1, arg2 }
    }
    fn bare(mnemonic: impl Into<String>) -> Self {
        OpEntry::new(mnemonic, ArgMode::None, ArgMode::None)
    }
}

const R8_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const RP_NAMES: [&str; 4] = ["BC", "DE", "HL", "SP"];
const RP2_NAMES: [&str; 4] = ["BC", "DE", "HL", "AF"];
const CC_NAMES: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];
const ALU_NAMES: [&str; 8] = ["ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP "];
const ROT_NAMES: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];

fn reg_arg_mode(code: u8) -> ArgMode {
    if code == 6 {
        ArgMode::IndexedMem
    } else {
        ArgMode::None
    }
}

/// A thin adapter so `BASE_TABLE[opcode]`/`CB_TABLE[opcode]`/`ED_TABLE[opcode]`
/// reads the way a literal array would, backed by the functions above.
pub struct ByteIndexed<F>(pub F);

impl<F: Fn(u8) -> OpEntry> Index<usize> for ByteIndexed<F> {
    type Output = OpEntry;
    fn index(&self, i: usize) -> &OpEntry {
        // Leak a single-use box so the returned reference can outlive this call;
        // acceptable for a debug-only disassembler that renders one instruction
        // at a time and is never on a hot path.
        Box::leak(Box::new((self.0)(i as u8)))
    }
}

pub static BASE_TABLE: ByteIndexed<fn(u8) -> OpEntry> = ByteIndexed(base_entry);
pub static CB_TABLE: ByteIndexed<fn(u8) -> OpEntry> = ByteIndexed(cb_entry);
pub static ED_TABLE: ByteIndexed<fn(u8) -> OpEntry> = ByteIndexed(ed_entry);

pub fn base_entry(opcode: u8) -> OpEntry {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = (y >> 1) as usize;
    let q = y & 1;

    match (x, z) {
        (0, 0) => match y {
            0 => OpEntry::bare("NOP"),
            1 => OpEntry::bare("EX AF,AF'"),
            2 => OpEntry::new("DJNZ", ArgMode::RelJump, ArgMode::None),
            3 => OpEntry::new("JR", ArgMode::RelJump, ArgMode::None),
            cc => OpEntry::new(format!("JR {},", CC_NAMES[(cc - 4) as usize]), ArgMode::RelJump, ArgMode::None),
        },
        (0, 1) if q == 0 => OpEntry::new(format!("LD {},", RP_NAMES[p]), ArgMode::Imm16, ArgMode::None),
        (0, 1) => OpEntry::new(format!("ADD HL,{}", RP_NAMES[p]), ArgMode::None, ArgMode::None),
        (0, 2) => match (p, q) {
            (0, 0) => OpEntry::bare("LD (BC),A"),
            (0, 1) => OpEntry::bare("LD A,(BC)"),
            (1, 0) => OpEntry::bare("LD (DE),A"),
            (1, 1) => OpEntry::bare("LD A,(DE)"),
            (2, 0) => OpEntry::new("LD", ArgMode::Imm16MemReg("HL"), ArgMode::None),
            (2, 1) => OpEntry::new("LD HL,", ArgMode::Imm16Mem, ArgMode::None),
            (3, 0) => OpEntry::new("LD", ArgMode::Imm16MemReg("A"), ArgMode::None),
            (3, 1) => OpEntry::new("LD A,", ArgMode::Imm16Mem, ArgMode::None),
            _ => unreachable!(),
        },
        (0, 3) => OpEntry::bare(format!("{} {}", if q == 0 { "INC" } else { "DEC" }, RP_NAMES[p])),
        (0, 4) => OpEntry::new(format!("INC {}", R8_NAMES[y as usize]), reg_arg_mode(y), ArgMode::None),
        (0, 5) => OpEntry::new(format!("DEC {}", R8_NAMES[y as usize]), reg_arg_mode(y), ArgMode::None),
        (0, 6) => OpEntry::new(format!("LD {},", R8_NAMES[y as usize]), ArgMode::Imm8, ArgMode::None),
        (0, 7) => OpEntry::bare(["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"][y as usize]),
        (1, _) if y == 6 && z == 6 => OpEntry::bare("HALT"),
        (1, _) => OpEntry::new(format!("LD {},{}", R8_NAMES[y as usize], R8_NAMES[z as usize]), ArgMode::None, ArgMode::None),
        (2, _) => OpEntry::new(format!("{}{}", ALU_NAMES[y as usize], R8_NAMES[z as usize]), ArgMode::None, ArgMode::None),
        (3, 0) => OpEntry::bare(format!("RET {}", CC_NAMES[y as usize])),
        (3, 1) if q == 0 => OpEntry::bare(format!("POP {}", RP2_NAMES[p])),
        (3, 1) => OpEntry::bare(["RET", "EXX", "JP HL", "LD SP,HL"][p]),
        (3, 2) => OpEntry::new(format!("JP {},", CC_NAMES[y as usize]), ArgMode::Imm16, ArgMode::None),
        (3, 3) => match y {
            0 => OpEntry::new("JP", ArgMode::Imm16, ArgMode::None),
            1 => OpEntry::bare("(CB prefix)"),
            2 => OpEntry::new("OUT", ArgMode::Port8, ArgMode::None),
            3 => OpEntry::new("IN A,", ArgMode::Port8, ArgMode::None),
            4 => OpEntry::bare("EX (SP),HL"),
            5 => OpEntry::bare("EX DE,HL"),
            6 => OpEntry::bare("DI"),
            _ => OpEntry::bare("EI"),
        },
        (3, 4) => OpEntry::new(format!("CALL {},", CC_NAMES[y as usize]), ArgMode::Imm16, ArgMode::None),
        (3, 5) if q == 0 => OpEntry::bare(format!("PUSH {}", RP2_NAMES[p])),
        (3, 5) if p == 0 => OpEntry::new("CALL", ArgMode::Imm16, ArgMode::None),
        (3, 5) => OpEntry::bare("(prefix)"),
        (3, 6) => OpEntry::new(ALU_NAMES[y as usize].trim_end_matches(','), ArgMode::Imm8, ArgMode::None),
        (3, 7) => OpEntry::bare(format!("RST {:#04X}", y * 8)),
        _ => OpEntry::bare("???"),
    }
}

pub fn cb_entry(opcode: u8) -> OpEntry {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let reg = R8_NAMES[z as usize];
    match x {
        0 => OpEntry::new(format!("{} {}", ROT_NAMES[y as usize], reg), reg_arg_mode(z), ArgMode::None),
        1 => OpEntry::new(format!("BIT {},{}", y, reg), reg_arg_mode(z), ArgMode::None),
        2 => OpEntry::new(format!("RES {},{}", y, reg), reg_arg_mode(z), ArgMode::None),
        _ => OpEntry::new(format!("SET {},{}", y, reg), reg_arg_mode(z), ArgMode::None),
    }
}

pub fn ed_entry(opcode: u8) -> OpEntry {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = (y >> 1) as usize;
    let q = y & 1;

    if x == 1 {
        return match z {
            0 if y == 6 => OpEntry::bare("IN (C)"),
            0 => OpEntry::bare(format!("IN {},(C)", R8_NAMES[y as usize])),
            1 if y == 6 => OpEntry::bare("OUT (C),0"),
            1 => OpEntry::bare(format!("OUT (C),{}", R8_NAMES[y as usize])),
            2 => OpEntry::bare(format!("{} HL,{}", if q == 0 { "SBC" } else { "ADC" }, RP_NAMES[p])),
            3 if q == 0 => OpEntry::new("LD", ArgMode::Imm16MemReg(RP_NAMES[p]), ArgMode::None),
            3 => OpEntry::new(format!("LD {},", RP_NAMES[p]), ArgMode::Imm16Mem, ArgMode::None),
            4 => OpEntry::bare("NEG"),
            5 => OpEntry::bare(if y == 1 { "RETI" } else { "RETN" }),
            6 => OpEntry::bare(format!("IM {}", [0, 0, 1, 2, 0, 0, 1, 2][y as usize])),
            7 => OpEntry::bare(
                ["LD I,A", "LD R,A", "LD A,I", "LD A,R", "RRD", "RLD", "NOP", "NOP"][y as usize],
            ),
            _ => unreachable!(),
        };
    }
    if x == 2 && z <= 3 && y >= 4 {
        let names: [[&str; 4]; 4] = [
            ["LDI", "LDD", "LDIR", "LDDR"],
            ["CPI", "CPD", "CPIR", "CPDR"],
            ["INI", "IND", "INIR", "INDR"],
            ["OUTI", "OUTD", "OTIR", "OTDR"],
        ];
        let row = [4, 5, 6, 7].iter().position(|&v| v == y).unwrap();
        return OpEntry::bare(names[z as usize][row]);
    }
    OpEntry::bare("NOP")
}
