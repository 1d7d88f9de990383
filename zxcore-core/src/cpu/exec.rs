/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! Decode/execute for the base, CB, ED and DD/FD (including DDCB/FDCB) opcode
//! spaces. Pure dispatch: every memory/IO access goes through the helpers at
//! the bottom of this file so contention is charged consistently everywhere.
use super::alu::*;
use super::regs::{InterruptMode, Registers};
use super::CpuBus;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum IdxMode {
    None,
    Ix,
    Iy,
}

pub(super) fn execute_one<B: CpuBus>(regs: &mut Registers, bus: &mut B) -> u32 {
    let mut total = 0u32;
    let mut idx = IdxMode::None;
    let mut opcode = fetch_opcode(regs, bus, &mut total);
    loop {
        match opcode {
            0xDD => {
                idx = IdxMode::Ix;
                opcode = fetch_opcode(regs, bus, &mut total);
            }
            0xFD => {
                idx = IdxMode::Iy;
                opcode = fetch_opcode(regs, bus, &mut total);
            }
            _ => break,
        }
    }
    match opcode {
        0xCB => execute_cb(regs, bus, idx, &mut total),
        0xED => execute_ed(regs, bus, &mut total),
        _ => execute_base(regs, bus, idx, opcode, &mut total),
    }
    total
}

// --- bus helpers -----------------------------------------------------------

fn mem_read<B: CpuBus>(bus: &mut B, addr: u16, base: u32, total: &mut u32) -> u8 {
    let delay = bus.contention(addr, false);
    if delay > 0 {
        bus.tick(delay);
        *total += delay;
    }
    let v = bus.read_mem(addr);
    bus.tick(base);
    *total += base;
    v
}

fn mem_write<B: CpuBus>(bus: &mut B, addr: u16, val: u8, base: u32, total: &mut u32) {
    let delay = bus.contention(addr, false);
    if delay > 0 {
        bus.tick(delay);
        *total += delay;
    }
    bus.write_mem(addr, val);
    bus.tick(base);
    *total += base;
}

fn io_read<B: CpuBus>(bus: &mut B, port: u16, total: &mut u32) -> u8 {
    let delay = bus.contention(port, true);
    if delay > 0 {
        bus.tick(delay);
        *total += delay;
    }
    let v = bus.read_io(port);
    bus.tick(4);
    *total += 4;
    v
}

fn io_write<B: CpuBus>(bus: &mut B, port: u16, val: u8, total: &mut u32) {
    let delay = bus.contention(port, true);
    if delay > 0 {
        bus.tick(delay);
        *total += delay;
    }
    bus.write_io(port, val);
    bus.tick(4);
    *total += 4;
}

fn fetch_opcode<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32) -> u8 {
    let addr = regs.pc;
    let v = mem_read(bus, addr, 4, total);
    regs.pc = regs.pc.wrapping_add(1);
    regs.bump_r(1);
    v
}

fn fetch_byte<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32) -> u8 {
    let addr = regs.pc;
    let v = mem_read(bus, addr, 3, total);
    regs.pc = regs.pc.wrapping_add(1);
    v
}

fn fetch_word<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32) -> u16 {
    let lo = fetch_byte(regs, bus, total);
    let hi = fetch_byte(regs, bus, total);
    u16::from_le_bytes([lo, hi])
}

pub(super) fn push_word<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    regs.sp = regs.sp.wrapping_sub(1);
    mem_write(bus, regs.sp, hi, 3, total);
    regs.sp = regs.sp.wrapping_sub(1);
    mem_write(bus, regs.sp, lo, 3, total);
}

fn pop_word<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32) -> u16 {
    let lo = mem_read(bus, regs.sp, 3, total);
    regs.sp = regs.sp.wrapping_add(1);
    let hi = mem_read(bus, regs.sp, 3, total);
    regs.sp = regs.sp.wrapping_add(1);
    u16::from_le_bytes([lo, hi])
}

pub(super) fn overhead<B: CpuBus>(bus: &mut B, tstates: u32, total: &mut u32) {
    bus.tick(tstates);
    *total += tstates;
}

/// Reads a little-endian word at `addr`/`addr+1`, charging contention on each
/// byte the same way [fetch_word] does. Used for the IM2 interrupt vector,
/// which isn't fetched through `PC` so [fetch_word] doesn't apply.
pub(super) fn read_word<B: CpuBus>(bus: &mut B, addr: u16, total: &mut u32) -> u16 {
    let lo = mem_read(bus, addr, 3, total);
    let hi = mem_read(bus, addr.wrapping_add(1), 3, total);
    u16::from_le_bytes([lo, hi])
}

// --- indexed (HL)/(IX+d)/(IY+d) addressing ---------------------------------

/// Resolves the effective address for an `(HL)`-group operand, fetching and
/// charging the displacement byte when an index prefix is active.
fn hl_addr<B: CpuBus>(regs: &mut Registers, bus: &mut B, idx: IdxMode, total: &mut u32) -> u16 {
    match idx {
        IdxMode::None => regs.hl(),
        IdxMode::Ix | IdxMode::Iy => {
            let d = fetch_byte(regs, bus, total) as i8 as i16;
            overhead(bus, 5, total);
            let base = if idx == IdxMode::Ix { regs.ix } else { regs.iy };
            let addr = (base as i16).wrapping_add(d) as u16;
            regs.memptr = addr;
            addr
        }
    }
}

/// Same as [hl_addr] but for the DDCB/FDCB space, where the displacement always
/// precedes the opcode byte and is never optional.
fn idx_addr<B: CpuBus>(regs: &mut Registers, bus: &mut B, idx: IdxMode, d: i8, total: &mut u32) -> u16 {
    let base = if idx == IdxMode::Ix { regs.ix } else { regs.iy };
    let addr = (base as i16).wrapping_add(d as i16) as u16;
    regs.memptr = addr;
    let _ = total;
    addr
}

// --- 8-bit register decode (groups of 3 bits, 6 = (HL)/(IX+d)/(IY+d)) ------

fn read_r8<B: CpuBus>(regs: &mut Registers, bus: &mut B, idx: IdxMode, code: u8, total: &mut u32) -> u8 {
    match code {
        0 => regs.b,
        1 => regs.c,
        2 => regs.d,
        3 => regs.e,
        4 => match idx {
            IdxMode::None => regs.h,
            IdxMode::Ix => (regs.ix >> 8) as u8,
            IdxMode::Iy => (regs.iy >> 8) as u8,
        },
        5 => match idx {
            IdxMode::None => regs.l,
            IdxMode::Ix => regs.ix as u8,
            IdxMode::Iy => regs.iy as u8,
        },
        6 => {
            let addr = hl_addr(regs, bus, idx, total);
            mem_read(bus, addr, 3, total)
        }
        7 => regs.a,
        _ => unreachable!(),
    }
}

fn write_r8<B: CpuBus>(regs: &mut Registers, bus: &mut B, idx: IdxMode, code: u8, val: u8, total: &mut u32) {
    match code {
        0 => regs.b = val,
        1 => regs.c = val,
        2 => regs.d = val,
        3 => regs.e = val,
        4 => match idx {
            IdxMode::None => regs.h = val,
            IdxMode::Ix => regs.ix = (regs.ix & 0x00FF) | ((val as u16) << 8),
            IdxMode::Iy => regs.iy = (regs.iy & 0x00FF) | ((val as u16) << 8),
        },
        5 => match idx {
            IdxMode::None => regs.l = val,
            IdxMode::Ix => regs.ix = (regs.ix & 0xFF00) | val as u16,
            IdxMode::Iy => regs.iy = (regs.iy & 0xFF00) | val as u16,
        },
        6 => {
            let addr = hl_addr(regs, bus, idx, total);
            mem_write(bus, addr, val, 3, total);
        }
        7 => regs.a = val,
        _ => unreachable!(),
    }
}

// --- 16-bit register-pair decode (`ss`/`dd`/`qq` groups) -------------------

fn rp_get(regs: &Registers, idx: IdxMode, p: u8) -> u16 {
    match p {
        0 => regs.bc(),
        1 => regs.de(),
        2 => match idx {
            IdxMode::None => regs.hl(),
            IdxMode::Ix => regs.ix,
            IdxMode::Iy => regs.iy,
        },
        3 => regs.sp,
        _ => unreachable!(),
    }
}

fn rp_set(regs: &mut Registers, idx: IdxMode, p: u8, val: u16) {
    match p {
        0 => regs.set_bc(val),
        1 => regs.set_de(val),
        2 => match idx {
            IdxMode::None => regs.set_hl(val),
            IdxMode::Ix => regs.ix = val,
            IdxMode::Iy => regs.iy = val,
        },
        3 => regs.sp = val,
        _ => unreachable!(),
    }
}

fn cond(regs: &Registers, code: u8) -> bool {
    match code {
        0 => regs.f & FLAG_Z == 0,      // NZ
        1 => regs.f & FLAG_Z != 0,      // Z
        2 => regs.f & FLAG_C == 0,      // NC
        3 => regs.f & FLAG_C != 0,      // C
        4 => regs.f & FLAG_PV == 0,     // PO
        5 => regs.f & FLAG_PV != 0,     // PE
        6 => regs.f & FLAG_S == 0,      // P
        7 => regs.f & FLAG_S != 0,      // M
        _ => unreachable!(),
    }
}

fn alu_op8(op: u8, a: u8, n: u8, carry: bool) -> (u8, u8) {
    match op {
        0 => add8(a, n, 0),
        1 => add8(a, n, carry as u8),
        2 => sub8(a, n, 0),
        3 => sub8(a, n, carry as u8),
        4 => and8(a, n),
        5 => xor8(a, n),
        6 => or8(a, n),
        7 => (a, cp8(a, n)),
        _ => unreachable!(),
    }
}

// --- base table -------------------------------------------------------------

fn execute_base<B: CpuBus>(regs: &mut Registers, bus: &mut B, idx: IdxMode, opcode: u8, total: &mut u32) {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = y >> 1;
    let q = y & 1;

    match (x, z) {
        // NOP / EX AF,AF' / DJNZ / JR / JR cc
        (0, 0) => match y {
            0 => {}
            1 => regs.ex_af_af(),
            2 => {
                regs.b = regs.b.wrapping_sub(1);
                let e = fetch_byte(regs, bus, total) as i8;
                overhead(bus, 1, total);
                if regs.b != 0 {
                    overhead(bus, 5, total);
                    regs.pc = (regs.pc as i16).wrapping_add(e as i16) as u16;
                    regs.memptr = regs.pc;
                }
            }
            3 => {
                let e = fetch_byte(regs, bus, total) as i8;
                overhead(bus, 5, total);
                regs.pc = (regs.pc as i16).wrapping_add(e as i16) as u16;
                regs.memptr = regs.pc;
            }
            4..=7 => {
                let e = fetch_byte(regs, bus, total) as i8;
                if cond(regs, y - 4) {
                    overhead(bus, 5, total);
                    regs.pc = (regs.pc as i16).wrapping_add(e as i16) as u16;
                    regs.memptr = regs.pc;
                }
            }
            _ => unreachable!(),
        },
        // LD rp,nn / ADD HL,rp
        (0, 1) => {
            if q == 0 {
                let nn = fetch_word(regs, bus, total);
                rp_set(regs, idx, p, nn);
            } else {
                let hl = rp_get(regs, idx, 2);
                let rp = rp_get(regs, idx, p);
                overhead(bus, 7, total);
                let (result, f) = add16(hl, rp, regs.f);
                rp_set(regs, idx, 2, result);
                regs.f = f;
                regs.memptr = hl.wrapping_add(1);
            }
        }
        // LD (BC/DE/nn),A and HL / LD A,(BC/DE/nn) and HL
        (0, 2) => {
            match (p, q) {
                (0, 0) => {
                    let addr = regs.bc();
                    mem_write(bus, addr, regs.a, 3, total);
                    regs.memptr = (addr.wrapping_add(1) & 0x00FF) | ((regs.a as u16) << 8);
                }
                (0, 1) => {
                    let addr = regs.bc();
                    regs.a = mem_read(bus, addr, 3, total);
                    regs.memptr = addr.wrapping_add(1);
                }
                (1, 0) => {
                    let addr = regs.de();
                    mem_write(bus, addr, regs.a, 3, total);
                    regs.memptr = (addr.wrapping_add(1) & 0x00FF) | ((regs.a as u16) << 8);
                }
                (1, 1) => {
                    let addr = regs.de();
                    regs.a = mem_read(bus, addr, 3, total);
                    regs.memptr = addr.wrapping_add(1);
                }
                (2, 0) => {
                    let addr = fetch_word(regs, bus, total);
                    let hl = rp_get(regs, idx, 2);
                    mem_write(bus, addr, hl as u8, 3, total);
                    mem_write(bus, addr.wrapping_add(1), (hl >> 8) as u8, 3, total);
                    regs.memptr = addr.wrapping_add(1);
                }
                (2, 1) => {
                    let addr = fetch_word(regs, bus, total);
                    let lo = mem_read(bus, addr, 3, total);
                    let hi = mem_read(bus, addr.wrapping_add(1), 3, total);
                    rp_set(regs, idx, 2, u16::from_le_bytes([lo, hi]));
                    regs.memptr = addr.wrapping_add(1);
                }
                (3, 0) => {
                    let addr = fetch_word(regs, bus, total);
                    mem_write(bus, addr, regs.a, 3, total);
                    regs.memptr = (addr.wrapping_add(1) & 0x00FF) | ((regs.a as u16) << 8);
                }
                (3, 1) => {
                    let addr = fetch_word(regs, bus, total);
                    regs.a = mem_read(bus, addr, 3, total);
                    regs.memptr = addr.wrapping_add(1);
                }
                _ => unreachable!(),
            }
        }
        // INC rp / DEC rp
        (0, 3) => {
            let rp = rp_get(regs, idx, p);
            overhead(bus, 2, total);
            rp_set(regs, idx, p, if q == 0 { rp.wrapping_add(1) } else { rp.wrapping_sub(1) });
        }
        // INC r
        (0, 4) => {
            let v = read_r8(regs, bus, idx, y, total);
            let (result, f) = inc8(v, regs.f);
            if y == 6 {
                overhead(bus, 1, total);
            }
            write_r8(regs, bus, idx, y, result, total);
            regs.f = f;
        }
        // DEC r
        (0, 5) => {
            let v = read_r8(regs, bus, idx, y, total);
            let (result, f) = dec8(v, regs.f);
            if y == 6 {
                overhead(bus, 1, total);
            }
            write_r8(regs, bus, idx, y, result, total);
            regs.f = f;
        }
        // LD r,n
        (0, 6) => {
            let n = fetch_byte(regs, bus, total);
            write_r8(regs, bus, idx, y, n, total);
        }
        // rotate-A / DAA / CPL / SCF / CCF
        (0, 7) => match y {
            0 => {
                let (r, f) = rlc8(regs.a);
                regs.a = r;
                regs.f = (f & !(FLAG_Z | FLAG_S | FLAG_PV)) | (regs.f & (FLAG_Z | FLAG_S | FLAG_PV));
            }
            1 => {
                let (r, f) = rrc8(regs.a);
                regs.a = r;
                regs.f = (f & !(FLAG_Z | FLAG_S | FLAG_PV)) | (regs.f & (FLAG_Z | FLAG_S | FLAG_PV));
            }
            2 => {
                let (r, f) = rl8(regs.a, regs.f & FLAG_C != 0);
                regs.a = r;
                regs.f = (f & !(FLAG_Z | FLAG_S | FLAG_PV)) | (regs.f & (FLAG_Z | FLAG_S | FLAG_PV));
            }
            3 => {
                let (r, f) = rr8(regs.a, regs.f & FLAG_C != 0);
                regs.a = r;
                regs.f = (f & !(FLAG_Z | FLAG_S | FLAG_PV)) | (regs.f & (FLAG_Z | FLAG_S | FLAG_PV));
            }
            4 => {
                let (r, f) = daa(regs.a, regs.f);
                regs.a = r;
                regs.f = f;
            }
            5 => {
                regs.a = !regs.a;
                regs.f = (regs.f & (FLAG_S | FLAG_Z | FLAG_PV | FLAG_C)) | FLAG_H | FLAG_N | yx_bits(regs.a);
            }
            6 => {
                regs.f = (regs.f & (FLAG_S | FLAG_Z | FLAG_PV)) | FLAG_C | yx_bits(regs.a);
            }
            7 => {
                let old_c = regs.f & FLAG_C;
                regs.f = (regs.f & (FLAG_S | FLAG_Z | FLAG_PV)) | yx_bits(regs.a) | (old_c << 4) | (if old_c == 0 { FLAG_C } else { 0 });
            }
            _ => unreachable!(),
        },
        // LD r,r' / HALT
        (1, _) if y == 6 && z == 6 => {
            regs.halted = true;
        }
        (1, _) => {
            let v = read_r8(regs, bus, idx, z, total);
            write_r8(regs, bus, idx, y, v, total);
        }
        // ALU A,r
        (2, _) => {
            let v = read_r8(regs, bus, idx, z, total);
            let carry = regs.f & FLAG_C != 0;
            let (result, f) = alu_op8(y, regs.a, v, carry);
            regs.f = f;
            if y != 7 {
                regs.a = result;
            }
        }
        // RET cc / POP / misc / PUSH / ALU A,n / RST
        (3, 0) => {
            overhead(bus, 1, total);
            if cond(regs, y) {
                let addr = pop_word(regs, bus, total);
                regs.pc = addr;
                regs.memptr = addr;
            }
        }
        (3, 1) => {
            if q == 0 {
                let v = pop_word(regs, bus, total);
                match p {
                    0 => regs.set_bc(v),
                    1 => regs.set_de(v),
                    2 => rp_set(regs, idx, 2, v),
                    3 => regs.set_af(v),
                    _ => unreachable!(),
                }
            } else {
                match p {
                    0 => {
                        regs.pc = pop_word(regs, bus, total);
                        regs.memptr = regs.pc;
                    }
                    1 => {
                        regs.exx();
                    }
                    2 => {
                        let hl = rp_get(regs, idx, 2);
                        regs.pc = hl;
                    }
                    3 => {
                        regs.sp = rp_get(regs, idx, 2);
                    }
                    _ => unreachable!(),
                }
            }
        }
        (3, 2) => {
            let addr = fetch_word(regs, bus, total);
            regs.memptr = addr;
            if cond(regs, y) {
                regs.pc = addr;
            }
        }
        (3, 3) => match y {
            0 => {
                let addr = fetch_word(regs, bus, total);
                regs.memptr = addr;
                regs.pc = addr;
            }
            // y==1 (0xCB) never reaches here: execute_one intercepts the CB prefix
            // before dispatching to the base table.
            1 => {}
            2 => {
                let n = fetch_byte(regs, bus, total);
                let port = n as u16 | ((regs.a as u16) << 8);
                io_write(bus, port, regs.a, total);
                regs.memptr = (port & 0xFF00) | (((port as u8).wrapping_add(1)) as u16);
            }
            3 => {
                let n = fetch_byte(regs, bus, total);
                let port = n as u16 | ((regs.a as u16) << 8);
                let v = io_read(bus, port, total);
                regs.a = v;
                regs.memptr = port.wrapping_add(1);
            }
            4 => {
                let hl = rp_get(regs, idx, 2);
                let lo = mem_read(bus, regs.sp, 3, total);
                let hi = mem_read(bus, regs.sp.wrapping_add(1), 3, total);
                overhead(bus, 1, total);
                mem_write(bus, regs.sp.wrapping_add(1), (hl >> 8) as u8, 3, total);
                mem_write(bus, regs.sp, hl as u8, 3, total);
                overhead(bus, 2, total);
                let new_hl = u16::from_le_bytes([lo, hi]);
                rp_set(regs, idx, 2, new_hl);
                regs.memptr = new_hl;
            }
            5 => {
                let d = regs.de();
                let h = rp_get(regs, idx, 2);
                regs.set_de(h);
                rp_set(regs, idx, 2, d);
            }
            // DI/EI: the flip-flop update itself happens in the block below,
            // after the main dispatch, so `pending_ei` latches uniformly.
            6 | 7 => {}
            _ => unreachable!(),
        },
        (3, 4) => {
            let addr = fetch_word(regs, bus, total);
            regs.memptr = addr;
            if cond(regs, y) {
                overhead(bus, 1, total);
                push_word(regs, bus, total, regs.pc);
                regs.pc = addr;
            }
        }
        (3, 5) => {
            if q == 0 {
                let v = match p {
                    0 => regs.bc(),
                    1 => regs.de(),
                    2 => rp_get(regs, idx, 2),
                    3 => regs.af(),
                    _ => unreachable!(),
                };
                overhead(bus, 1, total);
                push_word(regs, bus, total, v);
            } else if p == 0 {
                let addr = fetch_word(regs, bus, total);
                regs.memptr = addr;
                overhead(bus, 1, total);
                push_word(regs, bus, total, regs.pc);
                regs.pc = addr;
            }
        }
        (3, 6) => {
            let n = fetch_byte(regs, bus, total);
            let carry = regs.f & FLAG_C != 0;
            let (result, f) = alu_op8(y, regs.a, n, carry);
            regs.f = f;
            if y != 7 {
                regs.a = result;
            }
        }
        (3, 7) => {
            overhead(bus, 1, total);
            push_word(regs, bus, total, regs.pc);
            regs.pc = (y as u16) * 8;
            regs.memptr = regs.pc;
        }
        _ => {
            // x==0,z==0,y outside 0..7 or similar: unreachable for a 3-bit field.
        }
    }

    // DI/EI update the flip-flops here, uniformly, after the main dispatch above.
    if x == 3 && z == 3 {
        match y {
            6 => regs.iff1 = false,
            7 => {
                regs.iff1 = true;
            }
            _ => {}
        }
        if y == 7 {
            regs.iff2 = true;
            regs.pending_ei = true;
        } else if y == 6 {
            regs.iff2 = false;
        }
    }
}

// --- CB table (and DDCB/FDCB) -----------------------------------------------

fn execute_cb<B: CpuBus>(regs: &mut Registers, bus: &mut B, idx: IdxMode, total: &mut u32) {
    if idx == IdxMode::None {
        let opcode = fetch_opcode_cb(regs, bus, total);
        let z = opcode & 7;
        run_cb_op(regs, bus, idx, opcode, z, total, None);
        return;
    }
    // DDCB/FDCB: displacement byte precedes the CB sub-opcode; the CB
    // "opcode fetch" here does not bump R (it's a plain operand fetch).
    let d = fetch_byte(regs, bus, total) as i8;
    let opcode = fetch_byte(regs, bus, total);
    let addr = idx_addr(regs, bus, idx, d, total);
    overhead(bus, 2, total);
    let z = opcode & 7;
    run_cb_op(regs, bus, idx, opcode, z, total, Some(addr));
}

fn fetch_opcode_cb<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32) -> u8 {
    // The CB prefix's own sub-opcode fetch is itself an M1 cycle (bumps R).
    fetch_opcode(regs, bus, total)
}

fn run_cb_op<B: CpuBus>(
    regs: &mut Registers,
    bus: &mut B,
    idx: IdxMode,
    opcode: u8,
    reg_code: u8,
    total: &mut u32,
    indexed_addr: Option<u16>,
) {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;

    let read_operand = |regs: &mut Registers, bus: &mut B, total: &mut u32| -> u8 {
        match indexed_addr {
            Some(addr) => mem_read(bus, addr, 3, total),
            None => read_r8(regs, bus, idx, reg_code, total),
        }
    };
    let write_operand = |regs: &mut Registers, bus: &mut B, val: u8, total: &mut u32| {
        match indexed_addr {
            Some(addr) => mem_write(bus, addr, val, 3, total),
            None => write_r8(regs, bus, idx, reg_code, val, total),
        }
        // undocumented DDCB/FDCB copy-back: when the operand is memory-backed
        // but the sub-opcode names a concrete register slot (z != 6), the
        // result also lands in that register.
        if indexed_addr.is_some() && reg_code != 6 {
            write_r8(regs, bus, IdxMode::None, reg_code, val, total);
        }
    };

    let v = read_operand(regs, bus, total);
    if indexed_addr.is_some() {
        overhead(bus, 1, total);
    }

    match x {
        0 => {
            let (result, f) = match y {
                0 => rlc8(v),
                1 => rrc8(v),
                2 => rl8(v, regs.f & FLAG_C != 0),
                3 => rr8(v, regs.f & FLAG_C != 0),
                4 => sla8(v),
                5 => sra8(v),
                6 => sll8(v),
                7 => srl8(v),
                _ => unreachable!(),
            };
            regs.f = f;
            write_operand(regs, bus, result, total);
        }
        1 => {
            let yx_source = if reg_code == 6 {
                (regs.memptr >> 8) as u8
            } else {
                v
            };
            regs.f = bit_test(v, y, regs.f, yx_source);
        }
        2 => {
            let result = v & !(1 << y);
            write_operand(regs, bus, result, total);
        }
        3 => {
            let result = v | (1 << y);
            write_operand(regs, bus, result, total);
        }
        _ => unreachable!(),
    }
}

// --- ED table ----------------------------------------------------------------

fn execute_ed<B: CpuBus>(regs: &mut Registers, bus: &mut B, total: &mut u32) {
    let opcode = fetch_opcode(regs, bus, total);
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = y >> 1;
    let q = y & 1;

    if x == 1 {
        ed_general(regs, bus, y, z, p, q, total);
        return;
    }
    if x == 2 && z <= 3 && y >= 4 {
        ed_block(regs, bus, y, z, total);
        return;
    }
    // Undocumented/unused ED opcode (includes the 0x80-0x9F half of the block
    // rows): acts as a 2-byte NOP. The two opcode fetches already charged by
    // `execute_one`/this function total the documented 8 T-states.
}

fn ed_general<B: CpuBus>(regs: &mut Registers, bus: &mut B, y: u8, z: u8, p: u8, q: u8, total: &mut u32) {
    match z {
        0 => {
            // IN r,(C) (y==6 is the undocumented "IN F,(C)": flags only, no write-back)
            let port = regs.bc();
            let v = io_read(bus, port, total);
            regs.memptr = port.wrapping_add(1);
            let f = sz_bits(v) | yx_bits(v) | (regs.f & FLAG_C) | if parity(v) { FLAG_PV } else { 0 };
            regs.f = f;
            if y != 6 {
                write_r8(regs, bus, IdxMode::None, y, v, total);
            }
        }
        1 => {
            // OUT (C),r (y==6 outputs 0, undocumented)
            let port = regs.bc();
            let v = if y == 6 { 0 } else { read_r8(regs, bus, IdxMode::None, y, total) };
            io_write(bus, port, v, total);
            regs.memptr = port.wrapping_add(1);
        }
        2 => {
            let hl = regs.hl();
            let rp = match p {
                0 => regs.bc(),
                1 => regs.de(),
                2 => regs.hl(),
                3 => regs.sp,
                _ => unreachable!(),
            };
            overhead(bus, 7, total);
            let carry = regs.f & FLAG_C != 0;
            let (result, f) = if q == 0 {
                sbc16(hl, rp, carry as u8)
            } else {
                adc16(hl, rp, carry as u8)
            };
            regs.set_hl(result);
            regs.f = f;
            regs.memptr = hl.wrapping_add(1);
        }
        3 => {
            let addr = fetch_word(regs, bus, total);
            regs.memptr = addr.wrapping_add(1);
            if q == 0 {
                let rp = match p {
                    0 => regs.bc(),
                    1 => regs.de(),
                    2 => regs.hl(),
                    3 => regs.sp,
                    _ => unreachable!(),
                };
                mem_write(bus, addr, rp as u8, 3, total);
                mem_write(bus, addr.wrapping_add(1), (rp >> 8) as u8, 3, total);
            } else {
                let lo = mem_read(bus, addr, 3, total);
                let hi = mem_read(bus, addr.wrapping_add(1), 3, total);
                let v = u16::from_le_bytes([lo, hi]);
                match p {
                    0 => regs.set_bc(v),
                    1 => regs.set_de(v),
                    2 => regs.set_hl(v),
                    3 => regs.sp = v,
                    _ => unreachable!(),
                }
            }
        }
        4 => {
            // NEG
            let (result, f) = sub8(0, regs.a, 0);
            regs.a = result;
            regs.f = f;
        }
        5 => {
            // RETN (y!=1) / RETI (y==1)
            let addr = pop_word(regs, bus, total);
            regs.pc = addr;
            regs.memptr = addr;
            if y != 1 {
                regs.iff1 = regs.iff2;
            }
        }
        6 => {
            regs.im = match y & 3 {
                0 | 1 => InterruptMode::Im0,
                2 => InterruptMode::Im1,
                _ => InterruptMode::Im2,
            };
        }
        7 => match y {
            0 => regs.i = regs.a,
            1 => regs.r = regs.a,
            2 => {
                regs.a = regs.i;
                let f = sz_bits(regs.a) | yx_bits(regs.a) | (regs.f & FLAG_C) | if regs.iff2 { FLAG_PV } else { 0 };
                regs.f = f;
            }
            3 => {
                regs.a = regs.r;
                let f = sz_bits(regs.a) | yx_bits(regs.a) | (regs.f & FLAG_C) | if regs.iff2 { FLAG_PV } else { 0 };
                regs.f = f;
            }
            4 => {
                // RRD
                let addr = regs.hl();
                let m = mem_read(bus, addr, 3, total);
                overhead(bus, 4, total);
                let new_m = (regs.a << 4) | (m >> 4);
                let new_a = (regs.a & 0xF0) | (m & 0x0F);
                mem_write(bus, addr, new_m, 3, total);
                regs.a = new_a;
                let f = sz_bits(regs.a) | yx_bits(regs.a) | (regs.f & FLAG_C) | if parity(regs.a) { FLAG_PV } else { 0 };
                regs.f = f;
                regs.memptr = addr.wrapping_add(1);
            }
            5 => {
                // RLD
                let addr = regs.hl();
                let m = mem_read(bus, addr, 3, total);
                overhead(bus, 4, total);
                let new_m = (m << 4) | (regs.a & 0x0F);
                let new_a = (regs.a & 0xF0) | (m >> 4);
                mem_write(bus, addr, new_m, 3, total);
                regs.a = new_a;
                let f = sz_bits(regs.a) | yx_bits(regs.a) | (regs.f & FLAG_C) | if parity(regs.a) { FLAG_PV } else { 0 };
                regs.f = f;
                regs.memptr = addr.wrapping_add(1);
            }
            // y==6/7 (opcodes 0x77/0x7F): undefined, behave as a plain NOP.
            _ => {}
        },
        _ => {}
    }
}

fn ed_block<B: CpuBus>(regs: &mut Registers, bus: &mut B, y: u8, z: u8, total: &mut u32) {
    let repeating = y >= 6;
    match z {
        0 => {
            // LDI/LDD/LDIR/LDDR
            let src = regs.hl();
            let dst = regs.de();
            let v = mem_read(bus, src, 3, total);
            mem_write(bus, dst, v, 3, total);
            overhead(bus, 2, total);
            let inc = y & 1 == 0;
            regs.set_hl(if inc { src.wrapping_add(1) } else { src.wrapping_sub(1) });
            regs.set_de(if inc { dst.wrapping_add(1) } else { dst.wrapping_sub(1) });
            let bc = regs.bc().wrapping_sub(1);
            regs.set_bc(bc);
            let n = v.wrapping_add(regs.a);
            let mut f = regs.f & (FLAG_S | FLAG_Z | FLAG_C);
            f |= n & FLAG_X;
            if n & 0x02 != 0 {
                f |= FLAG_Y;
            }
            if bc != 0 {
                f |= FLAG_PV;
            }
            regs.f = f;
            if repeating && bc != 0 {
                overhead(bus, 5, total);
                regs.pc = regs.pc.wrapping_sub(2);
                regs.memptr = regs.pc.wrapping_add(1);
            }
        }
        1 => {
            // CPI/CPD/CPIR/CPDR
            let addr = regs.hl();
            let v = mem_read(bus, addr, 3, total);
            overhead(bus, 5, total);
            let inc = y & 1 == 0;
            regs.set_hl(if inc { addr.wrapping_add(1) } else { addr.wrapping_sub(1) });
            let bc = regs.bc().wrapping_sub(1);
            regs.set_bc(bc);
            let (result, mut f) = sub8(regs.a, v, 0);
            f &= FLAG_S | FLAG_Z | FLAG_H | FLAG_N;
            let half = f & FLAG_H != 0;
            let n = result.wrapping_sub(if half { 1 } else { 0 });
            f |= n & FLAG_X;
            if n & 0x02 != 0 {
                f |= FLAG_Y;
            }
            f |= regs.f & FLAG_C;
            if bc != 0 {
                f |= FLAG_PV;
            }
            regs.f = f;
            if inc {
                regs.memptr = regs.memptr.wrapping_add(1);
            } else {
                regs.memptr = regs.memptr.wrapping_sub(1);
            }
            if repeating && bc != 0 && result != 0 {
                overhead(bus, 5, total);
                regs.pc = regs.pc.wrapping_sub(2);
                regs.memptr = regs.pc.wrapping_add(1);
            }
        }
        2 => {
            // INI/IND/INIR/INDR
            overhead(bus, 1, total);
            let port = regs.bc();
            let v = io_read(bus, port, total);
            let addr = regs.hl();
            mem_write(bus, addr, v, 3, total);
            regs.b = regs.b.wrapping_sub(1);
            let inc = y & 1 == 0;
            regs.set_hl(if inc { addr.wrapping_add(1) } else { addr.wrapping_sub(1) });
            let mut f = sz_bits(regs.b) | yx_bits(regs.b) | FLAG_N;
            if v & 0x80 != 0 {
                f |= FLAG_N;
            }
            regs.f = f;
            if repeating && regs.b != 0 {
                overhead(bus, 5, total);
                regs.pc = regs.pc.wrapping_sub(2);
            }
        }
        3 => {
            // OUTI/OUTD/OTIR/OTDR
            overhead(bus, 1, total);
            let addr = regs.hl();
            let v = mem_read(bus, addr, 3, total);
            regs.b = regs.b.wrapping_sub(1);
            let port = regs.bc();
            io_write(bus, port, v, total);
            let inc = y & 1 == 0;
            regs.set_hl(if inc { addr.wrapping_add(1) } else { addr.wrapping_sub(1) });
            let f = sz_bits(regs.b) | yx_bits(regs.b);
            regs.f = f;
            if repeating && regs.b != 0 {
                overhead(bus, 5, total);
                regs.pc = regs.pc.wrapping_sub(2);
            }
        }
        _ => overhead(bus, 4, total),
    }
}
