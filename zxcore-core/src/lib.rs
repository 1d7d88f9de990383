/*
    Copyright (C) 2026  ZX Core Contributors

    This file is part of zxcore, a Rust library for building ZX Spectrum emulators.

    zxcore is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    zxcore is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! The core components of the zxcore library: the Z80 CPU interpreter, the
//! disassembler tables, the memory and video traits, the bus seam and the
//! frame clock.
pub mod audio;
pub mod bus;
pub mod clock;
pub mod cpu;
pub mod disasm;
pub mod memory;
pub mod video;

pub use cpu::Cpu;
