/*
    This file is part of zxcore. For the full copyright notice, see below.

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
//! Snapshot (`.sna`, `.z80`) and tape (`.tap`) file format decoders.
//!
//! Every decoder here works off an in-memory byte slice and hands back a
//! plain data record (registers, border, tagged memory pages) rather than
//! pushing bytes through a `SnapshotLoader` callback interface: the worker
//! that actually owns a `Memory`/`Model` pairing lives in the top-level
//! crate, which this one intentionally has no dependency on.
pub mod error;
pub mod sna;
pub mod tap;
pub mod z80;

pub use error::{FormatError, Result};
