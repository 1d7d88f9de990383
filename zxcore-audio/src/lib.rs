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
//! Audio related utilities for the zxcore library: the producer/consumer
//! ring buffer bridging the emulator thread to a host playback thread, and
//! optional host backend wiring behind the `cpal` feature.
pub mod host;
pub mod ring;

pub use ring::{ring, Consumer, Producer, RingClosed};
