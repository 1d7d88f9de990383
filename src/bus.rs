/*
    This file is part of zxcore. For the full copyright notice, see the lib.rs file.
*/
//! System bus device seam, re-exported from `zxcore-core`.
//!
//! The teacher library's AY/joystick/mouse/ZX-Interface-1/printer bus device
//! implementations are named Non-goals; only the generic `BusDevice`
//! port-routing trait and its `NullDevice` no-op implementation survive, so a
//! collaborator crate can attach one of those peripherals without this core
//! depending on it.
pub use zxcore_core::bus::{BusDevice, NullDevice};
