//! Narrow I/O-adjacent emulator components: the keyboard matrix.
//!
//! The AY-3-8912 sound chip (`io::ay`) is a named Non-goal; its port-level
//! register file lived here in the teacher library but has no counterpart
//! to build, so only the keyboard matrix survives in this module.
pub mod keyboard;
