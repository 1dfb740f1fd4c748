//! nes-tracer library
//!
//! Execution trace logging for an NES emulator's debugger.

pub mod config;
pub mod testing;
pub mod trace;
