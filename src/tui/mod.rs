//! TUI debugger for the MISC16 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Transport listing around the program counter
//! - Accumulator, flags and memory views
//! - The machine's console output, with keys typed in on demand
//! - Step/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
