//! # MISC16 Emulator
//!
//! An emulator and toolchain for MISC16, a minimal 16-bit
//! transport-triggered machine.
//!
//! MISC16 has a single instruction: move a word from one address to
//! another. Arithmetic, jumps and console I/O happen as side effects of
//! reading or writing special addresses.

pub mod cpu;
pub mod console;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, Memory, Registers, Snapshot, Transport};
pub use console::{BufferConsole, Console, TerminalConsole};
pub use asm::{assemble, disassemble, load_image, Assembly, AssemblyErrors, ImageError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
