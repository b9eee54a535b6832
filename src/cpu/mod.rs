//! CPU emulation for the MISC16.
//!
//! This module implements the whole transport-triggered machine:
//! - 32768 sixteen-bit memory words
//! - accumulator, sign/zero/carry flags and program counter
//! - an address map where reads and writes of special addresses trigger
//!   arithmetic, jumps and console I/O

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod bus;
pub mod execute;

pub use memory::{Memory, MEMORY_SIZE};
pub use registers::{Registers, RESET_PC};
pub use decode::{ReadPort, WritePort};
pub use execute::{Cpu, CpuState, Snapshot, Transport};
