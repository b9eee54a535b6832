//! Fetch/execute cycle for the MISC16.
//!
//! Every cycle moves one word: fetch the (source, destination) pair at
//! `pc`, read the source, advance `pc`, write the destination. The
//! machine stops once the key port has returned ESC.

use crate::console::Console;
use crate::cpu::decode::ESC;
use crate::cpu::{Memory, Registers};
use log::trace;
use serde::{Serialize, Deserialize};

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// ESC has been read from the key port.
    Halted,
}

/// One executed transport, for tracing and the debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    /// Address the pair was fetched from.
    pub pc: u16,
    /// Source address.
    pub src: u16,
    /// Destination address.
    pub dst: u16,
    /// Value moved from source to destination.
    pub value: u16,
}

/// Serializable view of a machine, minus its console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub regs: Registers,
    pub state: CpuState,
    pub cycles: u64,
    pub last_key: u8,
    pub mem: Memory,
}

/// The MISC16 machine.
pub struct Cpu<C: Console> {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Device behind the key and output ports.
    pub console: C,
    /// Cycle count.
    pub cycles: u64,
    pub(crate) last_key: u8,
}

impl<C: Console> Cpu<C> {
    /// Create a machine with zeroed memory in its reset state.
    pub fn new(console: C) -> Self {
        Self::with_memory(Memory::new(), console)
    }

    /// Create a machine running the given memory image.
    pub fn with_memory(mem: Memory, console: C) -> Self {
        Self {
            regs: Registers::new(),
            mem,
            console,
            cycles: 0,
            last_key: 0,
        }
    }

    /// Reset registers, the key latch and the cycle count. Memory is kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.cycles = 0;
        self.last_key = 0;
    }

    /// The last key returned by the key port.
    pub fn last_key(&self) -> u8 {
        self.last_key
    }

    /// Current execution state.
    pub fn state(&self) -> CpuState {
        if self.last_key == ESC {
            CpuState::Halted
        } else {
            CpuState::Running
        }
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state() == CpuState::Running
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state() == CpuState::Halted
    }

    /// The pair at `pc`, read straight from memory.
    ///
    /// Fetch never goes through the address map, so landing `pc` on a
    /// port address does not trigger anything.
    pub fn fetch(&self) -> (u16, u16) {
        let pc = self.regs.pc;
        (self.mem.read(pc), self.mem.read(pc.wrapping_add(1)))
    }

    /// Execute a single transport.
    ///
    /// `pc` advances before the write, so a jump trigger overrides it.
    pub fn step(&mut self) -> Transport {
        let pc = self.regs.pc;
        let (src, dst) = self.fetch();
        let value = self.read(src);
        self.regs.advance_pc();
        self.write(dst, value);
        self.cycles += 1;

        trace!(
            "{pc:04X}: {src:04X} -> {dst:04X} = {value:04X}  accu={:04X} {}",
            self.regs.accu,
            self.regs.flags_string()
        );

        Transport { pc, src, dst, value }
    }

    /// Run until ESC is read.
    ///
    /// Returns the number of transports executed.
    pub fn run(&mut self) -> u64 {
        let start_cycles = self.cycles;

        while self.is_running() {
            self.step();
        }

        self.cycles - start_cycles
    }

    /// Run for at most `max_cycles` transports.
    pub fn run_limited(&mut self, max_cycles: u64) -> u64 {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.is_running() && self.cycles < limit {
            self.step();
        }

        self.cycles - start_cycles
    }

    /// Capture registers, state and memory.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            regs: self.regs.clone(),
            state: self.state(),
            cycles: self.cycles,
            last_key: self.last_key,
            mem: self.mem.clone(),
        }
    }
}

impl<C: Console> std::fmt::Debug for Cpu<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state())
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}
