//! Address decoding for the MISC16.
//!
//! The MISC16 has one instruction: move a word from a source address to a
//! destination address. All behavior lives in the address map, so
//! "decoding" means classifying an address into the port it names on the
//! read side and on the write side. The two maps are deliberately not
//! symmetric: address 3 reads `pc+6` but has no write-side meaning, and
//! the arithmetic triggers only exist for writes.

use serde::{Serialize, Deserialize};

/// Output port: writing emits the low byte to the console.
pub const OUTPUT_ADDR: u16 = 0xFFFC;
/// Constant zero port.
pub const ZERO_ADDR: u16 = 0xFFFD;
/// Blocking key read port.
pub const KEY_ADDR: u16 = 0xFFFE;
/// Key poll port: 0 when a key is waiting, 1 otherwise.
pub const KEY_POLL_ADDR: u16 = 0xFFFF;
/// Indirect access through the accumulator.
pub const INDIRECT_ADDR: u16 = 7;
/// The accumulator itself.
pub const ACCU_ADDR: u16 = 8;

/// Key code that stops the machine once it has been read.
pub const ESC: u8 = 27;
/// Carriage return, swallowed by the output port.
pub const CR: u8 = 13;

/// What reading an address yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadPort {
    /// Address 0: current program counter
    Pc,
    /// Address 1: pc + 2
    PcPlus2,
    /// Address 2: pc + 4
    PcPlus4,
    /// Address 3: pc + 6
    PcPlus6,
    /// Address 7: the word named by the accumulator
    Indirect,
    /// Address 8: the accumulator
    Accu,
    /// Always zero
    Zero,
    /// Blocking key read, latches the key
    Key,
    /// Inverted key-available flag
    KeyPoll,
    /// Plain memory (zero above the backed range)
    Memory(u16),
}

impl ReadPort {
    /// Classify an address on the read side. Total.
    pub fn decode(addr: u16) -> Self {
        match addr {
            0 => ReadPort::Pc,
            1 => ReadPort::PcPlus2,
            2 => ReadPort::PcPlus4,
            3 => ReadPort::PcPlus6,
            INDIRECT_ADDR => ReadPort::Indirect,
            ACCU_ADDR => ReadPort::Accu,
            ZERO_ADDR => ReadPort::Zero,
            KEY_ADDR => ReadPort::Key,
            KEY_POLL_ADDR => ReadPort::KeyPoll,
            other => ReadPort::Memory(other),
        }
    }

    /// Short name, or `None` for plain memory.
    pub fn mnemonic(self) -> Option<&'static str> {
        let name = match self {
            ReadPort::Pc => "pc",
            ReadPort::PcPlus2 => "pc+2",
            ReadPort::PcPlus4 => "pc+4",
            ReadPort::PcPlus6 => "pc+6",
            ReadPort::Indirect => "[accu]",
            ReadPort::Accu => "accu",
            ReadPort::Zero => "zero",
            ReadPort::Key => "key",
            ReadPort::KeyPoll => "keypoll",
            ReadPort::Memory(_) => return None,
        };
        Some(name)
    }
}

/// What writing an address triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePort {
    /// Address 0: pc := value
    Jump,
    /// Address 1: pc := value if sf
    JumpIfSign,
    /// Address 2: pc := value if zf
    JumpIfZero,
    /// Address 4: pc := value if cf
    JumpIfCarry,
    /// Address 7: write the word named by the accumulator
    Indirect,
    /// Address 8: accu := value
    Accu,
    /// Address 9: accu := accu - value
    Sub,
    /// Address 11: accu := value + accu
    Add,
    /// Address 12: accu := value ^ accu
    Xor,
    /// Address 13: accu := value | accu
    Or,
    /// Address 14: accu := value & accu
    And,
    /// Address 15: accu := value >> 1 with carry in and out
    ShiftRight,
    /// Console output
    Output,
    /// Plain memory (discarded above the backed range)
    Memory(u16),
}

impl WritePort {
    /// Classify an address on the write side. Total.
    pub fn decode(addr: u16) -> Self {
        match addr {
            0 => WritePort::Jump,
            1 => WritePort::JumpIfSign,
            2 => WritePort::JumpIfZero,
            4 => WritePort::JumpIfCarry,
            INDIRECT_ADDR => WritePort::Indirect,
            ACCU_ADDR => WritePort::Accu,
            9 => WritePort::Sub,
            11 => WritePort::Add,
            12 => WritePort::Xor,
            13 => WritePort::Or,
            14 => WritePort::And,
            15 => WritePort::ShiftRight,
            OUTPUT_ADDR => WritePort::Output,
            other => WritePort::Memory(other),
        }
    }

    /// Short name, or `None` for plain memory.
    pub fn mnemonic(self) -> Option<&'static str> {
        let name = match self {
            WritePort::Jump => "jmp",
            WritePort::JumpIfSign => "jmi",
            WritePort::JumpIfZero => "jz",
            WritePort::JumpIfCarry => "jc",
            WritePort::Indirect => "[accu]",
            WritePort::Accu => "accu",
            WritePort::Sub => "sub",
            WritePort::Add => "add",
            WritePort::Xor => "xor",
            WritePort::Or => "or",
            WritePort::And => "and",
            WritePort::ShiftRight => "shr",
            WritePort::Output => "out",
            WritePort::Memory(_) => return None,
        };
        Some(name)
    }
}
