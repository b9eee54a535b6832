//! MISC16 processor state.
//!
//! The machine has a single accumulator, three one-bit flags and a
//! program counter:
//! - accu: 16-bit accumulator
//! - sf: sign flag, always bit 15 of accu
//! - zf: zero flag, always `accu == 0`
//! - cf: carry flag, only touched by add, subtract and shift right
//! - pc: program counter, a word index into memory

use serde::{Serialize, Deserialize};

/// Program counter value after reset. Words 0..16 are left to the host.
pub const RESET_PC: u16 = 0x10;

/// The MISC16 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Accumulator
    pub accu: u16,

    /// Sign flag
    pub sf: bool,

    /// Zero flag
    pub zf: bool,

    /// Carry flag
    pub cf: bool,

    /// Program counter
    pub pc: u16,
}

impl Registers {
    /// Create a register file in its reset state.
    pub fn new() -> Self {
        Self {
            accu: 0,
            sf: false,
            zf: false,
            cf: false,
            pc: RESET_PC,
        }
    }

    /// Reset all registers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Store a value in the accumulator and recompute sign and zero.
    ///
    /// This is the only way `sf` and `zf` change.
    #[inline]
    pub fn write_accu(&mut self, value: u16) {
        self.accu = value;
        self.sf = value & 0x8000 != 0;
        self.zf = value == 0;
    }

    /// Advance the program counter past one transport pair.
    /// Returns the old value.
    #[inline]
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(2);
        old
    }

    /// Set the program counter to an absolute address.
    #[inline]
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Render the flags as `SZC` with `-` for clear bits.
    pub fn flags_string(&self) -> String {
        format!(
            "{}{}{}",
            if self.sf { 'S' } else { '-' },
            if self.zf { 'Z' } else { '-' },
            if self.cf { 'C' } else { '-' },
        )
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let regs = Registers::new();
        assert_eq!(regs.pc, 16);
        assert_eq!(regs.accu, 0);
        assert!(!regs.sf && !regs.zf && !regs.cf);
    }

    #[test]
    fn test_write_accu_flags() {
        let mut regs = Registers::new();

        regs.write_accu(0x8000);
        assert!(regs.sf);
        assert!(!regs.zf);

        regs.write_accu(0);
        assert!(!regs.sf);
        assert!(regs.zf);

        regs.write_accu(0x7FFF);
        assert!(!regs.sf);
        assert!(!regs.zf);
    }

    #[test]
    fn test_write_accu_leaves_carry() {
        let mut regs = Registers::new();
        regs.cf = true;
        regs.write_accu(5);
        assert!(regs.cf);
    }

    #[test]
    fn test_advance_pc_wraps() {
        let mut regs = Registers::new();
        assert_eq!(regs.advance_pc(), 16);
        assert_eq!(regs.pc, 18);

        regs.jump(0xFFFF);
        regs.advance_pc();
        assert_eq!(regs.pc, 1);
    }

    #[test]
    fn test_flags_string() {
        let mut regs = Registers::new();
        regs.write_accu(0x8001);
        regs.cf = true;
        assert_eq!(regs.flags_string(), "S-C");
    }
}
