//! The MISC16 address space.
//!
//! `read` and `write` are total: every 16-bit address means something,
//! even if that something is "zero" or "discard". Nothing here can fail.

use crate::console::Console;
use crate::cpu::alu;
use crate::cpu::decode::{ReadPort, WritePort, CR, INDIRECT_ADDR};
use crate::cpu::Cpu;

impl<C: Console> Cpu<C> {
    /// Read an address through the address map.
    pub fn read(&mut self, addr: u16) -> u16 {
        let port = self.resolve_read(addr);
        self.read_port(port)
    }

    /// Write an address through the address map.
    pub fn write(&mut self, addr: u16, value: u16) {
        let port = self.resolve_write(addr);
        self.write_port(port, value);
    }

    /// The port a read of `addr` lands on, with indirection through
    /// `accu` resolved. Never returns `ReadPort::Indirect`.
    pub fn resolve_read(&self, addr: u16) -> ReadPort {
        match ReadPort::decode(addr) {
            ReadPort::Indirect => match ReadPort::decode(self.regs.accu) {
                // One level only: [accu] with accu == 7 is plain cell 7.
                ReadPort::Indirect => ReadPort::Memory(INDIRECT_ADDR),
                port => port,
            },
            port => port,
        }
    }

    /// The port a write to `addr` lands on, with indirection through
    /// `accu` resolved. Never returns `WritePort::Indirect`.
    pub fn resolve_write(&self, addr: u16) -> WritePort {
        match WritePort::decode(addr) {
            WritePort::Indirect => match WritePort::decode(self.regs.accu) {
                WritePort::Indirect => WritePort::Memory(INDIRECT_ADDR),
                port => port,
            },
            port => port,
        }
    }

    fn read_port(&mut self, port: ReadPort) -> u16 {
        let pc = self.regs.pc;
        match port {
            ReadPort::Pc => pc,
            ReadPort::PcPlus2 => pc.wrapping_add(2),
            ReadPort::PcPlus4 => pc.wrapping_add(4),
            ReadPort::PcPlus6 => pc.wrapping_add(6),
            ReadPort::Accu => self.regs.accu,
            ReadPort::Zero => 0,
            ReadPort::Key => {
                let key = self.console.read_key();
                self.last_key = key;
                key as u16
            }
            ReadPort::KeyPoll => {
                if self.console.key_available() { 0 } else { 1 }
            }
            ReadPort::Memory(addr) => self.mem.read(addr),
            // Not produced by `resolve_read`; kept so the match stays total.
            ReadPort::Indirect => self.mem.read(INDIRECT_ADDR),
        }
    }

    fn write_port(&mut self, port: WritePort, value: u16) {
        let regs = &mut self.regs;
        match port {
            WritePort::Jump => regs.jump(value),
            WritePort::JumpIfSign => {
                if regs.sf {
                    regs.jump(value);
                }
            }
            WritePort::JumpIfZero => {
                if regs.zf {
                    regs.jump(value);
                }
            }
            WritePort::JumpIfCarry => {
                if regs.cf {
                    regs.jump(value);
                }
            }
            WritePort::Accu => regs.write_accu(value),
            WritePort::Sub => {
                let (result, cf) = alu::subtract(regs.accu, value);
                regs.cf = cf;
                regs.write_accu(result);
            }
            WritePort::Add => {
                let (result, cf) = alu::add(value, regs.accu);
                regs.cf = cf;
                regs.write_accu(result);
            }
            WritePort::Xor => regs.write_accu(value ^ regs.accu),
            WritePort::Or => regs.write_accu(value | regs.accu),
            WritePort::And => regs.write_accu(value & regs.accu),
            WritePort::ShiftRight => {
                let (result, cf) = alu::shift_right(value, regs.cf);
                regs.cf = cf;
                regs.write_accu(result);
            }
            WritePort::Output => {
                let byte = (value & 0xFF) as u8;
                if byte != CR {
                    self.console.write_byte(byte);
                }
            }
            WritePort::Memory(addr) => self.mem.write(addr, value),
            // Not produced by `resolve_write`; kept so the match stays total.
            WritePort::Indirect => self.mem.write(INDIRECT_ADDR, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::console::BufferConsole;
    use crate::cpu::decode::{
        ReadPort, WritePort, ACCU_ADDR, KEY_ADDR, KEY_POLL_ADDR, OUTPUT_ADDR, ZERO_ADDR,
    };
    use crate::cpu::Cpu;
    use proptest::prelude::*;

    fn cpu() -> Cpu<BufferConsole> {
        Cpu::new(BufferConsole::new())
    }

    #[test]
    fn test_pc_relative_reads() {
        let mut cpu = cpu();
        cpu.regs.pc = 100;
        assert_eq!(cpu.read(0), 100);
        assert_eq!(cpu.read(1), 102);
        assert_eq!(cpu.read(2), 104);
        assert_eq!(cpu.read(3), 106);
    }

    #[test]
    fn test_accu_write_sets_flags() {
        let mut cpu = cpu();
        cpu.write(ACCU_ADDR, 0x8000);
        assert_eq!(cpu.read(ACCU_ADDR), 0x8000);
        assert!(cpu.regs.sf);
        assert!(!cpu.regs.zf);

        cpu.write(ACCU_ADDR, 0);
        assert!(!cpu.regs.sf);
        assert!(cpu.regs.zf);
    }

    #[test]
    fn test_indirect_access() {
        let mut cpu = cpu();
        cpu.write(ACCU_ADDR, 100);
        cpu.write(100, 0xAB);
        assert_eq!(cpu.read(7), 0xAB);

        cpu.write(7, 0xCD);
        assert_eq!(cpu.mem.read(100), 0xCD);
        assert_eq!(cpu.read(7), 0xCD);
        assert_eq!(cpu.read(100), 0xCD);
    }

    #[test]
    fn test_indirect_reaches_ports() {
        let mut cpu = cpu();
        cpu.write(ACCU_ADDR, OUTPUT_ADDR);
        cpu.write(7, b'Z' as u16);
        assert_eq!(cpu.console.output(), b"Z");

        cpu.write(ACCU_ADDR, ACCU_ADDR);
        assert_eq!(cpu.read(7), ACCU_ADDR);
    }

    #[test]
    fn test_indirect_through_itself_is_one_level() {
        let mut cpu = cpu();
        cpu.mem.write(7, 0x1111);
        cpu.write(ACCU_ADDR, 7);
        assert_eq!(cpu.read(7), 0x1111);

        cpu.write(7, 0x2222);
        assert_eq!(cpu.mem.read(7), 0x2222);
        assert_eq!(cpu.regs.accu, 7);
    }

    #[test]
    fn test_resolve_follows_accu() {
        let mut cpu = cpu();
        assert_eq!(cpu.resolve_read(KEY_ADDR), ReadPort::Key);

        cpu.write(ACCU_ADDR, KEY_ADDR);
        assert_eq!(cpu.resolve_read(7), ReadPort::Key);
        assert_eq!(cpu.resolve_write(7), WritePort::Memory(KEY_ADDR));

        cpu.write(ACCU_ADDR, 7);
        assert_eq!(cpu.resolve_read(7), ReadPort::Memory(7));
        assert_eq!(cpu.resolve_write(7), WritePort::Memory(7));

        // Resolving has no side effects on the console.
        assert_eq!(cpu.last_key(), 0);
    }

    #[test]
    fn test_add_and_sub_triggers() {
        let mut cpu = cpu();
        cpu.write(ACCU_ADDR, 0xFFFF);
        cpu.write(11, 1);
        assert_eq!(cpu.regs.accu, 0);
        assert!(cpu.regs.cf);
        assert!(cpu.regs.zf);

        cpu.write(ACCU_ADDR, 5);
        cpu.write(9, 3);
        assert_eq!(cpu.regs.accu, 2);
        assert!(!cpu.regs.cf);

        cpu.write(9, 3);
        assert_eq!(cpu.regs.accu, 0xFFFF);
        assert!(cpu.regs.cf);
        assert!(cpu.regs.sf);
    }

    #[test]
    fn test_logic_leaves_carry() {
        let mut cpu = cpu();
        cpu.regs.cf = true;
        cpu.write(ACCU_ADDR, 0x0F0F);
        cpu.write(12, 0xFFFF);
        assert_eq!(cpu.regs.accu, 0xF0F0);
        assert!(cpu.regs.sf);
        assert!(cpu.regs.cf);

        cpu.write(14, 0x0F0F);
        assert_eq!(cpu.regs.accu, 0);
        assert!(cpu.regs.zf);
        assert!(cpu.regs.cf);

        cpu.regs.cf = false;
        cpu.write(13, 0x0101);
        assert_eq!(cpu.regs.accu, 0x0101);
        assert!(!cpu.regs.cf);
    }

    #[test]
    fn test_shift_right_trigger() {
        let mut cpu = cpu();
        cpu.regs.cf = true;
        cpu.write(15, 0x0002);
        assert_eq!(cpu.regs.accu, 0x8001);
        assert!(!cpu.regs.cf);
        assert!(cpu.regs.sf);

        cpu.write(15, 0x0001);
        assert_eq!(cpu.regs.accu, 0);
        assert!(cpu.regs.cf);
        assert!(cpu.regs.zf);
    }

    #[test]
    fn test_conditional_jumps() {
        let mut cpu = cpu();
        cpu.write(ACCU_ADDR, 0x8000);
        assert!(cpu.regs.sf);

        cpu.write(1, 1234);
        assert_eq!(cpu.regs.pc, 1234);

        cpu.write(2, 4321);
        assert_eq!(cpu.regs.pc, 1234);

        cpu.write(4, 4321);
        assert_eq!(cpu.regs.pc, 1234);

        cpu.regs.cf = true;
        cpu.write(4, 4321);
        assert_eq!(cpu.regs.pc, 4321);

        cpu.write(0, 16);
        assert_eq!(cpu.regs.pc, 16);
    }

    #[test]
    fn test_address_three_write_is_memory() {
        let mut cpu = cpu();
        cpu.regs.cf = true;
        cpu.write(3, 999);
        assert_eq!(cpu.regs.pc, 16);
        assert_eq!(cpu.mem.read(3), 999);
    }

    #[test]
    fn test_output_swallows_carriage_return() {
        let mut cpu = cpu();
        cpu.write(OUTPUT_ADDR, 13);
        cpu.write(OUTPUT_ADDR, 0x4142);
        cpu.write(OUTPUT_ADDR, 0x0D0D);
        cpu.write(OUTPUT_ADDR, 10);
        assert_eq!(cpu.console.output(), &[0x42, 10]);
    }

    #[test]
    fn test_key_ports() {
        let mut cpu = Cpu::new(BufferConsole::with_input(b"x"));
        assert_eq!(cpu.read(ZERO_ADDR), 0);
        assert_eq!(cpu.read(KEY_POLL_ADDR), 0);
        assert_eq!(cpu.read(KEY_ADDR), b'x' as u16);
        assert_eq!(cpu.last_key(), b'x');
        assert_eq!(cpu.read(KEY_POLL_ADDR), 1);
    }

    #[test]
    fn test_unbacked_addresses() {
        let mut cpu = cpu();
        cpu.write(0x8000, 5);
        cpu.write(0xFFFE, 5);
        assert_eq!(cpu.read(0x8000), 0);
        assert_eq!(cpu.read(0xC000), 0);
        assert!(cpu.console.output().is_empty());
    }

    proptest! {
        #[test]
        fn prop_plain_memory_roundtrip(addr in 16u16..0x8000, value: u16) {
            let mut cpu = cpu();
            cpu.write(addr, value);
            prop_assert_eq!(cpu.read(addr), value);
        }

        #[test]
        fn prop_accu_flags_follow_value(value: u16) {
            let mut cpu = cpu();
            cpu.write(ACCU_ADDR, value);
            prop_assert_eq!(cpu.read(ACCU_ADDR), value);
            prop_assert_eq!(cpu.regs.sf, value & 0x8000 != 0);
            prop_assert_eq!(cpu.regs.zf, value == 0);
        }

        #[test]
        fn prop_indirect_write_matches_direct(target in 16u16..0x8000, value: u16) {
            let mut direct = cpu();
            let mut indirect = cpu();
            direct.write(ACCU_ADDR, target);
            indirect.write(ACCU_ADDR, target);

            direct.write(target, value);
            indirect.write(7, value);
            prop_assert_eq!(direct.mem.words(), indirect.mem.words());
            prop_assert_eq!(indirect.read(7), value);
        }
    }
}
