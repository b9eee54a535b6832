//! Disassembler for MISC16 programs.
//!
//! Turns word pairs back into `mov dst, src` lines, annotated with the
//! port each address names.

use crate::cpu::decode::{ReadPort, WritePort};

/// Disassemble a single transport pair to text.
pub fn disassemble_pair(src: u16, dst: u16) -> String {
    format!(
        "mov 0x{:04X}, 0x{:04X}  ; {} <- {}",
        dst,
        src,
        describe_write(dst),
        describe_read(src)
    )
}

/// Disassemble `words` as transport pairs, labelling them from `origin`.
pub fn disassemble(words: &[u16], origin: u16) -> String {
    let mut output = String::new();
    output.push_str("; MISC16 Disassembly\n");
    output.push_str("; ------------------\n\n");

    for (i, pair) in words.chunks(2).enumerate() {
        let addr = origin.wrapping_add(2 * i as u16);
        let src = pair[0];
        let dst = pair.get(1).copied().unwrap_or(0);
        let line = disassemble_pair(src, dst);
        output.push_str(&format!("{:04X}: {}\n", addr, line));
    }

    output
}

/// Name of what a read of `addr` yields.
pub fn describe_read(addr: u16) -> String {
    match ReadPort::decode(addr) {
        ReadPort::Memory(a) => format!("[{:04X}]", a),
        port => port.mnemonic().unwrap_or("?").to_string(),
    }
}

/// Name of what a write to `addr` triggers.
pub fn describe_write(addr: u16) -> String {
    match WritePort::decode(addr) {
        WritePort::Memory(a) => format!("[{:04X}]", a),
        port => port.mnemonic().unwrap_or("?").to_string(),
    }
}
