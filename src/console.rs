//! Console devices for the MISC16 key and output ports.
//!
//! The machine only needs three operations: a blocking key read, a
//! non-blocking key check and a raw byte write. [`TerminalConsole`] talks
//! to the real terminal through crossterm; [`BufferConsole`] is a scripted
//! device for tests and the debugger.

use std::collections::VecDeque;
use std::io::{stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::error;

use crate::cpu::decode::ESC;

/// A character device attached to the key and output ports.
pub trait Console {
    /// Wait for one keypress and return its low byte.
    fn read_key(&mut self) -> u8;

    /// Whether a key can be read without blocking.
    fn key_available(&mut self) -> bool;

    /// Emit one byte, unbuffered.
    fn write_byte(&mut self, byte: u8);
}

impl<C: Console + ?Sized> Console for &mut C {
    fn read_key(&mut self) -> u8 {
        (**self).read_key()
    }

    fn key_available(&mut self) -> bool {
        (**self).key_available()
    }

    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Scripted console: keys come from a queue, output is captured.
///
/// Reading a key from an empty queue yields ESC, which stops the machine.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a console with queued input.
    pub fn with_input(keys: &[u8]) -> Self {
        let mut console = Self::new();
        console.push_keys(keys);
        console
    }

    pub fn push_key(&mut self, key: u8) {
        self.input.push_back(key);
    }

    pub fn push_keys(&mut self, keys: &[u8]) {
        self.input.extend(keys.iter().copied());
    }

    /// Number of keys still queued.
    pub fn pending_keys(&self) -> usize {
        self.input.len()
    }

    /// Everything written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take the captured output, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Captured output as text (lossy).
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Console for BufferConsole {
    fn read_key(&mut self) -> u8 {
        self.input.pop_front().unwrap_or(ESC)
    }

    fn key_available(&mut self) -> bool {
        !self.input.is_empty()
    }

    fn write_byte(&mut self, byte: u8) {
        self.output.push(byte);
    }
}

////////////////////////////////////////////////////////////////////////////////

/// The controlling terminal, in raw mode for as long as this value lives.
pub struct TerminalConsole {
    pending: Option<u8>,
}

impl TerminalConsole {
    /// Put the terminal in raw mode and take over the keyboard.
    pub fn new() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { pending: None })
    }

    fn next_key(&mut self, timeout: Option<Duration>) -> std::io::Result<Option<u8>> {
        loop {
            if let Some(timeout) = timeout {
                if !event::poll(timeout)? {
                    return Ok(None);
                }
            }
            if let Event::Key(key) = event::read()? {
                if let Some(byte) = key_to_byte(&key) {
                    return Ok(Some(byte));
                }
            }
        }
    }
}

impl Console for TerminalConsole {
    fn read_key(&mut self) -> u8 {
        if let Some(key) = self.pending.take() {
            return key;
        }
        match self.next_key(None) {
            Ok(Some(key)) => key,
            Ok(None) => ESC,
            Err(e) => {
                error!("Console: key read failed: {e}");
                ESC
            }
        }
    }

    fn key_available(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        match self.next_key(Some(Duration::ZERO)) {
            Ok(key) => {
                self.pending = key;
                key.is_some()
            }
            Err(e) => {
                error!("Console: key poll failed: {e}");
                false
            }
        }
    }

    fn write_byte(&mut self, byte: u8) {
        let mut out = stdout().lock();
        // Raw mode turns off output post-processing, so newlines need a CR.
        let result = if byte == b'\n' {
            out.write_all(b"\r\n")
        } else {
            out.write_all(&[byte])
        };
        if let Err(e) = result.and_then(|_| out.flush()) {
            error!("Console: write failed: {e}");
        }
    }
}

impl Drop for TerminalConsole {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!("Console: could not restore terminal: {e}");
        }
    }
}

/// Translate a crossterm key event into the byte a program would see.
pub fn key_to_byte(key: &KeyEvent) -> Option<u8> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let byte = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            (c as u32 as u8) & 0x1F
        }
        KeyCode::Char(c) => c as u32 as u8,
        KeyCode::Enter => 13,
        KeyCode::Esc => ESC,
        KeyCode::Backspace => 8,
        KeyCode::Tab => 9,
        KeyCode::Delete => 127,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_console_queue() {
        let mut console = BufferConsole::with_input(b"hi");
        assert!(console.key_available());
        assert_eq!(console.read_key(), b'h');
        assert_eq!(console.read_key(), b'i');
        assert!(!console.key_available());
        assert_eq!(console.read_key(), ESC);
    }

    #[test]
    fn test_buffer_console_output() {
        let mut console = BufferConsole::new();
        console.write_byte(b'o');
        console.write_byte(b'k');
        assert_eq!(console.output_string(), "ok");
        assert_eq!(console.take_output(), b"ok".to_vec());
        assert!(console.output().is_empty());
    }

    #[test]
    fn test_console_through_mut_ref() {
        let mut console = BufferConsole::with_input(&[1]);
        {
            let mut by_ref: &mut BufferConsole = &mut console;
            assert_eq!(Console::read_key(&mut by_ref), 1);
            Console::write_byte(&mut by_ref, 2);
        }
        assert_eq!(console.output(), &[2]);
    }

    #[test]
    fn test_key_translation() {
        let plain = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(key_to_byte(&plain), Some(b'a'));

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_byte(&ctrl_c), Some(3));

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(key_to_byte(&enter), Some(13));

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(key_to_byte(&esc), Some(27));

        let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(key_to_byte(&up), None);
    }
}
