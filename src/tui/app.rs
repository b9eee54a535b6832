//! Debugger application state and logic.

use crate::asm::disasm::disassemble_pair;
use crate::console::BufferConsole;
use crate::cpu::{Cpu, Memory, ReadPort, MEMORY_SIZE};
use std::collections::HashSet;

/// Lines kept in the output pane.
const OUTPUT_LIMIT: usize = 4096;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub cpu: Cpu<BufferConsole>,
    /// Memory image for resets.
    pub image: Memory,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Are keystrokes going to the machine?
    pub input_mode: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Console output seen so far.
    pub output: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger for a memory image.
    pub fn new(image: Memory) -> Self {
        Self {
            cpu: Cpu::with_memory(image.clone(), BufferConsole::new()),
            image,
            breakpoints: HashSet::new(),
            running: false,
            input_mode: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            output: String::new(),
            mem_scroll: 0,
        }
    }

    /// True when the next transport would block on an empty key queue,
    /// whether it names the key port directly or reaches it through `[accu]`.
    pub fn waiting_for_key(&self) -> bool {
        let (src, _) = self.cpu.fetch();
        self.cpu.resolve_read(src) == ReadPort::Key && self.cpu.console.pending_keys() == 0
    }

    /// Step one transport.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("Halted after {} cycles", self.cpu.cycles);
            self.running = false;
            return;
        }

        if self.waiting_for_key() {
            self.status = "Waiting for a key. Press Tab to type into the machine.".into();
            self.running = false;
            return;
        }

        let t = self.cpu.step();
        self.collect_output();
        self.status = format!("{:04X}: {}", t.pc, disassemble_pair(t.src, t.dst));
    }

    /// Run until halt, breakpoint, or a blocking key read.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Run one batch of continuous execution.
    pub fn tick(&mut self, batch: usize) {
        for _ in 0..batch {
            if !self.running {
                return;
            }

            if !self.cpu.is_running() {
                self.running = false;
                self.status = format!("Halted after {} cycles", self.cpu.cycles);
                return;
            }

            let pc = self.cpu.regs.pc;
            if self.breakpoints.contains(&pc) {
                self.running = false;
                self.status = format!("Breakpoint at PC={:04X}", pc);
                return;
            }

            self.step();
        }
    }

    /// Feed a key to the machine's console.
    pub fn send_key(&mut self, key: u8) {
        self.cpu.console.push_key(key);
        self.status = format!("Queued key {:#04X} ({} pending)", key, self.cpu.console.pending_keys());
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:04X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:04X}", pc);
        }
    }

    /// Reset the machine to the loaded image.
    pub fn reset(&mut self) {
        self.cpu = Cpu::with_memory(self.image.clone(), BufferConsole::new());
        self.output.clear();
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    pub fn scroll_memory(&mut self, delta: isize) {
        let max = MEMORY_SIZE - 1;
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Transport listing around the current PC: (addr, text, is_current).
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let pc = self.cpu.regs.pc;
        let back = 2 * (lines / 2) as u16;
        // Stay aligned with pc so every row is a real pair.
        let start = if pc >= back { pc - back } else { pc & 1 };

        (0..lines as u16)
            .map(|i| {
                let addr = start.wrapping_add(2 * i);
                let src = self.cpu.mem.read(addr);
                let dst = self.cpu.mem.read(addr.wrapping_add(1));
                (addr, disassemble_pair(src, dst), addr == pc)
            })
            .collect()
    }

    fn collect_output(&mut self) {
        let bytes = self.cpu.console.take_output();
        if bytes.is_empty() {
            return;
        }
        self.output.extend(bytes.iter().map(|&b| b as char));
        let excess = self.output.lines().count().saturating_sub(OUTPUT_LIMIT);
        if excess > 0 {
            let cut = self
                .output
                .match_indices('\n')
                .nth(excess - 1)
                .map(|(i, _)| i + 1)
                .unwrap_or(0);
            self.output.drain(..cut);
        }
    }
}

/// Run the debugger on a memory image.
pub fn run_debugger(image: Memory) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(image);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        let timeout = if app.running { Duration::ZERO } else { Duration::from_millis(50) };
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.input_mode {
                        match key.code {
                            KeyCode::Tab => {
                                app.input_mode = false;
                                app.status = "Input mode off.".into();
                            }
                            _ => {
                                if let Some(byte) = crate::console::key_to_byte(&key) {
                                    app.send_key(byte);
                                }
                            }
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') => app.should_quit = true,
                            KeyCode::Char('s') => {
                                app.running = false;
                                app.step();
                            }
                            KeyCode::Char('r') => app.run(),
                            KeyCode::Char('p') => {
                                app.running = false;
                                app.status = "Paused.".into();
                            }
                            KeyCode::Char('b') => app.toggle_breakpoint(),
                            KeyCode::Char('x') => app.reset(),
                            KeyCode::Tab => {
                                app.input_mode = true;
                                app.status = "Input mode: keys go to the machine, Tab to leave.".into();
                            }
                            KeyCode::Up => app.scroll_memory(-1),
                            KeyCode::Down => app.scroll_memory(1),
                            KeyCode::PageUp => app.scroll_memory(-16),
                            KeyCode::PageDown => app.scroll_memory(16),
                            _ => {}
                        }
                    }
                }
            }
        }

        if app.running {
            app.tick(1000);
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{ACCU_ADDR, INDIRECT_ADDR, KEY_ADDR, OUTPUT_ADDR};

    fn echo_image() -> Memory {
        // 0x10: mov out, key ; 0x12: mov jmp, [0x100]
        let mut mem = Memory::new();
        mem.write(0x10, KEY_ADDR);
        mem.write(0x11, OUTPUT_ADDR);
        mem.write(0x12, 0x100);
        mem.write(0x13, 0);
        mem.write(0x100, 0x10);
        mem
    }

    #[test]
    fn test_blocks_on_empty_key_queue() {
        let mut app = DebuggerApp::new(echo_image());
        app.step();
        assert_eq!(app.cpu.cycles, 0);
        assert!(app.status.contains("Waiting"));

        app.send_key(b'k');
        app.step();
        assert_eq!(app.cpu.cycles, 1);
        assert_eq!(app.output, "k");
    }

    #[test]
    fn test_blocks_on_indirect_key_read() {
        // 0x10: mov accu, [0x100] ; 0x12: mov out, [accu]
        let mut mem = Memory::new();
        mem.write(0x10, 0x100);
        mem.write(0x11, ACCU_ADDR);
        mem.write(0x12, INDIRECT_ADDR);
        mem.write(0x13, OUTPUT_ADDR);
        mem.write(0x100, KEY_ADDR);

        let mut app = DebuggerApp::new(mem);
        app.step();
        assert_eq!(app.cpu.regs.accu, KEY_ADDR);
        assert!(app.waiting_for_key());

        app.step();
        assert_eq!(app.cpu.cycles, 1);
        assert!(!app.cpu.is_halted());
        assert!(app.output.is_empty());
        assert!(app.status.contains("Waiting"));

        app.send_key(b'z');
        app.step();
        assert_eq!(app.cpu.cycles, 2);
        assert_eq!(app.output, "z");
        assert!(app.cpu.is_running());
    }

    #[test]
    fn test_run_stops_at_breakpoint() {
        let mut app = DebuggerApp::new(echo_image());
        app.send_key(b'a');
        app.breakpoints.insert(0x12);
        app.run();
        app.tick(10);
        assert!(!app.running);
        assert_eq!(app.cpu.regs.pc, 0x12);
        assert!(app.status.contains("Breakpoint"));
    }

    #[test]
    fn test_escape_halts_and_reset_restores() {
        let mut app = DebuggerApp::new(echo_image());
        app.send_key(27);
        app.run();
        app.tick(10);
        assert!(app.cpu.is_halted());
        assert!(!app.running);

        app.reset();
        assert!(app.cpu.is_running());
        assert_eq!(app.cpu.regs.pc, 0x10);
        assert!(app.output.is_empty());
    }

    #[test]
    fn test_disassembly_window() {
        let app = DebuggerApp::new(echo_image());
        let lines = app.get_disassembly(4);
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().any(|(addr, _, current)| *addr == 0x10 && *current));
        assert!(lines.iter().all(|(addr, _, _)| addr % 2 == 0));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = DebuggerApp::new(Memory::new());
        app.scroll_memory(-5);
        assert_eq!(app.mem_scroll, 0);
        app.scroll_memory(100_000);
        assert_eq!(app.mem_scroll, MEMORY_SIZE - 1);
    }
}
