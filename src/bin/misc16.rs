//! MISC16 toolchain - CLI Entry Point
//!
//! Commands:
//! - `misc16 run <program>` - Run a binary image or assembly source
//! - `misc16 asm <source>` - Assemble to .bin/.mif/.lst (or run directly)
//! - `misc16 disasm <program>` - Disassemble transport pairs
//! - `misc16 debug <program>` - Interactive debugger

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use misc16::asm::{save_bin, save_listing, save_mif};
use misc16::{assemble, disassemble, load_image, Assembly, Cpu, Memory, TerminalConsole};

#[derive(Parser)]
#[command(name = "misc16")]
#[command(version = "0.1.0")]
#[command(about = "Assembler, emulator and debugger for the MISC16 transport-triggered machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until ESC is read
    Run {
        /// Path to the .bin image or .asm source to execute
        program: PathBuf,
        /// Stop after this many transports
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Log every transport (to stderr)
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state as JSON
        #[arg(long)]
        dump_state: Option<PathBuf>,
    },
    /// Assemble source; with no outputs given, run the result
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Binary image output
        #[arg(short, long)]
        bin: Option<PathBuf>,
        /// Memory Initialization File output
        #[arg(short, long)]
        mif: Option<PathBuf>,
        /// Listing output
        #[arg(short, long)]
        lst: Option<PathBuf>,
    },
    /// Disassemble transport pairs from a program
    Disasm {
        /// Path to the .bin image or .asm source
        program: PathBuf,
        /// First address to disassemble
        #[arg(short, long, default_value = "0x10", value_parser = parse_address)]
        start: u16,
        /// Number of pairs to show
        #[arg(short, long, default_value_t = 32)]
        count: usize,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the .bin image or .asm source to debug
        program: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Commands::Run { trace: true, .. } = cli.command {
        logger.filter_module("misc16::cpu", LevelFilter::Trace);
    }
    logger.init();

    match cli.command {
        Commands::Run { program, max_cycles, trace: _, dump_state } => {
            let mem = load_program(&program);
            run_memory(mem, max_cycles, dump_state.as_deref());
        }
        Commands::Asm { source, bin, mif, lst } => {
            assemble_file(&source, bin, mif, lst);
        }
        Commands::Disasm { program, start, count } => {
            disassemble_file(&program, start, count);
        }
        #[cfg(feature = "tui")]
        Commands::Debug { program } => {
            debug_program(&program);
        }
    }
}

/// Load a `.bin` image, or assemble a `.asm` source, exiting on failure.
fn load_program(path: &Path) -> Memory {
    let is_source = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asm"));

    if is_source {
        let asm = assemble_or_exit(path);
        Memory::from_words(asm.words())
    } else {
        match load_image(path) {
            Ok(mem) => mem,
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn assemble_or_exit(path: &Path) -> Assembly {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Could not open file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    match assemble(&source) {
        Ok(asm) => {
            info!("Assembled {} words from {}", asm.len, path.display());
            asm
        }
        Err(e) => {
            for error in &e.errors {
                eprintln!("ERROR: {}", error);
            }
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn run_memory(mem: Memory, max_cycles: Option<u64>, dump_state: Option<&Path>) {
    let console = match TerminalConsole::new() {
        Ok(console) => console,
        Err(e) => {
            eprintln!("❌ Cannot open terminal: {}", e);
            std::process::exit(1);
        }
    };

    let mut cpu = Cpu::with_memory(mem, console);
    let cycles = match max_cycles {
        Some(max) => cpu.run_limited(max),
        None => cpu.run(),
    };
    let snapshot = cpu.snapshot();
    // Dropping the console restores the terminal.
    drop(cpu);

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cycles);
    println!("State: {:?}", snapshot.state);
    println!("ACCU: {:04X}  PC: {:04X}  Flags: {}",
        snapshot.regs.accu, snapshot.regs.pc, snapshot.regs.flags_string());

    if let Some(max) = max_cycles {
        if cycles >= max {
            println!();
            println!("⚠️  Reached max cycles limit ({}).", max);
        }
    }

    if let Some(path) = dump_state {
        let written = std::fs::File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                serde_json::to_writer_pretty(std::io::BufWriter::new(file), &snapshot)
                    .map_err(|e| e.to_string())
            });
        match written {
            Ok(()) => println!("✓ State written to {}", path.display()),
            Err(e) => {
                eprintln!("❌ Failed to write state to {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
}

fn assemble_file(source: &Path, bin: Option<PathBuf>, mif: Option<PathBuf>, lst: Option<PathBuf>) {
    let asm = assemble_or_exit(source);
    println!("Success: assembly completed {} bytes", asm.len * 2);

    if let Some(path) = &mif {
        if let Err(e) = save_mif(path, asm.words()) {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        println!("MIF file {} created", path.display());
    }

    if let Some(path) = &bin {
        if let Err(e) = save_bin(path, asm.words()) {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        println!("BIN file {} created", path.display());
    }

    if let Some(path) = &lst {
        if let Err(e) = save_listing(path, &asm) {
            eprintln!("❌ Failed to write {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("LST file {} created", path.display());
    }

    if mif.is_none() && bin.is_none() && lst.is_none() {
        run_memory(Memory::from_words(asm.words()), None, None);
    }
}

fn disassemble_file(path: &Path, start: u16, count: usize) {
    let mem = load_program(path);
    let words: Vec<u16> = mem
        .dump(start as usize, count.saturating_mul(2))
        .into_iter()
        .map(|(_, word)| word)
        .collect();
    print!("{}", disassemble(&words, start));
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path) {
    use misc16::run_debugger;

    let mem = load_program(path);
    if let Err(e) = run_debugger(mem) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

/// Parse a decimal or `0x` hex address.
fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}
