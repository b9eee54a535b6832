//! MISC16 Simulator - CLI Entry Point
//!
//! `misc <binfile.bin>` loads a memory image and runs it on the terminal
//! until ESC is read. Every outcome exits with status 0.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};
use misc16::{load_image, Cpu, TerminalConsole};

const USAGE: &str = "Usage: misc <binfile.bin>";

/// Exactly one argument, always taken as the image path.
#[derive(Parser)]
#[command(name = "misc")]
#[command(about = "MISC16 simulator")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Memory image to run (big-endian 16-bit words)
    #[arg(allow_hyphen_values = true)]
    image: PathBuf,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            debug!("{e}");
            println!("{USAGE}");
            return;
        }
    };

    let mem = match load_image(&cli.image) {
        Ok(mem) => mem,
        Err(e) => {
            debug!("{e}");
            println!("File: {} not found", cli.image.display());
            return;
        }
    };

    let console = match TerminalConsole::new() {
        Ok(console) => console,
        Err(e) => {
            eprintln!("Cannot open terminal: {e}");
            return;
        }
    };

    let mut cpu = Cpu::with_memory(mem, console);
    let cycles = cpu.run();
    // Dropping the console restores the terminal.
    drop(cpu);

    info!("Stopped after {cycles} cycles");
}
