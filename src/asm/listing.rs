//! Listing files.
//!
//! A listing shows each source line next to the address and words it
//! produced, two words per row, followed by the symbol table.

use crate::asm::assembler::Assembly;
use std::io::Write;
use std::path::Path;

/// Write a listing for `asm`. `name` goes into the banner.
pub fn write_listing<W: Write>(mut out: W, name: &str, asm: &Assembly) -> std::io::Result<()> {
    banner(&mut out, &format!("   MISC16 assembler listing file {}   ", name))?;

    for entry in &asm.listing {
        let mut line_number = entry.line.to_string();
        let mut text = entry.text.trim_end();
        let mut index = entry.start;

        loop {
            let row: Vec<u16> = (index..entry.end.min(index + 2))
                .map(|i| asm.image[i])
                .collect();
            let address = if row.is_empty() {
                String::new()
            } else {
                format!("{:04X}", index)
            };
            let data: String = row.iter().map(|w| format!("{:04X}", w)).collect();
            index += row.len();

            writeln!(out, "{:<6}{:<6}{:<10}{}", line_number, address, data, text)?;
            line_number.clear();
            text = "";

            if index >= entry.end {
                break;
            }
        }
    }

    banner(&mut out, "   Symbol Table")?;
    for (label, value) in &asm.labels {
        writeln!(out, "{:<15}{:04X}", label, value)?;
    }
    banner(&mut out, "   End of File")?;
    Ok(())
}

/// Save a listing to disk.
pub fn save_listing<P: AsRef<Path>>(path: P, asm: &Assembly) -> std::io::Result<()> {
    let path = path.as_ref();
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let file = std::fs::File::create(path)?;
    let mut out = std::io::BufWriter::new(file);
    write_listing(&mut out, &name, asm)?;
    out.flush()
}

fn banner<W: Write>(out: &mut W, title: &str) -> std::io::Result<()> {
    let rule = "-".repeat(title.len().max(19));
    writeln!(out, "{}", rule)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", rule)
}
