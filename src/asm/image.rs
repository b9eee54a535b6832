//! Memory image files.
//!
//! A `.bin` image is a raw run of 16-bit words, big-endian on disk. On
//! load it is byte-swapped into host order and fitted to exactly
//! [`MEMORY_SIZE`] words: short files are zero-padded, long ones
//! truncated. A trailing odd byte lands in the high half of the final word.
//!
//! The assembler can also emit Memory Initialization Files (`.mif`) for
//! loading an image into FPGA block RAM.

use crate::cpu::{Memory, MEMORY_SIZE};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Load a binary image from disk into a fresh memory.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Memory, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Loaded {} bytes from {}", bytes.len(), path.display());
    if bytes.len() > MEMORY_SIZE * 2 {
        debug!(
            "Image {} is {} words, truncating to {}",
            path.display(),
            bytes.len().div_ceil(2),
            MEMORY_SIZE
        );
    }

    Ok(image_from_bytes(&bytes))
}

/// Decode big-endian image bytes into memory.
pub fn image_from_bytes(bytes: &[u8]) -> Memory {
    let words: Vec<u16> = bytes
        .chunks(2)
        .take(MEMORY_SIZE)
        .map(|pair| match *pair {
            [hi, lo] => u16::from_be_bytes([hi, lo]),
            [hi] => u16::from_be_bytes([hi, 0]),
            _ => 0,
        })
        .collect();
    Memory::from_words(&words)
}

/// Encode words as big-endian image bytes.
pub fn image_to_bytes(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Save words as a binary image.
pub fn save_bin<P: AsRef<Path>>(path: P, words: &[u16]) -> Result<(), ImageError> {
    let path = path.as_ref();
    std::fs::write(path, image_to_bytes(words)).map_err(|source| ImageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write words as a Memory Initialization File.
pub fn write_mif<W: Write>(mut out: W, words: &[u16]) -> std::io::Result<()> {
    writeln!(out, "DEPTH = {};", words.len())?;
    writeln!(out, "WIDTH = 16;")?;
    writeln!(out, "ADDRESS_RADIX = HEX;")?;
    writeln!(out, "DATA_RADIX = HEX;")?;
    writeln!(out, "CONTENT")?;
    writeln!(out, "BEGIN")?;

    for (addr, word) in words.iter().enumerate() {
        writeln!(out, "{:03X} : {:04X} ;", addr, word)?;
    }

    writeln!(out, "END")?;
    Ok(())
}

/// Save words as a Memory Initialization File.
pub fn save_mif<P: AsRef<Path>>(path: P, words: &[u16]) -> Result<(), ImageError> {
    let path = path.as_ref();
    let wrap = |source| ImageError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::create(path).map_err(wrap)?;
    let mut out = std::io::BufWriter::new(file);
    write_mif(&mut out, words).map_err(wrap)?;
    out.flush().map_err(wrap)
}

/// Errors that can occur reading or writing image files.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
