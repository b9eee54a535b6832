//! Tooling for MISC16 programs.
//!
//! This module provides:
//! - An assembler (text -> memory image)
//! - Image readers and writers (`.bin`, `.mif`)
//! - A listing writer
//! - A disassembler (memory image -> readable text)

pub mod assembler;
pub mod disasm;
pub mod image;
pub mod listing;

pub use assembler::{assemble, Assembly, AssemblerError, AssemblyErrors};
pub use disasm::disassemble;
pub use image::{load_image, image_from_bytes, save_bin, save_mif, ImageError};
pub use listing::{save_listing, write_listing};
