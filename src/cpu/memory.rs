//! MISC16 main memory.
//!
//! A flat array of 32768 sixteen-bit words. Addresses above the backed
//! range read as zero and swallow writes; the memory never faults.

use serde::{Serialize, Deserialize};

/// The number of words backed by memory.
pub const MEMORY_SIZE: usize = 32768;

/// MISC16 memory: 32768 sixteen-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u16>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Build a memory from a word slice.
    ///
    /// Missing tail words stay zero, words past the end are dropped.
    pub fn from_words(words: &[u16]) -> Self {
        let mut mem = Self::new();
        mem.load(0, words);
        mem
    }

    /// Read a cell. Returns 0 outside the backed range.
    #[inline]
    pub fn read(&self, addr: u16) -> u16 {
        self.cells.get(addr as usize).copied().unwrap_or(0)
    }

    /// Write a cell. Writes outside the backed range are discarded.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u16) {
        if let Some(cell) = self.cells.get_mut(addr as usize) {
            *cell = value;
        }
    }

    /// Copy `words` into memory starting at `start`, clamping at the end.
    ///
    /// Returns the number of words actually stored.
    pub fn load(&mut self, start: usize, words: &[u16]) -> usize {
        if start >= MEMORY_SIZE {
            return 0;
        }
        let count = words.len().min(MEMORY_SIZE - start);
        self.cells[start..start + count].copy_from_slice(&words[..count]);
        count
    }

    /// Borrow the whole backing store.
    pub fn words(&self) -> &[u16] {
        &self.cells
    }

    /// Dump a range of cells (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u16)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&w| w != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}
