//! CPU-side bookkeeping for GS local memory.
//!
//! Linear allocation only; surfaces live for the process lifetime. Addresses
//! and sizes are in 32-bit words (4 MB total = 1M words).

/// Total device memory in words.
pub const VRAM_WORDS: u32 = 1024 * 1024;

/// Words per allocation block.
pub const BLOCK_WORDS: u32 = 64;
/// Words per page.
pub const PAGE_WORDS: u32 = 2048;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VramAlign {
    Block,
    Page,
}

impl VramAlign {
    fn words(self) -> u32 {
        match self {
            VramAlign::Block => BLOCK_WORDS,
            VramAlign::Page => PAGE_WORDS,
        }
    }
}

/// Words occupied by a `width` x `height` surface in 32-bit storage, rounded
/// up to the alignment.
pub fn surface_words(width: u32, height: u32, align: VramAlign) -> u32 {
    let raw = width * height;
    let a = align.words();
    raw.div_ceil(a) * a
}

#[derive(Default)]
pub struct VramAllocator {
    cursor: u32,
}

impl VramAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve space for a surface and return its word address.
    pub fn alloc(&mut self, width: u32, height: u32, align: VramAlign) -> Option<u32> {
        let size = surface_words(width, height, align);
        let base = self.cursor.div_ceil(align.words()) * align.words();
        let end = base.checked_add(size)?;
        if end > VRAM_WORDS {
            return None;
        }
        self.cursor = end;
        Some(base)
    }

    pub fn used_words(&self) -> u32 {
        self.cursor
    }
}
