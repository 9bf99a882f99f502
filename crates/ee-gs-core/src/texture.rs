//! Host-side texture records and the generation-checked texture arena.
//!
//! Textures live in host memory until a bind uploads them to the device
//! staging area. Handles carry a generation so a deleted slot's reuse is
//! detected instead of silently dereferencing stale data.

use crate::gs::fixed::log2_ceil;

/// Borrowed RGBA pixel source for texture creation and updates.
#[derive(Clone, Copy, Debug)]
pub struct Bitmap<'a> {
    pub width: u32,
    pub height: u32,
    /// One RGBA word per texel, row major, `width * height` long.
    pub pixels: &'a [u32],
}

/// Host-side texture record.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub log2_width: u32,
    pub log2_height: u32,
    pub pixels: Vec<u32>,
}

impl Texture {
    fn from_bitmap(bmp: &Bitmap<'_>) -> Self {
        Self {
            width: bmp.width,
            height: bmp.height,
            log2_width: log2_ceil(bmp.width),
            log2_height: log2_ceil(bmp.height),
            pixels: bmp.pixels.to_vec(),
        }
    }
}

/// Generation-checked handle into the texture arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    texture: Option<Texture>,
}

#[derive(Default)]
pub struct TextureArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl TextureArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a texture record and copy the pixel data in. The mipmap flag
    /// of the public API is accepted upstream and ignored here.
    pub fn create(&mut self, bmp: &Bitmap<'_>) -> TextureId {
        let texture = Texture::from_bitmap(bmp);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.texture = Some(texture);
            return TextureId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            texture: Some(texture),
        });
        TextureId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.texture.as_ref()
    }

    pub fn get_mut(&mut self, id: TextureId) -> Option<&mut Texture> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.texture.as_mut()
    }

    /// Free the record and retire the handle's generation. Deleting an
    /// already-deleted handle is a no-op.
    pub fn delete(&mut self, id: TextureId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation || slot.texture.is_none() {
            return;
        }
        slot.texture = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Number of live texture records.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.texture.is_some()).count()
    }

    /// Copy a sub-rectangle of pixels into an existing record. Takes effect
    /// on the next bind, which re-uploads the whole texture.
    pub fn update_part(&mut self, id: TextureId, x: u32, y: u32, part: &Bitmap<'_>) -> bool {
        let Some(tex) = self.get_mut(id) else {
            return false;
        };
        if x + part.width > tex.width || y + part.height > tex.height {
            return false;
        }
        for row in 0..part.height {
            let src = (row * part.width) as usize;
            let dst = ((y + row) * tex.width + x) as usize;
            let w = part.width as usize;
            tex.pixels[dst..dst + w].copy_from_slice(&part.pixels[src..src + w]);
        }
        true
    }
}
