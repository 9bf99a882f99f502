//! Vertex buffer storage and the two supported vertex layouts.
//!
//! Buffers are raw little-endian byte blocks sized by per-format stride.
//! Lock/unlock is identity: locking hands back the storage slice, unlocking
//! rebinds it for drawing. Handles are generation checked like textures.

/// Vertex layouts understood by the draw pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    /// Position + packed RGBA color.
    Colored,
    /// Position + packed RGBA color + UV.
    Textured,
}

impl VertexFormat {
    pub const fn stride(self) -> usize {
        match self {
            VertexFormat::Colored => 16,
            VertexFormat::Textured => 24,
        }
    }
}

/// Plain-colored vertex record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexColored {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub color: u32,
}

impl VertexColored {
    pub const STRIDE: usize = VertexFormat::Colored.stride();

    pub fn to_bytes(self) -> [u8; Self::STRIDE] {
        let mut b = [0u8; Self::STRIDE];
        b[0..4].copy_from_slice(&self.x.to_le_bytes());
        b[4..8].copy_from_slice(&self.y.to_le_bytes());
        b[8..12].copy_from_slice(&self.z.to_le_bytes());
        b[12..16].copy_from_slice(&self.color.to_le_bytes());
        b
    }

    pub fn from_bytes(b: &[u8]) -> Self {
        Self {
            x: f32_at(b, 0),
            y: f32_at(b, 4),
            z: f32_at(b, 8),
            color: u32_at(b, 12),
        }
    }
}

/// Textured vertex record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexTextured {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub color: u32,
    pub u: f32,
    pub v: f32,
}

impl VertexTextured {
    pub const STRIDE: usize = VertexFormat::Textured.stride();

    pub fn to_bytes(self) -> [u8; Self::STRIDE] {
        let mut b = [0u8; Self::STRIDE];
        b[0..4].copy_from_slice(&self.x.to_le_bytes());
        b[4..8].copy_from_slice(&self.y.to_le_bytes());
        b[8..12].copy_from_slice(&self.z.to_le_bytes());
        b[12..16].copy_from_slice(&self.color.to_le_bytes());
        b[16..20].copy_from_slice(&self.u.to_le_bytes());
        b[20..24].copy_from_slice(&self.v.to_le_bytes());
        b
    }

    pub fn from_bytes(b: &[u8]) -> Self {
        Self {
            x: f32_at(b, 0),
            y: f32_at(b, 4),
            z: f32_at(b, 8),
            color: u32_at(b, 12),
            u: f32_at(b, 16),
            v: f32_at(b, 20),
        }
    }
}

fn f32_at(b: &[u8], i: usize) -> f32 {
    f32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]])
}

fn u32_at(b: &[u8], i: usize) -> u32 {
    u32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]])
}

/// Generation-checked handle into the buffer arena. Static and dynamic
/// buffers share one arena; the distinction is the caller's usage pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId {
    index: u32,
    generation: u32,
}

/// Dummy index-buffer handle. Index buffers are accepted for API parity but
/// never consumed; the draw pipeline walks vertices in quad order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexBufferId(pub u32);

struct Slot {
    generation: u32,
    data: Option<Vec<u8>>,
    format: VertexFormat,
}

#[derive(Default)]
pub struct BufferArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BufferArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate zeroed storage for `count` vertices of the given format.
    pub fn create(&mut self, format: VertexFormat, count: usize) -> BufferId {
        let data = vec![0u8; count * format.stride()];
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            slot.format = format;
            return BufferId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
            format,
        });
        BufferId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: BufferId) -> Option<(&[u8], VertexFormat)> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_deref().map(|d| (d, slot.format))
    }

    /// Identity lock: hand back the storage for the caller to fill.
    pub fn lock(&mut self, id: BufferId) -> Option<&mut [u8]> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_deref_mut()
    }

    pub fn delete(&mut self, id: BufferId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation || slot.data.is_none() {
            return;
        }
        slot.data = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }
}
