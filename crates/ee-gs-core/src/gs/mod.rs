pub mod fixed;
pub mod regs;

/// Half-range of the rasterizer's addressable coordinate space. Primitives
/// address 0..4096 in both axes; the viewport is centered at this midpoint
/// via the primitive origin offset.
pub const ORIGIN: f32 = 2048.0;
