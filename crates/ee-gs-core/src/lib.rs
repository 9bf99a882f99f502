//! Immediate-mode rendering backend for a GS-style fixed-function rasterizer.
//!
//! Converts vertex buffers, matrices, texture bitmaps, and render-state
//! toggles into a binary GIF command stream consumed asynchronously by the
//! hardware. CPU command generation overlaps hardware consumption through a
//! pair of command packets that alternate every frame: the CPU fills one
//! while the transfer unit drains the other.
//!
//! Transforms run on the CPU against a cached view-projection product, with a
//! coarse homogeneous-space clip test (whole triangles are accepted or
//! dropped, never re-clipped) and perspective-correct color and texture
//! coordinates.

pub mod buffer;
pub mod context;
pub mod error;
pub mod gif;
pub mod gs;
pub mod matrix;
pub mod packet;
pub mod pipeline;
pub mod state;
pub mod texture;
pub mod vram;

pub use buffer::{BufferArena, BufferId, IndexBufferId, VertexColored, VertexFormat, VertexTextured};
pub use context::GsContext;
pub use error::GsError;
pub use matrix::MatrixType;
pub use packet::{Packet, PacketRing, PacketState};
pub use texture::{Bitmap, TextureId};
