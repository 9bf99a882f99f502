//! Vertex transform and triangle emission.
//!
//! Vertices arrive in groups of four; each quad splits into triangles
//! (0,1,2) and (2,3,0) along the diagonal. A triangle is emitted only if all
//! three of its vertices pass the coarse homogeneous clip test; a triangle
//! straddling a clip plane is dropped wholesale, never re-clipped.

use glam::{Mat4, Vec4};

use crate::buffer::{VertexColored, VertexFormat, VertexTextured};
use crate::gif::{self, Qword};
use crate::gs::{fixed, regs, ORIGIN};
use crate::packet::{Packet, PacketFull};

/// Half-extents of the visible area, in pixels.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub half_width: f32,
    pub half_height: f32,
}

/// Transform a model-space position to homogeneous clip space.
pub fn transform(mvp: &Mat4, x: f32, y: f32, z: f32) -> Vec4 {
    *mvp * Vec4::new(x, y, z, 1.0)
}

/// Coarse per-vertex clip test. Boundary values count as inside.
pub fn not_clipped(v: Vec4) -> bool {
    v.x >= -v.w
        && v.x <= v.w
        && v.y >= -v.w
        && v.y <= v.w
        && v.z >= -v.w
        && v.z <= v.w
}

/// Map a clip-space vertex to the rasterizer's fixed-point screen space,
/// centered at the coordinate-space midpoint.
pub fn to_screen(v: Vec4, vp: Viewport) -> (u16, u16, u32) {
    let sx = (vp.half_width / ORIGIN) * (v.x / v.w);
    let sy = (vp.half_height / ORIGIN) * (v.y / v.w);
    let sz = v.z / v.w;
    (
        fixed::f32_to_12_4(ORIGIN + sx),
        fixed::f32_to_12_4(ORIGIN + sy),
        fixed::f32_to_z32(sz),
    )
}

/// Vertex color dword: packed RGBA in the low word, Q = 1/W in the high word
/// for perspective-correct interpolation.
fn rgbaq_packed(color: u32, q: f32) -> u64 {
    (color as u64) | ((q.to_bits() as u64) << 32)
}

fn emit_textured_triangle(
    packet: &mut Packet,
    prim_word: u64,
    clip: [Vec4; 3],
    verts: [VertexTextured; 3],
    vp: Viewport,
) -> Result<(), PacketFull> {
    packet.push_qword(gif::ad_tag(1))?;
    packet.push_qword(Qword::new(prim_word, regs::PRIM))?;
    packet.push_qword(gif::reglist_tag(3, 3, gif::REGLIST_STQ))?;

    for i in 0..3 {
        let q = 1.0 / clip[i].w;
        packet.push_dword(rgbaq_packed(verts[i].color, q))?;
        packet.push_dword(regs::st(verts[i].u * q, verts[i].v * q))?;
        let (x, y, z) = to_screen(clip[i], vp);
        packet.push_dword(regs::xyz2(x, y, z))?;
    }
    // 9 payload dwords; pad back to qword alignment.
    packet.push_dword(0)?;
    Ok(())
}

fn emit_colored_triangle(
    packet: &mut Packet,
    prim_word: u64,
    clip: [Vec4; 3],
    verts: [VertexColored; 3],
    vp: Viewport,
) -> Result<(), PacketFull> {
    packet.push_qword(gif::ad_tag(1))?;
    packet.push_qword(Qword::new(prim_word, regs::PRIM))?;
    packet.push_qword(gif::reglist_tag(3, 2, gif::REGLIST_FLAT))?;

    for i in 0..3 {
        let q = 1.0 / clip[i].w;
        packet.push_dword(rgbaq_packed(verts[i].color, q))?;
        let (x, y, z) = to_screen(clip[i], vp);
        packet.push_dword(regs::xyz2(x, y, z))?;
    }
    Ok(())
}

/// Walk `count` vertices from `start` as quads, transform them against the
/// combined matrix, and append surviving triangles to the packet. Returns
/// the number of triangles emitted.
pub fn draw_quads(
    packet: &mut Packet,
    mvp: &Mat4,
    data: &[u8],
    format: VertexFormat,
    start: usize,
    count: usize,
    vp: Viewport,
    alpha_blend: bool,
) -> Result<usize, PacketFull> {
    let stride = format.stride();
    let textured = format == VertexFormat::Textured;
    let prim_word = regs::prim(
        regs::PRIM_TRIANGLE,
        true,
        textured,
        false,
        alpha_blend,
        false,
        false,
        0,
        false,
    );

    let base = start * stride;
    let mut emitted = 0;

    for quad in data[base..].chunks_exact(stride * 4).take(count / 4) {
        let positions: [(f32, f32, f32); 4] = match format {
            VertexFormat::Textured => {
                let mut p = [(0.0, 0.0, 0.0); 4];
                for (i, slot) in p.iter_mut().enumerate() {
                    let v = VertexTextured::from_bytes(&quad[i * stride..][..stride]);
                    *slot = (v.x, v.y, v.z);
                }
                p
            }
            VertexFormat::Colored => {
                let mut p = [(0.0, 0.0, 0.0); 4];
                for (i, slot) in p.iter_mut().enumerate() {
                    let v = VertexColored::from_bytes(&quad[i * stride..][..stride]);
                    *slot = (v.x, v.y, v.z);
                }
                p
            }
        };

        let clip: [Vec4; 4] = [
            transform(mvp, positions[0].0, positions[0].1, positions[0].2),
            transform(mvp, positions[1].0, positions[1].1, positions[1].2),
            transform(mvp, positions[2].0, positions[2].1, positions[2].2),
            transform(mvp, positions[3].0, positions[3].1, positions[3].2),
        ];
        let inside = [
            not_clipped(clip[0]),
            not_clipped(clip[1]),
            not_clipped(clip[2]),
            not_clipped(clip[3]),
        ];

        for tri in [[0usize, 1, 2], [2, 3, 0]] {
            if !(inside[tri[0]] && inside[tri[1]] && inside[tri[2]]) {
                continue;
            }
            let tri_clip = [clip[tri[0]], clip[tri[1]], clip[tri[2]]];
            match format {
                VertexFormat::Textured => {
                    let verts = [
                        VertexTextured::from_bytes(&quad[tri[0] * stride..][..stride]),
                        VertexTextured::from_bytes(&quad[tri[1] * stride..][..stride]),
                        VertexTextured::from_bytes(&quad[tri[2] * stride..][..stride]),
                    ];
                    emit_textured_triangle(packet, prim_word, tri_clip, verts, vp)?;
                }
                VertexFormat::Colored => {
                    let verts = [
                        VertexColored::from_bytes(&quad[tri[0] * stride..][..stride]),
                        VertexColored::from_bytes(&quad[tri[1] * stride..][..stride]),
                        VertexColored::from_bytes(&quad[tri[2] * stride..][..stride]),
                    ];
                    emit_colored_triangle(packet, prim_word, tri_clip, verts, vp)?;
                }
            }
            emitted += 1;
        }
    }

    Ok(emitted)
}
