//! GS register addresses and bit-field packing.
//!
//! Pure functions building the 64-bit data words written through address+data
//! qwords. Field layouts follow the rasterizer's register map; addresses are
//! the context-1 set.

pub const PRIM: u64 = 0x00;
pub const RGBAQ: u64 = 0x01;
pub const ST: u64 = 0x02;
pub const XYZ2: u64 = 0x05;
pub const TEX0_1: u64 = 0x06;
pub const CLAMP_1: u64 = 0x08;
pub const TEX1_1: u64 = 0x14;
pub const XYOFFSET_1: u64 = 0x18;
pub const PRMODECONT: u64 = 0x1A;
pub const TEXFLUSH: u64 = 0x3F;
pub const SCISSOR_1: u64 = 0x40;
pub const TEST_1: u64 = 0x47;
pub const FRAME_1: u64 = 0x4C;
pub const ZBUF_1: u64 = 0x4E;
pub const BITBLTBUF: u64 = 0x50;
pub const TRXPOS: u64 = 0x51;
pub const TRXREG: u64 = 0x52;
pub const TRXDIR: u64 = 0x53;
pub const FINISH: u64 = 0x61;

/// Primitive types.
pub const PRIM_TRIANGLE: u64 = 3;
pub const PRIM_SPRITE: u64 = 6;

/// 32-bit RGBA pixel storage.
pub const PSM_32: u64 = 0x00;
/// 32-bit depth storage (ZBUF psm field).
pub const ZBUF_32: u64 = 0x00;

/// Depth test methods (TEST ztst field).
pub const ZTST_NEVER: u64 = 0;
pub const ZTST_ALWAYS: u64 = 1;
pub const ZTST_GEQUAL: u64 = 2;
pub const ZTST_GREATER: u64 = 3;

/// Alpha test methods (TEST atst field).
pub const ATST_NEVER: u64 = 0;
pub const ATST_ALWAYS: u64 = 1;
pub const ATST_GEQUAL: u64 = 5;

/// Alpha-fail behavior: update the framebuffer only.
pub const AFAIL_FB_ONLY: u64 = 1;

/// Texture wrap mode.
pub const WRAP_REPEAT: u64 = 0;

/// Texture function.
pub const TFX_MODULATE: u64 = 0;
/// RGBA component layout (TEX0 tcc field).
pub const TCC_RGBA: u64 = 1;

/// Host-to-local transfer direction.
pub const TRXDIR_HOST_TO_LOCAL: u64 = 0;

/// Primitive attributes: type, Gouraud shading, texturing, fog, alpha blend,
/// antialias, ST mapping, context, fractional fix.
#[allow(clippy::too_many_arguments)]
pub fn prim(
    prim_type: u64,
    gouraud: bool,
    textured: bool,
    fog: bool,
    alpha_blend: bool,
    antialias: bool,
    uv_mapped: bool,
    context: u64,
    fixed_frac: bool,
) -> u64 {
    (prim_type & 0x7)
        | ((gouraud as u64) << 3)
        | ((textured as u64) << 4)
        | ((fog as u64) << 5)
        | ((alpha_blend as u64) << 6)
        | ((antialias as u64) << 7)
        | ((uv_mapped as u64) << 8)
        | ((context & 1) << 9)
        | ((fixed_frac as u64) << 10)
}

/// Vertex color with the perspective-correction factor Q in the upper word.
pub fn rgbaq(r: u8, g: u8, b: u8, a: u8, q: f32) -> u64 {
    (r as u64)
        | ((g as u64) << 8)
        | ((b as u64) << 16)
        | ((a as u64) << 24)
        | ((q.to_bits() as u64) << 32)
}

/// Perspective-corrected texture coordinates (S = U·Q, T = V·Q).
pub fn st(s: f32, t: f32) -> u64 {
    (s.to_bits() as u64) | ((t.to_bits() as u64) << 32)
}

/// Fixed-point screen position; writing this register kicks the vertex.
pub fn xyz2(x: u16, y: u16, z: u32) -> u64 {
    (x as u64) | ((y as u64) << 16) | ((z as u64) << 32)
}

/// Pixel test state: alpha test, destination alpha test, depth test.
#[allow(clippy::too_many_arguments)]
pub fn test(
    alpha_enable: bool,
    alpha_method: u64,
    alpha_ref: u8,
    alpha_fail: u64,
    dest_alpha_enable: bool,
    dest_alpha_mode: bool,
    depth_enable: bool,
    depth_method: u64,
) -> u64 {
    (alpha_enable as u64)
        | ((alpha_method & 0x7) << 1)
        | ((alpha_ref as u64) << 4)
        | ((alpha_fail & 0x3) << 12)
        | ((dest_alpha_enable as u64) << 14)
        | ((dest_alpha_mode as u64) << 15)
        | ((depth_enable as u64) << 16)
        | ((depth_method & 0x3) << 17)
}

/// Texture buffer descriptor. `base` and `buf_width` are in 64-word blocks
/// and 64-texel units respectively.
pub fn tex0(base: u64, buf_width: u64, psm: u64, w_log2: u64, h_log2: u64, tcc: u64, tfx: u64) -> u64 {
    (base & 0x3FFF)
        | ((buf_width & 0x3F) << 14)
        | ((psm & 0x3F) << 20)
        | ((w_log2 & 0xF) << 26)
        | ((h_log2 & 0xF) << 30)
        | ((tcc & 1) << 34)
        | ((tfx & 0x3) << 35)
}

pub fn clamp(wrap_s: u64, wrap_t: u64) -> u64 {
    (wrap_s & 0x3) | ((wrap_t & 0x3) << 2)
}

/// Sampling control; magnification and minification filters are the
/// low bits of the filter fields (0 = nearest).
pub fn tex1(lod_method: u64, max_level: u64, mag_nearest: bool, min_nearest: bool) -> u64 {
    (lod_method & 1)
        | ((max_level & 0x7) << 2)
        | ((!mag_nearest as u64) << 5)
        | ((!min_nearest as u64) << 6)
}

/// Primitive coordinate origin offset, 12.4 fixed per axis.
pub fn xyoffset(x: u16, y: u16) -> u64 {
    (x as u64) | ((y as u64) << 32)
}

/// Use PRIM register attributes (not PRMODE).
pub fn prmodecont() -> u64 {
    1
}

pub fn scissor(x0: u64, x1: u64, y0: u64, y1: u64) -> u64 {
    (x0 & 0x7FF) | ((x1 & 0x7FF) << 16) | ((y0 & 0x7FF) << 32) | ((y1 & 0x7FF) << 48)
}

/// Color surface: base pointer in 2048-word pages, width in 64-pixel units.
pub fn frame(base_page: u64, width_64: u64, psm: u64, mask: u64) -> u64 {
    (base_page & 0x1FF) | ((width_64 & 0x3F) << 16) | ((psm & 0x3F) << 24) | (mask << 32)
}

/// Depth surface: base pointer in 2048-word pages.
pub fn zbuf(base_page: u64, psm: u64, writes_masked: bool) -> u64 {
    (base_page & 0x1FF) | ((psm & 0xF) << 24) | ((writes_masked as u64) << 32)
}

/// Transfer destination buffer: base in 64-word blocks, width in 64-texel
/// units.
pub fn bitbltbuf_dest(dest_base: u64, dest_width: u64, dest_psm: u64) -> u64 {
    ((dest_base & 0x3FFF) << 32) | ((dest_width & 0x3F) << 48) | ((dest_psm & 0x3F) << 56)
}

pub fn trxpos_dest(dest_x: u64, dest_y: u64) -> u64 {
    ((dest_x & 0x7FF) << 32) | ((dest_y & 0x7FF) << 48)
}

pub fn trxreg(width: u64, height: u64) -> u64 {
    (width & 0xFFF) | ((height & 0xFFF) << 32)
}

pub fn trxdir(dir: u64) -> u64 {
    dir & 0x3
}
