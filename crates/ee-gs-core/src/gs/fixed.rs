//! Fixed-point conversions for the rasterizer's coordinate formats.
//!
//! Screen X/Y use 12.4 unsigned fixed-point over the 0..4096 addressable
//! range; depth is a 32-bit unsigned value.

/// Convert an f32 screen coordinate to 12.4 fixed-point.
///
/// Resolution is 1/16 pixel; input is clamped to the addressable range.
pub fn f32_to_12_4(val: f32) -> u16 {
    let clamped = val.clamp(0.0, 4095.9375);
    (clamped * 16.0) as u16
}

/// Convert an f32 depth (post-divide Z) to the 32-bit depth format.
///
/// The post-projection depth lands in -1..1; only the non-negative half is
/// representable, scaled by 2^31. Negative values clamp to zero.
pub fn f32_to_z32(val: f32) -> u32 {
    let clamped = val.clamp(0.0, 1.0);
    (clamped * (1u64 << 31) as f32) as u32
}

/// Ceiling log2 of a texture dimension (1 → 0, 16 → 4, 17 → 5).
pub fn log2_ceil(v: u32) -> u32 {
    match v {
        0 | 1 => 0,
        _ => 32 - (v - 1).leading_zeros(),
    }
}
