//! GIF tag and transfer descriptor packing.
//!
//! Every command the rasterizer consumes is a 128-bit qword. A packet is a
//! sequence of tagged qwords: a GIF tag announcing a format and register
//! list, followed by the data qwords it covers.

/// One 128-bit command word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Qword {
    pub lo: u64,
    pub hi: u64,
}

impl Qword {
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }
}

/// GIF data formats.
pub const FLG_PACKED: u64 = 0;
pub const FLG_REGLIST: u64 = 1;
pub const FLG_IMAGE: u64 = 2;

/// Register descriptors used in tag register lists.
pub const REG_PRIM: u64 = 0x0;
pub const REG_RGBAQ: u64 = 0x1;
pub const REG_ST: u64 = 0x2;
pub const REG_XYZ2: u64 = 0x5;
/// Address+data: the following qwords carry (data, register address) pairs.
pub const REG_AD: u64 = 0xE;

/// Register list for textured triangle vertices: RGBAQ, ST, XYZ2.
pub const REGLIST_STQ: u64 = REG_RGBAQ | (REG_ST << 4) | (REG_XYZ2 << 8);
/// Register list for untextured triangle vertices: RGBAQ, XYZ2.
pub const REGLIST_FLAT: u64 = REG_RGBAQ | (REG_XYZ2 << 4);

/// Pack a GIF tag. `nloop` is the number of passes over the `nreg`-entry
/// register list in `regs`; `eop` marks the end of the primitive stream.
pub fn tag(nloop: u64, eop: bool, pre: bool, prim: u64, flg: u64, nreg: u64, regs: u64) -> Qword {
    let lo = (nloop & 0x7FFF)
        | ((eop as u64) << 15)
        | ((pre as u64) << 46)
        | ((prim & 0x7FF) << 47)
        | ((flg & 0x3) << 58)
        | ((nreg & 0xF) << 60);
    Qword::new(lo, regs)
}

/// Tag for `nloop` address+data register writes.
pub fn ad_tag(nloop: u64) -> Qword {
    tag(nloop, true, false, 0, FLG_PACKED, 1, REG_AD)
}

/// Tag for a register-list vertex burst.
pub fn reglist_tag(nloop: u64, nreg: u64, regs: u64) -> Qword {
    tag(nloop, true, false, 0, FLG_REGLIST, nreg, regs)
}

/// Tag announcing `qwords` of raw image data for a host-to-device transfer.
pub fn image_tag(qwords: u64) -> Qword {
    tag(qwords, true, false, 0, FLG_IMAGE, 0, 0)
}

/// Terminating transfer descriptor: `qwc` qwords follow, channel stops after.
pub fn dma_end_tag(qwc: u64) -> Qword {
    Qword::new((qwc & 0xFFFF) | (0x7 << 28), 0)
}
