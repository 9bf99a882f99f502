//! Render-state cache with lazy commit.
//!
//! Setters mutate a pending value; the TEST register is emitted only when
//! the pending value differs from the last committed one, at most once per
//! draw. Alpha blend and clear color are read directly at emission sites and
//! need no register of their own.

use crate::buffer::VertexFormat;
use crate::gs::regs;
use crate::packet::{Packet, PacketFull};

/// The slice of state that maps onto the pixel-test register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestState {
    pub alpha_test: bool,
    pub depth_test: bool,
}

/// Alpha-test reference value when the test is enabled.
const ALPHA_REF: u8 = 0x80;

pub struct RenderState {
    pending: TestState,
    committed: Option<TestState>,
    pub alpha_blend: bool,
    pub clear_color: [u8; 3],
    pub format: VertexFormat,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            pending: TestState {
                alpha_test: false,
                depth_test: false,
            },
            committed: None,
            alpha_blend: false,
            clear_color: [0, 0, 0],
            format: VertexFormat::Textured,
        }
    }

    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.pending.alpha_test = enabled;
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.pending.depth_test = enabled;
    }

    pub fn dirty(&self) -> bool {
        self.committed != Some(self.pending)
    }

    /// Pack the pending test state: always-pass methods when a test is
    /// disabled, greater-or-equal otherwise.
    pub fn test_word(&self) -> u64 {
        let alpha_method = if self.pending.alpha_test {
            regs::ATST_GEQUAL
        } else {
            regs::ATST_ALWAYS
        };
        let depth_method = if self.pending.depth_test {
            regs::ZTST_GEQUAL
        } else {
            regs::ZTST_ALWAYS
        };
        regs::test(
            true,
            alpha_method,
            ALPHA_REF,
            regs::AFAIL_FB_ONLY,
            false,
            false,
            true,
            depth_method,
        )
    }

    /// Emit the test register regardless of dirtiness and record it as
    /// committed. Used after operations that clobber the device state.
    pub fn commit_force(&mut self, packet: &mut Packet) -> Result<(), PacketFull> {
        packet.push_reg(regs::TEST_1, self.test_word())?;
        self.committed = Some(self.pending);
        Ok(())
    }

    /// Emit the test register only if the pending state is uncommitted.
    pub fn commit(&mut self, packet: &mut Packet) -> Result<(), PacketFull> {
        if self.dirty() {
            self.commit_force(packet)?;
        }
        Ok(())
    }
}
