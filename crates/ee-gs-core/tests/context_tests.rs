//! Integration tests for GsContext using a mock transport.
//!
//! The mock captures every normal and chain transfer plus the display setup
//! and wait calls, so tests can assert on the exact command words the
//! hardware would consume.

use std::cell::RefCell;
use std::rc::Rc;

use ee_gs_core::gif;
use ee_gs_core::gs::regs;
use ee_gs_core::{Bitmap, GsContext, GsError, PacketState, VertexFormat, VertexTextured};
use ee_gs_hal::{DisplayConfig, GifTransport, GraphControl};

/// Mock transfer channel that records every submission.
#[derive(Clone, Default)]
struct MockBus {
    normal_sends: Rc<RefCell<Vec<Vec<u64>>>>,
    chain_sends: Rc<RefCell<Vec<Vec<u64>>>>,
    outputs: Rc<RefCell<Vec<DisplayConfig>>>,
    idle_waits: Rc<RefCell<usize>>,
    finish_waits: Rc<RefCell<usize>>,
    vsync_waits: Rc<RefCell<usize>>,
}

impl MockBus {
    fn new() -> Self {
        Self::default()
    }

    fn chain_count(&self) -> usize {
        self.chain_sends.borrow().len()
    }

    fn last_chain(&self) -> Vec<u64> {
        self.chain_sends.borrow().last().cloned().unwrap()
    }
}

#[derive(Debug)]
struct MockError;

impl GifTransport for MockBus {
    type Error = MockError;

    fn send_normal(&mut self, words: &[u64]) -> Result<(), Self::Error> {
        self.normal_sends.borrow_mut().push(words.to_vec());
        Ok(())
    }

    fn send_chain(&mut self, words: &[u64]) -> Result<(), Self::Error> {
        self.chain_sends.borrow_mut().push(words.to_vec());
        Ok(())
    }

    fn wait_idle(&mut self) {
        *self.idle_waits.borrow_mut() += 1;
    }
}

impl GraphControl for MockBus {
    fn set_output(&mut self, cfg: &DisplayConfig) {
        self.outputs.borrow_mut().push(*cfg);
    }

    fn wait_finish(&mut self) {
        *self.finish_waits.borrow_mut() += 1;
    }

    fn wait_vsync(&mut self) {
        *self.vsync_waits.borrow_mut() += 1;
    }
}

fn make_context() -> (GsContext<MockBus>, MockBus) {
    let bus = MockBus::new();
    let ctx = GsContext::new(bus.clone(), 640, 480).unwrap();
    (ctx, bus)
}

/// Walk a captured packet and collect its address+data register writes as
/// (address, data) pairs, skipping over any other content.
fn ad_writes(words: &[u64]) -> Vec<(u64, u64)> {
    let tag = gif::ad_tag(1);
    let mut out = Vec::new();
    let mut i = 0;
    while i + 3 < words.len() {
        if words[i] == tag.lo && words[i + 1] == tag.hi {
            out.push((words[i + 3], words[i + 2]));
            i += 4;
        } else {
            i += 2;
        }
    }
    out
}

fn writes_to(words: &[u64], reg: u64) -> Vec<u64> {
    ad_writes(words)
        .into_iter()
        .filter(|(a, _)| *a == reg)
        .map(|(_, d)| d)
        .collect()
}

fn checker_bitmap(pixels: &mut Vec<u32>) -> Bitmap<'_> {
    for i in 0..64 * 64 {
        pixels.push(if (i / 64 + i % 64) % 2 == 0 { 0xFFFF_FFFF } else { 0xFF00_0000 });
    }
    Bitmap {
        width: 64,
        height: 64,
        pixels,
    }
}

/// Fill the first four vertices of a locked buffer with an on-screen quad.
fn write_visible_quad(storage: &mut [u8]) {
    let corners = [
        (-0.5f32, -0.5f32, 0.0f32, 0.0f32),
        (0.5, -0.5, 1.0, 0.0),
        (0.5, 0.5, 1.0, 1.0),
        (-0.5, 0.5, 0.0, 1.0),
    ];
    for (i, (x, y, u, v)) in corners.into_iter().enumerate() {
        let vert = VertexTextured {
            x,
            y,
            z: 0.0,
            color: 0xFFFF_FFFF,
            u,
            v,
        };
        let stride = VertexFormat::Textured.stride();
        storage[i * stride..(i + 1) * stride].copy_from_slice(&vert.to_bytes());
    }
}

mod startup {
    use super::*;

    #[test]
    fn display_programmed_with_color_surface() {
        let (_ctx, bus) = make_context();
        let outputs = bus.outputs.borrow();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].address, 0, "color surface sits at the base of device memory");
        assert_eq!(outputs[0].width, 640);
        assert_eq!(outputs[0].height, 480);
    }

    #[test]
    fn drawing_env_sent_as_one_normal_transfer() {
        let (_ctx, bus) = make_context();
        let sends = bus.normal_sends.borrow();
        assert_eq!(sends.len(), 1);
        let env = &sends[0];

        // 640x480 color at page 0, depth right after (150 pages in).
        assert_eq!(writes_to(env, regs::FRAME_1), vec![regs::frame(0, 10, regs::PSM_32, 0)]);
        assert_eq!(writes_to(env, regs::ZBUF_1), vec![regs::zbuf(150, regs::ZBUF_32, false)]);
        // Origin offset centers the viewport in the 4096 range.
        assert_eq!(
            writes_to(env, regs::XYOFFSET_1),
            vec![regs::xyoffset((2048 - 320) * 16, (2048 - 240) * 16)]
        );
        assert_eq!(
            writes_to(env, regs::SCISSOR_1),
            vec![regs::scissor(0, 639, 0, 479)]
        );
        assert_eq!(writes_to(env, regs::PRMODECONT), vec![1]);
        assert_eq!(writes_to(env, regs::TEST_1).len(), 1, "default tests committed");
        assert_eq!(writes_to(env, regs::FINISH).len(), 1);
    }

    #[test]
    fn fallback_texture_is_live_from_the_start() {
        let (ctx, _bus) = make_context();
        assert_eq!(ctx.live_textures(), 1);
    }
}

mod frame_lifecycle {
    use super::*;

    #[test]
    fn packets_alternate_each_frame() {
        let (mut ctx, _bus) = make_context();
        assert_eq!(ctx.active_packet_index(), 0);
        ctx.end_frame().unwrap();
        assert_eq!(ctx.active_packet_index(), 1);
        ctx.end_frame().unwrap();
        assert_eq!(ctx.active_packet_index(), 0);
        ctx.end_frame().unwrap();
        assert_eq!(ctx.active_packet_index(), 1);
    }

    #[test]
    fn submitted_packet_is_in_flight_and_the_other_writable() {
        let (mut ctx, _bus) = make_context();
        ctx.end_frame().unwrap();
        assert_eq!(ctx.packet_state(0), PacketState::InFlight);
        assert_eq!(ctx.packet_state(1), PacketState::Filling);
    }

    #[test]
    fn cursor_resets_on_flip() {
        let (mut ctx, _bus) = make_context();
        ctx.clear().unwrap();
        let filled = ctx.active_packet_len();
        assert!(filled > 2);
        ctx.end_frame().unwrap();
        assert_eq!(ctx.active_packet_len(), 2, "descriptor header only");
    }

    #[test]
    fn frame_chain_descriptor_records_payload_length() {
        let (mut ctx, bus) = make_context();
        ctx.end_frame().unwrap();
        let chain = bus.last_chain();
        let qwc = chain[0] & 0xFFFF;
        assert_eq!(qwc as usize, (chain.len() - 2) / 2);
        assert_eq!((chain[0] >> 28) & 0x7, 0x7, "terminating descriptor");
    }

    #[test]
    fn end_frame_finishes_with_a_finish_write() {
        let (mut ctx, bus) = make_context();
        ctx.end_frame().unwrap();
        let chain = bus.last_chain();
        assert_eq!(writes_to(&chain, regs::FINISH).len(), 1);
        assert_eq!(*bus.finish_waits.borrow(), 1);
    }

    #[test]
    fn vsync_waited_only_when_enabled() {
        let (mut ctx, bus) = make_context();
        ctx.end_frame().unwrap();
        assert_eq!(*bus.vsync_waits.borrow(), 0);
        ctx.set_fps_limit(true, 0.0);
        ctx.end_frame().unwrap();
        assert_eq!(*bus.vsync_waits.borrow(), 1);
    }
}

mod clearing {
    use super::*;

    #[test]
    fn clear_fills_the_framebuffer_extent() {
        let (mut ctx, bus) = make_context();
        ctx.set_clear_color(255, 0, 0);
        ctx.clear().unwrap();
        ctx.end_frame().unwrap();
        let chain = bus.last_chain();

        assert_eq!(
            writes_to(&chain, regs::RGBAQ),
            vec![regs::rgbaq(255, 0, 0, 0x80, 1.0)]
        );
        // Sprite corners: viewport extent around the 2048 origin, 12.4 fixed.
        assert_eq!(
            writes_to(&chain, regs::XYZ2),
            vec![
                regs::xyz2(27648, 28928, 0),
                regs::xyz2(37888, 36608, 0),
            ]
        );
        let prims = writes_to(&chain, regs::PRIM);
        assert_eq!(prims, vec![regs::PRIM_SPRITE]);
    }

    #[test]
    fn clear_disables_then_restores_the_pixel_tests() {
        let (mut ctx, bus) = make_context();
        ctx.set_depth_test(true);
        ctx.clear().unwrap();
        ctx.end_frame().unwrap();
        let tests = writes_to(&bus.last_chain(), regs::TEST_1);
        assert_eq!(tests.len(), 2);
        assert_eq!((tests[0] >> 17) & 0x3, regs::ZTST_ALWAYS, "all-pass for the fill");
        assert_eq!((tests[1] >> 17) & 0x3, regs::ZTST_GEQUAL, "current state restored");
    }
}

mod state_caching {
    use super::*;

    fn context_with_quad() -> (GsContext<MockBus>, MockBus) {
        let (mut ctx, bus) = make_context();
        let vb = ctx.create_dynamic_vb(VertexFormat::Textured, 4);
        write_visible_quad(ctx.lock_vb(vb).unwrap());
        ctx.unlock_vb(vb);
        (ctx, bus)
    }

    #[test]
    fn test_state_emitted_once_across_draws() {
        let (mut ctx, bus) = context_with_quad();
        ctx.set_depth_test(true);
        ctx.draw_vb_indexed_tris(4).unwrap();
        ctx.draw_vb_indexed_tris(4).unwrap();
        ctx.end_frame().unwrap();
        let tests = writes_to(&bus.last_chain(), regs::TEST_1);
        assert_eq!(tests.len(), 1, "second draw reuses the committed state");
    }

    #[test]
    fn unchanged_state_emits_nothing() {
        let (mut ctx, bus) = context_with_quad();
        ctx.draw_vb_indexed_tris(4).unwrap();
        ctx.end_frame().unwrap();
        assert_eq!(writes_to(&bus.last_chain(), regs::TEST_1).len(), 0);
    }

    #[test]
    fn toggling_state_reemits() {
        let (mut ctx, bus) = context_with_quad();
        ctx.set_depth_test(true);
        ctx.draw_vb_indexed_tris(4).unwrap();
        ctx.set_depth_test(false);
        ctx.draw_vb_indexed_tris(4).unwrap();
        ctx.end_frame().unwrap();
        assert_eq!(writes_to(&bus.last_chain(), regs::TEST_1).len(), 2);
    }
}

mod drawing {
    use super::*;

    #[test]
    fn quad_draw_lands_in_the_frame_chain() {
        let (mut ctx, bus) = make_context();
        let vb = ctx.create_dynamic_vb(VertexFormat::Textured, 4);
        write_visible_quad(ctx.lock_vb(vb).unwrap());
        ctx.unlock_vb(vb);

        let before = ctx.active_packet_len();
        ctx.draw_vb_indexed_tris(4).unwrap();
        // Two textured triangles, 8 qwords each.
        assert_eq!(ctx.active_packet_len() - before, 32);

        ctx.end_frame().unwrap();
        let chain = bus.last_chain();
        let reglist = gif::reglist_tag(3, 3, gif::REGLIST_STQ);
        let tags = chain
            .chunks(2)
            .filter(|q| q[0] == reglist.lo && q[1] == reglist.hi)
            .count();
        assert_eq!(tags, 2);
    }

    #[test]
    fn draw_without_a_bound_buffer_is_a_no_op() {
        let (mut ctx, _bus) = make_context();
        let before = ctx.active_packet_len();
        ctx.draw_vb_indexed_tris(4).unwrap();
        assert_eq!(ctx.active_packet_len(), before);
    }

    #[test]
    fn draw_through_a_deleted_buffer_fails() {
        let (mut ctx, _bus) = make_context();
        let vb = ctx.create_static_vb(VertexFormat::Textured, 4);
        let mut handle = Some(vb);
        ctx.delete_vb(&mut handle);
        ctx.bind_vb(vb);
        let err = ctx.draw_vb_indexed_tris(4).unwrap_err();
        assert!(matches!(err, GsError::StaleHandle));
    }

    #[test]
    fn deleting_the_bound_buffer_unbinds_it() {
        let (mut ctx, _bus) = make_context();
        let vb = ctx.create_static_vb(VertexFormat::Textured, 4);
        ctx.bind_vb(vb);
        let mut handle = Some(vb);
        ctx.delete_vb(&mut handle);
        assert!(ctx.draw_vb_indexed_tris(4).is_ok(), "draw degrades to a no-op");
    }

    #[test]
    fn tiny_packet_overflows_cleanly() {
        let bus = MockBus::new();
        let mut ctx = GsContext::with_packet_capacity(bus, 640, 480, 4).unwrap();
        let err = ctx.clear().unwrap_err();
        assert!(matches!(err, GsError::PacketOverflow { .. }));
    }
}

mod textures {
    use super::*;

    #[test]
    fn bind_uploads_then_installs_the_descriptor() {
        let (mut ctx, bus) = make_context();
        let mut pixels = Vec::new();
        let bmp = checker_bitmap(&mut pixels);
        let tex = ctx.create_texture(&bmp, 0, false);

        let chains_before = bus.chain_count();
        ctx.bind_texture(Some(tex)).unwrap();
        // Flush of the frame so far, then the transfer packet.
        assert_eq!(bus.chain_count(), chains_before + 2);

        let upload = bus.last_chain();
        assert_eq!(writes_to(&upload, regs::TRXREG), vec![regs::trxreg(64, 64)]);
        assert_eq!(
            writes_to(&upload, regs::TRXDIR),
            vec![regs::TRXDIR_HOST_TO_LOCAL]
        );
        assert_eq!(writes_to(&upload, regs::TEXFLUSH).len(), 1);

        ctx.end_frame().unwrap();
        // Staging area follows the two 150-page framebuffers: block 9600.
        // 64x64: buffer width clamps up to 256 texels, log2 dims 6.
        assert_eq!(
            writes_to(&bus.last_chain(), regs::TEX0_1),
            vec![regs::tex0(9600, 4, regs::PSM_32, 6, 6, regs::TCC_RGBA, regs::TFX_MODULATE)]
        );
    }

    #[test]
    fn binding_none_is_the_white_fallback() {
        let (mut ctx, bus) = make_context();
        ctx.bind_texture(None).unwrap();
        ctx.end_frame().unwrap();
        let from_none = writes_to(&bus.last_chain(), regs::TEX0_1);

        let (mut ctx2, bus2) = make_context();
        let fallback = ctx2.fallback_texture();
        ctx2.bind_texture(Some(fallback)).unwrap();
        ctx2.end_frame().unwrap();
        let from_handle = writes_to(&bus2.last_chain(), regs::TEX0_1);

        assert_eq!(from_none, from_handle);
    }

    #[test]
    fn rebinding_the_same_handle_skips_the_upload() {
        let (mut ctx, bus) = make_context();
        let mut pixels = Vec::new();
        let tex = ctx.create_texture(&checker_bitmap(&mut pixels), 0, false);
        ctx.bind_texture(Some(tex)).unwrap();
        let after_first = bus.chain_count();
        ctx.bind_texture(Some(tex)).unwrap();
        assert_eq!(bus.chain_count(), after_first);
    }

    #[test]
    fn binding_a_different_handle_uploads_again() {
        let (mut ctx, bus) = make_context();
        let mut p1 = Vec::new();
        let mut p2 = Vec::new();
        let t1 = ctx.create_texture(&checker_bitmap(&mut p1), 0, false);
        let t2 = ctx.create_texture(&checker_bitmap(&mut p2), 0, false);
        ctx.bind_texture(Some(t1)).unwrap();
        let after_first = bus.chain_count();
        ctx.bind_texture(Some(t2)).unwrap();
        assert_eq!(bus.chain_count(), after_first + 2);
    }

    #[test]
    fn the_bind_cache_clears_at_end_of_frame() {
        let (mut ctx, bus) = make_context();
        let mut pixels = Vec::new();
        let tex = ctx.create_texture(&checker_bitmap(&mut pixels), 0, false);
        ctx.bind_texture(Some(tex)).unwrap();
        ctx.end_frame().unwrap();
        let after_frame = bus.chain_count();
        ctx.bind_texture(Some(tex)).unwrap();
        assert_eq!(bus.chain_count(), after_frame + 2, "next frame re-uploads");
    }

    #[test]
    fn binding_a_deleted_texture_fails() {
        let (mut ctx, _bus) = make_context();
        let mut pixels = Vec::new();
        let tex = ctx.create_texture(&checker_bitmap(&mut pixels), 0, false);
        let mut handle = Some(tex);
        ctx.delete_texture(&mut handle);
        let err = ctx.bind_texture(Some(tex)).unwrap_err();
        assert!(matches!(err, GsError::StaleHandle));
    }

    #[test]
    fn delete_is_idempotent_and_nulls_the_handle() {
        let (mut ctx, _bus) = make_context();
        let mut pixels = Vec::new();
        let tex = ctx.create_texture(&checker_bitmap(&mut pixels), 0, false);
        assert_eq!(ctx.live_textures(), 2);
        let mut handle = Some(tex);
        ctx.delete_texture(&mut handle);
        assert!(handle.is_none());
        ctx.delete_texture(&mut handle);
        assert_eq!(ctx.live_textures(), 1, "only the fallback remains");
    }

    #[test]
    fn partial_update_lands_in_the_next_upload() {
        let (mut ctx, bus) = make_context();
        let mut pixels = Vec::new();
        let tex = ctx.create_texture(&checker_bitmap(&mut pixels), 0, false);

        let patch = [0x1234_5678u32; 4];
        ctx.update_texture_part(
            tex,
            0,
            0,
            &Bitmap {
                width: 2,
                height: 2,
                pixels: &patch,
            },
        )
        .unwrap();

        ctx.bind_texture(Some(tex)).unwrap();
        let upload = bus.last_chain();
        // First data dword of the image payload carries texels (0,0) and (1,0).
        let image = gif::image_tag(64 * 64 / 4);
        let pos = upload
            .chunks(2)
            .position(|q| q[0] == image.lo && q[1] == image.hi)
            .unwrap();
        let first = upload[(pos + 1) * 2];
        assert_eq!(first, 0x1234_5678 | (0x1234_5678u64 << 32));
    }

    #[test]
    fn out_of_bounds_update_is_rejected() {
        let (mut ctx, _bus) = make_context();
        let mut pixels = Vec::new();
        let tex = ctx.create_texture(&checker_bitmap(&mut pixels), 0, false);
        let patch = [0u32; 16];
        let result = ctx.update_texture_part(
            tex,
            62,
            62,
            &Bitmap {
                width: 4,
                height: 4,
                pixels: &patch,
            },
        );
        assert!(result.is_err());
    }
}
