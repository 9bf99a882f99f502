//! The rendering context: display setup, frame lifecycle, and the public
//! operation surface consumed by the engine.
//!
//! Owns the transport, the packet ring, resource arenas, matrix state, and
//! the render-state cache. Single-threaded by design: the only concurrency
//! is between this CPU producer and the hardware consumer, coupled through
//! the double buffer and unconditional blocking waits at submission points.

use std::thread;
use std::time::{Duration, Instant};

use ee_gs_hal::{DisplayConfig, GifTransport, GraphControl};
use glam::Mat4;

use crate::buffer::{BufferArena, BufferId, IndexBufferId, VertexFormat};
use crate::error::GsError;
use crate::gs::{fixed, regs, ORIGIN};
use crate::matrix::{MatrixState, MatrixType};
use crate::packet::{Packet, PacketRing, PacketState, HEADER_WORDS};
use crate::pipeline::{self, Viewport};
use crate::state::RenderState;
use crate::texture::{Bitmap, TextureArena, TextureId};
use crate::vram::{VramAlign, VramAllocator};

/// Command qwords per packet side; sized for a typical frame's triangles.
pub const DEFAULT_PACKET_QWORDS: usize = 20000;

/// Setup commands fit comfortably in a throwaway packet this size.
const ENV_PACKET_QWORDS: usize = 30;

/// Largest supported texture edge; also sizes the upload staging area.
pub const MAX_TEXTURE_DIM: u32 = 512;

/// Texture uploads land at least this wide so the buffer width field stays
/// in range for small textures.
const MIN_TEXTURE_BUFFER_WIDTH: u32 = 256;

pub struct GsContext<T: GifTransport + GraphControl> {
    transport: T,
    ring: PacketRing,
    vram: VramAllocator,
    fb_color: u32,
    fb_depth: u32,
    staging: u32,
    width: u32,
    height: u32,
    viewport: Viewport,
    textures: TextureArena,
    white: TextureId,
    /// Texture already programmed this frame; a re-bind of the same handle
    /// is skipped, a different handle does the full upload. Cleared at
    /// `end_frame`.
    bound_texture: Option<TextureId>,
    buffers: BufferArena,
    bound_vb: Option<BufferId>,
    matrices: MatrixState,
    state: RenderState,
    vsync: bool,
    min_frame_ms: f32,
    last_frame: Instant,
}

impl<T: GifTransport + GraphControl> GsContext<T> {
    pub fn new(transport: T, width: u32, height: u32) -> Result<Self, GsError<T::Error>> {
        Self::with_packet_capacity(transport, width, height, DEFAULT_PACKET_QWORDS)
    }

    /// Create a context with an explicit per-packet command capacity.
    pub fn with_packet_capacity(
        mut transport: T,
        width: u32,
        height: u32,
        packet_qwords: usize,
    ) -> Result<Self, GsError<T::Error>> {
        let mut vram = VramAllocator::new();
        let fb_color = vram
            .alloc(width, height, VramAlign::Page)
            .ok_or(GsError::OutOfVram)?;
        let fb_depth = vram
            .alloc(width, height, VramAlign::Page)
            .ok_or(GsError::OutOfVram)?;
        let staging = vram
            .alloc(MAX_TEXTURE_DIM, MAX_TEXTURE_DIM, VramAlign::Page)
            .ok_or(GsError::OutOfVram)?;

        transport.set_output(&DisplayConfig {
            address: fb_color,
            width,
            height,
            psm: regs::PSM_32 as u8,
        });

        let viewport = Viewport {
            half_width: width as f32 / 2.0,
            half_height: height as f32 / 2.0,
        };

        // 16x16 opaque-white fallback, substituted when no texture is bound.
        let mut textures = TextureArena::new();
        let white_pixels = vec![0xFFFF_FFFFu32; 16 * 16];
        let white = textures.create(&Bitmap {
            width: 16,
            height: 16,
            pixels: &white_pixels,
        });

        let mut context = Self {
            transport,
            ring: PacketRing::new(packet_qwords),
            vram,
            fb_color,
            fb_depth,
            staging,
            width,
            height,
            viewport,
            textures,
            white,
            bound_texture: None,
            buffers: BufferArena::new(),
            bound_vb: None,
            matrices: MatrixState::new(),
            state: RenderState::new(),
            vsync: false,
            min_frame_ms: 0.0,
            last_frame: Instant::now(),
        };

        context.init_drawing_env()?;
        context.ring.flip();

        log::info!(
            "gs context created: {}x{}, {} qwords per packet, {} vram words used",
            width,
            height,
            packet_qwords,
            context.vram.used_words()
        );
        Ok(context)
    }

    /// One-time drawing environment, sent through a throwaway packet:
    /// surfaces, origin offset centering the viewport in the addressable
    /// range, scissor, default tests, wrap and sampling modes.
    fn init_drawing_env(&mut self) -> Result<(), GsError<T::Error>> {
        let mut env = Packet::new(ENV_PACKET_QWORDS);

        let e = GsError::overflow;
        env.push_reg(regs::PRMODECONT, regs::prmodecont()).map_err(e)?;
        env.push_reg(
            regs::FRAME_1,
            regs::frame(
                (self.fb_color / 2048) as u64,
                (self.width / 64) as u64,
                regs::PSM_32,
                0,
            ),
        )
        .map_err(e)?;
        env.push_reg(
            regs::ZBUF_1,
            regs::zbuf((self.fb_depth / 2048) as u64, regs::ZBUF_32, false),
        )
        .map_err(e)?;
        env.push_reg(
            regs::XYOFFSET_1,
            regs::xyoffset(
                fixed::f32_to_12_4(ORIGIN - self.viewport.half_width),
                fixed::f32_to_12_4(ORIGIN - self.viewport.half_height),
            ),
        )
        .map_err(e)?;
        env.push_reg(
            regs::SCISSOR_1,
            regs::scissor(0, (self.width - 1) as u64, 0, (self.height - 1) as u64),
        )
        .map_err(e)?;
        env.push_reg(
            regs::CLAMP_1,
            regs::clamp(regs::WRAP_REPEAT, regs::WRAP_REPEAT),
        )
        .map_err(e)?;
        env.push_reg(regs::TEX1_1, regs::tex1(0, 0, true, true)).map_err(e)?;
        self.state.commit_force(&mut env).map_err(e)?;
        env.push_reg(regs::FINISH, 0).map_err(e)?;

        self.transport.send_normal(&env.words()[HEADER_WORDS..])?;
        self.transport.wait_idle();
        Ok(())
    }

    /// Tear down the context. Resources not shared with hardware are simply
    /// dropped; any in-flight packet is left to drain.
    pub fn free(self) {
        log::info!("gs context freed");
    }

    // --- Textures -------------------------------------------------------

    /// Allocate a host-side texture record and copy the pixels in. The
    /// mipmap flag is accepted and ignored.
    pub fn create_texture(&mut self, bmp: &Bitmap<'_>, _flags: u8, _mipmaps: bool) -> TextureId {
        log::debug!("create texture {}x{}", bmp.width, bmp.height);
        self.textures.create(bmp)
    }

    /// Upload and install a texture. `None` binds the built-in white
    /// fallback. A handle already programmed this frame is skipped.
    pub fn bind_texture(&mut self, id: Option<TextureId>) -> Result<(), GsError<T::Error>> {
        let id = id.unwrap_or(self.white);
        if self.bound_texture == Some(id) {
            return Ok(());
        }
        let (width, height, log2_w, log2_h) = {
            let tex = self.textures.get(id).ok_or(GsError::StaleHandle)?;
            (tex.width, tex.height, tex.log2_width, tex.log2_height)
        };
        log::debug!("bind texture {}x{}", width, height);

        // Flush what the frame has built so far; the upload must land
        // before any draw that samples it.
        {
            let packet = self.ring.active_mut();
            packet.finalize();
            self.transport.wait_idle();
            self.transport.send_chain(packet.words())?;
            self.transport.wait_idle();
        }

        let buf_width = width.max(MIN_TEXTURE_BUFFER_WIDTH);
        self.upload_texture(id, buf_width)?;
        self.transport.wait_idle();

        // The submitted content is on its way; restart the main packet and
        // install the texture descriptor.
        let packet = self.ring.active_mut();
        packet.reset();
        packet
            .push_reg(
                regs::TEX0_1,
                regs::tex0(
                    (self.staging / 64) as u64,
                    (buf_width / 64) as u64,
                    regs::PSM_32,
                    log2_w as u64,
                    log2_h as u64,
                    regs::TCC_RGBA,
                    regs::TFX_MODULATE,
                ),
            )
            .map_err(GsError::overflow)?;

        self.bound_texture = Some(id);
        Ok(())
    }

    /// Build and send the transient host-to-device pixel transfer packet.
    fn upload_texture(&mut self, id: TextureId, buf_width: u32) -> Result<(), GsError<T::Error>> {
        let tex = self.textures.get(id).ok_or(GsError::StaleHandle)?;
        let pixel_qwords = tex.pixels.len().div_ceil(4);

        // Payload plus transfer setup, image tag, pad, and flush.
        let mut up = Packet::new(pixel_qwords + 16);
        let e = GsError::overflow;
        up.push_reg(
            regs::BITBLTBUF,
            regs::bitbltbuf_dest(
                (self.staging / 64) as u64,
                (buf_width / 64) as u64,
                regs::PSM_32,
            ),
        )
        .map_err(e)?;
        up.push_reg(regs::TRXPOS, regs::trxpos_dest(0, 0)).map_err(e)?;
        up.push_reg(regs::TRXREG, regs::trxreg(tex.width as u64, tex.height as u64))
            .map_err(e)?;
        up.push_reg(regs::TRXDIR, regs::trxdir(regs::TRXDIR_HOST_TO_LOCAL))
            .map_err(e)?;

        up.push_qword(crate::gif::image_tag(pixel_qwords as u64)).map_err(e)?;
        for pair in tex.pixels.chunks(2) {
            let lo = pair[0] as u64;
            let hi = pair.get(1).copied().unwrap_or(0) as u64;
            up.push_dword(lo | (hi << 32)).map_err(e)?;
        }
        if up.len_words() % 2 != 0 {
            up.push_dword(0).map_err(e)?;
        }
        up.push_reg(regs::TEXFLUSH, 0).map_err(e)?;
        up.finalize();

        self.transport.send_chain(up.words())?;
        Ok(())
    }

    /// Copy a sub-rectangle into the texture record. Takes effect on the
    /// next bind, which re-uploads the whole texture.
    pub fn update_texture_part(
        &mut self,
        id: TextureId,
        x: u32,
        y: u32,
        part: &Bitmap<'_>,
    ) -> Result<(), GsError<T::Error>> {
        if self.textures.update_part(id, x, y, part) {
            Ok(())
        } else {
            Err(GsError::StaleHandle)
        }
    }

    /// Full-row variant of [`Self::update_texture_part`].
    pub fn update_texture(
        &mut self,
        id: TextureId,
        x: u32,
        y: u32,
        part: &Bitmap<'_>,
    ) -> Result<(), GsError<T::Error>> {
        self.update_texture_part(id, x, y, part)
    }

    /// Free the record and null the handle; idempotent on `None`.
    pub fn delete_texture(&mut self, id: &mut Option<TextureId>) {
        if let Some(t) = id.take() {
            self.textures.delete(t);
        }
    }

    pub fn set_texturing(&mut self, _enabled: bool) {}
    pub fn enable_mipmaps(&mut self) {}
    pub fn disable_mipmaps(&mut self) {}

    // --- Vertex and index buffers ---------------------------------------

    pub fn create_static_vb(&mut self, format: VertexFormat, count: usize) -> BufferId {
        self.buffers.create(format, count)
    }

    pub fn create_dynamic_vb(&mut self, format: VertexFormat, max_vertices: usize) -> BufferId {
        self.buffers.create(format, max_vertices)
    }

    /// Identity lock: returns the buffer storage for the caller to fill.
    pub fn lock_vb(&mut self, id: BufferId) -> Result<&mut [u8], GsError<T::Error>> {
        self.buffers.lock(id).ok_or(GsError::StaleHandle)
    }

    /// Unlocking rebinds the buffer for subsequent draws.
    pub fn unlock_vb(&mut self, id: BufferId) {
        self.bound_vb = Some(id);
    }

    pub fn bind_vb(&mut self, id: BufferId) {
        self.bound_vb = Some(id);
    }

    pub fn bind_dynamic_vb(&mut self, id: BufferId) {
        self.bind_vb(id);
    }

    pub fn lock_dynamic_vb(&mut self, id: BufferId) -> Result<&mut [u8], GsError<T::Error>> {
        self.lock_vb(id)
    }

    pub fn unlock_dynamic_vb(&mut self, id: BufferId) {
        self.unlock_vb(id);
    }

    pub fn delete_vb(&mut self, id: &mut Option<BufferId>) {
        if let Some(b) = id.take() {
            if self.bound_vb == Some(b) {
                self.bound_vb = None;
            }
            self.buffers.delete(b);
        }
    }

    pub fn delete_dynamic_vb(&mut self, id: &mut Option<BufferId>) {
        self.delete_vb(id);
    }

    /// Index buffers are not consumed by this backend; the handle is a
    /// placeholder for API parity.
    pub fn create_ib2(&mut self, _count: usize) -> IndexBufferId {
        IndexBufferId(1)
    }

    pub fn bind_ib(&mut self, _id: IndexBufferId) {}
    pub fn delete_ib(&mut self, _id: &mut Option<IndexBufferId>) {}

    // --- Matrices --------------------------------------------------------

    pub fn load_matrix(&mut self, ty: MatrixType, m: &Mat4) {
        self.matrices.load(ty, m);
    }

    pub fn load_identity_matrix(&mut self, ty: MatrixType) {
        self.matrices.load_identity(ty);
    }

    // --- Render state ----------------------------------------------------

    pub fn set_vertex_format(&mut self, format: VertexFormat) {
        self.state.format = format;
    }

    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.state.set_alpha_test(enabled);
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.state.set_depth_test(enabled);
    }

    pub fn set_alpha_blending(&mut self, enabled: bool) {
        self.state.alpha_blend = enabled;
    }

    pub fn set_clear_color(&mut self, r: u8, g: u8, b: u8) {
        self.state.clear_color = [r, g, b];
    }

    pub fn set_alpha_arg_blend(&mut self, _enabled: bool) {}
    pub fn set_face_culling(&mut self, _enabled: bool) {}
    pub fn set_col_write_mask(&mut self, _r: bool, _g: bool, _b: bool, _a: bool) {}
    pub fn set_depth_write(&mut self, _enabled: bool) {}
    pub fn depth_only_rendering(&mut self, _depth_only: bool) {}
    pub fn set_fog(&mut self, _enabled: bool) {}
    pub fn set_fog_color(&mut self, _color: u32) {}
    pub fn set_fog_density(&mut self, _value: f32) {}
    pub fn set_fog_end(&mut self, _value: f32) {}
    pub fn set_fog_mode(&mut self, _mode: u32) {}

    /// Disable the pixel tests, fill the full framebuffer with the stored
    /// clear color, then re-apply the current test state.
    pub fn clear(&mut self) -> Result<(), GsError<T::Error>> {
        let [r, g, b] = self.state.clear_color;
        let x0 = fixed::f32_to_12_4(ORIGIN - self.viewport.half_width);
        let y0 = fixed::f32_to_12_4(ORIGIN - self.viewport.half_height);
        let x1 = fixed::f32_to_12_4(ORIGIN + self.viewport.half_width);
        let y1 = fixed::f32_to_12_4(ORIGIN + self.viewport.half_height);

        let packet = self.ring.active_mut();
        let e = GsError::overflow;
        packet
            .push_reg(
                regs::TEST_1,
                regs::test(
                    true,
                    regs::ATST_ALWAYS,
                    0,
                    regs::AFAIL_FB_ONLY,
                    false,
                    false,
                    true,
                    regs::ZTST_ALWAYS,
                ),
            )
            .map_err(e)?;
        packet
            .push_reg(
                regs::PRIM,
                regs::prim(regs::PRIM_SPRITE, false, false, false, false, false, false, 0, false),
            )
            .map_err(e)?;
        packet
            .push_reg(regs::RGBAQ, regs::rgbaq(r, g, b, 0x80, 1.0))
            .map_err(e)?;
        packet.push_reg(regs::XYZ2, regs::xyz2(x0, y0, 0)).map_err(e)?;
        packet.push_reg(regs::XYZ2, regs::xyz2(x1, y1, 0)).map_err(e)?;

        self.state.commit_force(packet).map_err(e)?;
        Ok(())
    }

    // --- Drawing ---------------------------------------------------------

    /// Line topology is not rasterized by this backend.
    pub fn draw_vb_lines(&mut self, _vertices_count: usize) {}

    pub fn draw_vb_indexed_tris(&mut self, vertices_count: usize) -> Result<(), GsError<T::Error>> {
        self.draw_quads(vertices_count, 0)
    }

    pub fn draw_vb_indexed_tris_range(
        &mut self,
        vertices_count: usize,
        start_vertex: usize,
    ) -> Result<(), GsError<T::Error>> {
        self.draw_quads(vertices_count, start_vertex)
    }

    pub fn draw_indexed_tris_t2fc4b(
        &mut self,
        vertices_count: usize,
        start_vertex: usize,
    ) -> Result<(), GsError<T::Error>> {
        self.draw_quads(vertices_count, start_vertex)
    }

    fn draw_quads(&mut self, count: usize, start: usize) -> Result<(), GsError<T::Error>> {
        self.state
            .commit(self.ring.active_mut())
            .map_err(GsError::overflow)?;

        let Some(vb) = self.bound_vb else {
            return Ok(());
        };
        let (data, _) = self.buffers.get(vb).ok_or(GsError::StaleHandle)?;

        let emitted = pipeline::draw_quads(
            self.ring.active_mut(),
            self.matrices.combined(),
            data,
            self.state.format,
            start,
            count,
            self.viewport,
            self.state.alpha_blend,
        )
        .map_err(GsError::overflow)?;
        log::trace!("draw: {count} vertices, {emitted} triangles emitted");
        Ok(())
    }

    // --- Frame lifecycle -------------------------------------------------

    pub fn set_fps_limit(&mut self, vsync: bool, min_frame_ms: f32) {
        self.vsync = vsync;
        self.min_frame_ms = min_frame_ms;
    }

    /// The active packet is already writable from the prior flip.
    pub fn begin_frame(&mut self) {
        log::trace!("--- frame ---");
    }

    /// Finalize and submit the frame's packet, wait out the hardware, pace
    /// the frame, and flip to the other packet.
    pub fn end_frame(&mut self) -> Result<(), GsError<T::Error>> {
        self.bound_texture = None;

        let packet = self.ring.active_mut();
        packet.push_reg(regs::FINISH, 0).map_err(GsError::overflow)?;
        packet.finalize();

        // Block on whatever was previously in flight, then hand this packet
        // over; the new transfer drains while the next frame builds.
        self.transport.wait_idle();
        self.transport.send_chain(packet.words())?;

        self.transport.wait_finish();
        if self.vsync {
            self.transport.wait_vsync();
        }
        self.pace();
        self.ring.flip();
        Ok(())
    }

    fn pace(&mut self) {
        if self.min_frame_ms > 0.0 {
            let min = Duration::from_secs_f32(self.min_frame_ms / 1000.0);
            let elapsed = self.last_frame.elapsed();
            if elapsed < min {
                thread::sleep(min - elapsed);
            }
        }
        self.last_frame = Instant::now();
    }

    // --- Diagnostics -----------------------------------------------------

    pub fn api_info(&self) -> String {
        format!(
            "-- Using EE/GS --\nMax texture size: {d} x {d}",
            d = MAX_TEXTURE_DIM
        )
    }

    /// Capability probe; this backend never needs a warning dialog.
    pub fn warn_if_necessary(&self) -> bool {
        false
    }

    pub fn take_screenshot(&self) -> Result<(), GsError<T::Error>> {
        Err(GsError::Unsupported("screenshot"))
    }

    pub fn try_restore_context(&mut self) -> bool {
        true
    }

    pub fn on_window_resize(&mut self) {}

    /// Handle of the built-in white fallback texture.
    pub fn fallback_texture(&self) -> TextureId {
        self.white
    }

    pub fn active_packet_index(&self) -> usize {
        self.ring.active_index()
    }

    pub fn packet_state(&self, index: usize) -> PacketState {
        self.ring.state(index)
    }

    /// Words written to the active packet, descriptor header included.
    pub fn active_packet_len(&self) -> usize {
        self.ring.active().len_words()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.live_count()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.live_count()
    }
}
