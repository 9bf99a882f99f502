//! PC debug host for the EE/GS backend.
//!
//! Single-threaded loop that renders a spinning textured quad against a
//! tracing transport, logging the command volume each frame. No hardware or
//! window required.

mod transport;

use anyhow::Context as _;
use ee_gs_core::{Bitmap, GsContext, MatrixType, VertexFormat, VertexTextured};
use glam::Mat4;
use transport::TraceTransport;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAMES: usize = 60;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("ee-gs-pc: debug host starting");

    let mut gfx = GsContext::new(TraceTransport::new(), WIDTH, HEIGHT)
        .context("context creation failed")?;
    log::info!("{}", gfx.api_info());

    // 64x64 checkerboard test texture.
    let pixels: Vec<u32> = (0..64u32 * 64)
        .map(|i| {
            let (x, y) = (i % 64, i / 64);
            if ((x / 8) + (y / 8)) % 2 == 0 {
                0xFFFF_FFFF
            } else {
                0xFF40_4040
            }
        })
        .collect();
    let tex = gfx.create_texture(
        &Bitmap {
            width: 64,
            height: 64,
            pixels: &pixels,
        },
        0,
        false,
    );

    let vb = gfx.create_dynamic_vb(VertexFormat::Textured, 4);
    gfx.set_vertex_format(VertexFormat::Textured);
    gfx.set_depth_test(true);
    gfx.set_clear_color(32, 32, 64);
    gfx.load_matrix(
        MatrixType::Projection,
        &ee_gs_core::matrix::calc_perspective(70f32.to_radians(), WIDTH as f32 / HEIGHT as f32, 100.0),
    );

    for frame in 0..FRAMES {
        gfx.begin_frame();
        gfx.clear().context("clear failed")?;

        let angle = frame as f32 * 0.05;
        gfx.load_matrix(
            MatrixType::View,
            &(Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -3.0)) * Mat4::from_rotation_y(angle)),
        );

        let quad = [
            VertexTextured { x: -1.0, y: -1.0, z: 0.0, color: 0xFFFF_FFFF, u: 0.0, v: 0.0 },
            VertexTextured { x: 1.0, y: -1.0, z: 0.0, color: 0xFFFF_FFFF, u: 1.0, v: 0.0 },
            VertexTextured { x: 1.0, y: 1.0, z: 0.0, color: 0xFFFF_FFFF, u: 1.0, v: 1.0 },
            VertexTextured { x: -1.0, y: 1.0, z: 0.0, color: 0xFFFF_FFFF, u: 0.0, v: 1.0 },
        ];
        {
            let dst = gfx.lock_vb(vb).context("lock failed")?;
            for (i, v) in quad.iter().enumerate() {
                dst[i * VertexTextured::STRIDE..(i + 1) * VertexTextured::STRIDE]
                    .copy_from_slice(&v.to_bytes());
            }
        }
        gfx.unlock_vb(vb);

        gfx.bind_texture(Some(tex)).context("bind failed")?;
        gfx.draw_vb_indexed_tris(4).context("draw failed")?;
        gfx.end_frame().context("end frame failed")?;
    }

    let mut tex = Some(tex);
    gfx.delete_texture(&mut tex);
    let mut vb = Some(vb);
    gfx.delete_dynamic_vb(&mut vb);
    log::info!("ee-gs-pc: {FRAMES} frames traced");
    gfx.free();
    Ok(())
}
