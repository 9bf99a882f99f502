//! View/projection matrix state with a cached combined product.
//!
//! Matrices follow the usual column convention (`clip = m * v`); the
//! combined transform is recomputed whenever either input is loaded and is
//! read by every vertex transform.

use glam::Mat4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixType {
    View,
    Projection,
}

pub struct MatrixState {
    view: Mat4,
    projection: Mat4,
    combined: Mat4,
}

impl Default for MatrixState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixState {
    pub fn new() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            combined: Mat4::IDENTITY,
        }
    }

    pub fn load(&mut self, ty: MatrixType, m: &Mat4) {
        match ty {
            MatrixType::View => self.view = *m,
            MatrixType::Projection => self.projection = *m,
        }
        self.combined = self.projection * self.view;
    }

    pub fn load_identity(&mut self, ty: MatrixType) {
        self.load(ty, &Mat4::IDENTITY);
    }

    pub fn combined(&self) -> &Mat4 {
        &self.combined
    }
}

/// Orthographic projection over (0,0)..(width,height), Y down.
pub fn calc_ortho(width: f32, height: f32, z_near: f32, z_far: f32) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.x_axis.x = 2.0 / width;
    m.y_axis.y = -2.0 / height;
    m.z_axis.z = -2.0 / (z_far - z_near);
    m.w_axis.x = -1.0;
    m.w_axis.y = 1.0;
    m.w_axis.z = -(z_far + z_near) / (z_far - z_near);
    m
}

/// Perspective projection from vertical FOV and aspect ratio.
///
/// The near plane takes the supplied `z_far` and the far plane is a fixed
/// 0.1, swapped relative to a conventional frustum. Depth output lands in
/// the range expected by the greater-or-equal depth test setup.
pub fn calc_perspective(fov: f32, aspect: f32, z_far: f32) -> Mat4 {
    let near = z_far;
    let far = 0.1;
    let c = 1.0 / (0.5 * fov).tan();

    let mut m = Mat4::IDENTITY;
    m.x_axis.x = c / aspect;
    m.y_axis.y = c;
    m.z_axis.z = -(far + near) / (far - near);
    m.z_axis.w = -1.0;
    m.w_axis.z = -(2.0 * far * near) / (far - near);
    m.w_axis.w = 0.0;
    m
}
