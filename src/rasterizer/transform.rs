//! World / camera / projection transform stage

use super::math::{Mat4, Vec4};
use super::types::Vertex;

/// The combined transforms for one frame setup.
///
/// `view = camera * world` and `view_projection = projection * view` are
/// computed once here, never per vertex.
///
/// Normals are transformed by `view` directly rather than its inverse
/// transpose, which is only correct for rigid and uniform-scale transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub world: Mat4,
    pub camera: Mat4,
    pub projection: Mat4,
    view: Mat4,
    view_projection: Mat4,
    /// Viewport size in pixels
    pub width: f32,
    pub height: f32,
}

impl Transform {
    pub fn new(world: Mat4, camera: Mat4, projection: Mat4, width: usize, height: usize) -> Self {
        let mut t = Self {
            world,
            camera,
            projection,
            view: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            width: width as f32,
            height: height as f32,
        };
        t.update();
        t
    }

    /// Identity transforms: clip space equals local space
    pub fn identity(width: usize, height: usize) -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, width, height)
    }

    /// Recompute the combined matrices after editing world/camera/projection
    pub fn update(&mut self) {
        self.view = self.camera * self.world;
        self.view_projection = self.projection * self.view;
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    /// Local-space point into view space
    pub fn to_view(&self, p: Vec4) -> Vec4 {
        self.view * p
    }

    /// Project a local-space vertex: clip-space `pos_h`, view-space `pos`
    /// and `normal`. No divide happens here; that is `homogenize`, after
    /// clipping.
    pub fn project(&self, v: &Vertex) -> Vertex {
        Vertex {
            pos_h: self.view_projection * v.pos,
            pos: self.view * v.pos,
            normal: self.view * v.normal,
            ..*v
        }
    }

    /// Perspective divide and viewport mapping.
    ///
    /// `(x, y, z, w)` becomes `(screen x, screen y, z / w, 1 / w)` and the
    /// vertex's `rhw` is populated. Screen origin is top-left, so y flips.
    pub fn homogenize(&self, v: &mut Vertex) {
        let p = &mut v.pos_h;
        let rhw = 1.0 / p.w;
        p.x *= rhw;
        p.y *= rhw;
        p.z *= rhw;
        p.w = rhw;

        p.x = (p.x * 0.5 + 0.5) * self.width;
        p.y = (0.5 - p.y * 0.5) * self.height;
        v.rhw = rhw;
    }
}
