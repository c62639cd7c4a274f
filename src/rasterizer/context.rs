//! Render context: frame buffers, configuration and the per-frame passes
//!
//! A context is created once per output size and reused across frames.
//! Each frame runs `clear`, one or more `render_mesh` calls, then
//! `shade_fragments` and `pack_color_buffer` (`render_frame` does all four).

use std::sync::Arc;
use log::{debug, warn};
use crate::scene::Mesh;
use super::buffer::{FrameBuffers, PixelBuffer};
use super::clip::clip_triangle;
use super::error::RenderError;
use super::math::Mat4;
use super::scanline::draw_triangle;
use super::shader::{FragmentShader, ShadeContext, ShaderRegistry};
use super::texture::Texture;
use super::transform::Transform;
use super::types::{Color, Light, RenderMode, RenderSettings, Vertex};

/// Everything one frame of rendering reads and writes
#[derive(Debug)]
pub struct RenderContext {
    pub settings: RenderSettings,
    transform: Transform,
    texture: Option<Arc<Texture>>,
    shaders: ShaderRegistry,
    frame: FrameBuffers,
}

impl RenderContext {
    /// Allocate buffers for a `width` x `height` frame.
    ///
    /// Transforms start as identity and the `"default"` shader is registered.
    pub fn new(width: usize, height: usize) -> Self {
        debug!("allocating {}x{} frame buffers", width, height);
        Self {
            settings: RenderSettings::default(),
            transform: Transform::identity(width, height),
            texture: None,
            shaders: ShaderRegistry::with_builtin(),
            frame: FrameBuffers::new(width, height),
        }
    }

    pub fn with_settings(width: usize, height: usize, settings: RenderSettings) -> Self {
        let mut ctx = Self::new(width, height);
        ctx.settings = settings;
        ctx
    }

    pub fn width(&self) -> usize {
        self.frame.width
    }

    pub fn height(&self) -> usize {
        self.frame.height
    }

    /// Set world, camera and projection; the combined matrices are
    /// recomputed here once.
    pub fn set_transform(&mut self, world: Mat4, camera: Mat4, projection: Mat4) {
        self.transform = Transform::new(world, camera, projection, self.frame.width, self.frame.height);
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Set the light, given in the same space as mesh positions
    pub fn set_light(&mut self, light: Light) {
        self.settings.light = light;
    }

    /// The configured light with its position moved into view space
    pub fn light_view(&self) -> Light {
        Light {
            position: self.transform.to_view(self.settings.light.position),
            color: self.settings.light.color,
        }
    }

    pub fn set_texture(&mut self, texture: impl Into<Arc<Texture>>) {
        let texture = texture.into();
        debug!("texture set: {}x{}", texture.width, texture.height);
        self.texture = Some(texture);
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_deref()
    }

    pub fn register_shader<S>(&mut self, name: impl Into<String>, shader: S) -> Result<(), RenderError>
    where
        S: FragmentShader + 'static,
    {
        self.shaders.register(name, shader)
    }

    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    /// Per-frame reset of every buffer
    pub fn clear(&mut self) {
        self.frame.clear();
        debug!("frame cleared");
    }

    /// Transform, clip and rasterize a mesh into the frame buffers.
    ///
    /// Returns the number of pixels that passed the depth test. Panics if a
    /// triangle indexes past the vertex arrays.
    pub fn render_mesh(&mut self, mesh: &Mesh) -> usize {
        debug!(
            "rendering mesh: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        let vertices = mesh.assemble_vertices();
        self.draw_indexed(&vertices, &mesh.triangles)
    }

    /// Like `render_mesh`, over already assembled local-space vertices
    pub fn draw_indexed(&mut self, vertices: &[Vertex], triangles: &[[u32; 3]]) -> usize {
        if triangles.is_empty() {
            warn!("mesh has no triangles");
            return 0;
        }

        let projected: Vec<Vertex> = vertices.iter().map(|v| self.transform.project(v)).collect();

        let mut written = 0;
        for (i, tri) in triangles.iter().enumerate() {
            let [a, b, c] = tri.map(|idx| {
                let idx = idx as usize;
                assert!(
                    idx < projected.len(),
                    "triangle {} references vertex {} of {}",
                    i,
                    idx,
                    projected.len()
                );
                projected[idx]
            });
            written += self.draw_clip_triangle(&a, &b, &c);
        }

        debug!("drew {} triangles, {} pixels passed depth", triangles.len(), written);
        written
    }

    /// Rasterize one triangle given in clip space.
    ///
    /// Clips against the near plane, homogenizes and rhw-premultiplies the
    /// surviving vertices, then scan converts the fan.
    pub fn draw_clip_triangle(&mut self, a: &Vertex, b: &Vertex, c: &Vertex) -> usize {
        let mut poly = clip_triangle(a, b, c);
        for v in poly.vertices_mut() {
            self.transform.homogenize(v);
            v.premultiply_rhw();
        }

        let frame = &mut self.frame;
        poly.triangles()
            .map(|[v0, v1, v2]| draw_triangle(frame, &v0, &v1, &v2))
            .sum()
    }

    /// Resolve the final color of every hit pixel per the render mode
    pub fn shade_fragments(&mut self) -> Result<(), RenderError> {
        match self.settings.mode {
            RenderMode::Wireframe => Err(RenderError::WireframeUnsupported),
            RenderMode::VertexColor => {
                let FrameBuffers { hit, cells, .. } = &mut self.frame;
                for (cell, &h) in cells.as_mut_slice().iter_mut().zip(hit.as_slice()) {
                    if h != 0 {
                        cell.color = cell.vertex_color;
                    }
                }
                Ok(())
            }
            RenderMode::Shaded => {
                let texture = self.texture.as_deref().ok_or(RenderError::MissingTexture)?;
                let name = &self.settings.shader;
                let shader = self
                    .shaders
                    .get(name)
                    .ok_or_else(|| RenderError::UnknownShader(name.clone()))?;

                let ctx = ShadeContext {
                    light: self.light_view(),
                    material: self.settings.material,
                    sample_mode: self.settings.sample_mode,
                    texture: Some(texture),
                };
                debug!("shading with '{}'", name);

                let FrameBuffers { hit, cells, .. } = &mut self.frame;
                for (cell, &h) in cells.as_mut_slice().iter_mut().zip(hit.as_slice()) {
                    if h == 0 {
                        continue;
                    }
                    cell.diffuse = texture.sample(ctx.sample_mode, cell.uv.x, cell.uv.y);
                    shader.shade(&ctx, cell);
                }
                Ok(())
            }
        }
    }

    /// Pack final colors into the output buffer; pixels not hit become 0
    pub fn pack_color_buffer(&mut self) {
        let FrameBuffers { hit, cells, color, .. } = &mut self.frame;
        for ((out, &h), cell) in color
            .as_mut_slice()
            .iter_mut()
            .zip(hit.as_slice())
            .zip(cells.as_slice())
        {
            *out = if h != 0 { cell.color.to_packed() } else { 0 };
        }
    }

    /// Clear, draw `mesh`, shade and pack one full frame
    pub fn render_frame(&mut self, mesh: &Mesh) -> Result<usize, RenderError> {
        self.clear();
        let written = self.render_mesh(mesh);
        self.shade_fragments()?;
        self.pack_color_buffer();
        debug!("frame done: {} pixels hit", self.frame.hit_count());
        Ok(written)
    }

    pub fn frame(&self) -> &FrameBuffers {
        &self.frame
    }

    pub fn is_hit(&self, x: usize, y: usize) -> bool {
        self.frame.hit[(x, y)] != 0
    }

    pub fn depth(&self, x: usize, y: usize) -> f32 {
        self.frame.depth[(x, y)]
    }

    /// Packed 0x00BBGGRR output
    pub fn color_buffer(&self) -> &PixelBuffer<u32> {
        &self.frame.color
    }

    /// Output as tightly packed RGB8 rows
    pub fn rgb_bytes(&self) -> Vec<u8> {
        self.frame
            .color
            .as_slice()
            .iter()
            .flat_map(|&c| [c as u8, (c >> 8) as u8, (c >> 16) as u8])
            .collect()
    }

    /// Coarse text map of the hit mask: every 16th row, every 8th column
    pub fn ascii_preview(&self) -> String {
        let mut out = String::new();
        for y in (0..self.frame.height).step_by(16) {
            let row = self.frame.hit.row(y);
            out.extend(row.iter().step_by(8).map(|&h| if h != 0 { '#' } else { ' ' }));
            out.push('\n');
        }
        out
    }

    /// Final color of a pixel as floats, unpacked from the output buffer
    pub fn pixel_color(&self, x: usize, y: usize) -> Color {
        Color::from_packed(self.frame.color[(x, y)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::buffer::FAR_DEPTH;
    use crate::rasterizer::math::{Vec2, Vec4};
    use crate::rasterizer::shader::BlinnPhong;
    use crate::rasterizer::types::{FragmentCell, SampleMode, DEFAULT_SHADER};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Reference camera looking at a 20x20 plane
    fn plane_scene(width: usize, height: usize) -> (RenderContext, Mesh) {
        let mut ctx = RenderContext::new(width, height);
        ctx.set_transform(
            Mat4::IDENTITY,
            Mat4::look_at(
                Vec4::point(-10.0, -5.0, 20.0),
                Vec4::point(0.0, 0.0, 0.0),
                Vec4::UP,
            ),
            Mat4::perspective(60.0, width as f32 / height as f32, 15.0, 100.0),
        );
        (ctx, Mesh::plane(20.0, 20.0))
    }

    fn screen_corners(ctx: &RenderContext, mesh: &Mesh) -> Vec<(f32, f32)> {
        mesh.assemble_vertices()
            .iter()
            .map(|v| {
                let mut p = ctx.transform().project(v);
                ctx.transform().homogenize(&mut p);
                (p.pos_h.x, p.pos_h.y)
            })
            .collect()
    }

    #[test]
    fn test_new_context_is_cleared() {
        let ctx = RenderContext::new(8, 4);
        assert_eq!(ctx.width(), 8);
        assert_eq!(ctx.height(), 4);
        assert!(ctx.shaders().contains(DEFAULT_SHADER));
        assert_eq!(ctx.frame().hit_count(), 0);
    }

    #[test]
    fn test_clear_resets_between_frames() {
        init_logs();
        let (mut ctx, mesh) = plane_scene(64, 64);
        ctx.render_frame(&mesh).unwrap();
        assert!(ctx.frame().hit_count() > 0);

        ctx.clear();
        assert!(ctx.frame().depth.as_slice().iter().all(|&d| d == FAR_DEPTH));
        assert!(ctx.frame().hit.as_slice().iter().all(|&h| h == 0));
        assert!(ctx.color_buffer().as_slice().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_repeated_frames_are_identical() {
        let (mut ctx, mesh) = plane_scene(64, 64);
        ctx.settings.mode = RenderMode::Shaded;
        ctx.set_texture(Texture::new(4, 4, [200, 100, 50, 255]));
        ctx.register_shader("phong", BlinnPhong::default()).unwrap();
        ctx.settings.shader = "phong".to_string();

        ctx.render_frame(&mesh).unwrap();
        let first = ctx.color_buffer().as_slice().to_vec();
        ctx.render_frame(&mesh).unwrap();
        assert_eq!(ctx.color_buffer().as_slice(), first.as_slice());
    }

    #[test]
    fn test_wireframe_is_rejected() {
        let (mut ctx, mesh) = plane_scene(16, 16);
        ctx.settings.mode = RenderMode::Wireframe;
        assert_eq!(ctx.render_frame(&mesh), Err(RenderError::WireframeUnsupported));
    }

    #[test]
    fn test_shaded_requires_texture() {
        let (mut ctx, mesh) = plane_scene(16, 16);
        ctx.settings.mode = RenderMode::Shaded;
        assert_eq!(ctx.render_frame(&mesh), Err(RenderError::MissingTexture));
    }

    #[test]
    fn test_shaded_requires_registered_shader() {
        let (mut ctx, mesh) = plane_scene(16, 16);
        ctx.settings.mode = RenderMode::Shaded;
        ctx.settings.shader = "toon".to_string();
        ctx.set_texture(Texture::new(2, 2, [255; 4]));
        assert_eq!(
            ctx.render_frame(&mesh),
            Err(RenderError::UnknownShader("toon".to_string()))
        );
    }

    #[test]
    fn test_default_shader_outputs_texture() {
        let (mut ctx, mesh) = plane_scene(32, 32);
        ctx.settings.mode = RenderMode::Shaded;
        ctx.settings.sample_mode = SampleMode::Nearest;
        ctx.set_texture(Texture::new(2, 2, [255, 0, 0, 255]));
        ctx.render_frame(&mesh).unwrap();

        let hit = ctx.frame().hit.as_slice();
        for (i, &c) in ctx.color_buffer().as_slice().iter().enumerate() {
            assert_eq!(c, if hit[i] != 0 { 0x0000FF } else { 0 });
        }
    }

    #[test]
    fn test_closure_shader_sees_view_space_light() {
        let (mut ctx, mesh) = plane_scene(16, 16);
        ctx.settings.mode = RenderMode::Shaded;
        ctx.set_texture(Texture::new(1, 1, [0; 4]));
        ctx.set_light(Light {
            position: Vec4::point(-10.0, -5.0, 20.0),
            color: Color::WHITE,
        });
        // Light placed at the eye lands on the view-space origin
        let light = ctx.light_view();
        assert!(light.position.x.abs() < 1e-4);
        assert!(light.position.z.abs() < 1e-4);

        ctx.register_shader("distance", |sc: &ShadeContext, cell: &mut FragmentCell| {
            let d = (sc.light.position - cell.pos).len();
            cell.color = Color::new(d / 100.0, 0.0, 0.0);
        })
        .unwrap();
        ctx.settings.shader = "distance".to_string();
        ctx.render_frame(&mesh).unwrap();

        // Every visible point lies past the near plane, well inside far
        assert!(ctx.frame().hit_count() > 0);
        for y in 0..16 {
            for x in 0..16 {
                if ctx.is_hit(x, y) {
                    let r = ctx.pixel_color(x, y).r;
                    assert!(r > 0.14 && r < 0.6, "pixel ({}, {}) r = {}", x, y, r);
                }
            }
        }
    }

    #[test]
    fn test_triangle_behind_camera_draws_nothing() {
        let mut ctx = RenderContext::new(16, 16);
        ctx.set_transform(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::perspective(90.0, 1.0, 1.0, 10.0),
        );
        let v = |x: f32, y: f32, z: f32| {
            Vertex::new(Vec4::point(x, y, z), Vec4::UP, Vec2::default(), Color::WHITE)
        };
        let verts = [v(-1.0, -1.0, 5.0), v(1.0, -1.0, 5.0), v(0.0, 1.0, 5.0)];
        assert_eq!(ctx.draw_indexed(&verts, &[[0, 1, 2]]), 0);
        assert_eq!(ctx.frame().hit_count(), 0);
    }

    #[test]
    fn test_near_clipped_triangle_still_draws() {
        let mut ctx = RenderContext::new(32, 32);
        ctx.set_transform(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::perspective(90.0, 1.0, 1.0, 10.0),
        );
        let v = |x: f32, y: f32, z: f32| {
            Vertex::new(Vec4::point(x, y, z), Vec4::UP, Vec2::default(), Color::WHITE)
        };
        // One vertex sits in front of the near plane
        let verts = [v(-2.0, -1.0, -3.0), v(2.0, -1.0, -3.0), v(0.0, 1.0, -0.5)];
        assert!(ctx.draw_indexed(&verts, &[[0, 1, 2]]) > 0);
        assert!(ctx.frame().depth.as_slice().iter().all(|&d| d >= 0.0));
    }

    #[test]
    fn test_far_offscreen_triangle_past_near_plane() {
        let mut ctx = RenderContext::new(16, 16);
        ctx.set_transform(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Mat4::perspective(90.0, 1.0, 0.01, 10.0),
        );
        let v = |x: f32, y: f32, z: f32| {
            Vertex::new(Vec4::point(x, y, z), Vec4::UP, Vec2::default(), Color::WHITE)
        };
        // Just beyond the near plane, millions of units to either side
        let verts = [
            v(2.0e6, 0.0, -0.011),
            v(4.0e6, 0.0, -0.011),
            v(2.0e6, 0.001, -0.011),
            v(-4.0e6, 0.0, -0.011),
            v(-2.0e6, 0.0, -0.011),
            v(-4.0e6, 0.001, -0.011),
        ];
        assert_eq!(ctx.draw_indexed(&verts, &[[0, 1, 2], [3, 4, 5]]), 0);
        assert_eq!(ctx.frame().hit_count(), 0);
    }

    #[test]
    fn test_empty_mesh_draws_nothing() {
        init_logs();
        let mut ctx = RenderContext::new(8, 8);
        assert_eq!(ctx.render_mesh(&Mesh::default()), 0);
    }

    #[test]
    #[should_panic(expected = "references vertex")]
    fn test_index_out_of_range_panics() {
        let mut ctx = RenderContext::new(8, 8);
        let mut mesh = Mesh::plane(1.0, 1.0);
        mesh.triangles.push([0, 1, 4]);
        ctx.render_mesh(&mesh);
    }

    #[test]
    fn test_context_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RenderContext>();
    }

    #[test]
    fn test_rgb_bytes_and_preview() {
        let (mut ctx, mesh) = plane_scene(64, 32);
        ctx.render_frame(&mesh).unwrap();
        let rgb = ctx.rgb_bytes();
        assert_eq!(rgb.len(), 64 * 32 * 3);
        let packed = ctx.color_buffer()[(32, 16)];
        let i = (16 * 64 + 32) * 3;
        assert_eq!(rgb[i], packed as u8);
        assert_eq!(rgb[i + 2], (packed >> 16) as u8);

        let preview = ctx.ascii_preview();
        assert_eq!(preview.lines().count(), 2);
        assert!(preview.lines().all(|l| l.chars().count() == 8));
    }

    /// Camera at (-10, -5, 20) looking at a 20x20 plane, 60 degree fov,
    /// near/far 15/100, 256x256 vertex-color frame.
    #[test]
    fn test_plane_render_matches_projection() {
        init_logs();
        let (mut ctx, mesh) = plane_scene(256, 256);
        let written = ctx.render_frame(&mesh).unwrap();
        assert!(written > 1000);

        // Quad outline in corner order 0 -> 1 -> 3 -> 2
        let c = screen_corners(&ctx, &mesh);
        let quad = [c[0], c[1], c[3], c[2]];
        let area: f32 = (0..4)
            .map(|i| {
                let (a, b) = (quad[i], quad[(i + 1) % 4]);
                a.0 * b.1 - b.0 * a.1
            })
            .sum();
        let orient = area.signum();

        // Minimum signed distance from (x, y) to the quad's edges
        let inside_by = |x: f32, y: f32| -> f32 {
            (0..4)
                .map(|i| {
                    let (a, b) = (quad[i], quad[(i + 1) % 4]);
                    let (ex, ey) = (b.0 - a.0, b.1 - a.1);
                    orient * (ex * (y - a.1) - ey * (x - a.0)) / (ex * ex + ey * ey).sqrt()
                })
                .fold(f32::INFINITY, f32::min)
        };

        let mut inside_pixels = 0;
        for y in 0..256 {
            for x in 0..256 {
                let d = inside_by(x as f32, y as f32);
                let packed = ctx.color_buffer()[(x, y)];
                if d > 1.5 {
                    inside_pixels += 1;
                    assert!(ctx.is_hit(x, y), "pixel ({}, {}) should be hit", x, y);
                    let (r, g, b) = (packed & 0xFF, (packed >> 8) & 0xFF, (packed >> 16) & 0xFF);
                    assert_eq!(b, 127, "pixel ({}, {})", x, y);
                    assert!((126..=255).contains(&r), "pixel ({}, {}) r = {}", x, y, r);
                    assert!((126..=255).contains(&g), "pixel ({}, {}) g = {}", x, y, g);
                    let depth = ctx.depth(x, y);
                    assert!(depth > 0.0 && depth < FAR_DEPTH);
                } else if d < -1.5 {
                    assert!(!ctx.is_hit(x, y), "pixel ({}, {}) should be empty", x, y);
                    assert_eq!(packed, 0);
                }
            }
        }
        assert!(inside_pixels > 1000);
    }
}
