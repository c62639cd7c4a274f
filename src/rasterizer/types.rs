//! Core types for the pipeline

use std::ops::{Add, Mul, Sub};
use serde::{Serialize, Deserialize};
use super::math::{Vec2, Vec4};

/// Linear RGB color, nominally 0.0-1.0 per channel
///
/// Channels may leave that range while shading accumulates light; they are
/// only clamped when packed into the output buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From 8-bit channels
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// `self + other * s`
    pub fn add_scaled(self, other: Color, s: f32) -> Self {
        Self {
            r: self.r + other.r * s,
            g: self.g + other.g * s,
            b: self.b + other.b * s,
        }
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    /// Clamp one channel to [0, 1] and scale to 0-255 (truncating)
    pub fn channel_to_u8(c: f32) -> u8 {
        (c.clamp(0.0, 1.0) * 255.0) as u8
    }

    /// Pack as 0x00BBGGRR: red in the lowest byte
    pub fn to_packed(self) -> u32 {
        let r = Self::channel_to_u8(self.r) as u32;
        let g = Self::channel_to_u8(self.g) as u32;
        let b = Self::channel_to_u8(self.b) as u32;
        r | (g << 8) | (b << 16)
    }

    pub fn from_packed(c: u32) -> Self {
        Self::from_rgb8(c as u8, (c >> 8) as u8, (c >> 16) as u8)
    }
}

impl Add for Color {
    type Output = Color;
    fn add(self, other: Color) -> Color {
        Color::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl Sub for Color {
    type Output = Color;
    fn sub(self, other: Color) -> Color {
        Color::new(self.r - other.r, self.g - other.g, self.b - other.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;
    fn mul(self, s: f32) -> Color {
        Color::new(self.r * s, self.g * s, self.b * s)
    }
}

/// A vertex moving through the pipeline
///
/// `pos_h` holds the clip-space position until `homogenize` runs, after which
/// it holds `(screen x, screen y, z / w, 1 / w)`. `pos`, `normal`, `uv` and
/// `color` are the attributes interpolated across a triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub pos_h: Vec4,
    /// View-space position
    pub pos: Vec4,
    /// View-space normal
    pub normal: Vec4,
    pub uv: Vec2,
    pub color: Color,
    /// Reciprocal of clip w, valid after `homogenize`
    pub rhw: f32,
}

impl Vertex {
    /// Vertex in local/model space, as assembled from a mesh
    pub fn new(pos: Vec4, normal: Vec4, uv: Vec2, color: Color) -> Self {
        Self {
            pos_h: Vec4::ZERO,
            pos,
            normal,
            uv,
            color,
            rhw: 0.0,
        }
    }

    /// Interpolate every field at ratio `t` (0 = self, 1 = other)
    pub fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            pos_h: self.pos_h.lerp(other.pos_h, t),
            pos: self.pos.lerp(other.pos, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
            color: self.color.lerp(other.color, t),
            rhw: super::math::lerp(self.rhw, other.rhw, t),
        }
    }

    /// Per-pixel delta across a span from `left` to `right`.
    ///
    /// The x-span is padded with a small epsilon so zero-width spans do
    /// not divide by zero.
    pub fn step(left: &Vertex, right: &Vertex) -> Vertex {
        const SPAN_EPSILON: f32 = 1e-6;
        let inv = 1.0 / (right.pos_h.x - left.pos_h.x + SPAN_EPSILON);
        (*right - *left) * inv
    }

    /// Pre-multiply the interpolated attributes by rhw.
    ///
    /// Must run after `homogenize` has populated `rhw`.
    pub fn premultiply_rhw(&mut self) {
        let rhw = self.rhw;
        self.pos = self.pos * rhw;
        self.normal = self.normal * rhw;
        self.uv = self.uv * rhw;
        self.color = self.color * rhw;
    }
}

impl Add for Vertex {
    type Output = Vertex;
    fn add(self, o: Vertex) -> Vertex {
        Vertex {
            pos_h: self.pos_h + o.pos_h,
            pos: self.pos + o.pos,
            normal: self.normal + o.normal,
            uv: self.uv + o.uv,
            color: self.color + o.color,
            rhw: self.rhw + o.rhw,
        }
    }
}

impl Sub for Vertex {
    type Output = Vertex;
    fn sub(self, o: Vertex) -> Vertex {
        Vertex {
            pos_h: self.pos_h - o.pos_h,
            pos: self.pos - o.pos,
            normal: self.normal - o.normal,
            uv: self.uv - o.uv,
            color: self.color - o.color,
            rhw: self.rhw - o.rhw,
        }
    }
}

impl Mul<f32> for Vertex {
    type Output = Vertex;
    fn mul(self, s: f32) -> Vertex {
        Vertex {
            pos_h: self.pos_h * s,
            pos: self.pos * s,
            normal: self.normal * s,
            uv: self.uv * s,
            color: self.color * s,
            rhw: self.rhw * s,
        }
    }
}

/// Per-pixel attribute cell written by the rasterizer and read by shading
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FragmentCell {
    /// (screen x, screen y, depth, rhw)
    pub pos_h: Vec4,
    /// View-space position
    pub pos: Vec4,
    /// View-space normal (not renormalized)
    pub normal: Vec4,
    pub uv: Vec2,
    pub vertex_color: Color,
    /// Texture sample, filled in shaded mode
    pub diffuse: Color,
    /// Light accumulator for shading routines
    pub specular: Color,
    /// Output of the shading stage
    pub color: Color,
}

impl FragmentCell {
    /// Build a cell from an interpolated vertex, undoing the rhw
    /// pre-multiplication of its attributes.
    pub fn from_interpolated(v: &Vertex) -> Self {
        let w = 1.0 / v.rhw;
        Self {
            pos_h: v.pos_h,
            pos: v.pos * w,
            normal: v.normal * w,
            uv: v.uv * w,
            vertex_color: v.color * w,
            ..Default::default()
        }
    }
}

/// How hit pixels get their color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderMode {
    /// Edge/fill line drawing. Declared but not implemented.
    Wireframe,
    /// Interpolated vertex colors
    #[default]
    VertexColor,
    /// Texture sample handed to the active fragment shader
    Shaded,
}

/// Texture filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleMode {
    #[default]
    Nearest,
    Bilinear,
}

/// Point light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec4,
    pub color: Color,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec4::point(5.0, 5.0, 5.0),
            color: Color::WHITE,
        }
    }
}

/// Material coefficients, only read by fragment shaders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: 0.0,
            diffuse: 1.0,
            specular: 0.0,
        }
    }
}

/// Name of the shader every context registers on creation
pub const DEFAULT_SHADER: &str = "default";

fn default_shader_name() -> String {
    DEFAULT_SHADER.to_string()
}

/// Per-frame render configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default)]
    pub sample_mode: SampleMode,
    /// Name of the fragment shader used in `Shaded` mode
    #[serde(default = "default_shader_name")]
    pub shader: String,
    /// Light as configured. Shaders see the view-space copy on the context.
    #[serde(default)]
    pub light: Light,
    #[serde(default)]
    pub material: Material,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            sample_mode: SampleMode::default(),
            shader: default_shader_name(),
            light: Light::default(),
            material: Material::default(),
        }
    }
}
