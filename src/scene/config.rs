//! Scene files
//!
//! Uses RON (Rusty Object Notation) for human-readable scene descriptions:
//! output size, camera, the plane to draw, an optional checkerboard texture
//! and the render settings.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::rasterizer::{BlinnPhong, Mat4, RenderContext, RenderError, RenderSettings, Texture, Vec4};
use super::Mesh;

/// Name the Blinn-Phong shader is registered under by `build_context`
pub const BLINN_PHONG_SHADER: &str = "blinn_phong";

/// Why a scene file could not be loaded or saved
#[derive(Debug)]
pub enum ConfigError {
    /// Reading or writing the scene file failed
    Io { path: PathBuf, source: std::io::Error },
    /// The text is not a valid scene
    Parse(ron::error::SpannedError),
    /// The scene could not be written out as RON
    Serialize(ron::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot access scene file '{}': {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(
                f,
                "invalid scene at line {}, column {}: {}",
                e.position.line, e.position.col, e.code
            ),
            ConfigError::Serialize(e) => write!(f, "cannot encode scene: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
        }
    }
}

/// Look-at camera with a horizontal field of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub eye: (f32, f32, f32),
    #[serde(default)]
    pub center: (f32, f32, f32),
    #[serde(default = "default_up")]
    pub up: (f32, f32, f32),
    /// Horizontal field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

fn default_up() -> (f32, f32, f32) {
    (0.0, 1.0, 0.0)
}

fn default_fov() -> f32 {
    60.0
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: (-10.0, -5.0, 20.0),
            center: (0.0, 0.0, 0.0),
            up: default_up(),
            fov: default_fov(),
            near: 15.0,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    pub fn view_matrix(&self) -> Mat4 {
        let p = |(x, y, z): (f32, f32, f32)| Vec4::point(x, y, z);
        let (ux, uy, uz) = self.up;
        Mat4::look_at(p(self.eye), p(self.center), Vec4::direction(ux, uy, uz))
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.fov, aspect, self.near, self.far)
    }
}

/// Procedural checkerboard texture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    pub width: usize,
    pub height: usize,
    pub cell_width: usize,
    pub cell_height: usize,
    pub color1: (u8, u8, u8, u8),
    /// Top-left cell
    pub color2: (u8, u8, u8, u8),
}

impl TextureConfig {
    pub fn build(&self) -> Texture {
        let rgba = |(r, g, b, a): (u8, u8, u8, u8)| [r, g, b, a];
        Texture::checkerboard(
            self.width,
            self.height,
            self.cell_width,
            self.cell_height,
            rgba(self.color1),
            rgba(self.color2),
        )
    }
}

/// One renderable scene: a square plane seen from a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_frame_size")]
    pub width: usize,
    #[serde(default = "default_frame_size")]
    pub height: usize,
    #[serde(default)]
    pub camera: CameraConfig,
    /// Edge length of the plane centered on the origin
    #[serde(default = "default_plane_size")]
    pub plane_size: f32,
    #[serde(default)]
    pub texture: Option<TextureConfig>,
    /// Exponent for the Blinn-Phong shader
    #[serde(default = "default_shininess")]
    pub shininess: f32,
    #[serde(default)]
    pub settings: RenderSettings,
}

fn default_frame_size() -> usize {
    256
}

fn default_plane_size() -> f32 {
    20.0
}

fn default_shininess() -> f32 {
    10.0
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: default_frame_size(),
            height: default_frame_size(),
            camera: CameraConfig::default(),
            plane_size: default_plane_size(),
            texture: None,
            shininess: default_shininess(),
            settings: RenderSettings::default(),
        }
    }
}

impl SceneConfig {
    pub fn mesh(&self) -> Mesh {
        Mesh::plane(self.plane_size, self.plane_size)
    }

    /// Render context with this scene's settings, transforms, texture and
    /// the Blinn-Phong shader registered as `"blinn_phong"`
    pub fn build_context(&self) -> Result<RenderContext, RenderError> {
        let mut ctx = RenderContext::with_settings(self.width, self.height, self.settings.clone());
        let aspect = self.width as f32 / self.height as f32;
        ctx.set_transform(Mat4::IDENTITY, self.camera.view_matrix(), self.camera.projection(aspect));
        if let Some(tex) = &self.texture {
            ctx.set_texture(tex.build());
        }
        ctx.register_shader(
            BLINN_PHONG_SHADER,
            BlinnPhong {
                shininess: self.shininess,
            },
        )?;
        Ok(ctx)
    }
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    load_scene_from_str(&contents)
}

/// Load a scene from a RON string
pub fn load_scene_from_str(s: &str) -> Result<SceneConfig, ConfigError> {
    Ok(ron::from_str(s)?)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &SceneConfig, path: P) -> Result<(), ConfigError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    let path = path.as_ref();
    fs::write(path, contents).map_err(|e| ConfigError::io(path, e))?;
    Ok(())
}
