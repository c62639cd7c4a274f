//! Fragment shaders and the name-keyed shader registry
//!
//! A fragment shader turns a resolved attribute cell into a final color.
//! Shaders are looked up by name from a registry owned by each render
//! context; any `Fn(&ShadeContext, &mut FragmentCell)` closure qualifies.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use log::debug;
use super::error::RenderError;
use super::math::Vec4;
use super::texture::Texture;
use super::types::{FragmentCell, Light, Material, SampleMode, DEFAULT_SHADER};

/// Read-only view of the render context handed to shaders
#[derive(Debug, Clone, Copy)]
pub struct ShadeContext<'a> {
    /// Light with its position in view space
    pub light: Light,
    pub material: Material,
    pub sample_mode: SampleMode,
    pub texture: Option<&'a Texture>,
}

/// Per-pixel shading routine.
///
/// Expected to write `cell.color`; may use `cell.specular` as scratch.
pub trait FragmentShader: Send + Sync {
    fn shade(&self, ctx: &ShadeContext, cell: &mut FragmentCell);
}

impl<F> FragmentShader for F
where
    F: Fn(&ShadeContext, &mut FragmentCell) + Send + Sync,
{
    fn shade(&self, ctx: &ShadeContext, cell: &mut FragmentCell) {
        self(ctx, cell)
    }
}

/// Passes the diffuse (texture) color straight through
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlit;

impl FragmentShader for Unlit {
    fn shade(&self, _ctx: &ShadeContext, cell: &mut FragmentCell) {
        cell.color = cell.diffuse;
    }
}

/// Blinn-Phong point light in view space.
///
/// Adds `specular * ks + diffuse * kd`; the material's ambient term is
/// not used.
#[derive(Debug, Clone, Copy)]
pub struct BlinnPhong {
    pub shininess: f32,
}

impl Default for BlinnPhong {
    fn default() -> Self {
        Self { shininess: 10.0 }
    }
}

impl FragmentShader for BlinnPhong {
    fn shade(&self, ctx: &ShadeContext, cell: &mut FragmentCell) {
        let to_light = (ctx.light.position - cell.pos).normalize();
        // The eye sits at the view-space origin
        let to_eye = (Vec4::point(0.0, 0.0, 0.0) - cell.pos).normalize();
        let half = (to_light + to_eye).normalize();
        let normal = cell.normal.normalize();

        let shine = half.dot(normal).max(0.0).powf(self.shininess);
        let m = ctx.material;

        cell.specular = cell.specular.add_scaled(ctx.light.color, shine);
        cell.color = cell
            .color
            .add_scaled(cell.specular, m.specular)
            .add_scaled(cell.diffuse, m.diffuse);
    }
}

/// Unique-name table of fragment shaders
#[derive(Default)]
pub struct ShaderRegistry {
    shaders: HashMap<String, Box<dyn FragmentShader>>,
}

impl std::fmt::Debug for ShaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.shaders.keys()).finish()
    }
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the built-in `"default"` shader
    pub fn with_builtin() -> Self {
        let mut shaders: HashMap<String, Box<dyn FragmentShader>> = HashMap::new();
        shaders.insert(DEFAULT_SHADER.to_string(), Box::new(Unlit));
        Self { shaders }
    }

    /// Register `shader` under `name`; fails if the name is taken
    pub fn register<S>(&mut self, name: impl Into<String>, shader: S) -> Result<(), RenderError>
    where
        S: FragmentShader + 'static,
    {
        match self.shaders.entry(name.into()) {
            Entry::Occupied(e) => Err(RenderError::DuplicateShader(e.key().clone())),
            Entry::Vacant(e) => {
                debug!("registered fragment shader '{}'", e.key());
                e.insert(Box::new(shader));
                Ok(())
            }
        }
    }

    /// Look up a shader; `None` if it was never registered
    pub fn get(&self, name: &str) -> Option<&dyn FragmentShader> {
        self.shaders.get(name).map(|s| s.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shaders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::Color;

    fn ctx() -> ShadeContext<'static> {
        ShadeContext {
            light: Light {
                position: Vec4::point(0.0, 0.0, 0.0),
                color: Color::new(1.0, 0.5, 0.25),
            },
            material: Material {
                ambient: 0.0,
                diffuse: 0.5,
                specular: 1.0,
            },
            sample_mode: SampleMode::Nearest,
            texture: None,
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut reg = ShaderRegistry::new();
        assert!(reg.register("phong", BlinnPhong::default()).is_ok());
        assert_eq!(
            reg.register("phong", Unlit),
            Err(RenderError::DuplicateShader("phong".to_string()))
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_builtin_default_is_registered() {
        let mut reg = ShaderRegistry::with_builtin();
        assert!(reg.contains(DEFAULT_SHADER));
        assert!(reg.register(DEFAULT_SHADER, Unlit).is_err());
    }

    #[test]
    fn test_unknown_lookup_is_none() {
        let mut reg = ShaderRegistry::new();
        reg.register("unlit", Unlit).unwrap();
        assert!(reg.get("missing").is_none());
        assert!(reg.get("unlit").is_some());
        assert!(!reg.contains("missing"));
    }

    #[test]
    fn test_closure_shader() {
        let mut reg = ShaderRegistry::new();
        reg.register("red", |_: &ShadeContext, cell: &mut FragmentCell| {
            cell.color = Color::new(1.0, 0.0, 0.0);
        })
        .unwrap();
        reg.register("unlit", Unlit).unwrap();
        assert_eq!(reg.names(), vec!["red", "unlit"]);

        let mut cell = FragmentCell::default();
        reg.get("red").unwrap().shade(&ctx(), &mut cell);
        assert_eq!(cell.color, Color::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_unlit_copies_diffuse() {
        let mut cell = FragmentCell {
            diffuse: Color::new(0.2, 0.4, 0.6),
            ..Default::default()
        };
        Unlit.shade(&ctx(), &mut cell);
        assert_eq!(cell.color, cell.diffuse);
    }

    #[test]
    fn test_blinn_phong_head_on_highlight() {
        // Surface straight ahead of the eye, facing it, light at the eye:
        // half vector equals the normal, so the highlight is full strength.
        let mut cell = FragmentCell {
            pos: Vec4::point(0.0, 0.0, -10.0),
            normal: Vec4::direction(0.0, 0.0, 3.0),
            diffuse: Color::new(0.5, 0.5, 0.5),
            ..Default::default()
        };
        BlinnPhong::default().shade(&ctx(), &mut cell);
        assert!((cell.specular.r - 1.0).abs() < 1e-5);
        assert!((cell.color.r - (1.0 + 0.25)).abs() < 1e-5);
        assert!((cell.color.g - (0.5 + 0.25)).abs() < 1e-5);
    }

    #[test]
    fn test_blinn_phong_facing_away_has_no_highlight() {
        let mut cell = FragmentCell {
            pos: Vec4::point(0.0, 0.0, -10.0),
            normal: Vec4::direction(0.0, 0.0, -1.0),
            diffuse: Color::new(0.5, 0.5, 0.5),
            ..Default::default()
        };
        BlinnPhong::default().shade(&ctx(), &mut cell);
        assert_eq!(cell.specular, Color::BLACK);
        assert!((cell.color.r - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_blinn_phong_ignores_ambient() {
        let base = FragmentCell {
            pos: Vec4::point(1.0, 2.0, -10.0),
            normal: Vec4::direction(0.0, 0.0, 1.0),
            diffuse: Color::new(0.5, 0.25, 0.75),
            ..Default::default()
        };
        let mut plain = base;
        BlinnPhong::default().shade(&ctx(), &mut plain);

        let mut with_ambient = base;
        let mut sc = ctx();
        sc.material.ambient = 0.8;
        BlinnPhong::default().shade(&sc, &mut with_ambient);
        assert_eq!(with_ambient.color, plain.color);
    }
}
