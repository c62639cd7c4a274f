//! softpipe: a software 3D rendering pipeline
//!
//! Meshes are transformed to clip space, clipped against the near plane,
//! scan converted into per-pixel attribute cells with perspective-correct
//! interpolation and a depth test, then shaded by a named fragment shader
//! and packed into an RGB color buffer.
//!
//! ```no_run
//! use softpipe::scene::SceneConfig;
//!
//! let scene = SceneConfig::default();
//! let mut ctx = scene.build_context()?;
//! ctx.render_frame(&scene.mesh())?;
//! let rgb = ctx.rgb_bytes();
//! # Ok::<(), softpipe::rasterizer::RenderError>(())
//! ```

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rasterizer;
pub mod scene;
