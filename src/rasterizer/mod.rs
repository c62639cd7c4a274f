//! Software rasterization pipeline
//!
//! Stages, in frame order:
//! - transform: local space to clip space (and view space for shading)
//! - clip: near-plane clipping in homogeneous space
//! - scanline: trapezoid scan conversion with perspective-correct
//!   attributes and a depth test
//! - shader: per-pixel resolution through named fragment shaders
//!
//! `RenderContext` owns the frame buffers and drives the stages.

mod math;
mod types;
mod transform;
mod clip;
mod scanline;
mod texture;
mod buffer;
mod shader;
mod error;
mod context;

pub use math::*;
pub use types::*;
pub use transform::*;
pub use clip::*;
pub use scanline::*;
pub use texture::*;
pub use buffer::*;
pub use shader::*;
pub use error::*;
pub use context::*;
