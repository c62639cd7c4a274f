//! Scene inputs for the pipeline: meshes and RON scene files

mod mesh;
mod config;

pub use mesh::*;
pub use config::*;
