//! Errors reported at pipeline stage boundaries
//!
//! Numeric invariant violations inside the core (clip ratios, texel bounds,
//! mesh indices) panic instead; they indicate a bug, not bad configuration.

/// Configuration misuse detected by the render context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A shader is already registered under this name
    DuplicateShader(String),
    /// The active shader name has no registration
    UnknownShader(String),
    /// Shaded mode was requested without a texture
    MissingTexture,
    /// Wireframe mode is declared but not implemented
    WireframeUnsupported,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::DuplicateShader(name) => {
                write!(f, "Fragment shader '{}' is already registered", name)
            }
            RenderError::UnknownShader(name) => {
                write!(f, "Fragment shader '{}' is not registered", name)
            }
            RenderError::MissingTexture => write!(f, "Shaded mode requires a texture"),
            RenderError::WireframeUnsupported => write!(f, "Wireframe mode is not implemented"),
        }
    }
}

impl std::error::Error for RenderError {}
