//! Error types
//!
//! Every fallible library operation returns [`RenderError`]. Asset failures are
//! logged at the call site and usually swallowed so the frame keeps rendering;
//! precondition violations propagate and stop the caller.

use std::path::PathBuf;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors produced by the renderer and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Two parallel lists disagree in length.
    #[error("{what}: expected {expected} entries, found {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A drawable binds more material maps than there are free sampler units.
    #[error("drawable binds {count} texture maps, at most {max} are available")]
    TooManyTextureMaps { count: usize, max: usize },

    /// A texture map with a shadow role was bound as a material, or vice versa.
    #[error("texture role mismatch: expected {expected}, found {found}")]
    RoleMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Source pools and index streams cannot be expanded into vertices.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("drawable `{0}` is already initialized")]
    AlreadyInitialized(String),

    #[error("drawable `{0}` has not been initialized")]
    NotInitialized(String),

    #[error("unknown render mode `{0}`")]
    UnknownRenderMode(String),

    #[error("unknown movement direction `{0}`")]
    UnknownDirection(String),

    /// The scene pass ran without a light-space matrix from this frame.
    #[error("scene pass requires the light-space matrix of the directional shadow pass")]
    MissingLightSpace,

    /// A handle does not refer to a live GPU resource.
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("shader {path} failed to parse: {message}")]
    ShaderParse { path: PathBuf, message: String },

    /// Window, surface or device creation failed.
    #[error("setup failed: {0}")]
    Setup(String),
}

impl RenderError {
    /// Structured `subsystem::stage::reason` tag used when logging the error.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LengthMismatch { .. } => "scene::validate::length_mismatch",
            Self::TooManyTextureMaps { .. } => "drawable::create::too_many_maps",
            Self::RoleMismatch { .. } => "texture::bind::role_mismatch",
            Self::InvalidGeometry(_) => "geometry::build::invalid",
            Self::AlreadyInitialized(_) => "drawable::initialize::already_initialized",
            Self::NotInitialized(_) => "drawable::draw::not_initialized",
            Self::UnknownRenderMode(_) => "render::select::unknown_mode",
            Self::UnknownDirection(_) => "camera::move::unknown_direction",
            Self::MissingLightSpace => "render::scene::missing_light_space",
            Self::UnknownHandle { .. } => "gpu::handle::unknown",
            Self::Io { .. } => "asset::read::io",
            Self::ImageDecode { .. } => "texture::load::decode",
            Self::ShaderParse { .. } => "shader::load::parse",
            Self::Setup(_) => "app::setup::failed",
        }
    }
}
