//! Core rendering abstractions
//!
//! Vertex and uniform formats shared by every backend, plus the wgpu
//! primitives the GPU backend builds on.

pub mod buffer;
pub mod pipeline;
pub mod render_states;
pub mod texture;
pub mod uniform;
pub mod vertex;

pub use buffer::{IndexBuffer, MeshBuffers, UniformBlockBuffer, VertexBuffer};
pub use pipeline::PipelineBuilder;
pub use render_states::{BlendState, ClearState, CullFace, DepthState};
pub use texture::{DepthTexture, Samplers, Texture2D};
pub use uniform::{
    StageOutcome, StagingBlock, UniformKind, UniformLayout, UniformSlot, UniformValue,
};
pub use vertex::{Vertex, VertexLayout};
