//! Collaborator seams
//!
//! The renderer never talks to wgpu directly. It drives these traits, which
//! are implemented by the wgpu backend for real frames and by the recording
//! backend for headless runs and tests.

use crate::core::render_states::{ClearState, CullFace};
use crate::core::uniform::{UniformLayout, UniformValue};
use crate::core::vertex::VertexLayout;
use crate::error::Result;
use crate::input::{InputEvents, Key};
use crate::renderer::geometry::MeshData;
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::path::{Path, PathBuf};

/// Opaque handle to an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawHandle(pub u32);

/// Opaque handle to a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque handle to an off-screen framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u32);

/// Texture dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    TextureCube,
}

/// Pixel rectangle a pass renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Full-target viewport of the given size.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Get the aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Where a pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// The presentable colour surface with its depth buffer.
    Surface,
    /// A depth-only framebuffer.
    Framebuffer(FramebufferHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// One source file of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub path: PathBuf,
    pub stage: ShaderStage,
}

/// What the backend samples when nothing is bound to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTexture {
    White,
    Black,
    /// Tangent-space +Z.
    FlatNormal,
    /// Farthest depth, i.e. fully lit.
    FarDepth,
}

/// A sampler uniform declared by a program.
///
/// The int published under `uniform` names the texture unit that feeds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerSlot {
    pub uniform: String,
    pub kind: TextureKind,
    pub depth: bool,
    pub fallback: FallbackTexture,
}

impl SamplerSlot {
    pub fn color(uniform: impl Into<String>, fallback: FallbackTexture) -> Self {
        Self {
            uniform: uniform.into(),
            kind: TextureKind::Texture2D,
            depth: false,
            fallback,
        }
    }

    pub fn depth(uniform: impl Into<String>, kind: TextureKind) -> Self {
        Self {
            uniform: uniform.into(),
            kind,
            depth: true,
            fallback: FallbackTexture::FarDepth,
        }
    }
}

/// Whether a program writes colour or depth only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Color,
    Depth,
}

/// Everything a compiler needs to build a program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    pub label: String,
    pub stages: Vec<ShaderSource>,
    pub uniforms: UniformLayout,
    pub samplers: Vec<SamplerSlot>,
    pub vertex_layout: VertexLayout,
    pub target: TargetKind,
    /// Source compiled instead when the files cannot be read or parsed.
    pub embedded: Option<&'static str>,
}

/// A linked program with a name-addressed uniform interface.
pub trait ShaderProgram {
    /// Make this the active program.
    fn use_program(&mut self);

    /// Publish a value under a fully-qualified uniform name.
    ///
    /// Names the program does not declare are ignored.
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.set_uniform(name, UniformValue::Vec2(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.set_uniform(name, UniformValue::Vec4(value));
    }

    fn set_mat2(&mut self, name: &str, value: Mat2) {
        self.set_uniform(name, UniformValue::Mat2(value));
    }

    fn set_mat3(&mut self, name: &str, value: Mat3) {
        self.set_uniform(name, UniformValue::Mat3(value));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }
}

/// Turns shader sources into programs.
pub trait ShaderCompiler {
    type Program: ShaderProgram;

    fn compile(&mut self, descriptor: &ProgramDescriptor) -> Result<Self::Program>;
}

/// Uploads mesh data and hands back draw handles.
pub trait GpuBufferUploader {
    fn upload_mesh(
        &mut self,
        mesh: &MeshData,
        layout: VertexLayout,
        label: &str,
    ) -> Result<DrawHandle>;

    fn release_mesh(&mut self, handle: DrawHandle);
}

/// GL-style immediate interface over one GPU device.
///
/// Texture units and the cull face are sticky state, as in a GL context:
/// they persist across draws until changed.
pub trait RenderDevice: GpuBufferUploader {
    type Program: ShaderProgram;

    fn create_framebuffer(&mut self) -> FramebufferHandle;

    /// Create a depth-only texture, nearest filtered and edge clamped.
    fn create_depth_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle>;

    /// Create a mipmapped linear RGBA8 texture, linear filtered and repeating.
    fn create_texture_rgba8(&mut self, image: &DecodedImage) -> Result<TextureHandle>;

    /// Use `texture` as the depth attachment of `framebuffer`; no colour attachment.
    fn attach_depth(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<()>;

    fn set_active_unit(&mut self, unit: u32);

    /// Bind a texture to a unit. Leaves `unit` active.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle, kind: TextureKind);

    fn set_cull_face(&mut self, face: CullFace);

    fn begin_pass(
        &mut self,
        target: PassTarget,
        viewport: Viewport,
        clear: ClearState,
    ) -> Result<()>;

    fn end_pass(&mut self);

    /// Draw a mesh with the program's currently published uniforms.
    fn draw(&mut self, program: &mut Self::Program, mesh: DrawHandle) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32);

    /// Submit the frame and present it (the swap of a double-buffered surface).
    fn present(&mut self) -> Result<()>;

    fn release_texture(&mut self, texture: TextureHandle);

    fn release_framebuffer(&mut self, framebuffer: FramebufferHandle);
}

/// An RGBA8 image decoded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decodes image files into pixel buffers.
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage>;
}

/// Window and input provider polled once per frame.
pub trait Surface {
    fn should_close(&self) -> bool;

    /// Pump pending window events and return what happened since the last call.
    fn poll_events(&mut self) -> InputEvents;

    /// Seconds since the surface was created.
    fn time(&self) -> f64;

    fn key_pressed(&self, key: Key) -> bool;

    fn request_close(&mut self);

    fn framebuffer_size(&self) -> (u32, u32);
}
