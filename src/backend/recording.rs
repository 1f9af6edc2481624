//! Recording backend
//!
//! A GPU-free implementation of the device seams. Handles are sequential
//! ids and every call lands in a shared, ordered [`Command`] log that tests
//! and headless tooling inspect.

use crate::core::render_states::{ClearState, CullFace};
use crate::core::uniform::{StageOutcome, StagingBlock, UniformLayout, UniformValue};
use crate::core::vertex::VertexLayout;
use crate::error::{RenderError, Result};
use crate::gpu::{
    DecodedImage, DrawHandle, FramebufferHandle, GpuBufferUploader, PassTarget, ProgramDescriptor,
    RenderDevice, ShaderCompiler, ShaderProgram, TextureHandle, TextureKind, Viewport,
};
use crate::renderer::geometry::MeshData;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One recorded device or program call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UploadMesh {
        handle: DrawHandle,
        label: String,
        indices: usize,
    },
    ReleaseMesh(DrawHandle),
    CreateFramebuffer(FramebufferHandle),
    CreateDepthTexture {
        handle: TextureHandle,
        kind: TextureKind,
        width: u32,
        height: u32,
    },
    CreateTexture {
        handle: TextureHandle,
        width: u32,
        height: u32,
    },
    AttachDepth {
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    },
    ActiveUnit(u32),
    BindTexture {
        unit: u32,
        texture: TextureHandle,
        kind: TextureKind,
    },
    CullFace(CullFace),
    BeginPass {
        target: PassTarget,
        viewport: Viewport,
        clear: ClearState,
    },
    EndPass,
    UseProgram(String),
    Uniform {
        program: String,
        name: String,
        value: UniformValue,
    },
    Draw {
        program: String,
        mesh: DrawHandle,
        cull: CullFace,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Present,
    ReleaseTexture(TextureHandle),
    ReleaseFramebuffer(FramebufferHandle),
}

/// Command log shared by a device and the programs it draws with.
pub type CommandLog = Rc<RefCell<Vec<Command>>>;

/// A program that records every uniform it is given.
///
/// Declared uniforms are also staged against the layout, so kind mismatches
/// warn the same way they do on the GPU backend.
#[derive(Debug, Clone)]
pub struct RecordingProgram {
    label: String,
    log: CommandLog,
    layout: UniformLayout,
    staging: StagingBlock,
    values: HashMap<String, UniformValue>,
}

impl RecordingProgram {
    pub fn new(label: impl Into<String>, layout: UniformLayout, log: CommandLog) -> Self {
        Self {
            label: label.into(),
            log,
            staging: StagingBlock::new(&layout),
            layout,
            values: HashMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Latest value published under `name`.
    pub fn value(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    /// Staged byte image of the declared uniforms.
    pub fn staged_bytes(&self) -> &[u8] {
        self.staging.as_bytes()
    }
}

impl ShaderProgram for RecordingProgram {
    fn use_program(&mut self) {
        self.log.borrow_mut().push(Command::UseProgram(self.label.clone()));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let outcome = self.staging.write(&self.layout, name, value);
        if let StageOutcome::KindMismatch { expected } = outcome {
            tracing::warn!(
                program = %self.label,
                uniform = name,
                ?expected,
                "uniform kind mismatch"
            );
        }
        self.values.insert(name.to_string(), value);
        self.log.borrow_mut().push(Command::Uniform {
            program: self.label.clone(),
            name: name.to_string(),
            value,
        });
    }
}

/// Compiles descriptors into [`RecordingProgram`]s without touching the disk.
#[derive(Debug, Clone)]
pub struct RecordingCompiler {
    log: CommandLog,
    compiled: Vec<String>,
}

impl RecordingCompiler {
    pub fn new(log: CommandLog) -> Self {
        Self {
            log,
            compiled: Vec::new(),
        }
    }

    /// Labels of every program compiled so far.
    pub fn compiled(&self) -> &[String] {
        &self.compiled
    }
}

impl ShaderCompiler for RecordingCompiler {
    type Program = RecordingProgram;

    fn compile(&mut self, descriptor: &ProgramDescriptor) -> Result<RecordingProgram> {
        self.compiled.push(descriptor.label.clone());
        Ok(RecordingProgram::new(
            descriptor.label.clone(),
            descriptor.uniforms.clone(),
            self.log.clone(),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
enum TextureEntry {
    Color,
    Depth(TextureKind),
}

impl TextureEntry {
    /// Sampling dimensionality the texture was created with.
    fn kind(self) -> TextureKind {
        match self {
            TextureEntry::Color => TextureKind::Texture2D,
            TextureEntry::Depth(kind) => kind,
        }
    }
}

/// Headless [`RenderDevice`].
#[derive(Debug)]
pub struct RecordingDevice {
    log: CommandLog,
    meshes: Vec<bool>,
    textures: Vec<Option<TextureEntry>>,
    framebuffers: Vec<Option<Option<TextureHandle>>>,
    cull_face: CullFace,
    pass_open: bool,
    size: (u32, u32),
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            meshes: Vec::new(),
            textures: Vec::new(),
            framebuffers: Vec::new(),
            cull_face: CullFace::Back,
            pass_open: false,
            size: (width, height),
        }
    }

    /// Shared log, for programs and compilers that should record alongside the device.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    pub fn compiler(&self) -> RecordingCompiler {
        RecordingCompiler::new(self.log.clone())
    }

    /// Snapshot of everything recorded so far.
    pub fn commands(&self) -> Vec<Command> {
        self.log.borrow().clone()
    }

    /// Drain the log.
    pub fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Mesh and texture handles still alive.
    pub fn live_resources(&self) -> usize {
        self.meshes.iter().filter(|live| **live).count() + self.textures.iter().flatten().count()
    }

    fn record(&self, command: Command) {
        self.log.borrow_mut().push(command);
    }

    fn push_texture(&mut self, entry: TextureEntry) -> TextureHandle {
        self.textures.push(Some(entry));
        TextureHandle(self.textures.len() as u32 - 1)
    }
}

impl GpuBufferUploader for RecordingDevice {
    fn upload_mesh(
        &mut self,
        mesh: &MeshData,
        _layout: VertexLayout,
        label: &str,
    ) -> Result<DrawHandle> {
        if mesh.indices.is_empty() {
            return Err(RenderError::InvalidGeometry(format!("mesh `{label}` is empty")));
        }
        self.meshes.push(true);
        let handle = DrawHandle(self.meshes.len() as u32 - 1);
        self.record(Command::UploadMesh {
            handle,
            label: label.to_string(),
            indices: mesh.indices.len(),
        });
        Ok(handle)
    }

    fn release_mesh(&mut self, handle: DrawHandle) {
        if let Some(live) = self.meshes.get_mut(handle.0 as usize) {
            *live = false;
        }
        self.record(Command::ReleaseMesh(handle));
    }
}

impl RenderDevice for RecordingDevice {
    type Program = RecordingProgram;

    fn create_framebuffer(&mut self) -> FramebufferHandle {
        self.framebuffers.push(Some(None));
        let handle = FramebufferHandle(self.framebuffers.len() as u32 - 1);
        self.record(Command::CreateFramebuffer(handle));
        handle
    }

    fn create_depth_texture(
        &mut self,
        kind: TextureKind,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle> {
        if width == 0 || height == 0 {
            return Err(RenderError::Setup(format!("depth texture size {width}x{height}")));
        }
        let handle = self.push_texture(TextureEntry::Depth(kind));
        self.record(Command::CreateDepthTexture {
            handle,
            kind,
            width,
            height,
        });
        Ok(handle)
    }

    fn create_texture_rgba8(&mut self, image: &DecodedImage) -> Result<TextureHandle> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.pixels.len() != expected {
            return Err(RenderError::LengthMismatch {
                what: "pixels",
                expected,
                actual: image.pixels.len(),
            });
        }
        let handle = self.push_texture(TextureEntry::Color);
        self.record(Command::CreateTexture {
            handle,
            width: image.width,
            height: image.height,
        });
        Ok(handle)
    }

    fn attach_depth(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<()> {
        if !matches!(
            self.textures.get(texture.0 as usize),
            Some(Some(TextureEntry::Depth(_)))
        ) {
            return Err(RenderError::UnknownHandle {
                kind: "depth texture",
                id: texture.0,
            });
        }
        let slot = self
            .framebuffers
            .get_mut(framebuffer.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(RenderError::UnknownHandle {
                kind: "framebuffer",
                id: framebuffer.0,
            })?;
        *slot = Some(texture);
        self.record(Command::AttachDepth { framebuffer, texture });
        Ok(())
    }

    fn set_active_unit(&mut self, unit: u32) {
        self.record(Command::ActiveUnit(unit));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle, kind: TextureKind) {
        let Some(Some(entry)) = self.textures.get(texture.0 as usize).copied() else {
            tracing::warn!(unit, texture = texture.0, "bind of unknown texture ignored");
            return;
        };
        if entry.kind() != kind {
            tracing::warn!(
                unit,
                texture = texture.0,
                created = ?entry.kind(),
                requested = ?kind,
                "texture bound with the wrong kind, ignored"
            );
            return;
        }
        self.record(Command::BindTexture { unit, texture, kind });
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
        self.record(Command::CullFace(face));
    }

    fn begin_pass(
        &mut self,
        target: PassTarget,
        viewport: Viewport,
        clear: ClearState,
    ) -> Result<()> {
        if let PassTarget::Framebuffer(fb) = target {
            let attached = self.framebuffers.get(fb.0 as usize).copied().flatten().flatten();
            if attached.is_none() {
                return Err(RenderError::UnknownHandle {
                    kind: "framebuffer",
                    id: fb.0,
                });
            }
        }
        if self.pass_open {
            tracing::warn!("begin_pass while a pass is open, closing it");
            self.end_pass();
        }
        self.pass_open = true;
        self.record(Command::BeginPass {
            target,
            viewport,
            clear,
        });
        Ok(())
    }

    fn end_pass(&mut self) {
        self.pass_open = false;
        self.record(Command::EndPass);
    }

    fn draw(&mut self, program: &mut RecordingProgram, mesh: DrawHandle) -> Result<()> {
        if !self.meshes.get(mesh.0 as usize).copied().unwrap_or(false) {
            return Err(RenderError::UnknownHandle {
                kind: "mesh",
                id: mesh.0,
            });
        }
        if !self.pass_open {
            tracing::warn!(program = %program.label(), "draw outside a pass ignored");
            return Ok(());
        }
        self.record(Command::Draw {
            program: program.label().to_string(),
            mesh,
            cull: self.cull_face,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.record(Command::Resize { width, height });
    }

    fn present(&mut self) -> Result<()> {
        self.pass_open = false;
        self.record(Command::Present);
        Ok(())
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if let Some(slot) = self.textures.get_mut(texture.0 as usize) {
            *slot = None;
        }
        self.record(Command::ReleaseTexture(texture));
    }

    fn release_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(slot) = self.framebuffers.get_mut(framebuffer.0 as usize) {
            *slot = None;
        }
        self.record(Command::ReleaseFramebuffer(framebuffer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uniform::UniformKind;

    fn quad() -> MeshData {
        MeshData {
            vertices: Vec::new(),
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_handles_are_sequential() {
        let mut device = RecordingDevice::new(1200, 800);
        let a = device.upload_mesh(&quad(), VertexLayout::Basic, "a").unwrap();
        let b = device.upload_mesh(&quad(), VertexLayout::Basic, "b").unwrap();
        assert_eq!((a, b), (DrawHandle(0), DrawHandle(1)));

        let fb = device.create_framebuffer();
        let tex = device.create_depth_texture(TextureKind::Texture2D, 16, 16).unwrap();
        assert_eq!((fb, tex), (FramebufferHandle(0), TextureHandle(0)));
    }

    #[test]
    fn test_framebuffer_pass_requires_attachment() {
        let mut device = RecordingDevice::new(1200, 800);
        let fb = device.create_framebuffer();
        let viewport = Viewport::sized(16, 16);
        assert!(device
            .begin_pass(PassTarget::Framebuffer(fb), viewport, ClearState::depth(1.0))
            .is_err());

        let tex = device.create_depth_texture(TextureKind::TextureCube, 16, 16).unwrap();
        device.attach_depth(fb, tex).unwrap();
        assert!(device
            .begin_pass(PassTarget::Framebuffer(fb), viewport, ClearState::depth(1.0))
            .is_ok());
    }

    #[test]
    fn test_attach_rejects_color_texture() {
        let mut device = RecordingDevice::new(4, 4);
        let fb = device.create_framebuffer();
        let image = DecodedImage {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        };
        let tex = device.create_texture_rgba8(&image).unwrap();
        assert!(matches!(
            device.attach_depth(fb, tex),
            Err(RenderError::UnknownHandle { kind: "depth texture", .. })
        ));
    }

    #[test]
    fn test_bind_checks_created_kind() {
        let mut device = RecordingDevice::new(4, 4);
        let cube = device.create_depth_texture(TextureKind::TextureCube, 4, 4).unwrap();
        device.bind_texture(6, cube, TextureKind::Texture2D);
        device.bind_texture(6, TextureHandle(9), TextureKind::Texture2D);
        device.bind_texture(6, cube, TextureKind::TextureCube);

        let binds: Vec<Command> = device
            .commands()
            .into_iter()
            .filter(|c| matches!(c, Command::BindTexture { .. }))
            .collect();
        assert_eq!(
            binds,
            vec![Command::BindTexture {
                unit: 6,
                texture: cube,
                kind: TextureKind::TextureCube,
            }]
        );
    }

    #[test]
    fn test_oversized_image_reports_length_mismatch() {
        let mut device = RecordingDevice::new(4, 4);
        let image = DecodedImage {
            width: 70_000,
            height: 70_000,
            pixels: Vec::new(),
        };
        assert!(matches!(
            device.create_texture_rgba8(&image),
            Err(RenderError::LengthMismatch {
                what: "pixels",
                expected: 19_600_000_000,
                actual: 0,
            })
        ));
    }

    #[test]
    fn test_draw_records_program_and_cull() {
        let mut device = RecordingDevice::new(1200, 800);
        let mesh = device.upload_mesh(&quad(), VertexLayout::Basic, "quad").unwrap();
        let layout = UniformLayout::new().field("far_plane", UniformKind::Float);
        let mut program = RecordingProgram::new("shadow", layout, device.log());

        device
            .begin_pass(PassTarget::Surface, Viewport::sized(1200, 800), ClearState::default())
            .unwrap();
        device.set_cull_face(CullFace::Front);
        program.set_float("far_plane", 25.0);
        device.draw(&mut program, mesh).unwrap();
        device.end_pass();

        let commands = device.commands();
        assert!(commands.contains(&Command::Draw {
            program: "shadow".into(),
            mesh,
            cull: CullFace::Front,
        }));
        assert_eq!(program.value("far_plane"), Some(UniformValue::Float(25.0)));
        assert_eq!(&program.staged_bytes()[..4], &25.0f32.to_ne_bytes());
    }

    #[test]
    fn test_draw_unknown_mesh_fails() {
        let mut device = RecordingDevice::new(4, 4);
        let mut program = RecordingProgram::new("scene", UniformLayout::new(), device.log());
        assert!(matches!(
            device.draw(&mut program, DrawHandle(3)),
            Err(RenderError::UnknownHandle { kind: "mesh", id: 3 })
        ));
    }

    #[test]
    fn test_release_drops_live_resources() {
        let mut device = RecordingDevice::new(4, 4);
        let mesh = device.upload_mesh(&quad(), VertexLayout::Basic, "quad").unwrap();
        let tex = device.create_depth_texture(TextureKind::Texture2D, 4, 4).unwrap();
        assert_eq!(device.live_resources(), 2);
        device.release_mesh(mesh);
        device.release_texture(tex);
        assert_eq!(device.live_resources(), 0);
    }
}
