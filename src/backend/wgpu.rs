//! wgpu backend
//!
//! Implements the GL-style [`RenderDevice`] seam on top of wgpu. Passes and
//! draws are recorded as they are issued and flushed through a single
//! command encoder in [`RenderDevice::present`]. Every draw snapshots the
//! program's staged uniforms into its own buffer and resolves the texture
//! unit table into a bind group, so later uniform writes never leak into
//! earlier draws of the same frame.

use crate::context::WgpuContext;
use crate::core::buffer::{IndexBuffer, MeshBuffers, UniformBlockBuffer, VertexBuffer};
use crate::core::pipeline::PipelineBuilder;
use crate::core::render_states::{BlendState, ClearState, CullFace, DepthState};
use crate::core::texture::{DepthTexture, Samplers, Texture2D};
use crate::core::uniform::{StageOutcome, StagingBlock, UniformLayout, UniformValue};
use crate::core::vertex::VertexLayout;
use crate::error::{RenderError, Result};
use crate::gpu::{
    DecodedImage, DrawHandle, FallbackTexture, FramebufferHandle, GpuBufferUploader, PassTarget,
    ProgramDescriptor, RenderDevice, SamplerSlot, ShaderCompiler, ShaderProgram, TargetKind,
    TextureHandle, TextureKind, Viewport,
};
use crate::renderer::geometry::MeshData;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Parse and validate WGSL with naga.
pub fn validate_wgsl(source: &str, path: &std::path::Path) -> Result<()> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| RenderError::ShaderParse {
        path: path.to_path_buf(),
        message: err.emit_to_string(source),
    })?;
    let flags = naga::valid::ValidationFlags::all();
    naga::valid::Validator::new(flags, naga::valid::Capabilities::all())
        .validate(&module)
        .map_err(|err| RenderError::ShaderParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    Ok(())
}

/// Read every distinct stage file of a descriptor, in order.
fn read_sources(descriptor: &ProgramDescriptor) -> Result<(String, PathBuf)> {
    let mut paths: Vec<&PathBuf> = Vec::new();
    for stage in &descriptor.stages {
        if !paths.contains(&&stage.path) {
            paths.push(&stage.path);
        }
    }
    let mut source = String::new();
    for path in &paths {
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        source.push_str(&text);
        source.push('\n');
    }
    let first = paths.first().map(|p| p.to_path_buf()).unwrap_or_default();
    Ok((source, first))
}

/// Pick the WGSL to compile: the stage files when they load and validate,
/// otherwise the descriptor's embedded source.
fn resolve_source(descriptor: &ProgramDescriptor) -> Result<String> {
    let loaded = read_sources(descriptor).and_then(|(source, path)| {
        validate_wgsl(&source, &path)?;
        Ok(source)
    });

    match (loaded, descriptor.embedded) {
        (Ok(source), _) => Ok(source),
        (Err(err), Some(embedded)) => {
            tracing::warn!(
                tag = shader_tag(&err),
                program = %descriptor.label,
                error = %err,
                "shader files unusable, using built-in source"
            );
            validate_wgsl(embedded, &PathBuf::from(format!("<{}>", descriptor.label)))?;
            Ok(embedded.to_string())
        }
        (Err(err), None) => {
            tracing::error!(
                tag = shader_tag(&err),
                program = %descriptor.label,
                error = %err,
                "shader load failed"
            );
            Err(err)
        }
    }
}

fn shader_tag(err: &RenderError) -> &'static str {
    match err {
        RenderError::Io { .. } => "shader::load::io",
        other => other.tag(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    color_format: Option<wgpu::TextureFormat>,
    cull: CullFace,
    front_face: wgpu::FrontFace,
}

struct ProgramShared {
    label: String,
    module: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    uniforms: UniformLayout,
    samplers: Vec<SamplerSlot>,
    vertex_layout: VertexLayout,
    target: TargetKind,
    pipelines: Mutex<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

impl ProgramShared {
    fn pipeline(&self, ctx: &WgpuContext, key: PipelineKey) -> wgpu::RenderPipeline {
        let mut pipelines = self.pipelines.lock().unwrap_or_else(|e| e.into_inner());
        pipelines
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(program = %self.label, ?key, "building pipeline");
                let mut builder = PipelineBuilder::new(ctx, &self.module)
                    .label(&self.label)
                    .vertex_layout(self.vertex_layout.buffer_layout())
                    .bind_group_layout(&self.bind_group_layout)
                    .depth(DepthState::read_write())
                    .cull(key.cull)
                    .front_face(key.front_face);
                if let Some(format) = key.color_format {
                    builder = builder.color_format(format).blend(BlendState::Alpha);
                }
                builder.build()
            })
            .clone()
    }
}

/// A compiled program plus its staged uniform values.
///
/// Clones share the GPU module and pipelines but stage uniforms
/// independently, so each object can own one.
#[derive(Clone)]
pub struct WgpuProgram {
    shared: Arc<ProgramShared>,
    staging: StagingBlock,
    sampler_units: Vec<Option<u32>>,
}

impl WgpuProgram {
    pub fn label(&self) -> &str {
        &self.shared.label
    }
}

impl std::fmt::Debug for WgpuProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuProgram").field("label", &self.shared.label).finish()
    }
}

impl ShaderProgram for WgpuProgram {
    fn use_program(&mut self) {
        tracing::trace!(program = %self.shared.label, "use program");
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if let Some(index) = self.shared.samplers.iter().position(|s| s.uniform == name) {
            match value {
                UniformValue::Int(unit) if unit >= 0 => {
                    self.sampler_units[index] = Some(unit as u32)
                }
                other => tracing::warn!(
                    program = %self.shared.label,
                    uniform = name,
                    kind = ?other.kind(),
                    "sampler uniform expects a non-negative int"
                ),
            }
            return;
        }

        let outcome = self.staging.write(&self.shared.uniforms, name, value);
        if let StageOutcome::KindMismatch { expected } = outcome {
            tracing::warn!(
                program = %self.shared.label,
                uniform = name,
                ?expected,
                found = ?value.kind(),
                "uniform kind mismatch"
            );
        }
    }
}

/// Compiles [`ProgramDescriptor`]s into [`WgpuProgram`]s.
pub struct WgpuShaderCompiler {
    ctx: WgpuContext,
}

impl WgpuShaderCompiler {
    pub fn new(ctx: WgpuContext) -> Self {
        Self { ctx }
    }
}

impl ShaderCompiler for WgpuShaderCompiler {
    type Program = WgpuProgram;

    fn compile(&mut self, descriptor: &ProgramDescriptor) -> Result<WgpuProgram> {
        let source = resolve_source(descriptor)?;
        let module = self
            .ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.label.as_str()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for (i, slot) in descriptor.samplers.iter().enumerate() {
            let (texture, sampler) = sampler_binding_types(slot);
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1 + 2 * i as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: texture,
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 + 2 * i as u32,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: sampler,
                count: None,
            });
        }

        let layout_label = format!("{} layout", descriptor.label);
        let bind_group_layout = self
            .ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(layout_label.as_str()),
                entries: &entries,
            });

        tracing::info!(
            program = %descriptor.label,
            uniforms = descriptor.uniforms.size(),
            samplers = descriptor.samplers.len(),
            "program compiled"
        );

        Ok(WgpuProgram {
            staging: StagingBlock::new(&descriptor.uniforms),
            sampler_units: vec![None; descriptor.samplers.len()],
            shared: Arc::new(ProgramShared {
                label: descriptor.label.clone(),
                module,
                bind_group_layout,
                uniforms: descriptor.uniforms.clone(),
                samplers: descriptor.samplers.clone(),
                vertex_layout: descriptor.vertex_layout,
                target: descriptor.target,
                pipelines: Mutex::new(HashMap::new()),
            }),
        })
    }
}

fn sampler_binding_types(slot: &SamplerSlot) -> (wgpu::BindingType, wgpu::BindingType) {
    let view_dimension = match slot.kind {
        TextureKind::Texture2D => wgpu::TextureViewDimension::D2,
        TextureKind::TextureCube => wgpu::TextureViewDimension::Cube,
    };
    let (sample_type, sampler) = match (slot.depth, slot.kind) {
        (false, _) => (
            wgpu::TextureSampleType::Float { filterable: true },
            wgpu::SamplerBindingType::Filtering,
        ),
        (true, TextureKind::Texture2D) => (
            wgpu::TextureSampleType::Depth,
            wgpu::SamplerBindingType::Comparison,
        ),
        (true, TextureKind::TextureCube) => (
            wgpu::TextureSampleType::Depth,
            wgpu::SamplerBindingType::NonFiltering,
        ),
    };
    (
        wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        wgpu::BindingType::Sampler(sampler),
    )
}

enum GpuTexture {
    Color(Texture2D),
    Depth(DepthTexture),
}

struct Fallbacks {
    white: Texture2D,
    black: Texture2D,
    flat_normal: Texture2D,
    far_depth: DepthTexture,
    far_depth_cube: DepthTexture,
}

impl Fallbacks {
    fn new(ctx: &WgpuContext) -> Result<Self> {
        let far_depth =
            DepthTexture::new(ctx, TextureKind::Texture2D, 1, 1, Some("fallback depth"));
        let far_depth_cube =
            DepthTexture::new(ctx, TextureKind::TextureCube, 1, 1, Some("fallback depth cube"));
        far_depth.clear(ctx, 1.0);
        far_depth_cube.clear(ctx, 1.0);
        Ok(Self {
            white: Texture2D::solid(ctx, [255, 255, 255, 255], Some("fallback white"))?,
            black: Texture2D::solid(ctx, [0, 0, 0, 255], Some("fallback black"))?,
            flat_normal: Texture2D::solid(ctx, [128, 128, 255, 255], Some("fallback normal"))?,
            far_depth,
            far_depth_cube,
        })
    }

    fn view(&self, slot: &SamplerSlot) -> &wgpu::TextureView {
        match (slot.fallback, slot.kind) {
            (FallbackTexture::White, _) => self.white.view(),
            (FallbackTexture::Black, _) => self.black.view(),
            (FallbackTexture::FlatNormal, _) => self.flat_normal.view(),
            (FallbackTexture::FarDepth, TextureKind::Texture2D) => self.far_depth.sample_view(),
            (FallbackTexture::FarDepth, TextureKind::TextureCube) => {
                self.far_depth_cube.sample_view()
            }
        }
    }
}

/// Where finished frames go.
enum Output {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
        width: u32,
        height: u32,
    },
}

impl Output {
    fn size(&self) -> (u32, u32) {
        match self {
            Output::Surface { config, .. } => (config.width, config.height),
            Output::Offscreen { width, height, .. } => (*width, *height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attachment {
    Surface,
    Layer { texture: TextureHandle, layer: usize },
}

struct RecordedDraw {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    mesh: DrawHandle,
}

struct RecordedPass {
    attachment: Attachment,
    viewport: Viewport,
    clear: ClearState,
    draws: Vec<RecordedDraw>,
}

/// [`RenderDevice`] backed by a wgpu device.
pub struct WgpuDevice {
    ctx: WgpuContext,
    output: Output,
    color_format: wgpu::TextureFormat,
    depth: DepthTexture,
    samplers: Samplers,
    fallbacks: Fallbacks,
    meshes: Vec<Option<MeshBuffers>>,
    textures: Vec<Option<GpuTexture>>,
    framebuffers: Vec<Option<Option<TextureHandle>>>,
    units: HashMap<u32, (TextureHandle, TextureKind)>,
    active_unit: u32,
    cull_face: CullFace,
    passes: Vec<RecordedPass>,
    open: Option<std::ops::Range<usize>>,
}

impl WgpuDevice {
    /// Colour format of offscreen frames.
    pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Device presenting to a window surface created from the same instance as `adapter`.
    pub fn for_surface(
        ctx: WgpuContext,
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        size: (u32, u32),
        vsync: bool,
    ) -> Result<Self> {
        let caps = surface.get_capabilities(adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Setup("surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &config);
        tracing::info!(?format, width = config.width, height = config.height, "surface configured");

        Self::with_output(ctx, Output::Surface { surface, config }, format)
    }

    /// Device rendering into an offscreen texture.
    pub fn headless(ctx: WgpuContext, width: u32, height: u32) -> Result<Self> {
        let texture = offscreen_texture(&ctx, width.max(1), height.max(1));
        let output = Output::Offscreen {
            texture,
            width: width.max(1),
            height: height.max(1),
        };
        Self::with_output(ctx, output, Self::OFFSCREEN_FORMAT)
    }

    fn with_output(
        ctx: WgpuContext,
        output: Output,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let (width, height) = output.size();
        let depth =
            DepthTexture::new(&ctx, TextureKind::Texture2D, width, height, Some("surface depth"));
        let samplers = Samplers::new(&ctx);
        let fallbacks = Fallbacks::new(&ctx)?;
        Ok(Self {
            ctx,
            output,
            color_format,
            depth,
            samplers,
            fallbacks,
            meshes: Vec::new(),
            textures: Vec::new(),
            framebuffers: Vec::new(),
            units: HashMap::new(),
            active_unit: 0,
            cull_face: CullFace::Back,
            passes: Vec::new(),
            open: None,
        })
    }

    /// Compiler producing programs for this device.
    pub fn compiler(&self) -> WgpuShaderCompiler {
        WgpuShaderCompiler::new(self.ctx.clone())
    }

    pub fn context(&self) -> &WgpuContext {
        &self.ctx
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    fn push_texture(&mut self, texture: GpuTexture) -> TextureHandle {
        self.textures.push(Some(texture));
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn texture(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn depth_texture(&self, handle: TextureHandle) -> Result<&DepthTexture> {
        match self.texture(handle) {
            Some(GpuTexture::Depth(depth)) => Ok(depth),
            _ => Err(RenderError::UnknownHandle {
                kind: "depth texture",
                id: handle.0,
            }),
        }
    }

    fn sampler_view(&self, slot: &SamplerSlot, unit: Option<u32>) -> &wgpu::TextureView {
        let bound = unit
            .and_then(|unit| self.units.get(&unit))
            .and_then(|(handle, _)| self.texture(*handle));
        match (slot.depth, bound) {
            (false, Some(GpuTexture::Color(texture))) => texture.view(),
            (true, Some(GpuTexture::Depth(depth))) if depth.kind() == slot.kind => {
                depth.sample_view()
            }
            _ => self.fallbacks.view(slot),
        }
    }

    fn sampler_for(&self, slot: &SamplerSlot) -> &wgpu::Sampler {
        match (slot.depth, slot.kind) {
            (false, _) => &self.samplers.material,
            (true, TextureKind::Texture2D) => &self.samplers.shadow_compare,
            (true, TextureKind::TextureCube) => &self.samplers.shadow_depth,
        }
    }

    fn bind_group(&self, program: &WgpuProgram, uniforms: &UniformBlockBuffer) -> wgpu::BindGroup {
        let shared = &program.shared;
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniforms.buffer().as_entire_binding(),
        }];
        for (i, slot) in shared.samplers.iter().enumerate() {
            let unit = program.sampler_units.get(i).copied().flatten();
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * i as u32,
                resource: wgpu::BindingResource::TextureView(self.sampler_view(slot, unit)),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * i as u32,
                resource: wgpu::BindingResource::Sampler(self.sampler_for(slot)),
            });
        }
        self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(shared.label.as_str()),
            layout: &shared.bind_group_layout,
            entries: &entries,
        })
    }

    fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        passes: &[RecordedPass],
    ) -> Result<()> {
        for pass in passes {
            let (depth_view, target_size) = match pass.attachment {
                Attachment::Surface => (self.depth.sample_view(), self.output.size()),
                Attachment::Layer { texture, layer } => {
                    let depth = self.depth_texture(texture)?;
                    let view = depth.layer_view(layer).ok_or(RenderError::UnknownHandle {
                        kind: "depth layer",
                        id: layer as u32,
                    })?;
                    (view, depth.size())
                }
            };

            let color_attachments = match pass.attachment {
                Attachment::Surface => vec![Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: pass.clear.color_load_op(),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                Attachment::Layer { .. } => Vec::new(),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("umbra pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: pass.clear.depth_load_op(),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let viewport = clamp_viewport(pass.viewport, target_size);
            render_pass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );

            for draw in &pass.draws {
                let mesh = self.meshes.get(draw.mesh.0 as usize).and_then(Option::as_ref);
                let Some(mesh) = mesh else {
                    continue;
                };
                render_pass.set_pipeline(&draw.pipeline);
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertices.slice());
                render_pass.set_index_buffer(mesh.indices.slice(), IndexBuffer::FORMAT);
                render_pass.draw_indexed(0..mesh.indices.count(), 0, 0..1);
            }
        }
        Ok(())
    }
}

fn offscreen_texture(ctx: &WgpuContext, width: u32, height: u32) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen color"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: WgpuDevice::OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Keep a viewport inside a `(width, height)` target.
fn clamp_viewport(viewport: Viewport, (width, height): (u32, u32)) -> Viewport {
    let x = viewport.x.min(width.saturating_sub(1));
    let y = viewport.y.min(height.saturating_sub(1));
    Viewport {
        x,
        y,
        width: viewport.width.min(width - x).max(1),
        height: viewport.height.min(height - y).max(1),
    }
}

impl GpuBufferUploader for WgpuDevice {
    fn upload_mesh(
        &mut self,
        mesh: &MeshData,
        _layout: VertexLayout,
        label: &str,
    ) -> Result<DrawHandle> {
        if mesh.indices.is_empty() {
            return Err(RenderError::InvalidGeometry(format!("mesh `{label}` is empty")));
        }
        let buffers = MeshBuffers {
            vertices: VertexBuffer::new(&self.ctx, &mesh.vertices, Some(label)),
            indices: IndexBuffer::new(&self.ctx, &mesh.indices, Some(label)),
        };
        self.meshes.push(Some(buffers));
        Ok(DrawHandle(self.meshes.len() as u32 - 1))
    }

    fn release_mesh(&mut self, handle: DrawHandle) {
        if let Some(slot) = self.meshes.get_mut(handle.0 as usize) {
            *slot = None;
        }
    }
}

impl RenderDevice for WgpuDevice {
    type Program = WgpuProgram;

    fn create_framebuffer(&mut self) -> FramebufferHandle {
        self.framebuffers.push(Some(None));
        FramebufferHandle(self.framebuffers.len() as u32 - 1)
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
        let depth = DepthTexture::new(&self.ctx, kind, width, height, Some("shadow depth"));
        Ok(self.push_texture(GpuTexture::Depth(depth)))
    }

    fn create_texture_rgba8(&mut self, image: &DecodedImage) -> Result<TextureHandle> {
        let texture = Texture2D::from_image(&self.ctx, image, Some("material"))?;
        Ok(self.push_texture(GpuTexture::Color(texture)))
    }

    fn attach_depth(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<()> {
        self.depth_texture(texture)?;
        let slot = self
            .framebuffers
            .get_mut(framebuffer.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(RenderError::UnknownHandle {
                kind: "framebuffer",
                id: framebuffer.0,
            })?;
        *slot = Some(texture);
        Ok(())
    }

    fn set_active_unit(&mut self, unit: u32) {
        self.active_unit = unit;
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle, kind: TextureKind) {
        self.active_unit = unit;
        self.units.insert(unit, (texture, kind));
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull_face = face;
    }

    fn begin_pass(
        &mut self,
        target: PassTarget,
        viewport: Viewport,
        clear: ClearState,
    ) -> Result<()> {
        if self.open.is_some() {
            tracing::warn!("begin_pass while a pass is open, closing it");
            self.end_pass();
        }

        let attachments: Vec<Attachment> = match target {
            PassTarget::Surface => vec![Attachment::Surface],
            PassTarget::Framebuffer(fb) => {
                let texture = self
                    .framebuffers
                    .get(fb.0 as usize)
                    .copied()
                    .flatten()
                    .flatten()
                    .ok_or(RenderError::UnknownHandle {
                        kind: "framebuffer",
                        id: fb.0,
                    })?;
                let layers = self.depth_texture(texture)?.layer_count();
                (0..layers).map(|layer| Attachment::Layer { texture, layer }).collect()
            }
        };

        let start = self.passes.len();
        self.passes.extend(attachments.into_iter().map(|attachment| RecordedPass {
            attachment,
            viewport,
            clear,
            draws: Vec::new(),
        }));
        self.open = Some(start..self.passes.len());
        Ok(())
    }

    fn end_pass(&mut self) {
        self.open = None;
    }

    fn draw(&mut self, program: &mut WgpuProgram, mesh: DrawHandle) -> Result<()> {
        let Some(range) = self.open.clone() else {
            tracing::warn!(program = %program.label(), "draw outside a pass ignored");
            return Ok(());
        };
        if self.meshes.get(mesh.0 as usize).and_then(Option::as_ref).is_none() {
            return Err(RenderError::UnknownHandle {
                kind: "mesh",
                id: mesh.0,
            });
        }

        let attachment = self.passes[range.start].attachment;
        let (color_format, cube) = match attachment {
            Attachment::Surface => (Some(self.color_format), false),
            Attachment::Layer { texture, .. } => {
                let kind = self.depth_texture(texture)?.kind();
                (None, kind == TextureKind::TextureCube)
            }
        };
        // The cube program flips y, which mirrors winding.
        let front_face = if cube { wgpu::FrontFace::Cw } else { wgpu::FrontFace::Ccw };
        let writes_color = program.shared.target == TargetKind::Color;
        if writes_color != color_format.is_some() {
            tracing::warn!(
                program = %program.label(),
                "program target does not match pass, draw skipped"
            );
            return Ok(());
        }

        let pipeline = program.shared.pipeline(
            &self.ctx,
            PipelineKey {
                color_format,
                cull: self.cull_face,
                front_face,
            },
        );

        for (face, index) in range.enumerate() {
            let mut staging = program.staging.clone();
            if cube {
                let value = UniformValue::Int(face as i32);
                staging.write(&program.shared.uniforms, "cube_face", value);
            }
            let label = Some(program.label());
            let uniforms = UniformBlockBuffer::from_bytes(&self.ctx, staging.as_bytes(), label);
            let bind_group = self.bind_group(program, &uniforms);
            self.passes[index].draws.push(RecordedDraw {
                pipeline: pipeline.clone(),
                bind_group,
                mesh,
            });
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        match &mut self.output {
            Output::Surface { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.ctx.device, config);
            }
            Output::Offscreen {
                texture,
                width: w,
                height: h,
            } => {
                *texture = offscreen_texture(&self.ctx, width, height);
                *w = width;
                *h = height;
            }
        }
        self.depth = DepthTexture::new(
            &self.ctx,
            TextureKind::Texture2D,
            width,
            height,
            Some("surface depth"),
        );
        tracing::debug!(width, height, "device resized");
    }

    fn present(&mut self) -> Result<()> {
        self.end_pass();
        let passes = std::mem::take(&mut self.passes);

        let frame = match &self.output {
            Output::Surface { surface, config } => match surface.get_current_texture() {
                Ok(frame) => Some(frame),
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    surface.configure(&self.ctx.device, config);
                    return Ok(());
                }
                Err(err) => {
                    tracing::error!(tag = "gpu::present::surface", error = %err, "frame dropped");
                    return Ok(());
                }
            },
            Output::Offscreen { .. } => None,
        };
        let descriptor = wgpu::TextureViewDescriptor::default();
        let view = match (&frame, &self.output) {
            (Some(frame), _) => frame.texture.create_view(&descriptor),
            (None, Output::Offscreen { texture, .. }) => texture.create_view(&descriptor),
            (None, Output::Surface { .. }) => return Ok(()),
        };

        let mut encoder = self.ctx.create_encoder(Some("umbra frame"));
        let encoded = self.encode(&mut encoder, &view, &passes);
        self.ctx.submit(std::iter::once(encoder.finish()));
        if let Some(frame) = frame {
            frame.present();
        }
        encoded
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        if let Some(slot) = self.textures.get_mut(texture.0 as usize) {
            *slot = None;
        }
        self.units.retain(|_, (bound, _)| *bound != texture);
    }

    fn release_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(slot) = self.framebuffers.get_mut(framebuffer.0 as usize) {
            *slot = None;
        }
    }
}
