//! Render pipeline builder
//!
//! Builds colour or depth-only pipelines from an already validated shader
//! module.

use crate::context::WgpuContext;
use crate::core::render_states::{BlendState, CullFace, DepthState};
use crate::core::texture::DepthTexture;

/// Builder for creating render pipelines.
pub struct PipelineBuilder<'a> {
    ctx: &'a WgpuContext,
    module: &'a wgpu::ShaderModule,
    label: Option<&'a str>,
    vertex_entry: &'a str,
    fragment_entry: &'a str,
    vertex_layouts: Vec<wgpu::VertexBufferLayout<'a>>,
    bind_group_layouts: Vec<&'a wgpu::BindGroupLayout>,
    color_format: Option<wgpu::TextureFormat>,
    depth_state: DepthState,
    blend_state: BlendState,
    cull_face: CullFace,
    front_face: wgpu::FrontFace,
}

impl<'a> PipelineBuilder<'a> {
    /// Pipeline over `module`, entry points `vs_main` and `fs_main`.
    pub fn new(ctx: &'a WgpuContext, module: &'a wgpu::ShaderModule) -> Self {
        Self {
            ctx,
            module,
            label: None,
            vertex_entry: "vs_main",
            fragment_entry: "fs_main",
            vertex_layouts: Vec::new(),
            bind_group_layouts: Vec::new(),
            color_format: None,
            depth_state: DepthState::default(),
            blend_state: BlendState::default(),
            cull_face: CullFace::default(),
            front_face: wgpu::FrontFace::Ccw,
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn vertex_layout(mut self, layout: wgpu::VertexBufferLayout<'a>) -> Self {
        self.vertex_layouts.push(layout);
        self
    }

    pub fn bind_group_layout(mut self, layout: &'a wgpu::BindGroupLayout) -> Self {
        self.bind_group_layouts.push(layout);
        self
    }

    /// Write colour to a target of this format. Without one the pipeline is depth-only.
    pub fn color_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    pub fn depth(mut self, state: DepthState) -> Self {
        self.depth_state = state;
        self
    }

    pub fn blend(mut self, state: BlendState) -> Self {
        self.blend_state = state;
        self
    }

    pub fn cull(mut self, face: CullFace) -> Self {
        self.cull_face = face;
        self
    }

    /// Winding of front faces in framebuffer space.
    pub fn front_face(mut self, front_face: wgpu::FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    pub fn build(self) -> wgpu::RenderPipeline {
        let pipeline_layout = self
            .ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: self.label,
                bind_group_layouts: &self.bind_group_layouts,
                immediate_size: 0,
            });

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = self
            .color_format
            .map(|format| wgpu::ColorTargetState {
                format,
                blend: self.blend_state.to_wgpu(),
                write_mask: wgpu::ColorWrites::ALL,
            })
            .into_iter()
            .map(Some)
            .collect();

        self.ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: self.label,
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: self.module,
                    entry_point: Some(self.vertex_entry),
                    buffers: &self.vertex_layouts,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.module,
                    entry_point: Some(self.fragment_entry),
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: self.front_face,
                    cull_mode: self.cull_face.to_wgpu(),
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(self.depth_state.to_wgpu(DepthTexture::FORMAT)),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview_mask: None,
                cache: None,
            })
    }
}
