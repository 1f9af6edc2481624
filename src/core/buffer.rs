//! GPU buffer abstractions
//!
//! Mesh buffers created once at upload, and the per-draw uniform block.

use crate::context::WgpuContext;
use crate::core::vertex::Vertex;
use wgpu::util::DeviceExt;

/// A GPU buffer containing vertex data.
pub struct VertexBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) count: u32,
}

impl VertexBuffer {
    pub fn new(ctx: &WgpuContext, vertices: &[Vertex], label: Option<&str>) -> Self {
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Self {
            buffer,
            count: vertices.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }
}

/// A GPU buffer containing `u32` index data.
pub struct IndexBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) count: u32,
}

impl IndexBuffer {
    pub const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

    pub fn new(ctx: &WgpuContext, indices: &[u32], label: Option<&str>) -> Self {
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            buffer,
            count: indices.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buffer.slice(..)
    }
}

/// Vertex and index buffers of one uploaded mesh.
pub struct MeshBuffers {
    pub vertices: VertexBuffer,
    pub indices: IndexBuffer,
}

/// Uniform buffer initialised from a staged byte image.
///
/// Every draw gets its own, so values published between two draws of one
/// frame never overwrite each other before submission.
pub struct UniformBlockBuffer {
    pub(crate) buffer: wgpu::Buffer,
}

impl UniformBlockBuffer {
    pub fn from_bytes(ctx: &WgpuContext, bytes: &[u8], label: Option<&str>) -> Self {
        let buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents: bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
