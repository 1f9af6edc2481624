//! Vertex format
//!
//! One fixed vertex struct is shared by every mesh; the tangent frame is
//! always stored and only declared to the pipeline when normal mapping is on.

use bytemuck::{Pod, Zeroable};

/// Vertex with position, normal, UV and tangent frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        }
    }

    /// Attach a tangent frame.
    pub const fn with_tangent_frame(mut self, tangent: [f32; 3], bitangent: [f32; 3]) -> Self {
        self.tangent = tangent;
        self.bitangent = bitangent;
        self
    }
}

/// Which vertex attributes a mesh or program declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexLayout {
    /// Position, normal, UV.
    #[default]
    Basic,
    /// Position, normal, UV, tangent, bitangent.
    NormalMapped,
}

const BASIC_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    // position
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    // normal
    wgpu::VertexAttribute {
        offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    },
    // uv
    wgpu::VertexAttribute {
        offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x2,
    },
];

const NORMAL_MAPPED_ATTRIBUTES: [wgpu::VertexAttribute; 5] = [
    BASIC_ATTRIBUTES[0],
    BASIC_ATTRIBUTES[1],
    BASIC_ATTRIBUTES[2],
    // tangent
    wgpu::VertexAttribute {
        offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x3,
    },
    // bitangent
    wgpu::VertexAttribute {
        offset: std::mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
        shader_location: 4,
        format: wgpu::VertexFormat::Float32x3,
    },
];

impl VertexLayout {
    /// Number of attributes declared.
    pub const fn attribute_count(self) -> usize {
        match self {
            VertexLayout::Basic => BASIC_ATTRIBUTES.len(),
            VertexLayout::NormalMapped => NORMAL_MAPPED_ATTRIBUTES.len(),
        }
    }

    /// Get the vertex buffer layout for this attribute set.
    ///
    /// The stride is always the full [`Vertex`] size so one buffer serves both.
    pub const fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexLayout::Basic => &BASIC_ATTRIBUTES,
            VertexLayout::NormalMapped => &NORMAL_MAPPED_ATTRIBUTES,
        };
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 56); // 3+3+2+3+3 floats = 14 floats * 4 bytes
    }

    #[test]
    fn test_attribute_offsets_match_fields() {
        let layout = VertexLayout::NormalMapped.buffer_layout();
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32, 44]);
        assert_eq!(layout.array_stride, 56);
    }

    #[test]
    fn test_basic_layout_skips_tangents() {
        let layout = VertexLayout::Basic.buffer_layout();
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.array_stride, 56);
        assert_eq!(VertexLayout::Basic.attribute_count(), 3);
    }
}
