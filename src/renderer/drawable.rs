//! Mesh plus material bindings
//!
//! A [`Drawable`] owns its mesh data, the texture maps it binds at draw time
//! and the volume flag that selects front-face culling in the directional
//! shadow pass.

use crate::core::vertex::VertexLayout;
use crate::error::{RenderError, Result};
use crate::gpu::{DrawHandle, GpuBufferUploader, RenderDevice, ShaderProgram};
use crate::renderer::geometry::MeshData;
use crate::renderer::texture_map::{bind_texture_map, TextureMap, TextureRole};

/// Sampler units below this are free for material maps.
pub const MATERIAL_UNIT_LIMIT: u32 = 5;

/// A drawable mesh with its material maps.
#[derive(Debug, Clone)]
pub struct Drawable {
    label: String,
    mesh: MeshData,
    layout: VertexLayout,
    texture_maps: Vec<TextureMap>,
    volume: bool,
    handle: Option<DrawHandle>,
}

impl Drawable {
    /// Create a drawable. Closed volumes (`volume = true`) cull front faces
    /// when casting directional shadows.
    pub fn new(
        label: impl Into<String>,
        mesh: MeshData,
        layout: VertexLayout,
        volume: bool,
    ) -> Self {
        Self {
            label: label.into(),
            mesh,
            layout,
            texture_maps: Vec::new(),
            volume,
            handle: None,
        }
    }

    /// Replace the material maps. Bind order becomes sampler unit order.
    pub fn with_texture_maps(mut self, maps: Vec<TextureMap>) -> Result<Self> {
        self.set_texture_maps(maps)?;
        Ok(self)
    }

    pub fn set_texture_maps(&mut self, maps: Vec<TextureMap>) -> Result<()> {
        if maps.len() > MATERIAL_UNIT_LIMIT as usize {
            return Err(RenderError::TooManyTextureMaps {
                count: maps.len(),
                max: MATERIAL_UNIT_LIMIT as usize,
            });
        }
        if maps.iter().any(|m| m.role().is_shadow()) {
            return Err(RenderError::RoleMismatch {
                expected: "material",
                found: "shadow",
            });
        }
        self.texture_maps = maps;
        Ok(())
    }

    /// Upload the mesh. A second call without [`Drawable::release`] is logged
    /// and rejected.
    pub fn initialize<U: GpuBufferUploader + ?Sized>(&mut self, uploader: &mut U) -> Result<()> {
        if self.handle.is_some() {
            let err = RenderError::AlreadyInitialized(self.label.clone());
            tracing::error!(tag = err.tag(), "{err}");
            return Err(err);
        }
        let handle = uploader.upload_mesh(&self.mesh, self.layout, &self.label)?;
        tracing::debug!(
            label = %self.label,
            vertices = self.mesh.vertices.len(),
            indices = self.mesh.indices.len(),
            "drawable uploaded"
        );
        self.handle = Some(handle);
        Ok(())
    }

    /// Release the GPU mesh. Safe to call on an uninitialized drawable.
    pub fn release<U: GpuBufferUploader + ?Sized>(&mut self, uploader: &mut U) {
        if let Some(handle) = self.handle.take() {
            uploader.release_mesh(handle);
        }
    }

    /// Bind material maps, publish their uniforms and issue an indexed draw.
    ///
    /// Map `i` goes to unit `i` and is named `{role}[n]` where `n` counts
    /// earlier maps of the same role. Unit 0 is left active afterwards.
    pub fn draw<D: RenderDevice>(&self, device: &mut D, program: &mut D::Program) -> Result<()> {
        let handle = self
            .handle
            .ok_or_else(|| RenderError::NotInitialized(self.label.clone()))?;

        let mut role_counts = [0usize; 4];
        for (unit, map) in self.texture_maps.iter().enumerate() {
            let unit = unit as u32;
            let Some(slot) = material_slot(map.role()) else {
                continue;
            };
            let name = format!("{}[{}]", map.role().uniform_name(), role_counts[slot]);
            role_counts[slot] += 1;

            device.set_active_unit(unit);
            bind_texture_map(device, map, unit);
            program.set_int(&format!("{name}.texture_data"), unit as i32);
            map.params().publish(program, &name);
        }

        device.draw(program, handle)?;
        device.set_active_unit(0);
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_volume(&self) -> bool {
        self.volume
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    pub fn texture_maps(&self) -> &[TextureMap] {
        &self.texture_maps
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }
}

fn material_slot(role: TextureRole) -> Option<usize> {
    match role {
        TextureRole::Diffuse => Some(0),
        TextureRole::Specular => Some(1),
        TextureRole::Normal => Some(2),
        TextureRole::Depth => Some(3),
        TextureRole::Shadow2D | TextureRole::ShadowCube => None,
    }
}
