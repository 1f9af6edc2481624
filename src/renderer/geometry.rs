//! Geometry expansion
//!
//! Meshes are authored as three independent attribute pools (positions,
//! normals, UVs), each addressed by its own index stream. One pass of the
//! index streams describes a face template; `cycle` repeats it, advancing
//! every pool by `pool.len() / cycle` entries per repetition. A pool shorter
//! than `cycle` is shared by all repetitions.
//!
//! Every pool must either split evenly into `cycle` blocks or be shorter than
//! `cycle`. A cube is therefore authored with four corners per face (24
//! positions for `cycle = 6`); eight shared corners do not split into six
//! faces and are rejected.

use crate::core::vertex::Vertex;
use crate::error::{RenderError, Result};
use glam::{Vec2, Vec3};
use std::collections::HashMap;

const DEGENERATE_EPSILON: f32 = 1e-8;

/// Expands indexed attribute pools into a flat triangle list.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    position_indices: Vec<u32>,
    normal_indices: Vec<u32>,
    uv_indices: Vec<u32>,
    cycle: usize,
    tangents: bool,
}

impl GeometryBuilder {
    pub fn new() -> Self {
        Self {
            cycle: 1,
            ..Default::default()
        }
    }

    pub fn positions(
        mut self,
        positions: impl Into<Vec<Vec3>>,
        indices: impl Into<Vec<u32>>,
    ) -> Self {
        self.positions = positions.into();
        self.position_indices = indices.into();
        self
    }

    pub fn normals(mut self, normals: impl Into<Vec<Vec3>>, indices: impl Into<Vec<u32>>) -> Self {
        self.normals = normals.into();
        self.normal_indices = indices.into();
        self
    }

    pub fn uvs(mut self, uvs: impl Into<Vec<Vec2>>, indices: impl Into<Vec<u32>>) -> Self {
        self.uvs = uvs.into();
        self.uv_indices = indices.into();
        self
    }

    /// Number of times the index template repeats.
    pub fn cycle(mut self, cycle: usize) -> Self {
        self.cycle = cycle;
        self
    }

    /// Compute tangent and bitangent per triangle.
    pub fn with_tangents(mut self, tangents: bool) -> Self {
        self.tangents = tangents;
        self
    }

    /// Produce the flat vertex list, three vertices per triangle in stream order.
    pub fn expand(&self) -> Result<Vec<Vertex>> {
        let group = self.position_indices.len();
        if group == 0 || group % 3 != 0 {
            return Err(RenderError::InvalidGeometry(format!(
                "index template length {group} is not a positive multiple of 3"
            )));
        }
        if self.normal_indices.len() != group || self.uv_indices.len() != group {
            return Err(RenderError::InvalidGeometry(format!(
                "index streams differ in length: {} positions, {} normals, {} uvs",
                group,
                self.normal_indices.len(),
                self.uv_indices.len()
            )));
        }
        if self.cycle == 0 {
            return Err(RenderError::InvalidGeometry("cycle must be at least 1".into()));
        }

        let position_stride = pool_stride("position", self.positions.len(), self.cycle)?;
        let normal_stride = pool_stride("normal", self.normals.len(), self.cycle)?;
        let uv_stride = pool_stride("uv", self.uvs.len(), self.cycle)?;

        let mut vertices = Vec::with_capacity(group * self.cycle);
        for repeat in 0..self.cycle {
            for i in 0..group {
                let position = fetch(
                    &self.positions,
                    self.position_indices[i],
                    repeat * position_stride,
                    "position",
                )?;
                let normal =
                    fetch(&self.normals, self.normal_indices[i], repeat * normal_stride, "normal")?;
                let uv = fetch(&self.uvs, self.uv_indices[i], repeat * uv_stride, "uv")?;
                vertices.push(Vertex::new(position.to_array(), normal.to_array(), uv.to_array()));
            }
        }

        if self.tangents {
            for triangle in vertices.chunks_exact_mut(3) {
                apply_tangent_frame(triangle);
            }
        }

        Ok(vertices)
    }

    /// Expand and then merge bit-identical vertices into an indexed mesh.
    pub fn build(&self) -> Result<MeshData> {
        Ok(MeshData::from_triangles(self.expand()?))
    }
}

fn pool_stride(name: &str, len: usize, cycle: usize) -> Result<usize> {
    if len < cycle {
        return Ok(0);
    }
    if len % cycle != 0 {
        return Err(RenderError::InvalidGeometry(format!(
            "{name} pool of {len} entries does not split into {cycle} repetitions"
        )));
    }
    Ok(len / cycle)
}

fn fetch<T: Copy>(pool: &[T], index: u32, base: usize, name: &str) -> Result<T> {
    let resolved = base + index as usize;
    pool.get(resolved).copied().ok_or_else(|| {
        RenderError::InvalidGeometry(format!(
            "{name} index {resolved} out of bounds for pool of {}",
            pool.len()
        ))
    })
}

/// Tangent and bitangent of one triangle, before per-vertex orthogonalization.
///
/// Returns `None` when the UV deltas are degenerate.
pub fn triangle_tangents(positions: [Vec3; 3], uvs: [Vec2; 3]) -> Option<(Vec3, Vec3)> {
    let edge1 = positions[1] - positions[0];
    let edge2 = positions[2] - positions[0];
    let duv1 = uvs[1] - uvs[0];
    let duv2 = uvs[2] - uvs[0];

    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    if det.abs() < DEGENERATE_EPSILON || !det.is_finite() {
        return None;
    }
    let f = 1.0 / det;
    let tangent = (edge1 * duv2.y - edge2 * duv1.y) * f;
    let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * f;
    if !tangent.is_finite() || !bitangent.is_finite() {
        return None;
    }
    Some((tangent, bitangent))
}

/// Orthonormal tangent frame for one vertex normal.
///
/// Gram-Schmidt against the normal; the bitangent is `cross(n, t)` flipped to
/// follow the UV winding. Degenerate inputs fall back to an arbitrary frame
/// around the normal.
pub fn tangent_frame(normal: Vec3, raw: Option<(Vec3, Vec3)>) -> (Vec3, Vec3) {
    let n = normal.try_normalize().unwrap_or(Vec3::Y);
    let fallback = || {
        let t = n.any_orthonormal_vector();
        (t, n.cross(t))
    };

    let Some((tangent, bitangent)) = raw else {
        return fallback();
    };
    let Some(t) = (tangent - n * n.dot(tangent)).try_normalize() else {
        return fallback();
    };
    let b = n.cross(t);
    if b.dot(bitangent) < 0.0 {
        (t, -b)
    } else {
        (t, b)
    }
}

fn apply_tangent_frame(triangle: &mut [Vertex]) {
    let positions = [0, 1, 2].map(|i| Vec3::from(triangle[i].position));
    let uvs = [0, 1, 2].map(|i| Vec2::from(triangle[i].uv));
    let raw = triangle_tangents(positions, uvs);
    for vertex in triangle.iter_mut() {
        let (t, b) = tangent_frame(Vec3::from(vertex.normal), raw);
        vertex.tangent = t.to_array();
        vertex.bitangent = b.to_array();
    }
}

/// Indexed triangle mesh ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Build an indexed mesh from a flat triangle list, merging duplicates.
    pub fn from_triangles(triangles: Vec<Vertex>) -> Self {
        let mut lookup: HashMap<[u32; 14], u32> = HashMap::with_capacity(triangles.len());
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(triangles.len());

        for vertex in triangles {
            let key = vertex_key(&vertex);
            let index = *lookup.entry(key).or_insert_with(|| {
                vertices.push(vertex);
                (vertices.len() - 1) as u32
            });
            indices.push(index);
        }

        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

// Bit pattern with -0.0 folded into 0.0.
fn vertex_key(vertex: &Vertex) -> [u32; 14] {
    let floats: [f32; 14] = bytemuck::cast(*vertex);
    floats.map(|f| (f + 0.0).to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_builder() -> GeometryBuilder {
        GeometryBuilder::new()
            .positions(
                vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ],
                vec![0, 1, 2, 2, 3, 0],
            )
            .normals(vec![Vec3::Z], vec![0; 6])
            .uvs(
                vec![
                    Vec2::new(0.0, 0.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(0.0, 1.0),
                ],
                vec![0, 1, 2, 2, 3, 0],
            )
    }

    #[test]
    fn test_quad_expands_in_stream_order() {
        let vertices = quad_builder().expand().unwrap();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(vertices[4].uv, [0.0, 1.0]);
        assert!(vertices.iter().all(|v| v.tangent == [0.0; 3]));
    }

    #[test]
    fn test_quad_tangent_follows_u() {
        let vertices = quad_builder().with_tangents(true).expand().unwrap();
        for v in &vertices {
            assert!(Vec3::from(v.tangent).abs_diff_eq(Vec3::X, 1e-5));
            assert!(Vec3::from(v.bitangent).abs_diff_eq(Vec3::Y, 1e-5));
        }
    }

    #[test]
    fn test_mirrored_uv_flips_bitangent() {
        let vertices = quad_builder()
            .uvs(
                vec![
                    Vec2::new(0.0, 1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(0.0, 0.0),
                ],
                vec![0, 1, 2, 2, 3, 0],
            )
            .with_tangents(true)
            .expand()
            .unwrap();
        let b = Vec3::from(vertices[0].bitangent);
        assert!(b.abs_diff_eq(-Vec3::Y, 1e-5));
    }

    #[test]
    fn test_degenerate_uvs_fall_back_to_finite_frame() {
        let vertices = quad_builder()
            .uvs(vec![Vec2::ZERO], vec![0; 6])
            .with_tangents(true)
            .expand()
            .unwrap();
        for v in &vertices {
            let t = Vec3::from(v.tangent);
            let b = Vec3::from(v.bitangent);
            assert!(t.is_finite() && b.is_finite());
            assert!((t.length() - 1.0).abs() < 1e-5);
            assert!(t.dot(Vec3::Z).abs() < 1e-5);
            assert!(b.dot(t).abs() < 1e-5);
        }
    }

    #[test]
    fn test_short_pool_is_shared_across_repeats() {
        let vertices = quad_builder()
            .positions(
                vec![
                    Vec3::ZERO,
                    Vec3::X,
                    Vec3::new(1.0, 1.0, 0.0),
                    Vec3::Y,
                    Vec3::new(0.0, 0.0, 2.0),
                    Vec3::new(1.0, 0.0, 2.0),
                    Vec3::new(1.0, 1.0, 2.0),
                    Vec3::new(0.0, 1.0, 2.0),
                ],
                vec![0, 1, 2, 2, 3, 0],
            )
            .uvs(vec![Vec2::ONE], vec![0; 6])
            .cycle(2)
            .expand()
            .unwrap();

        assert_eq!(vertices.len(), 12);
        assert_eq!(vertices[6].position, [0.0, 0.0, 2.0]);
        assert!(vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert!(vertices.iter().all(|v| v.uv == [1.0, 1.0]));
    }

    #[test]
    fn test_rejects_uneven_pool() {
        let err = quad_builder().cycle(3).expand();
        assert!(matches!(err, Err(RenderError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_shared_cube_corners() {
        let err = quad_builder()
            .positions(vec![Vec3::ZERO; 8], vec![0, 1, 2, 2, 3, 0])
            .cycle(6)
            .expand();
        assert!(matches!(err, Err(RenderError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_mismatched_streams() {
        let err = quad_builder().normals(vec![Vec3::Z], vec![0; 3]).expand();
        assert!(matches!(err, Err(RenderError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_out_of_bounds_index() {
        let err = quad_builder()
            .positions(vec![Vec3::ZERO; 3], vec![0, 1, 2, 2, 3, 0])
            .expand();
        assert!(matches!(err, Err(RenderError::InvalidGeometry(_))));
    }

    #[test]
    fn test_indexed_mesh_merges_shared_corners() {
        let mesh = quad_builder().with_tangents(true).build().unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 3, 0]);
        assert_eq!(mesh.triangle_count(), 2);
    }
}
