//! Named uniform values and their byte layout
//!
//! Shader programs are addressed by fully-qualified uniform names
//! (`light_point0.position`, `shadow_view[3]`). A [`UniformLayout`] maps each
//! name to an offset inside one uniform block laid out with WGSL
//! uniform-address-space rules, and a [`StagingBlock`] holds the bytes a
//! program accumulates between draws.

use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// A value published to a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat2(_) => UniformKind::Mat2,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Write the value into `dst` using the WGSL uniform representation.
    ///
    /// `dst` must be at least `self.kind().size()` bytes long.
    fn write_to(&self, dst: &mut [u8]) {
        match self {
            UniformValue::Int(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Float(v) => dst[..4].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => dst[..8].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec3(v) => dst[..12].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => dst[..16].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat2(m) => {
                // mat2x2<f32>: two vec2 columns, 8-byte stride.
                dst[..16].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()));
            }
            UniformValue::Mat3(m) => {
                // mat3x3<f32>: three vec3 columns padded to 16 bytes.
                for (i, col) in [m.x_axis, m.y_axis, m.z_axis].iter().enumerate() {
                    let start = i * 16;
                    dst[start..start + 12].copy_from_slice(bytemuck::cast_slice(&col.to_array()));
                    dst[start + 12..start + 16].fill(0);
                }
            }
            UniformValue::Mat4(m) => {
                dst[..64].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()));
            }
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

/// Shape of a uniform member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl UniformKind {
    /// Alignment in the uniform address space.
    pub const fn align(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 | UniformKind::Mat2 => 8,
            UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat3 | UniformKind::Mat4 => 16,
        }
    }

    /// Size in bytes.
    pub const fn size(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 | UniformKind::Mat2 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Mat4 => 64,
        }
    }

    /// Element stride inside a uniform array.
    pub const fn array_stride(self) -> usize {
        round_up(round_up(self.size(), self.align()), 16)
    }
}

const fn round_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// One resolved member of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: usize,
    pub kind: UniformKind,
}

/// Name-to-offset table for one uniform block.
///
/// Members are declared in the same order as the fields of the matching WGSL
/// struct; offsets follow the WGSL rules, including implicit padding.
#[derive(Debug, Clone, Default)]
pub struct UniformLayout {
    slots: HashMap<String, UniformSlot>,
    order: Vec<String>,
    cursor: usize,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a member.
    pub fn field(mut self, name: impl Into<String>, kind: UniformKind) -> Self {
        let offset = round_up(self.cursor, kind.align());
        self.insert(name.into(), UniformSlot { offset, kind });
        self.cursor = offset + kind.size();
        self
    }

    /// Declare a fixed-size array member addressed as `name[i]`.
    pub fn array(mut self, name: &str, kind: UniformKind, count: usize) -> Self {
        let base = round_up(self.cursor, 16);
        let stride = kind.array_stride();
        for i in 0..count {
            self.insert(
                format!("{name}[{i}]"),
                UniformSlot {
                    offset: base + i * stride,
                    kind,
                },
            );
        }
        self.cursor = base + count * stride;
        self
    }

    /// Declare `count` repetitions of a struct, addressed as `{prefix}{i}.{field}`.
    ///
    /// Mirrors a WGSL `array<Struct, count>` whose members are listed in `fields`.
    pub fn struct_array(
        mut self,
        prefix: &str,
        fields: &[(&str, UniformKind)],
        count: usize,
    ) -> Self {
        for i in 0..count {
            self.cursor = round_up(self.cursor, 16);
            for (field, kind) in fields {
                self = self.field(format!("{prefix}{i}.{field}"), *kind);
            }
            self.cursor = round_up(self.cursor, 16);
        }
        self
    }

    fn insert(&mut self, name: String, slot: UniformSlot) {
        self.order.push(name.clone());
        self.slots.insert(name, slot);
    }

    /// Look up a member by its fully-qualified name.
    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    /// Member names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Total block size, rounded to 16 bytes.
    pub fn size(&self) -> usize {
        round_up(self.cursor.max(16), 16)
    }
}

/// Outcome of writing a value into a staging block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Written,
    /// The layout has no member with this name.
    Inactive,
    /// The member exists but has a different kind.
    KindMismatch { expected: UniformKind },
}

/// CPU copy of one uniform block.
#[derive(Debug, Clone)]
pub struct StagingBlock {
    bytes: Vec<u8>,
}

impl StagingBlock {
    pub fn new(layout: &UniformLayout) -> Self {
        Self {
            bytes: vec![0; layout.size()],
        }
    }

    pub fn write(
        &mut self,
        layout: &UniformLayout,
        name: &str,
        value: UniformValue,
    ) -> StageOutcome {
        let Some(slot) = layout.slot(name) else {
            return StageOutcome::Inactive;
        };
        if slot.kind != value.kind() {
            return StageOutcome::KindMismatch {
                expected: slot.kind,
            };
        }
        value.write_to(&mut self.bytes[slot.offset..slot.offset + slot.kind.size()]);
        StageOutcome::Written
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_followed_by_scalar_packs() {
        let layout = UniformLayout::new()
            .field("model", UniformKind::Mat4)
            .field("view_position", UniformKind::Vec3)
            .field("far_plane", UniformKind::Float)
            .field("light_dir", UniformKind::Vec3);

        assert_eq!(layout.slot("view_position").map(|s| s.offset), Some(64));
        assert_eq!(layout.slot("far_plane").map(|s| s.offset), Some(76));
        assert_eq!(layout.slot("light_dir").map(|s| s.offset), Some(80));
        assert_eq!(layout.size(), 96);
    }

    #[test]
    fn test_array_addressing() {
        let layout = UniformLayout::new()
            .array("shadow_view", UniformKind::Mat4, 6)
            .field("light_position", UniformKind::Vec3);

        assert_eq!(layout.slot("shadow_view[0]").map(|s| s.offset), Some(0));
        assert_eq!(layout.slot("shadow_view[5]").map(|s| s.offset), Some(320));
        assert_eq!(layout.slot("light_position").map(|s| s.offset), Some(384));
        assert!(layout.slot("shadow_view[6]").is_none());
    }

    #[test]
    fn test_struct_array_matches_wgsl_stride() {
        let fields = [
            ("position", UniformKind::Vec3),
            ("constant", UniformKind::Float),
            ("ambient", UniformKind::Vec3),
        ];
        let layout = UniformLayout::new()
            .field("count", UniformKind::Int)
            .struct_array("light", &fields, 2);

        assert_eq!(layout.slot("light0.position").map(|s| s.offset), Some(16));
        assert_eq!(layout.slot("light0.constant").map(|s| s.offset), Some(28));
        assert_eq!(layout.slot("light1.position").map(|s| s.offset), Some(48));
        assert_eq!(layout.size(), 80);
    }

    #[test]
    fn test_mat3_columns_are_padded() {
        let layout = UniformLayout::new().field("normal_matrix", UniformKind::Mat3);
        let mut block = StagingBlock::new(&layout);
        let m = Mat3::from_cols(Vec3::X, Vec3::Y, Vec3::Z);
        assert_eq!(
            block.write(&layout, "normal_matrix", UniformValue::Mat3(m)),
            StageOutcome::Written
        );

        let floats: &[f32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(&floats[0..4], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(&floats[4..8], &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(&floats[8..12], &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_staging_rejects_unknown_and_mistyped() {
        let layout = UniformLayout::new().field("far_plane", UniformKind::Float);
        let mut block = StagingBlock::new(&layout);

        assert_eq!(
            block.write(&layout, "missing", UniformValue::Float(1.0)),
            StageOutcome::Inactive
        );
        assert_eq!(
            block.write(&layout, "far_plane", UniformValue::Int(3)),
            StageOutcome::KindMismatch {
                expected: UniformKind::Float
            }
        );
        assert_eq!(
            block.write(&layout, "far_plane", UniformValue::Float(25.0)),
            StageOutcome::Written
        );
        let floats: &[f32] = bytemuck::cast_slice(block.as_bytes());
        assert_eq!(floats[0], 25.0);
    }
}
