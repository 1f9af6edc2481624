//! Texture abstractions
//!
//! Mipmapped material textures, depth textures for shadow targets (2D or
//! six-layer cube) and the samplers the scene program reads them with.

use crate::context::WgpuContext;
use crate::error::{RenderError, Result};
use crate::gpu::{DecodedImage, TextureKind};
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Number of mip levels down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Full mip chain of an RGBA8 image, level 0 first.
pub fn mip_chain(image: &DecodedImage) -> Result<Vec<RgbaImage>> {
    let base = RgbaImage::from_raw(image.width, image.height, image.pixels.clone()).ok_or_else(
        || RenderError::LengthMismatch {
            what: "pixels",
            expected: image.width as usize * image.height as usize * 4,
            actual: image.pixels.len(),
        },
    )?;

    let levels = mip_level_count(image.width, image.height);
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let Some(prev) = chain.last() else { break };
        let width = (prev.width() / 2).max(1);
        let height = (prev.height() / 2).max(1);
        let next = imageops::resize(prev, width, height, FilterType::Triangle);
        chain.push(next);
    }
    Ok(chain)
}

/// A mipmapped RGBA8 texture.
pub struct Texture2D {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) size: wgpu::Extent3d,
}

impl Texture2D {
    /// Linear RGBA8; colour values are used as stored.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Upload an image and its CPU-generated mip chain.
    pub fn from_image(
        ctx: &WgpuContext,
        image: &DecodedImage,
        label: Option<&str>,
    ) -> Result<Self> {
        let chain = mip_chain(image)?;
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: chain.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in chain.iter().enumerate() {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                mip.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width()),
                    rows_per_image: Some(mip.height()),
                },
                wgpu::Extent3d {
                    width: mip.width(),
                    height: mip.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            size,
        })
    }

    /// A 1x1 texture of one colour.
    pub fn solid(ctx: &WgpuContext, rgba: [u8; 4], label: Option<&str>) -> Result<Self> {
        let image = DecodedImage {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        };
        Self::from_image(ctx, &image, label)
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }
}

/// A depth texture usable both as a pass attachment and as a sampled map.
pub struct DepthTexture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) kind: TextureKind,
    /// `D2` for 2D textures, `Cube` for cube textures.
    pub(crate) sample_view: wgpu::TextureView,
    /// One `D2` view per layer.
    pub(crate) layer_views: Vec<wgpu::TextureView>,
    pub(crate) size: wgpu::Extent3d,
}

impl DepthTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(
        ctx: &WgpuContext,
        kind: TextureKind,
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let layers = match kind {
            TextureKind::Texture2D => 1,
            TextureKind::TextureCube => 6,
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: layers,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let sample_view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(match kind {
                TextureKind::Texture2D => wgpu::TextureViewDimension::D2,
                TextureKind::TextureCube => wgpu::TextureViewDimension::Cube,
            }),
            ..Default::default()
        });

        let layer_views = (0..layers)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Self {
            texture,
            kind,
            sample_view,
            layer_views,
            size,
        }
    }

    /// Clear every layer to `depth`.
    pub fn clear(&self, ctx: &WgpuContext, depth: f32) {
        let mut encoder = ctx.create_encoder(Some("depth clear"));
        for view in &self.layer_views {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("depth clear"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        ctx.submit(std::iter::once(encoder.finish()));
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn sample_view(&self) -> &wgpu::TextureView {
        &self.sample_view
    }

    pub fn layer_view(&self, layer: usize) -> Option<&wgpu::TextureView> {
        self.layer_views.get(layer)
    }

    pub fn layer_count(&self) -> usize {
        self.layer_views.len()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }
}

/// Samplers shared by every program.
pub struct Samplers {
    /// Linear, repeating, trilinear mips.
    pub material: wgpu::Sampler,
    /// Nearest, clamped, `LessEqual` comparison.
    pub shadow_compare: wgpu::Sampler,
    /// Nearest, clamped, raw depth reads.
    pub shadow_depth: wgpu::Sampler,
}

impl Samplers {
    pub fn new(ctx: &WgpuContext) -> Self {
        let material = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let shadow_compare = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow compare sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let shadow_depth = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow depth sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            material,
            shadow_compare,
            shadow_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(1024, 300), 11);
    }

    #[test]
    fn test_mip_chain_halves_to_one() {
        let image = DecodedImage {
            width: 8,
            height: 2,
            pixels: vec![255; 8 * 2 * 4],
        };
        let chain = mip_chain(&image).unwrap();
        let sizes: Vec<_> = chain.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert_eq!(chain[3].as_raw(), &vec![255u8; 4]);
    }

    #[test]
    fn test_mip_chain_reports_oversized_length() {
        let image = DecodedImage {
            width: 70_000,
            height: 70_000,
            pixels: Vec::new(),
        };
        assert!(matches!(
            mip_chain(&image),
            Err(RenderError::LengthMismatch {
                expected: 19_600_000_000,
                ..
            })
        ));
    }

    #[test]
    fn test_mip_chain_rejects_short_pixels() {
        let image = DecodedImage {
            width: 4,
            height: 4,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            mip_chain(&image),
            Err(RenderError::LengthMismatch { what: "pixels", .. })
        ));
    }
}
