//! Texture assets
//!
//! Decoding goes through the `image` crate; loading a texture map never
//! fails the caller. A missing or broken file is logged and produces a map
//! without a texture, which the backend samples as a neutral fallback.

use crate::error::{RenderError, Result};
use crate::gpu::{DecodedImage, ImageDecoder, RenderDevice};
use crate::renderer::texture_map::{TextureMap, TextureParams, TextureRole};
use std::path::Path;

/// [`ImageDecoder`] backed by the `image` crate. Every format becomes RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage> {
        let bytes = std::fs::read(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image::load_from_memory(&bytes)
            .map_err(|source| RenderError::ImageDecode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        Ok(DecodedImage {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }
}

/// Decode `path` and upload it as a material map of `role`.
///
/// Failures are logged with a `texture::load::*` tag and yield a map whose
/// handle is `None`.
pub fn load_texture_map<D, I>(
    device: &mut D,
    decoder: &I,
    path: &Path,
    role: TextureRole,
    params: TextureParams,
) -> Result<TextureMap>
where
    D: RenderDevice,
    I: ImageDecoder + ?Sized,
{
    let handle = match decoder
        .decode(path)
        .and_then(|image| device.create_texture_rgba8(&image))
    {
        Ok(handle) => {
            tracing::debug!(path = %path.display(), ?role, "texture loaded");
            Some(handle)
        }
        Err(err) => {
            let tag = match &err {
                RenderError::Io { .. } => "texture::load::io",
                RenderError::ImageDecode { .. } => "texture::load::decode",
                _ => "texture::load::upload",
            };
            tracing::warn!(
                tag,
                path = %path.display(),
                error = %err,
                "texture unavailable, using fallback"
            );
            None
        }
    };
    TextureMap::material(role, handle, params)
}
