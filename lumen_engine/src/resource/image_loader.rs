/// Image decoding into texture descriptors
///
/// LDR files decode to RGBA8 sRGB. Radiance `.hdr` files decode to RGBA32F
/// and are flipped vertically so row 0 is the bottom of the image.

use std::path::Path;
use image::{DynamicImage, ImageError};
use crate::error::{Error, Result};
use crate::graphics_device::{Format, TextureDesc};
use crate::engine_error;

pub const FLAT_NORMAL_SIZE: u32 = 256;

/// Decode an image file into a texture descriptor
pub fn load_texture_desc(path: impl AsRef<Path>) -> Result<TextureDesc> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|e| image_error(path, e))?;
    Ok(texture_desc_from_image(image, is_hdr_path(path)))
}

/// Decode an in-memory image
///
/// `hdr` selects the RGBA32F path; the container format is detected from
/// the bytes.
pub fn decode_texture_desc(bytes: &[u8], hdr: bool) -> Result<TextureDesc> {
    let image = image::load_from_memory(bytes).map_err(|e| image_error(Path::new("<memory>"), e))?;
    Ok(texture_desc_from_image(image, hdr))
}

fn texture_desc_from_image(image: DynamicImage, hdr: bool) -> TextureDesc {
    if hdr {
        let pixels = image.flipv().to_rgba32f();
        let (width, height) = pixels.dimensions();
        let data = bytemuck::cast_slice(pixels.as_raw()).to_vec();
        TextureDesc::new(width, height, Format::R32G32B32A32_SFLOAT, data)
    } else {
        let pixels = image.to_rgba8();
        let (width, height) = pixels.dimensions();
        TextureDesc::new(width, height, Format::R8G8B8A8_SRGB, pixels.into_raw())
    }
}

fn is_hdr_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("hdr"))
}

fn image_error(path: &Path, error: ImageError) -> Error {
    let message = format!("{}: {}", path.display(), error);
    engine_error!("lumen::resource", "Failed to decode image {}", message);
    match error {
        ImageError::Unsupported(_) => Error::UnsupportedAsset(message),
        _ => Error::InvalidResource(message),
    }
}

// ===== BUILT-IN TEXTURES =====

/// 1x1 opaque white, bound at bindless index 0
pub fn white_texture_desc() -> TextureDesc {
    TextureDesc::new(1, 1, Format::R8G8B8A8_SRGB, vec![255, 255, 255, 255])
}

/// Tangent-space flat normal map (0, 0, 1)
pub fn flat_normal_texture_desc() -> TextureDesc {
    let texels = (FLAT_NORMAL_SIZE * FLAT_NORMAL_SIZE) as usize;
    let data = [128u8, 128, 255, 255].repeat(texels);
    TextureDesc::new(FLAT_NORMAL_SIZE, FLAT_NORMAL_SIZE, Format::R8G8B8A8_UNORM, data)
}

#[cfg(test)]
#[path = "image_loader_tests.rs"]
mod tests;
