//! PNG output for decoded rasters.
//!
//! Only 8-bit layouts with a direct PNG color type are encoded:
//! gray (L8), gray + alpha (La8), RGB (Rgb8, including expanded palettes)
//! and RGBA (Rgba8). Sample-major rasters are interleaved first, and
//! min-is-white gray is inverted so that 0 renders black.

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::OutputError;
use crate::format::tiff::Photometric;

use super::decoder::Expansion;
use super::info::ImageInfo;

/// PNG color type and channel count for a decoded image.
pub fn png_color_type(info: &ImageInfo) -> Result<(ExtendedColorType, usize), OutputError> {
    let expansion = Expansion::for_image(info).ok_or_else(|| OutputError::UnsupportedLayout {
        reason: format!("photometric {} has no decoded form", info.photometric.name()),
    })?;

    if expansion != Expansion::PaletteRgb && info.bits_per_sample != 8 {
        return Err(OutputError::UnsupportedLayout {
            reason: format!("{}-bit samples", info.bits_per_sample),
        });
    }

    let color = match (expansion, info.samples_per_pixel) {
        (Expansion::PaletteRgb, _) => (ExtendedColorType::Rgb8, 3),
        (Expansion::SampleRows | Expansion::SamplePlanes, 1) => (ExtendedColorType::L8, 1),
        (Expansion::SampleRows | Expansion::SamplePlanes, 2) => (ExtendedColorType::La8, 2),
        (Expansion::PixelRows | Expansion::PixelPlanes, 3) => (ExtendedColorType::Rgb8, 3),
        (Expansion::PixelRows | Expansion::PixelPlanes, 4) => (ExtendedColorType::Rgba8, 4),
        (_, samples) => {
            return Err(OutputError::UnsupportedLayout {
                reason: format!("{} {} samples per pixel", samples, info.photometric.name()),
            })
        }
    };
    Ok(color)
}

/// Encode a decoded raster as PNG.
pub fn encode_png(info: &ImageInfo, pixels: &[u8]) -> Result<Bytes, OutputError> {
    let (color_type, channels) = png_color_type(info)?;
    let pixel_count = info.width as usize * info.height as usize;
    let expected = pixel_count * channels;
    if pixels.len() < expected {
        return Err(OutputError::Encode {
            message: format!("raster holds {} bytes, expected {}", pixels.len(), expected),
        });
    }

    let planar = Expansion::for_image(info).is_some_and(Expansion::is_planar);
    let mut data = if planar && channels > 1 {
        interleave(&pixels[..expected], pixel_count, channels)
    } else {
        pixels[..expected].to_vec()
    };

    if info.photometric == Photometric::MinIsWhite {
        // Invert gray, leave alpha alone
        for pixel in data.chunks_exact_mut(channels) {
            pixel[0] = 255 - pixel[0];
        }
    }

    let mut output = Vec::new();
    PngEncoder::new(&mut output)
        .write_image(&data, info.width, info.height, color_type)
        .map_err(|e| OutputError::Encode {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}

/// Turn `channels` consecutive planes into pixel-major order.
fn interleave(planes: &[u8], pixel_count: usize, channels: usize) -> Vec<u8> {
    let mut out = vec![0u8; pixel_count * channels];
    for (channel, plane) in planes.chunks_exact(pixel_count).enumerate() {
        for (i, &value) in plane.iter().enumerate() {
            out[i * channels + channel] = value;
        }
    }
    out
}
