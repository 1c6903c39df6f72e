//! Per-image metadata.

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{DecodeError, TiffError};
use crate::format::tiff::{Container, FieldValue, Photometric, PlanarConfig, TiffTag};

/// Metadata of one image in a TIFF file.
///
/// Built fresh by every [`read_image_info`] call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Index the image was requested with, `None` for the current image
    pub image_index: Option<u32>,

    /// NewSubfileType flags
    pub subfile_type: u32,

    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    pub planar_config: PlanarConfig,
    pub photometric: Photometric,

    /// Raw Compression tag value, 0 if absent
    pub compression: u16,

    /// Number of images in the file
    pub num_images: usize,

    /// ImageDescription text, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Set when a raster decode of this image stopped early
    pub error: bool,
}

/// Read the metadata of image `index`, or of the current image when `None`.
///
/// Width, height, compression and subfile type read as 0 when absent.
/// BitsPerSample, SamplesPerPixel and PlanarConfiguration fall back to the
/// TIFF defaults. A missing PhotometricInterpretation is inferred from the
/// samples per pixel: 1 is min-is-black, 3 or 4 is RGB.
pub fn read_image_info<C: Container + ?Sized>(
    container: &mut C,
    index: Option<u32>,
) -> Result<ImageInfo, DecodeError> {
    if let Some(index) = index {
        container.select_image(index).map_err(|source| {
            error!(file = container.file_name(), index, error = %source, "Cannot select image");
            DecodeError::ImageSelection { index, source }
        })?;
    }

    let width = plain_u32(container, TiffTag::ImageWidth)?;
    let height = plain_u32(container, TiffTag::ImageLength)?;
    let compression = plain_u16(container, TiffTag::Compression)?;
    let subfile_type = plain_u32(container, TiffTag::SubfileType)?;

    let bits_per_sample = defaulted_u16(container, TiffTag::BitsPerSample)?;
    let samples_per_pixel = defaulted_u16(container, TiffTag::SamplesPerPixel)?;
    let planar_raw = defaulted_u16(container, TiffTag::PlanarConfiguration)?;
    let planar_config = PlanarConfig::from_u16(planar_raw).ok_or_else(|| {
        TiffError::InvalidTagValue {
            tag: TiffTag::PlanarConfiguration.name(),
            message: format!("unknown value {}", planar_raw),
        }
    })?;

    let photometric = match container.field(TiffTag::PhotometricInterpretation)? {
        Some(value) => Photometric::from_u16(
            value
                .as_u16()
                .ok_or_else(|| invalid(TiffTag::PhotometricInterpretation, &value))?,
        ),
        None => infer_photometric(container.file_name(), samples_per_pixel)?,
    };

    let description = match container.field(TiffTag::ImageDescription)? {
        Some(value) => Some(
            value
                .as_str()
                .ok_or_else(|| invalid(TiffTag::ImageDescription, &value))?
                .to_string(),
        ),
        None => None,
    };

    let info = ImageInfo {
        image_index: index,
        subfile_type,
        width,
        height,
        bits_per_sample,
        samples_per_pixel,
        planar_config,
        photometric,
        compression,
        num_images: container.image_count(),
        description,
        error: false,
    };
    debug!(file = container.file_name(), ?info, "Read image info");
    Ok(info)
}

/// Default interpretation for images without a PhotometricInterpretation tag.
fn infer_photometric(file: &str, samples_per_pixel: u16) -> Result<Photometric, DecodeError> {
    let photometric = match samples_per_pixel {
        1 => Photometric::MinIsBlack,
        3 | 4 => Photometric::Rgb,
        _ => {
            error!(file, samples_per_pixel, "Missing needed \"PhotometricInterpretation\" tag");
            return Err(DecodeError::UnsupportedFormat {
                reason: format!(
                    "no PhotometricInterpretation tag and {} samples per pixel",
                    samples_per_pixel
                ),
            });
        }
    };
    warn!(
        file,
        "No \"PhotometricInterpretation\" tag, assuming {}",
        photometric.name()
    );
    Ok(photometric)
}

fn plain_u32<C: Container + ?Sized>(container: &mut C, tag: TiffTag) -> Result<u32, DecodeError> {
    match container.field(tag)? {
        Some(value) => value.as_u32().ok_or_else(|| invalid(tag, &value)),
        None => Ok(0),
    }
}

fn plain_u16<C: Container + ?Sized>(container: &mut C, tag: TiffTag) -> Result<u16, DecodeError> {
    match container.field(tag)? {
        Some(value) => value.as_u16().ok_or_else(|| invalid(tag, &value)),
        None => Ok(0),
    }
}

fn defaulted_u16<C: Container + ?Sized>(container: &mut C, tag: TiffTag) -> Result<u16, DecodeError> {
    let value = container.field_defaulted(tag)?;
    value.as_u16().ok_or_else(|| invalid(tag, &value))
}

fn invalid(tag: TiffTag, value: &FieldValue) -> DecodeError {
    DecodeError::Tiff(TiffError::InvalidTagValue {
        tag: tag.name(),
        message: format!("unexpected value {:?}", value),
    })
}
