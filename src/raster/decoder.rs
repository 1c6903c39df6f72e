//! Scanline-driven raster decoding.
//!
//! The decoder reads an image one scanline at a time and expands it into a
//! flat, row-major byte buffer. How each scanline is expanded depends on the
//! photometric interpretation and planar configuration:
//!
//! | Photometric              | Planar     | Output                                   |
//! |--------------------------|------------|------------------------------------------|
//! | min-is-black/white       | contiguous | rows of `bytesPerRow * samples` bytes    |
//! | min-is-black/white       | separate   | one block of rows per sample             |
//! | palette                  | either     | 3 bytes (R, G, B) per input index byte   |
//! | RGB                      | contiguous | rows of `width * samples` bytes          |
//! | RGB                      | separate   | one block of `width`-byte rows per sample|
//!
//! Any other combination is rejected as unsupported.

use tracing::{debug, error};

use crate::error::DecodeError;
use crate::format::tiff::{Container, Photometric, PlanarConfig};

use super::colormap::{read_colormap, Colormap};
use super::info::{read_image_info, ImageInfo};

// =============================================================================
// Expansion strategies
// =============================================================================

/// How scanlines of one image become output bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Grayscale, interleaved samples: copy `bytesPerRow * samples` per row
    SampleRows,
    /// Grayscale, one plane per sample: copy `bytesPerRow` per row
    SamplePlanes,
    /// Palette indices expanded to RGB triplets
    PaletteRgb,
    /// RGB, interleaved samples: copy `width * samples` per row
    PixelRows,
    /// RGB, one plane per sample: copy `width` per row
    PixelPlanes,
}

const STRATEGIES: &[(Photometric, PlanarConfig, Expansion)] = &[
    (Photometric::MinIsBlack, PlanarConfig::Contiguous, Expansion::SampleRows),
    (Photometric::MinIsWhite, PlanarConfig::Contiguous, Expansion::SampleRows),
    (Photometric::MinIsBlack, PlanarConfig::Separate, Expansion::SamplePlanes),
    (Photometric::MinIsWhite, PlanarConfig::Separate, Expansion::SamplePlanes),
    (Photometric::Palette, PlanarConfig::Contiguous, Expansion::PaletteRgb),
    (Photometric::Palette, PlanarConfig::Separate, Expansion::PaletteRgb),
    (Photometric::Rgb, PlanarConfig::Contiguous, Expansion::PixelRows),
    (Photometric::Rgb, PlanarConfig::Separate, Expansion::PixelPlanes),
];

impl Expansion {
    /// Strategy for an image, `None` if its layout cannot be decoded.
    pub fn for_image(info: &ImageInfo) -> Option<Self> {
        STRATEGIES
            .iter()
            .find(|(photometric, planar, _)| {
                *photometric == info.photometric && *planar == info.planar_config
            })
            .map(|&(_, _, expansion)| expansion)
    }

    /// Whether output is sample-major (one block per sample).
    pub fn is_planar(self) -> bool {
        matches!(self, Expansion::SamplePlanes | Expansion::PixelPlanes)
    }

    /// Number of sample planes read.
    fn planes(self, info: &ImageInfo) -> u16 {
        if self.is_planar() {
            info.samples_per_pixel
        } else {
            1
        }
    }

    /// Input bytes consumed from each scanline.
    fn row_input_len(self, info: &ImageInfo, geometry: &RasterGeometry) -> Option<usize> {
        let width = info.width as usize;
        let samples = info.samples_per_pixel as usize;
        match self {
            Expansion::SampleRows => geometry.bytes_per_row.checked_mul(samples),
            Expansion::SamplePlanes => Some(geometry.bytes_per_row),
            Expansion::PaletteRgb => Some(width),
            Expansion::PixelRows => width.checked_mul(samples),
            Expansion::PixelPlanes => Some(width),
        }
    }

    /// Output bytes produced per input byte.
    fn output_per_input(self) -> usize {
        match self {
            Expansion::PaletteRgb => 3,
            _ => 1,
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Size bookkeeping for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterGeometry {
    /// `ceil(width * bitsPerSample / 8)`
    pub bytes_per_row: usize,

    /// `bytesPerRow * height * samplesPerPixel`
    pub raster_size: usize,

    /// `2^bitsPerSample - 1`; informational only
    pub max_sample_value: u64,
}

impl RasterGeometry {
    pub fn of(info: &ImageInfo) -> Self {
        let bytes_per_row = (info.width as u64 * info.bits_per_sample as u64).div_ceil(8);
        let raster_size = bytes_per_row
            .saturating_mul(info.height as u64)
            .saturating_mul(info.samples_per_pixel as u64);
        let max_sample_value = 1u64
            .checked_shl(info.bits_per_sample as u32)
            .map(|v| v - 1)
            .unwrap_or(u64::MAX);

        Self {
            bytes_per_row: usize::try_from(bytes_per_row).unwrap_or(usize::MAX),
            raster_size: usize::try_from(raster_size).unwrap_or(usize::MAX),
            max_sample_value,
        }
    }
}

/// Output bytes needed to decode an image.
pub fn required_output_len(info: &ImageInfo) -> Result<usize, DecodeError> {
    let expansion = Expansion::for_image(info).ok_or_else(|| unsupported_layout(info))?;
    let geometry = RasterGeometry::of(info);
    output_len(info, expansion, &geometry)
}

fn output_len(
    info: &ImageInfo,
    expansion: Expansion,
    geometry: &RasterGeometry,
) -> Result<usize, DecodeError> {
    expansion
        .row_input_len(info, geometry)
        .and_then(|len| len.checked_mul(expansion.output_per_input()))
        .and_then(|len| len.checked_mul(info.height as usize))
        .and_then(|len| len.checked_mul(expansion.planes(info) as usize))
        .ok_or_else(|| DecodeError::UnsupportedFormat {
            reason: format!("{}x{} raster does not fit in memory", info.width, info.height),
        })
}

fn unsupported_layout(info: &ImageInfo) -> DecodeError {
    DecodeError::UnsupportedFormat {
        reason: format!(
            "cannot read photometric {} ({:?} planar configuration)",
            info.photometric.as_u16(),
            info.planar_config
        ),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// How a raster decode ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every scanline was expanded
    Complete,

    /// A scanline read failed; rows after it were not decoded.
    ///
    /// The output buffer must be treated as unusable.
    Aborted { row: u32, sample: u16, reason: String },
}

/// Result of [`decode_raster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterOutcome {
    /// Metadata of the decoded image; `error` is set when aborted
    pub info: ImageInfo,
    pub status: DecodeStatus,
    pub bytes_written: usize,
}

impl RasterOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == DecodeStatus::Complete
    }
}

/// Decoded pixels together with their outcome.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub outcome: RasterOutcome,
    pub pixels: Vec<u8>,
}

/// Decode image `index` (or the current image) into `output`.
///
/// `output` must hold at least [`required_output_len`] bytes. Palette images
/// are expanded to 8-bit RGB triplets.
///
/// Metadata, palette and layout failures are returned as `Err`. A failed
/// scanline read stops the decode and is reported as
/// [`DecodeStatus::Aborted`], with earlier rows left in `output`.
pub fn decode_raster<C: Container + ?Sized>(
    container: &mut C,
    index: Option<u32>,
    output: &mut [u8],
) -> Result<RasterOutcome, DecodeError> {
    let mut info = read_image_info(container, index)?;

    let colormap = if info.photometric == Photometric::Palette {
        match read_colormap(container)? {
            Some(map) => Some(map),
            None => return Err(DecodeError::MissingColormap(container.file_name().to_string())),
        }
    } else {
        None
    };

    let geometry = RasterGeometry::of(&info);
    debug!(
        file = container.file_name(),
        bytes_per_row = geometry.bytes_per_row,
        raster_size = geometry.raster_size,
        max_sample_value = geometry.max_sample_value,
        "Raster geometry"
    );

    let Some(expansion) = Expansion::for_image(&info) else {
        error!(
            file = container.file_name(),
            "Can't read photometric {}",
            info.photometric.as_u16()
        );
        return Err(unsupported_layout(&info));
    };
    debug!(file = container.file_name(), ?expansion, "Selected expansion");

    let required = output_len(&info, expansion, &geometry)?;
    if output.len() < required {
        return Err(DecodeError::BufferTooSmall {
            required,
            actual: output.len(),
        });
    }

    let row_len = expansion
        .row_input_len(&info, &geometry)
        .unwrap_or(usize::MAX);
    let scanline_len = container.scanline_size()?.max(row_len);
    let mut scanline = vec![0u8; scanline_len];

    let mut written = 0;
    let mut status = DecodeStatus::Complete;
    'planes: for sample in 0..expansion.planes(&info) {
        for row in 0..info.height {
            if let Err(err) = container.read_scanline(&mut scanline, row, sample) {
                error!(
                    file = container.file_name(),
                    row,
                    sample,
                    error = %err,
                    "Bad data read on line {}",
                    row
                );
                status = DecodeStatus::Aborted {
                    row,
                    sample,
                    reason: err.to_string(),
                };
                break 'planes;
            }

            let input = &scanline[..row_len];
            written += expand_row(expansion, input, colormap.as_ref(), &mut output[written..]);
        }
    }

    // The palette is only needed for this image
    drop(colormap);

    if status != DecodeStatus::Complete {
        info.error = true;
    }
    Ok(RasterOutcome {
        info,
        status,
        bytes_written: written,
    })
}

/// Decode into a newly allocated buffer of exactly the required size.
///
/// Images whose declared dimensions need more pixel data than the container
/// holds, or whose raster cannot be allocated, fail with
/// [`DecodeError::UnsupportedFormat`] before anything is read.
pub fn decode_image<C: Container + ?Sized>(
    container: &mut C,
    index: Option<u32>,
) -> Result<DecodedImage, DecodeError> {
    let info = read_image_info(container, index)?;
    let required = required_output_len(&info)?;

    if let Some(available) = container.data_size() {
        let input = required / Expansion::for_image(&info).map_or(1, Expansion::output_per_input);
        if input as u64 > available {
            error!(
                file = container.file_name(),
                width = info.width,
                height = info.height,
                needed = input,
                available,
                "Image dimensions exceed the file"
            );
            return Err(DecodeError::UnsupportedFormat {
                reason: format!(
                    "{}x{} raster needs {} bytes of image data, file holds {}",
                    info.width, info.height, input, available
                ),
            });
        }
    }

    let mut pixels = allocate_raster(required, &info)?;
    // Already selected above
    let outcome = decode_raster(container, None, &mut pixels)?;
    Ok(DecodedImage {
        outcome: RasterOutcome {
            info: ImageInfo {
                image_index: index,
                ..outcome.info
            },
            ..outcome
        },
        pixels,
    })
}

fn allocate_raster(len: usize, info: &ImageInfo) -> Result<Vec<u8>, DecodeError> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| DecodeError::UnsupportedFormat {
            reason: format!("{}x{} raster does not fit in memory", info.width, info.height),
        })?;
    pixels.resize(len, 0);
    Ok(pixels)
}

/// Expand one scanline into `out`, returning the bytes written.
#[inline]
fn expand_row(
    expansion: Expansion,
    input: &[u8],
    colormap: Option<&Colormap>,
    out: &mut [u8],
) -> usize {
    match (expansion, colormap) {
        (Expansion::PaletteRgb, Some(map)) => {
            for (&index, pixel) in input.iter().zip(out.chunks_exact_mut(3)) {
                pixel.copy_from_slice(&map.rgb8(index as usize));
            }
            input.len() * 3
        }
        _ => {
            out[..input.len()].copy_from_slice(input);
            input.len()
        }
    }
}
