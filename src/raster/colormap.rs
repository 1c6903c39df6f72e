//! Palette extraction for indexed-color images.
//!
//! Many writers store 8-bit values in the 16-bit ColorMap tag.
//! [`correct_colormap`] guesses which kind of map it has been given.

use tracing::{error, warn};

use crate::error::{DecodeError, TiffError};
use crate::format::tiff::{Container, Photometric, TiffTag};

use super::info::read_image_info;

/// Largest BitsPerSample a palette image may use.
const MAX_PALETTE_BITS: u16 = 16;

/// Red, green and blue lookup tables of a palette image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    red: Vec<u16>,
    green: Vec<u16>,
    blue: Vec<u16>,
}

impl Colormap {
    /// Build a map from three equally long channel tables.
    pub fn from_channels(red: Vec<u16>, green: Vec<u16>, blue: Vec<u16>) -> Option<Self> {
        if red.len() != green.len() || red.len() != blue.len() {
            return None;
        }
        Some(Self { red, green, blue })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    pub fn red(&self) -> &[u16] {
        &self.red
    }

    pub fn green(&self) -> &[u16] {
        &self.green
    }

    pub fn blue(&self) -> &[u16] {
        &self.blue
    }

    /// Output bytes for palette index `index`: each channel divided by 256.
    ///
    /// Indices past the end of the map expand to black.
    #[inline]
    pub fn rgb8(&self, index: usize) -> [u8; 3] {
        match (self.red.get(index), self.green.get(index), self.blue.get(index)) {
            (Some(&r), Some(&g), Some(&b)) => [(r / 256) as u8, (g / 256) as u8, (b / 256) as u8],
            _ => [0, 0, 0],
        }
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut u16> {
        self.red
            .iter_mut()
            .chain(self.green.iter_mut())
            .chain(self.blue.iter_mut())
    }
}

/// Which value range [`correct_colormap`] decided the map uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColormapDepth {
    /// No value exceeds 255; the map is left as is
    Eight,
    /// Some value exceeds 255; the map was rescaled into 0..=255
    Sixteen,
}

/// Detect and rescale a 16-bit colormap.
///
/// When any channel value of any entry exceeds 255, every value becomes
/// `value * 255 / 65535`. Otherwise the map is untouched.
pub fn correct_colormap(map: &mut Colormap) -> ColormapDepth {
    if !map.values_mut().any(|v| *v > 255) {
        return ColormapDepth::Eight;
    }
    for value in map.values_mut() {
        *value = (*value as u32 * 255 / 65535) as u16;
    }
    ColormapDepth::Sixteen
}

/// Read the palette of the current image.
///
/// Returns `Ok(None)` when the image is not a palette image.
pub fn read_colormap<C: Container + ?Sized>(container: &mut C) -> Result<Option<Colormap>, DecodeError> {
    let info = read_image_info(container, None)?;
    if info.photometric != Photometric::Palette {
        return Ok(None);
    }

    if info.bits_per_sample > MAX_PALETTE_BITS {
        error!(
            file = container.file_name(),
            bits_per_sample = info.bits_per_sample,
            "Palette depth too large"
        );
        return Err(DecodeError::UnsupportedFormat {
            reason: format!("{}-bit palette images", info.bits_per_sample),
        });
    }
    let size = 1usize << info.bits_per_sample;

    let Some(value) = container.field(TiffTag::ColorMap)? else {
        error!(file = container.file_name(), "Missing required \"Colormap\" tag");
        return Err(DecodeError::MissingColormap(container.file_name().to_string()));
    };

    let values = value
        .as_u16_vec()
        .filter(|values| values.len() == 3 * size)
        .ok_or_else(|| TiffError::InvalidTagValue {
            tag: TiffTag::ColorMap.name(),
            message: format!(
                "expected {} 16-bit values for {}-bit samples",
                3 * size,
                info.bits_per_sample
            ),
        })?;

    let mut channels = values.chunks_exact(size).map(<[u16]>::to_vec);
    let (Some(red), Some(green), Some(blue)) = (channels.next(), channels.next(), channels.next())
    else {
        return Err(DecodeError::MissingColormap(container.file_name().to_string()));
    };
    let mut map = Colormap { red, green, blue };

    if correct_colormap(&mut map) == ColormapDepth::Eight {
        warn!(file = container.file_name(), "Assuming 8-bit colormap");
    }
    Ok(Some(map))
}
