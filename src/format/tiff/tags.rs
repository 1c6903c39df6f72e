//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary for TIFF parsing:
//! - Field types that determine how values are encoded
//! - Tag IDs that identify metadata fields, with their format defaults
//! - Enumerated tag values (compression, photometric interpretation, planar
//!   configuration)

use serde::Serialize;

use super::values::FieldValue;

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Only integer, ASCII and opaque types are decoded. Entries using other types
/// (RATIONAL, FLOAT, ...) still parse, but reading their value fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Unsigned 64-bit integer (8 bytes) - BigTIFF only
    Long8 = 16,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long => 4,
            FieldType::Long8 => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unsupported or unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            7 => Some(FieldType::Undefined),
            16 => Some(FieldType::Long8),
            _ => None,
        }
    }

    /// Maximum bytes stored inline in a classic TIFF IFD entry.
    pub const INLINE_THRESHOLD_TIFF: usize = 4;

    /// Maximum bytes stored inline in a BigTIFF IFD entry.
    pub const INLINE_THRESHOLD_BIGTIFF: usize = 8;

    /// Check if `count` values of this type fit in the entry's value field.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let threshold = if is_bigtiff {
            Self::INLINE_THRESHOLD_BIGTIFF as u64
        } else {
            Self::INLINE_THRESHOLD_TIFF as u64
        };
        match (self.size_in_bytes() as u64).checked_mul(count) {
            Some(total) => total <= threshold,
            None => false,
        }
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs used by the raster decoder.
///
/// Tags not listed here are kept in the parsed directory but never looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Kind of data in this subfile (reduced resolution, page, mask)
    SubfileType = 254,

    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample, one value per sample
    BitsPerSample = 258,

    /// Compression scheme used
    Compression = 259,

    /// How sample values map to color
    PhotometricInterpretation = 262,

    /// Free-form description string
    ImageDescription = 270,

    /// Number of components per pixel (e.g., 3 for RGB)
    SamplesPerPixel = 277,

    /// How components are organized (contiguous vs separate planes)
    PlanarConfiguration = 284,

    /// Palette: 3 * 2^BitsPerSample 16-bit entries, all reds then greens then blues
    ColorMap = 320,

    // -------------------------------------------------------------------------
    // Strip Organization
    // -------------------------------------------------------------------------
    /// Byte offsets of strips
    StripOffsets = 273,

    /// Row count per strip
    RowsPerStrip = 278,

    /// Byte counts of strips
    StripByteCounts = 279,

    // -------------------------------------------------------------------------
    // Tile Organization (detected so scanline access can be refused)
    // -------------------------------------------------------------------------
    /// Width of each tile in pixels
    TileWidth = 322,

    /// Height (length) of each tile in pixels
    TileLength = 323,

    /// Byte offsets of each tile in the file
    TileOffsets = 324,

    /// Byte counts of each tile
    TileByteCounts = 325,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            254 => Some(TiffTag::SubfileType),
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            262 => Some(TiffTag::PhotometricInterpretation),
            270 => Some(TiffTag::ImageDescription),
            273 => Some(TiffTag::StripOffsets),
            277 => Some(TiffTag::SamplesPerPixel),
            278 => Some(TiffTag::RowsPerStrip),
            279 => Some(TiffTag::StripByteCounts),
            284 => Some(TiffTag::PlanarConfiguration),
            320 => Some(TiffTag::ColorMap),
            322 => Some(TiffTag::TileWidth),
            323 => Some(TiffTag::TileLength),
            324 => Some(TiffTag::TileOffsets),
            325 => Some(TiffTag::TileByteCounts),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Tag name as written in the TIFF specification.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::SubfileType => "SubfileType",
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::BitsPerSample => "BitsPerSample",
            TiffTag::Compression => "Compression",
            TiffTag::PhotometricInterpretation => "PhotometricInterpretation",
            TiffTag::ImageDescription => "ImageDescription",
            TiffTag::StripOffsets => "StripOffsets",
            TiffTag::SamplesPerPixel => "SamplesPerPixel",
            TiffTag::RowsPerStrip => "RowsPerStrip",
            TiffTag::StripByteCounts => "StripByteCounts",
            TiffTag::PlanarConfiguration => "PlanarConfiguration",
            TiffTag::ColorMap => "ColorMap",
            TiffTag::TileWidth => "TileWidth",
            TiffTag::TileLength => "TileLength",
            TiffTag::TileOffsets => "TileOffsets",
            TiffTag::TileByteCounts => "TileByteCounts",
        }
    }

    /// Value the TIFF format prescribes when the tag is absent.
    ///
    /// `None` for tags without a documented default (including
    /// PhotometricInterpretation, which has none in TIFF 5.0/6.0).
    pub fn default_value(self) -> Option<FieldValue> {
        let value = match self {
            TiffTag::SubfileType => 0,
            TiffTag::BitsPerSample => 1,
            TiffTag::Compression => Compression::None as u64,
            TiffTag::SamplesPerPixel => 1,
            TiffTag::RowsPerStrip => u32::MAX as u64,
            TiffTag::PlanarConfiguration => PlanarConfig::Contiguous as u64,
            _ => return None,
        };
        Some(FieldValue::unsigned(value))
    }
}

// =============================================================================
// Compression Values
// =============================================================================

/// TIFF compression scheme identifiers.
///
/// Scanline reads are served for uncompressed data only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// No compression
    None = 1,

    /// CCITT modified Huffman RLE
    CcittRle = 2,

    /// CCITT Group 3 fax
    CcittFax3 = 3,

    /// CCITT Group 4 fax
    CcittFax4 = 4,

    /// LZW compression
    Lzw = 5,

    /// "Old-style" JPEG
    OldJpeg = 6,

    /// JPEG compression
    Jpeg = 7,

    /// Deflate/zlib compression
    Deflate = 8,

    /// Macintosh RLE
    PackBits = 32773,

    /// Adobe Deflate
    AdobeDeflate = 32946,
}

impl Compression {
    /// Create a Compression from its numeric value.
    ///
    /// Returns `None` for unrecognized compression values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            2 => Some(Compression::CcittRle),
            3 => Some(Compression::CcittFax3),
            4 => Some(Compression::CcittFax4),
            5 => Some(Compression::Lzw),
            6 => Some(Compression::OldJpeg),
            7 => Some(Compression::Jpeg),
            8 => Some(Compression::Deflate),
            32773 => Some(Compression::PackBits),
            32946 => Some(Compression::AdobeDeflate),
            _ => None,
        }
    }

    /// Check if scanlines can be read for this compression scheme.
    #[inline]
    pub const fn is_supported(self) -> bool {
        matches!(self, Compression::None)
    }

    /// Get a human-readable name for the compression scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::CcittRle => "CCITT RLE",
            Compression::CcittFax3 => "CCITT Group 3",
            Compression::CcittFax4 => "CCITT Group 4",
            Compression::Lzw => "LZW",
            Compression::OldJpeg => "Old JPEG",
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "Deflate",
            Compression::PackBits => "PackBits",
            Compression::AdobeDeflate => "Adobe Deflate",
        }
    }
}

// =============================================================================
// Photometric Interpretation
// =============================================================================

/// How raw sample values map to visual meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Photometric {
    /// Grayscale, 0 is white
    MinIsWhite,
    /// Grayscale, 0 is black
    MinIsBlack,
    /// Direct RGB color
    Rgb,
    /// Indexed color through a ColorMap
    Palette,
    /// Holdout mask
    TransparencyMask,
    /// Color separations, usually CMYK
    Separated,
    /// Luma/chroma
    YCbCr,
    /// CIE L*a*b*
    CieLab,
    /// Any value this crate has no name for
    Other(u16),
}

impl Photometric {
    /// Map a PhotometricInterpretation tag value.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Photometric::MinIsWhite,
            1 => Photometric::MinIsBlack,
            2 => Photometric::Rgb,
            3 => Photometric::Palette,
            4 => Photometric::TransparencyMask,
            5 => Photometric::Separated,
            6 => Photometric::YCbCr,
            8 => Photometric::CieLab,
            other => Photometric::Other(other),
        }
    }

    /// The tag value for this interpretation.
    pub const fn as_u16(self) -> u16 {
        match self {
            Photometric::MinIsWhite => 0,
            Photometric::MinIsBlack => 1,
            Photometric::Rgb => 2,
            Photometric::Palette => 3,
            Photometric::TransparencyMask => 4,
            Photometric::Separated => 5,
            Photometric::YCbCr => 6,
            Photometric::CieLab => 8,
            Photometric::Other(value) => value,
        }
    }

    /// Short human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Photometric::MinIsWhite => "min-is-white",
            Photometric::MinIsBlack => "min-is-black",
            Photometric::Rgb => "RGB",
            Photometric::Palette => "palette",
            Photometric::TransparencyMask => "transparency mask",
            Photometric::Separated => "separated",
            Photometric::YCbCr => "YCbCr",
            Photometric::CieLab => "CIE L*a*b*",
            Photometric::Other(_) => "unknown",
        }
    }
}

// =============================================================================
// Planar Configuration
// =============================================================================

/// Whether the components of a pixel are interleaved or stored as planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanarConfig {
    /// Components interleaved per pixel (chunky)
    Contiguous = 1,
    /// One full-image plane per component
    Separate = 2,
}

impl PlanarConfig {
    /// Map a PlanarConfiguration tag value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(PlanarConfig::Contiguous),
            2 => Some(PlanarConfig::Separate),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
