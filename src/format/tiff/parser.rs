//! TIFF header and directory parsing.
//!
//! # TIFF Header Structure
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! ## BigTIFF (16 bytes)
//! ```text
//! Bytes 0-1: Byte order
//! Bytes 2-3: Version (43 = 0x002B)
//! Bytes 4-5: Offset byte size (must be 8)
//! Bytes 6-7: Reserved (must be 0)
//! Bytes 8-15: Offset to first IFD (8 bytes)
//! ```
//!
//! # IFD Structure
//! ```text
//! entry count          (2 bytes classic, 8 bytes BigTIFF)
//! entries              (12 bytes classic, 20 bytes BigTIFF each)
//!   tag, type          (2 + 2 bytes)
//!   count              (4 / 8 bytes)
//!   value or offset    (4 / 8 bytes)
//! next IFD offset      (4 / 8 bytes, 0 terminates the chain)
//! ```

use crate::error::TiffError;
use crate::io::{read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le};

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for classic TIFF
const VERSION_TIFF: u16 = 42;

/// Version number for BigTIFF
const VERSION_BIGTIFF: u16 = 43;

/// Size of classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => read_u64_le(bytes),
            ByteOrder::BigEndian => read_u64_be(bytes),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Whether this is a BigTIFF file (64-bit offsets)
    pub is_bigtiff: bool,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from the first bytes of a file.
    ///
    /// `bytes` must hold at least 8 bytes, or 16 for BigTIFF. `file_size`
    /// bounds the first IFD offset.
    ///
    /// # Errors
    /// - `FileTooSmall` if there aren't enough bytes for the header
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if version is not 42 or 43
    /// - `InvalidBigTiffOffsetSize` if BigTIFF offset size is not 8
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // Checked as raw bytes; the order isn't known yet
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        let (is_bigtiff, first_ifd_offset) = match version {
            VERSION_TIFF => (false, byte_order.read_u32(&bytes[4..8]) as u64),
            VERSION_BIGTIFF => {
                if bytes.len() < BIGTIFF_HEADER_SIZE {
                    return Err(TiffError::FileTooSmall {
                        required: BIGTIFF_HEADER_SIZE as u64,
                        actual: bytes.len() as u64,
                    });
                }
                let offset_size = byte_order.read_u16(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidBigTiffOffsetSize(offset_size));
                }
                (true, byte_order.read_u64(&bytes[8..16]))
            }
            _ => return Err(TiffError::InvalidVersion(version)),
        };

        if first_ifd_offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            is_bigtiff,
            first_ifd_offset,
        })
    }

    /// Size of an IFD entry: 12 bytes classic, 20 bytes BigTIFF.
    #[inline]
    pub const fn ifd_entry_size(&self) -> usize {
        if self.is_bigtiff {
            20
        } else {
            12
        }
    }

    /// Size of the entry count field at the start of an IFD.
    #[inline]
    pub const fn ifd_count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    /// Size of the next-IFD offset field, and of the value/offset field of an entry.
    #[inline]
    pub const fn offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// One raw entry of an image file directory.
///
/// The value is not decoded here; see [`super::ValueReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Numeric tag ID
    pub tag_id: u16,

    /// Decoded field type, `None` if the type is not supported
    pub field_type: Option<FieldType>,

    /// Field type as stored in the file
    pub field_type_raw: u16,

    /// Number of values
    pub count: u64,

    /// The raw value/offset field (4 or 8 bytes, in file byte order)
    pub value_offset_bytes: Vec<u8>,

    /// Whether the value is stored in `value_offset_bytes` itself
    pub is_inline: bool,
}

impl IfdEntry {
    /// Total byte size of the value, or `None` for unsupported types.
    pub fn value_byte_size(&self) -> Option<u64> {
        let field_type = self.field_type?;
        (field_type.size_in_bytes() as u64).checked_mul(self.count)
    }

    /// Interpret the value field as an offset into the file.
    pub fn value_offset(&self, byte_order: ByteOrder) -> u64 {
        if self.value_offset_bytes.len() == 8 {
            byte_order.read_u64(&self.value_offset_bytes)
        } else {
            byte_order.read_u32(&self.value_offset_bytes) as u64
        }
    }

    /// Single inline integer value, if the entry holds exactly one.
    pub fn inline_u64(&self, byte_order: ByteOrder) -> Option<u64> {
        if !self.is_inline || self.count != 1 {
            return None;
        }
        let bytes = &self.value_offset_bytes;
        match self.field_type? {
            FieldType::Byte => Some(bytes[0] as u64),
            FieldType::Short => Some(byte_order.read_u16(bytes) as u64),
            FieldType::Long => Some(byte_order.read_u32(bytes) as u64),
            FieldType::Long8 => Some(byte_order.read_u64(bytes)),
            FieldType::Ascii | FieldType::Undefined => None,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed image file directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Entries in file order
    pub entries: Vec<IfdEntry>,

    /// Offset of the next IFD, 0 if this is the last
    pub next_ifd_offset: u64,
}

impl Ifd {
    /// Byte size of an IFD with `entry_count` entries.
    ///
    /// Returns `None` if the size overflows, which only a corrupt BigTIFF
    /// entry count can cause.
    pub fn calculate_size(entry_count: u64, header: &TiffHeader) -> Option<u64> {
        entry_count
            .checked_mul(header.ifd_entry_size() as u64)?
            .checked_add((header.ifd_count_size() + header.offset_size()) as u64)
    }

    /// Parse an IFD from bytes starting at its entry count.
    pub fn parse(bytes: &[u8], header: &TiffHeader) -> Result<Self, TiffError> {
        let byte_order = header.byte_order;
        let count_size = header.ifd_count_size();
        let entry_size = header.ifd_entry_size();
        let offset_size = header.offset_size();

        if bytes.len() < count_size {
            return Err(TiffError::FileTooSmall {
                required: count_size as u64,
                actual: bytes.len() as u64,
            });
        }

        let entry_count = if header.is_bigtiff {
            byte_order.read_u64(bytes)
        } else {
            byte_order.read_u16(bytes) as u64
        };

        let required = Self::calculate_size(entry_count, header)
            .ok_or(TiffError::InvalidTagValue {
                tag: "IFD",
                message: format!("entry count {} overflows", entry_count),
            })?;
        if (bytes.len() as u64) < required {
            return Err(TiffError::FileTooSmall {
                required,
                actual: bytes.len() as u64,
            });
        }

        // required fits in bytes.len(), so every index below is in range
        let mut entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count as usize {
            let start = count_size + i * entry_size;
            let raw = &bytes[start..start + entry_size];

            let tag_id = byte_order.read_u16(&raw[0..2]);
            let field_type_raw = byte_order.read_u16(&raw[2..4]);
            let field_type = FieldType::from_u16(field_type_raw);
            let (count, value_offset_bytes) = if header.is_bigtiff {
                (byte_order.read_u64(&raw[4..12]), raw[12..20].to_vec())
            } else {
                (byte_order.read_u32(&raw[4..8]) as u64, raw[8..12].to_vec())
            };
            let is_inline = field_type
                .map(|t| t.fits_inline(count, header.is_bigtiff))
                .unwrap_or(false);

            entries.push(IfdEntry {
                tag_id,
                field_type,
                field_type_raw,
                count,
                value_offset_bytes,
                is_inline,
            });
        }

        let next_start = count_size + entry_count as usize * entry_size;
        let next_bytes = &bytes[next_start..next_start + offset_size];
        let next_ifd_offset = if header.is_bigtiff {
            byte_order.read_u64(next_bytes)
        } else {
            byte_order.read_u32(next_bytes) as u64
        };

        Ok(Ifd {
            entries,
            next_ifd_offset,
        })
    }

    /// Find the entry for a tag.
    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        let id = tag.as_u16();
        self.entries.iter().find(|e| e.tag_id == id)
    }

    /// Whether the directory describes a tiled image.
    pub fn is_tiled(&self) -> bool {
        self.get_entry_by_tag(TiffTag::TileWidth).is_some()
            && self.get_entry_by_tag(TiffTag::TileOffsets).is_some()
    }

    /// Whether the directory describes a stripped image.
    pub fn is_stripped(&self) -> bool {
        self.get_entry_by_tag(TiffTag::StripOffsets).is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
