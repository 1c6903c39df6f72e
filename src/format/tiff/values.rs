//! TIFF tag value reading.
//!
//! Values are stored either inline in the IFD entry (small values) or at
//! an offset in the file (arrays such as StripOffsets or ColorMap). Each
//! value is fetched with a single read regardless of its length.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::TiffStream;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

// =============================================================================
// FieldValue
// =============================================================================

/// A decoded tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// BYTE, SHORT, LONG or LONG8 values widened to u64
    Unsigned(Vec<u64>),

    /// ASCII string with the NUL terminator stripped
    Ascii(String),

    /// Opaque bytes
    Undefined(Bytes),
}

impl FieldValue {
    /// A single unsigned value.
    pub fn unsigned(value: u64) -> Self {
        FieldValue::Unsigned(vec![value])
    }

    /// All unsigned values, or `None` for non-integer fields.
    pub fn as_u64_slice(&self) -> Option<&[u64]> {
        match self {
            FieldValue::Unsigned(values) => Some(values),
            _ => None,
        }
    }

    /// First value as u32, `None` if absent or out of range.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64_slice()?
            .first()
            .and_then(|&v| u32::try_from(v).ok())
    }

    /// First value as u16, `None` if absent or out of range.
    pub fn as_u16(&self) -> Option<u16> {
        self.as_u64_slice()?
            .first()
            .and_then(|&v| u16::try_from(v).ok())
    }

    /// All values as u16, `None` if any is out of range.
    pub fn as_u16_vec(&self) -> Option<Vec<u16>> {
        self.as_u64_slice()?
            .iter()
            .map(|&v| u16::try_from(v).ok())
            .collect()
    }

    /// The string value of an ASCII field.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF stream, respecting the file's byte order.
pub struct ValueReader<'a, S: TiffStream + ?Sized> {
    stream: &'a mut S,
    header: TiffHeader,
}

impl<'a, S: TiffStream + ?Sized> ValueReader<'a, S> {
    pub fn new(stream: &'a mut S, header: TiffHeader) -> Self {
        Self { stream, header }
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Raw bytes of an entry's value.
    ///
    /// Inline values come from the entry itself, others are read from the stream.
    pub fn read_bytes(&mut self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            return Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ));
        }

        let len = usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
            tag: "IFD entry",
            message: format!("value of {} bytes is not addressable", size),
        })?;
        let offset = entry.value_offset(self.header.byte_order);
        Ok(self.stream.read_exact_at(offset, len)?)
    }

    /// Decode a whole entry into a [`FieldValue`].
    pub fn read_field(&mut self, entry: &IfdEntry) -> Result<FieldValue, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        match field_type {
            FieldType::Ascii => self.read_string(entry).map(FieldValue::Ascii),
            FieldType::Undefined => self.read_bytes(entry).map(FieldValue::Undefined),
            _ => self.read_u64_array(entry).map(FieldValue::Unsigned),
        }
    }

    /// Read an integer array, widening every value to u64.
    pub fn read_u64_array(&mut self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if !matches!(
            field_type,
            FieldType::Byte | FieldType::Short | FieldType::Long | FieldType::Long8
        ) {
            return Err(TiffError::InvalidTagValue {
                tag: "IFD entry",
                message: format!("expected an integer type, got {:?}", field_type),
            });
        }
        if entry.count == 0 {
            return Ok(Vec::new());
        }

        // Single inline values skip the byte copy
        if let Some(value) = entry.inline_u64(self.header.byte_order) {
            return Ok(vec![value]);
        }

        let bytes = self.read_bytes(entry)?;
        Ok(parse_u64_array(
            &bytes,
            entry.count as usize,
            field_type,
            self.header.byte_order,
        ))
    }

    /// Read an ASCII value, stopping at the first NUL.
    pub fn read_string(&mut self, entry: &IfdEntry) -> Result<String, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if field_type != FieldType::Ascii {
            return Err(TiffError::InvalidTagValue {
                tag: "IFD entry",
                message: format!("expected Ascii type for string, got {:?}", field_type),
            });
        }

        let bytes = self.read_bytes(entry)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

// =============================================================================
// Convenience functions for reading from bytes directly
// =============================================================================

/// Parse an array of integers from raw bytes.
///
/// Values that would read past the end of `bytes` are dropped.
pub fn parse_u64_array(
    bytes: &[u8],
    count: usize,
    field_type: FieldType,
    byte_order: ByteOrder,
) -> Vec<u64> {
    let width = field_type.size_in_bytes();
    bytes
        .chunks_exact(width)
        .take(count)
        .filter_map(|chunk| match field_type {
            FieldType::Byte => Some(chunk[0] as u64),
            FieldType::Short => Some(byte_order.read_u16(chunk) as u64),
            FieldType::Long => Some(byte_order.read_u32(chunk) as u64),
            FieldType::Long8 => Some(byte_order.read_u64(chunk)),
            FieldType::Ascii | FieldType::Undefined => None,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
