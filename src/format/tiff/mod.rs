//! TIFF container layer.
//!
//! This module parses TIFF and BigTIFF files and serves their image data
//! one scanline at a time.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian, MM = big-endian)
//!   in the header. All multi-byte values must be read respecting this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets (max 4GB files),
//!   while BigTIFF uses 64-bit offsets. The parser handles both transparently.
//!
//! - **IFD (Image File Directory)**: One per image. Multi-page files chain
//!   them through next-IFD offsets; exactly one is current at a time.
//!
//! - **Strips**: Uncompressed image data is stored in strips of `RowsPerStrip`
//!   rows. Planar-separate images store one run of strips per sample.
//!
//! - **Defaults**: Several tags (BitsPerSample, SamplesPerPixel, PlanarConfiguration,
//!   ...) have format-defined values used when absent. See [`Container::field_defaulted`].

mod container;
mod parser;
mod tags;
mod values;

pub use container::{scanline_bytes, Container, TiffFile};
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{Compression, FieldType, Photometric, PlanarConfig, TiffTag};
pub use values::{parse_u64_array, FieldValue, ValueReader};
