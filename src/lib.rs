//! # tiff-raster
//!
//! Decode in-memory TIFF images into flat, row-major pixel buffers.
//!
//! The crate reads grayscale (min-is-black / min-is-white), palette and RGB
//! images, with contiguous or planar-separate samples, from uncompressed
//! strip-organized TIFF and BigTIFF files. Missing metadata falls back to the
//! TIFF defaults, and a missing photometric interpretation is inferred from
//! the samples per pixel.
//!
//! ## Architecture
//!
//! - [`io`] - [`TiffStream`] contract and the in-memory [`MemoryStream`] adapter
//! - [`mod@format`] - TIFF header/IFD parsing and the scanline [`Container`]
//! - [`raster`] - image info, colormaps, raster decoding and PNG output
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use tiff_raster::{decode_image, read_image_info, TiffFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("scan.tif")?;
//! let mut file = TiffFile::open_bytes(&data, "scan.tif")?;
//!
//! let info = read_image_info(&mut file, Some(0))?;
//! println!("{} x {} {}", info.width, info.height, info.photometric.name());
//!
//! let decoded = decode_image(&mut file, Some(0))?;
//! assert!(decoded.outcome.is_complete());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod raster;

// Re-export commonly used types
pub use config::{Cli, Command, DecodeConfig, InfoConfig, OutputFormat};
pub use error::{DecodeError, IoError, OutputError, TiffError};
pub use format::tiff::{
    parse_u64_array, scanline_bytes, ByteOrder, Compression, Container, FieldType, FieldValue,
    Ifd, IfdEntry, Photometric, PlanarConfig, TiffFile, TiffHeader, TiffTag, ValueReader,
    BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE,
};
pub use io::{grow_by_resize, GrowFn, MemoryStream, OpenMode, TiffStream, DEFAULT_STREAM_IDENTIFIER};
pub use raster::{
    correct_colormap, decode_image, decode_raster, encode_png, png_color_type, read_colormap,
    read_image_info, required_output_len, Colormap, ColormapDepth, DecodeStatus, DecodedImage,
    Expansion, ImageInfo, RasterGeometry, RasterOutcome,
};
