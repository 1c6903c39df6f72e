//! Raster decoding layer.
//!
//! This module turns the images of an open [`Container`](crate::format::tiff::Container)
//! into flat pixel buffers.
//!
//! # Flow
//!
//! ```text
//! bytes ──► MemoryStream ──► TiffFile (Container)
//!                                 │
//!                                 ▼
//!                         read_image_info ──► ImageInfo
//!                                 │
//!                       palette?  ▼
//!                          read_colormap ──► Colormap
//!                                 │
//!                                 ▼
//!                          decode_raster ──► row-major bytes
//! ```
//!
//! # Components
//!
//! - [`read_image_info`]: per-image metadata with TIFF defaults and photometric inference
//! - [`read_colormap`]: palette extraction with 8/16-bit detection
//! - [`decode_raster`]: scanline expansion into a caller buffer
//! - [`encode_png`]: PNG output for 8-bit layouts

mod colormap;
mod decoder;
mod encoder;
mod info;


pub use colormap::{correct_colormap, read_colormap, Colormap, ColormapDepth};
pub use decoder::{
    decode_image, decode_raster, required_output_len, DecodeStatus, DecodedImage, Expansion,
    RasterGeometry, RasterOutcome,
};
pub use encoder::{encode_png, png_color_type};
pub use info::{read_image_info, ImageInfo};
