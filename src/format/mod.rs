//! File format support.
//!
//! Only TIFF is handled: [`tiff`] parses the container and exposes it
//! through the [`tiff::Container`] trait the raster decoder reads from.

pub mod tiff;
