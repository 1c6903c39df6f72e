//! Scanline container over a TIFF stream.
//!
//! [`Container`] is the contract the raster layer decodes against: directory
//! selection, tag lookup, and "read one scanline of sample S of row R".
//! [`TiffFile`] implements it for uncompressed, strip-organized TIFF and
//! BigTIFF files held in any [`TiffStream`].

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::error::{IoError, TiffError};
use crate::io::{MemoryStream, TiffStream};

use super::parser::{Ifd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::tags::{Compression, PlanarConfig, TiffTag};
use super::values::{FieldValue, ValueReader};

/// Maximum number of IFDs to walk.
///
/// Caps the directory chain of corrupt or hostile files.
const MAX_IFDS: usize = 100;

// =============================================================================
// Container trait
// =============================================================================

/// Directory navigation, tag access and scanline I/O for one open file.
///
/// Every call takes `&mut self`: a container owns its stream and its
/// current-directory cursor, so two decodes can never interleave on one handle.
pub trait Container {
    /// Number of image directories in the file.
    fn image_count(&self) -> usize;

    /// Zero-based index of the current directory.
    fn current_image(&self) -> u32;

    /// Make `index` the current directory.
    fn select_image(&mut self, index: u32) -> Result<(), TiffError>;

    /// Value of `tag` in the current directory, `None` if the tag is absent.
    fn field(&mut self, tag: TiffTag) -> Result<Option<FieldValue>, TiffError>;

    /// Value of `tag`, falling back to the TIFF default when absent.
    ///
    /// Fails with `MissingTag` for absent tags that have no default.
    fn field_defaulted(&mut self, tag: TiffTag) -> Result<FieldValue, TiffError> {
        match self.field(tag)? {
            Some(value) => Ok(value),
            None => tag
                .default_value()
                .ok_or(TiffError::MissingTag(tag.name())),
        }
    }

    /// Byte length of one scanline of the current image.
    ///
    /// For planar-separate images this is the length of one sample's row.
    fn scanline_size(&mut self) -> Result<usize, TiffError>;

    /// Read row `row` of sample plane `sample` into the front of `buf`.
    ///
    /// `sample` is ignored for contiguous images.
    fn read_scanline(&mut self, buf: &mut [u8], row: u32, sample: u16) -> Result<(), TiffError>;

    /// Name of the underlying stream, used in diagnostics.
    fn file_name(&self) -> &str;

    /// Total bytes behind the container, when known.
    ///
    /// Uncompressed image data can never exceed it.
    fn data_size(&self) -> Option<u64> {
        None
    }
}

/// Bytes in one scanline.
///
/// Contiguous rows carry every sample of each pixel, separate rows carry one.
pub fn scanline_bytes(width: u32, bits_per_sample: u16, samples_per_pixel: u16, planar: PlanarConfig) -> u64 {
    let samples = match planar {
        PlanarConfig::Contiguous => samples_per_pixel as u64,
        PlanarConfig::Separate => 1,
    };
    (width as u64 * samples * bits_per_sample as u64).div_ceil(8)
}

// =============================================================================
// Strip layout
// =============================================================================

/// Where each scanline of the current image lives.
#[derive(Debug, Clone)]
struct StripLayout {
    height: u32,
    samples_per_pixel: u16,
    planar: PlanarConfig,
    rows_per_strip: u32,
    strips_per_plane: u64,
    scanline_size: usize,
    offsets: Vec<u64>,
    byte_counts: Option<Vec<u64>>,
}

impl StripLayout {
    /// File offset of a scanline.
    fn locate(&self, row: u32, sample: u16) -> Result<u64, TiffError> {
        let plane = match self.planar {
            PlanarConfig::Contiguous => 0,
            PlanarConfig::Separate => sample as u64,
        };
        if row >= self.height
            || (self.planar == PlanarConfig::Separate && sample >= self.samples_per_pixel)
        {
            return Err(TiffError::ScanlineOutOfRange {
                row,
                sample,
                height: self.height,
                samples: self.samples_per_pixel,
            });
        }

        let strip = plane * self.strips_per_plane + (row / self.rows_per_strip) as u64;
        let row_in_strip = (row % self.rows_per_strip) as u64;
        let start = row_in_strip * self.scanline_size as u64;

        let strip_offset = *self
            .offsets
            .get(strip as usize)
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag: TiffTag::StripOffsets.name(),
                message: format!("no entry for strip {}", strip),
            })?;

        if let Some(count) = self.byte_counts.as_ref().and_then(|c| c.get(strip as usize)) {
            if start + self.scanline_size as u64 > *count {
                return Err(TiffError::InvalidTagValue {
                    tag: TiffTag::StripByteCounts.name(),
                    message: format!(
                        "strip {} holds {} bytes, row {} needs {}",
                        strip,
                        count,
                        row,
                        start + self.scanline_size as u64
                    ),
                });
            }
        }

        strip_offset
            .checked_add(start)
            .ok_or_else(|| TiffError::InvalidTagValue {
                tag: TiffTag::StripOffsets.name(),
                message: format!("strip {} offset overflows", strip),
            })
    }
}

// =============================================================================
// TiffFile
// =============================================================================

/// An open TIFF file serving uncompressed strips by scanline.
pub struct TiffFile<S: TiffStream> {
    stream: S,
    header: TiffHeader,
    ifds: Vec<Ifd>,
    current: usize,

    /// Strip layout of the current directory, built on first scanline access
    strips: Option<StripLayout>,
}

impl<'a> TiffFile<MemoryStream<'a>> {
    /// Open a TIFF held in a byte slice.
    pub fn open_bytes(data: &'a [u8], name: &str) -> Result<Self, TiffError> {
        Self::open(MemoryStream::new(data).with_identifier(name))
    }
}

impl<S: TiffStream> TiffFile<S> {
    /// Parse the header and the full directory chain.
    ///
    /// The first directory becomes current.
    pub fn open(mut stream: S) -> Result<Self, TiffError> {
        let size = stream.size();
        let header_len = size.min(BIGTIFF_HEADER_SIZE as u64) as usize;
        let header_bytes = stream.read_exact_at(0, header_len)?;
        let header = TiffHeader::parse(&header_bytes, size)?;

        let ifds = read_directories(&mut stream, &header)?;
        if ifds.is_empty() {
            return Err(TiffError::NoDirectories);
        }

        debug!(
            file = stream.identifier(),
            bigtiff = header.is_bigtiff,
            byte_order = ?header.byte_order,
            directories = ifds.len(),
            "Opened TIFF"
        );

        Ok(TiffFile {
            stream,
            header,
            ifds,
            current: 0,
            strips: None,
        })
    }

    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    /// Close the file, releasing the stream.
    pub fn close(self) {
        trace!(file = self.stream.identifier(), "Closing TIFF");
    }

    /// Close the file and hand the stream back.
    pub fn into_stream(self) -> S {
        self.stream
    }

    fn current_ifd(&self) -> &Ifd {
        &self.ifds[self.current]
    }

    /// Value of a tag that has no default.
    fn required_u32(&mut self, tag: TiffTag) -> Result<u32, TiffError> {
        let value = self.field(tag)?.ok_or(TiffError::MissingTag(tag.name()))?;
        value.as_u32().ok_or_else(|| invalid_value(tag, &value))
    }

    fn defaulted_u16(&mut self, tag: TiffTag) -> Result<u16, TiffError> {
        let value = self.field_defaulted(tag)?;
        value.as_u16().ok_or_else(|| invalid_value(tag, &value))
    }

    fn planar_config(&mut self) -> Result<PlanarConfig, TiffError> {
        let raw = self.defaulted_u16(TiffTag::PlanarConfiguration)?;
        PlanarConfig::from_u16(raw).ok_or_else(|| TiffError::InvalidTagValue {
            tag: TiffTag::PlanarConfiguration.name(),
            message: format!("unknown value {}", raw),
        })
    }

    fn load_strip_layout(&mut self) -> Result<StripLayout, TiffError> {
        let compression = self.defaulted_u16(TiffTag::Compression)?;
        match Compression::from_u16(compression) {
            Some(c) if c.is_supported() => {}
            Some(c) => return Err(TiffError::UnsupportedCompression(c.name().to_string())),
            None => return Err(TiffError::UnsupportedCompression(format!("scheme {}", compression))),
        }
        if self.current_ifd().is_tiled() {
            return Err(TiffError::TiledOrganization);
        }

        let height = self.required_u32(TiffTag::ImageLength)?;
        let samples_per_pixel = self.defaulted_u16(TiffTag::SamplesPerPixel)?;
        let planar = self.planar_config()?;
        let scanline_size = self.scanline_size()?;

        let rows_per_strip = self
            .field_defaulted(TiffTag::RowsPerStrip)?
            .as_u64_slice()
            .and_then(|v| v.first().copied())
            .unwrap_or(u32::MAX as u64)
            .min(height as u64)
            .max(1) as u32;
        let strips_per_plane = (height as u64).div_ceil(rows_per_strip as u64);

        let offsets = match self.field(TiffTag::StripOffsets)? {
            Some(FieldValue::Unsigned(values)) => values,
            Some(other) => return Err(invalid_value(TiffTag::StripOffsets, &other)),
            None => return Err(TiffError::MissingTag(TiffTag::StripOffsets.name())),
        };
        let planes = match planar {
            PlanarConfig::Contiguous => 1,
            PlanarConfig::Separate => samples_per_pixel as u64,
        };
        let expected = strips_per_plane * planes;
        if (offsets.len() as u64) < expected {
            return Err(TiffError::InvalidTagValue {
                tag: TiffTag::StripOffsets.name(),
                message: format!("expected {} strips, found {}", expected, offsets.len()),
            });
        }

        let byte_counts = match self.field(TiffTag::StripByteCounts)? {
            Some(FieldValue::Unsigned(values)) => Some(values),
            _ => None,
        };

        let layout = StripLayout {
            height,
            samples_per_pixel,
            planar,
            rows_per_strip,
            strips_per_plane,
            scanline_size,
            offsets,
            byte_counts,
        };
        debug!(
            file = self.stream.identifier(),
            directory = self.current,
            rows_per_strip,
            strips = layout.offsets.len(),
            scanline_size,
            "Loaded strip layout"
        );
        Ok(layout)
    }

    fn strip_layout(&mut self) -> Result<&StripLayout, TiffError> {
        let layout = match self.strips.take() {
            Some(layout) => layout,
            None => self.load_strip_layout()?,
        };
        Ok(self.strips.insert(layout))
    }
}

impl<S: TiffStream> Container for TiffFile<S> {
    fn image_count(&self) -> usize {
        self.ifds.len()
    }

    fn current_image(&self) -> u32 {
        self.current as u32
    }

    fn select_image(&mut self, index: u32) -> Result<(), TiffError> {
        if index as usize >= self.ifds.len() {
            return Err(TiffError::DirectoryOutOfRange {
                index,
                count: self.ifds.len(),
            });
        }
        if index as usize != self.current {
            self.current = index as usize;
            self.strips = None;
        }
        trace!(file = self.stream.identifier(), directory = index, "Selected directory");
        Ok(())
    }

    fn field(&mut self, tag: TiffTag) -> Result<Option<FieldValue>, TiffError> {
        let Some(entry) = self.ifds[self.current].get_entry_by_tag(tag) else {
            return Ok(None);
        };
        ValueReader::new(&mut self.stream, self.header)
            .read_field(entry)
            .map(Some)
    }

    fn scanline_size(&mut self) -> Result<usize, TiffError> {
        let width = self.required_u32(TiffTag::ImageWidth)?;
        let bits_per_sample = self.defaulted_u16(TiffTag::BitsPerSample)?;
        let samples_per_pixel = self.defaulted_u16(TiffTag::SamplesPerPixel)?;
        let planar = self.planar_config()?;

        let size = scanline_bytes(width, bits_per_sample, samples_per_pixel, planar);
        usize::try_from(size).map_err(|_| TiffError::InvalidTagValue {
            tag: TiffTag::ImageWidth.name(),
            message: format!("scanline of {} bytes is not addressable", size),
        })
    }

    fn read_scanline(&mut self, buf: &mut [u8], row: u32, sample: u16) -> Result<(), TiffError> {
        let (offset, len) = {
            let layout = self.strip_layout()?;
            (layout.locate(row, sample)?, layout.scanline_size)
        };
        if buf.len() < len {
            return Err(TiffError::ScanlineBufferTooSmall {
                required: len,
                actual: buf.len(),
            });
        }

        let dest = &mut buf[..len];
        if let Some(data) = self.stream.map() {
            let copied = usize::try_from(offset)
                .ok()
                .and_then(|start| data.get(start..start.checked_add(len)?))
                .map(|src| dest.copy_from_slice(src));
            let size = data.len() as u64;
            self.stream.unmap();
            copied.ok_or(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size,
            })?;
        } else {
            let bytes = self.stream.read_exact_at(offset, len)?;
            dest.copy_from_slice(&bytes);
        }
        Ok(())
    }

    fn file_name(&self) -> &str {
        self.stream.identifier()
    }

    fn data_size(&self) -> Option<u64> {
        Some(self.stream.size())
    }
}

fn invalid_value(tag: TiffTag, value: &FieldValue) -> TiffError {
    TiffError::InvalidTagValue {
        tag: tag.name(),
        message: format!("unexpected value {:?}", value),
    }
}

/// Walk the next-IFD chain from the header.
///
/// Stops at a zero offset, at an offset already visited, or after
/// [`MAX_IFDS`] directories.
fn read_directories<S: TiffStream>(
    stream: &mut S,
    header: &TiffHeader,
) -> Result<Vec<Ifd>, TiffError> {
    let mut ifds = Vec::new();
    let mut visited = HashSet::new();
    let mut offset = header.first_ifd_offset;

    while offset != 0 {
        if ifds.len() >= MAX_IFDS {
            warn!(file = stream.identifier(), limit = MAX_IFDS, "Directory limit reached, ignoring the rest");
            break;
        }
        if !visited.insert(offset) {
            warn!(file = stream.identifier(), offset, "Directory chain loops, stopping");
            break;
        }

        let count_size = header.ifd_count_size();
        let count_bytes = stream.read_exact_at(offset, count_size)?;
        let entry_count = if header.is_bigtiff {
            header.byte_order.read_u64(&count_bytes)
        } else {
            header.byte_order.read_u16(&count_bytes) as u64
        };

        let ifd_size = Ifd::calculate_size(entry_count, header)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or(TiffError::InvalidIfdOffset(offset))?;
        let ifd_bytes = stream.read_exact_at(offset, ifd_size)?;
        let ifd = Ifd::parse(&ifd_bytes, header)?;

        offset = ifd.next_ifd_offset;
        ifds.push(ifd);
    }

    Ok(ifds)
}

// =============================================================================
// Tests
// =============================================================================
