//! Test utilities for integration tests.
//!
//! This module builds strip-organized TIFF files in memory: little- or
//! big-endian, classic or BigTIFF, with any number of directories.

// =============================================================================
// Field types
// =============================================================================

pub const BYTE: u16 = 1;
pub const ASCII: u16 = 2;
pub const SHORT: u16 = 3;
pub const LONG: u16 = 4;
pub const LONG8: u16 = 16;

// =============================================================================
// TIFF File Builders
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

/// Builder for creating test TIFF files.
pub struct TiffBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    ifds: Vec<IfdBuilder>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            ifds: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    pub fn add_ifd(mut self, ifd: IfdBuilder) -> Self {
        self.ifds.push(ifd);
        self
    }

    /// Build the TIFF file data.
    ///
    /// Layout: header, then for each directory the IFD itself followed by its
    /// out-of-line values and strip data.
    pub fn build(self) -> Vec<u8> {
        let writer = Writer {
            byte_order: self.byte_order,
            is_bigtiff: self.is_bigtiff,
        };
        let header_size: u64 = if self.is_bigtiff { 16 } else { 8 };

        let mut data = Vec::new();
        match self.byte_order {
            ByteOrderType::LittleEndian => data.extend(b"II"),
            ByteOrderType::BigEndian => data.extend(b"MM"),
        }
        if self.is_bigtiff {
            writer.put(&mut data, 43, 2);
            writer.put(&mut data, 8, 2);
            writer.put(&mut data, 0, 2);
        } else {
            writer.put(&mut data, 42, 2);
        }
        let first = if self.ifds.is_empty() { 0 } else { header_size };
        writer.put(&mut data, first, writer.offset_size());

        let count = self.ifds.len();
        for (idx, ifd) in self.ifds.into_iter().enumerate() {
            let offset = data.len() as u64;
            let block = ifd.layout(&writer, offset, idx + 1 < count);
            data.extend(block);
        }

        data
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One image directory with its strips.
#[derive(Clone, Debug)]
pub struct IfdBuilder {
    entries: Vec<(u16, u16, Vec<u64>)>,
    strips: Vec<Vec<u8>>,
    byte_counts: bool,
}

impl IfdBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            strips: Vec::new(),
            byte_counts: true,
        }
    }

    /// Add a tag. Replaces an earlier entry for the same tag.
    pub fn tag(mut self, tag: u16, field_type: u16, values: &[u64]) -> Self {
        self.entries.retain(|(t, _, _)| *t != tag);
        self.entries.push((tag, field_type, values.to_vec()));
        self
    }

    /// Remove a tag.
    pub fn without(mut self, tag: u16) -> Self {
        self.entries.retain(|(t, _, _)| *t != tag);
        self
    }

    /// Add an ASCII tag.
    pub fn text(self, tag: u16, value: &str) -> Self {
        let mut bytes: Vec<u64> = value.bytes().map(u64::from).collect();
        bytes.push(0);
        self.tag(tag, ASCII, &bytes)
    }

    /// Strip payloads; StripOffsets and StripByteCounts are generated.
    pub fn strips(mut self, strips: Vec<Vec<u8>>) -> Self {
        self.strips = strips;
        self
    }

    /// Leave out StripByteCounts.
    pub fn without_byte_counts(mut self) -> Self {
        self.byte_counts = false;
        self
    }

    /// 8-bit grayscale image, `rows_per_strip` rows per strip.
    pub fn gray8(width: u32, height: u32, rows_per_strip: u32, pixels: &[u8]) -> Self {
        let row = width as usize;
        Self::new()
            .tag(256, LONG, &[width as u64])
            .tag(257, LONG, &[height as u64])
            .tag(258, SHORT, &[8])
            .tag(262, SHORT, &[1])
            .tag(277, SHORT, &[1])
            .tag(278, LONG, &[rows_per_strip as u64])
            .strips(split_strips(pixels, row, rows_per_strip))
    }

    /// 8-bit RGB, interleaved.
    pub fn rgb8(width: u32, height: u32, pixels: &[u8]) -> Self {
        Self::new()
            .tag(256, SHORT, &[width as u64])
            .tag(257, SHORT, &[height as u64])
            .tag(258, SHORT, &[8, 8, 8])
            .tag(262, SHORT, &[2])
            .tag(277, SHORT, &[3])
            .tag(278, SHORT, &[height as u64])
            .strips(vec![pixels.to_vec()])
    }

    /// 8-bit RGB, one plane per sample, `rows_per_strip` rows per strip.
    pub fn rgb8_planar(width: u32, height: u32, rows_per_strip: u32, planes: [&[u8]; 3]) -> Self {
        let strips = planes
            .iter()
            .flat_map(|plane| split_strips(plane, width as usize, rows_per_strip))
            .collect();
        Self::new()
            .tag(256, SHORT, &[width as u64])
            .tag(257, SHORT, &[height as u64])
            .tag(258, SHORT, &[8, 8, 8])
            .tag(262, SHORT, &[2])
            .tag(277, SHORT, &[3])
            .tag(278, SHORT, &[rows_per_strip as u64])
            .tag(284, SHORT, &[2])
            .strips(strips)
    }

    /// Palette image with 8-bit indices.
    ///
    /// `colormap` holds all red values, then green, then blue.
    pub fn palette8(width: u32, height: u32, colormap: &[u64], indices: &[u8]) -> Self {
        Self::new()
            .tag(256, SHORT, &[width as u64])
            .tag(257, SHORT, &[height as u64])
            .tag(258, SHORT, &[8])
            .tag(262, SHORT, &[3])
            .tag(320, SHORT, colormap)
            .strips(vec![indices.to_vec()])
    }

    /// Serialize this directory placed at `offset`.
    fn layout(mut self, writer: &Writer, offset: u64, has_next: bool) -> Vec<u8> {
        let strip_type = if writer.is_bigtiff { LONG8 } else { LONG };
        let strip_count = self.strips.len();
        // Placeholders; only the counts matter for sizing
        self.entries.push((273, strip_type, vec![0; strip_count]));
        if self.byte_counts {
            let counts = self.strips.iter().map(|s| s.len() as u64).collect();
            self.entries.push((279, LONG, counts));
        }
        self.entries.sort_by_key(|(tag, _, _)| *tag);

        let inline = writer.offset_size();
        let ifd_size = writer.count_size() + self.entries.len() * writer.entry_size() + inline;
        let external_len: usize = self
            .entries
            .iter()
            .map(|(_, t, v)| value_size(*t, v.len()))
            .filter(|&size| size > inline)
            .sum();

        let strips_start = offset + (ifd_size + external_len) as u64;
        let mut strip_offsets = Vec::with_capacity(strip_count);
        let mut cursor = strips_start;
        for strip in &self.strips {
            strip_offsets.push(cursor);
            cursor += strip.len() as u64;
        }
        if let Some(entry) = self.entries.iter_mut().find(|(tag, _, _)| *tag == 273) {
            entry.2 = strip_offsets;
        }
        let strips_len = (cursor - strips_start) as usize;
        let end = offset as usize + ifd_size + external_len + strips_len;
        let padded_end = end + end % 2;

        let mut ifd = Vec::new();
        let mut external = Vec::new();
        writer.put(&mut ifd, self.entries.len() as u64, writer.count_size());
        for (tag, field_type, values) in &self.entries {
            let mut bytes = Vec::new();
            for &value in values {
                writer.put(&mut bytes, value, value_size(*field_type, 1));
            }
            writer.put(&mut ifd, *tag as u64, 2);
            writer.put(&mut ifd, *field_type as u64, 2);
            writer.put(&mut ifd, values.len() as u64, inline);
            if bytes.len() <= inline {
                bytes.resize(inline, 0);
                ifd.extend(bytes);
            } else {
                let at = offset + (ifd_size + external.len()) as u64;
                writer.put(&mut ifd, at, inline);
                external.extend(bytes);
            }
        }
        let next = if has_next { padded_end as u64 } else { 0 };
        writer.put(&mut ifd, next, inline);

        ifd.extend(external);
        for strip in self.strips {
            ifd.extend(strip);
        }
        ifd.resize(padded_end - offset as usize, 0);
        ifd
    }
}

/// Split row-major data into strips of `rows_per_strip` rows.
pub fn split_strips(data: &[u8], row_len: usize, rows_per_strip: u32) -> Vec<Vec<u8>> {
    data.chunks(row_len * rows_per_strip as usize)
        .map(<[u8]>::to_vec)
        .collect()
}

fn value_size(field_type: u16, count: usize) -> usize {
    let width = match field_type {
        SHORT => 2,
        LONG => 4,
        LONG8 => 8,
        _ => 1,
    };
    width * count
}

struct Writer {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
}

impl Writer {
    fn offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    fn count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    fn entry_size(&self) -> usize {
        if self.is_bigtiff {
            20
        } else {
            12
        }
    }

    /// Append the low `width` bytes of `value`.
    fn put(&self, data: &mut Vec<u8>, value: u64, width: usize) {
        match self.byte_order {
            ByteOrderType::LittleEndian => data.extend(&value.to_le_bytes()[..width]),
            ByteOrderType::BigEndian => data.extend(&value.to_be_bytes()[8 - width..]),
        }
    }
}

/// Deterministic non-uniform pixel values.
pub fn gradient(width: u32, height: u32) -> Vec<u8> {
    (0..width * height).map(|i| (i * 7 % 256) as u8).collect()
}
