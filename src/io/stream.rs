use std::fmt;
use std::io::SeekFrom;

use bytes::Bytes;
use tracing::trace;

use crate::error::IoError;

/// Random-access stream consumed by the TIFF container layer.
///
/// This mirrors the client procedures a TIFF library needs from its data
/// source: cursor-based read/write/seek plus size and direct mapping.
/// Every call mutates the cursor, so a stream must never be shared between
/// concurrent decodes.
pub trait TiffStream {
    /// Read up to `buf.len()` bytes from the cursor and advance it.
    ///
    /// Returns the number of bytes copied; 0 at end of data.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write `buf` at the cursor and advance it.
    fn write(&mut self, buf: &[u8]) -> Result<usize, IoError>;

    /// Move the cursor, returning the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, IoError>;

    /// Current size of the underlying data in bytes.
    fn size(&self) -> u64;

    /// Expose the whole buffer for zero-copy access, if possible.
    fn map(&self) -> Option<&[u8]>;

    /// Release a mapping obtained from [`TiffStream::map`].
    fn unmap(&self) {}

    /// Name used in diagnostics.
    fn identifier(&self) -> &str;

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// A range that runs past the end of the data is an error rather than
    /// a short read.
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let size = self.size();
        let out_of_bounds = || IoError::RangeOutOfBounds {
            offset,
            requested: len as u64,
            size,
        };

        match offset.checked_add(len as u64) {
            Some(end) if end <= size => {}
            _ => return Err(out_of_bounds()),
        }

        self.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        if self.read(&mut buf) < len {
            return Err(out_of_bounds());
        }
        Ok(Bytes::from(buf))
    }
}

// =============================================================================
// MemoryStream
// =============================================================================

/// Access mode a [`MemoryStream`] was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only; writes fail and seeking past the end is rejected
    Read,
    /// Reads and writes; writes past the end go through the grow callback
    Write,
}

/// Callback used to enlarge a writable buffer.
///
/// Receives the buffer and the length it must reach. Returns `false` to
/// refuse the growth, which fails the pending write.
pub type GrowFn<'a> = Box<dyn FnMut(&mut Vec<u8>, usize) -> bool + 'a>;

/// Grow callback that zero-extends the buffer to the requested length.
pub fn grow_by_resize() -> GrowFn<'static> {
    Box::new(|buffer: &mut Vec<u8>, len: usize| {
        buffer.resize(len, 0);
        true
    })
}

enum Backing<'a> {
    Shared(&'a [u8]),
    Exclusive(&'a mut Vec<u8>),
}

impl Backing<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Shared(data) => data,
            Backing::Exclusive(data) => data.as_slice(),
        }
    }
}

/// Stream over a caller-owned byte buffer.
///
/// The stream borrows the buffer for its whole lifetime and never frees it.
/// Dropping (or [`close`](MemoryStream::close)-ing) the stream releases only
/// the cursor bookkeeping.
pub struct MemoryStream<'a> {
    data: Backing<'a>,
    position: u64,
    mode: OpenMode,
    grow: Option<GrowFn<'a>>,
    identifier: String,
}

/// Identifier used when the caller does not name the stream.
pub const DEFAULT_STREAM_IDENTIFIER: &str = "memory";

impl<'a> MemoryStream<'a> {
    /// Open a read-only stream over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data: Backing::Shared(data),
            position: 0,
            mode: OpenMode::Read,
            grow: None,
            identifier: DEFAULT_STREAM_IDENTIFIER.to_string(),
        }
    }

    /// Open a stream over a mutable buffer.
    ///
    /// With [`OpenMode::Write`], writes past the end of `buffer` call `grow`.
    /// Without a callback such writes fail.
    pub fn open(buffer: &'a mut Vec<u8>, mode: OpenMode, grow: Option<GrowFn<'a>>) -> Self {
        Self {
            data: Backing::Exclusive(buffer),
            position: 0,
            mode,
            grow,
            identifier: DEFAULT_STREAM_IDENTIFIER.to_string(),
        }
    }

    /// Set the name reported in diagnostics.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Mode the stream was opened with.
    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Release the stream. The underlying buffer stays with the caller.
    pub fn close(self) {
        trace!(stream = %self.identifier, "closing memory stream");
    }

    fn grow_failed(&self, requested: u64, reason: &'static str) -> IoError {
        IoError::GrowFailed {
            identifier: self.identifier.clone(),
            requested,
            reason,
        }
    }
}

impl fmt::Debug for MemoryStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStream")
            .field("identifier", &self.identifier)
            .field("size", &self.data.as_slice().len())
            .field("position", &self.position)
            .field("mode", &self.mode)
            .field("growable", &self.grow.is_some())
            .finish()
    }
}

impl TiffStream for MemoryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let data = self.data.as_slice();
        let size = data.len() as u64;
        if self.position >= size {
            return 0;
        }

        // position < size, so it fits in usize
        let start = self.position as usize;
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        self.position += count as u64;

        trace!(stream = %self.identifier, count, position = self.position, "read");
        count
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, IoError> {
        if self.mode == OpenMode::Read {
            return Err(IoError::ReadOnly(self.identifier.clone()));
        }

        let start = usize::try_from(self.position)
            .map_err(|_| self.grow_failed(self.position, "position exceeds address space"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| self.grow_failed(u64::MAX, "write length overflows"))?;

        let data = match &mut self.data {
            Backing::Exclusive(data) => &mut **data,
            Backing::Shared(_) => return Err(IoError::ReadOnly(self.identifier.clone())),
        };

        if end > data.len() {
            let Some(grow) = self.grow.as_mut() else {
                return Err(IoError::GrowFailed {
                    identifier: self.identifier.clone(),
                    requested: end as u64,
                    reason: "no grow callback registered",
                });
            };
            if !grow(data, end) || data.len() < end {
                return Err(IoError::GrowFailed {
                    identifier: self.identifier.clone(),
                    requested: end as u64,
                    reason: "grow callback declined",
                });
            }
        }

        data[start..end].copy_from_slice(buf);
        self.position = end as u64;

        trace!(stream = %self.identifier, count = buf.len(), position = self.position, "write");
        Ok(buf.len())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, IoError> {
        let size = self.size();
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                if delta > 0 && self.mode == OpenMode::Read {
                    return Err(IoError::InvalidSeek {
                        identifier: self.identifier.clone(),
                        reason: "cannot seek past end of data in read mode",
                    });
                }
                size.checked_add_signed(delta)
            }
        };

        let target = target.ok_or_else(|| IoError::InvalidSeek {
            identifier: self.identifier.clone(),
            reason: "position out of range",
        })?;
        self.position = target;
        Ok(target)
    }

    fn size(&self) -> u64 {
        self.data.as_slice().len() as u64
    }

    fn map(&self) -> Option<&[u8]> {
        Some(self.data.as_slice())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// TIFF files are either little-endian or big-endian, as declared by the
// header. All helpers panic if the slice is shorter than the value.

#[inline]
fn head<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

/// Read a little-endian u16 from the start of a byte slice.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes(head(bytes))
}

/// Read a big-endian u16 from the start of a byte slice.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes(head(bytes))
}

/// Read a little-endian u32 from the start of a byte slice.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(head(bytes))
}

/// Read a big-endian u32 from the start of a byte slice.
#[inline]
pub fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes(head(bytes))
}

/// Read a little-endian u64 from the start of a byte slice.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes(head(bytes))
}

/// Read a big-endian u64 from the start of a byte slice.
#[inline]
pub fn read_u64_be(bytes: &[u8]) -> u64 {
    u64::from_be_bytes(head(bytes))
}
