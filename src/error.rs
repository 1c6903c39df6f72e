use thiserror::Error;

/// I/O errors raised by the in-memory stream layer
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds the stream bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Write attempted on a stream opened for reading
    #[error("Stream {0} is read-only")]
    ReadOnly(String),

    /// Write needs a larger buffer but the stream cannot grow
    #[error("Cannot grow stream {identifier} to {requested} bytes: {reason}")]
    GrowFailed {
        identifier: String,
        requested: u64,
        reason: &'static str,
    },

    /// Seek target is not representable or not allowed in this mode
    #[error("Invalid seek on {identifier}: {reason}")]
    InvalidSeek {
        identifier: String,
        reason: &'static str,
    },
}

/// Errors that can occur when parsing TIFF files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// The header points at no image directory at all
    #[error("File contains no image directories")]
    NoDirectories,

    /// Requested directory does not exist
    #[error("Directory {index} out of range: file has {count} directories")]
    DirectoryOutOfRange { index: u32, count: usize },

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Scanline access on compressed data
    #[error("Unsupported compression: {0} (only uncompressed strips can be read by scanline)")]
    UnsupportedCompression(String),

    /// Scanline access on a tiled image
    #[error("Unsupported organization: cannot read scanlines from a tiled image")]
    TiledOrganization,

    /// Row or sample outside the image
    #[error("Scanline out of range: row {row}, sample {sample} (image has {height} rows, {samples} samples)")]
    ScanlineOutOfRange {
        row: u32,
        sample: u16,
        height: u32,
        samples: u16,
    },

    /// Caller buffer shorter than one scanline
    #[error("Scanline buffer too small: need {required} bytes, got {actual}")]
    ScanlineBufferTooSmall { required: usize, actual: usize },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors raised while reading image metadata, palettes or rasters
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Container-level failure
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// Requested sub-image could not be selected
    #[error("Cannot select image {index}: {source}")]
    ImageSelection {
        index: u32,
        #[source]
        source: TiffError,
    },

    /// Image layout the decoder cannot handle
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// Palette image without a ColorMap tag
    #[error("Missing required \"Colormap\" tag in {0}")]
    MissingColormap(String),

    /// Caller-provided raster buffer cannot hold the expanded image
    #[error("Output buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },
}

/// Errors raised while writing a decoded raster to an output format
#[derive(Debug, Clone, Error)]
pub enum OutputError {
    /// Raster layout has no matching output color type
    #[error("Cannot encode raster: {reason}")]
    UnsupportedLayout { reason: String },

    /// Encoding failed
    #[error("Encode error: {message}")]
    Encode { message: String },
}
