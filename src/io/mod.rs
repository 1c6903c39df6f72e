mod stream;

pub use stream::{
    grow_by_resize, read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le,
    GrowFn, MemoryStream, OpenMode, TiffStream, DEFAULT_STREAM_IDENTIFIER,
};
