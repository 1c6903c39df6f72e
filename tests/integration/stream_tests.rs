//! Memory stream integration tests.
//!
//! Files are written through a growable stream and decoded back from the
//! same buffer.

use std::io::SeekFrom;

use tiff_raster::{
    decode_image, grow_by_resize, read_image_info, Container, IoError, MemoryStream, OpenMode,
    TiffError, TiffFile, TiffStream,
};

use super::test_utils::{gradient, IfdBuilder, TiffBuilder};

#[test]
fn test_write_then_decode_from_grown_buffer() {
    let pixels = gradient(5, 3);
    let file_bytes = TiffBuilder::new()
        .add_ifd(IfdBuilder::gray8(5, 3, 1, &pixels))
        .build();

    let mut buffer = Vec::new();
    {
        let mut stream = MemoryStream::open(&mut buffer, OpenMode::Write, Some(grow_by_resize()))
            .with_identifier("written.tif");
        // Two writes, the second extending the buffer again
        let (head, tail) = file_bytes.split_at(8);
        assert_eq!(stream.write(head).unwrap(), 8);
        assert_eq!(stream.write(tail).unwrap(), tail.len());
        assert_eq!(stream.position(), file_bytes.len() as u64);
        stream.close();
    }
    assert_eq!(buffer, file_bytes);

    let mut file = TiffFile::open_bytes(&buffer, "written.tif").unwrap();
    let decoded = decode_image(&mut file, Some(0)).unwrap();
    assert!(decoded.outcome.is_complete());
    assert_eq!(decoded.pixels, pixels);
}

#[test]
fn test_decode_over_writable_stream() {
    let pixels = gradient(4, 4);
    let mut buffer = TiffBuilder::new()
        .add_ifd(IfdBuilder::gray8(4, 4, 3, &pixels))
        .build();

    let stream = MemoryStream::open(&mut buffer, OpenMode::Write, None).with_identifier("rw.tif");
    let mut file = TiffFile::open(stream).unwrap();
    assert_eq!(file.file_name(), "rw.tif");

    let decoded = decode_image(&mut file, None).unwrap();
    assert_eq!(decoded.pixels, pixels);

    let stream = file.into_stream();
    assert_eq!(stream.mode(), OpenMode::Write);
}

#[test]
fn test_write_without_grow_callback_fails() {
    let mut buffer = vec![0u8; 4];
    let mut stream = MemoryStream::open(&mut buffer, OpenMode::Write, None);

    assert_eq!(stream.write(&[1, 2, 3, 4]).unwrap(), 4);
    let err = stream.write(&[5]).unwrap_err();
    assert!(matches!(err, IoError::GrowFailed { requested: 5, .. }));
    drop(stream);
    assert_eq!(buffer, vec![1, 2, 3, 4]);
}

#[test]
fn test_declining_grow_callback() {
    let mut buffer = Vec::new();
    let mut stream = MemoryStream::open(
        &mut buffer,
        OpenMode::Write,
        Some(Box::new(|_data: &mut Vec<u8>, _len: usize| false)),
    );
    assert!(matches!(
        stream.write(b"II"),
        Err(IoError::GrowFailed { .. })
    ));
}

#[test]
fn test_read_only_stream_rejects_write() {
    let data = vec![0u8; 16];
    let mut stream = MemoryStream::new(&data).with_identifier("ro.tif");
    match stream.write(&[1]) {
        Err(IoError::ReadOnly(name)) => assert_eq!(name, "ro.tif"),
        other => panic!("expected read-only error, got {:?}", other),
    }

    let mut owned = vec![0u8; 16];
    let mut stream = MemoryStream::open(&mut owned, OpenMode::Read, Some(grow_by_resize()));
    assert!(matches!(stream.write(&[1]), Err(IoError::ReadOnly(_))));
}

#[test]
fn test_seek_past_end_in_read_mode() {
    let data = vec![0u8; 16];
    let mut stream = MemoryStream::new(&data);

    assert!(matches!(
        stream.seek(SeekFrom::End(1)),
        Err(IoError::InvalidSeek { .. })
    ));
    assert_eq!(stream.seek(SeekFrom::End(-4)).unwrap(), 12);

    // Reads at or past the end return nothing
    stream.seek(SeekFrom::Start(40)).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(stream.read(&mut buf), 0);
}

#[test]
fn test_seek_past_end_then_write_grows() {
    let mut buffer = vec![1u8; 4];
    let mut stream = MemoryStream::open(&mut buffer, OpenMode::Write, Some(grow_by_resize()));
    assert_eq!(stream.seek(SeekFrom::End(2)).unwrap(), 6);
    stream.write(&[9]).unwrap();
    assert_eq!(stream.size(), 7);
    drop(stream);
    assert_eq!(buffer, vec![1, 1, 1, 1, 0, 0, 9]);
}

#[test]
fn test_truncated_header() {
    let data = b"II*\0".to_vec();
    match TiffFile::open_bytes(&data, "short.tif") {
        Err(TiffError::FileTooSmall { .. }) => {}
        Err(other) => panic!("expected FileTooSmall, got {}", other),
        Ok(_) => panic!("expected an error"),
    };
}

#[test]
fn test_stream_name_flows_into_info_errors() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::gray8(1, 1, 1, &[0]))
        .build();
    let mut file = TiffFile::open_bytes(&data, "named.tif").unwrap();
    assert_eq!(file.file_name(), "named.tif");
    assert!(read_image_info(&mut file, Some(1)).is_err());
    file.close();
}
