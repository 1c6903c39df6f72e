//! Image metadata integration tests.

use tiff_raster::{
    read_image_info, Container, DecodeError, Photometric, PlanarConfig, TiffError, TiffFile,
};

use super::test_utils::{gradient, ByteOrderType, IfdBuilder, TiffBuilder, BYTE, SHORT};

// =============================================================================
// Byte Order and BigTIFF
// =============================================================================

#[test]
fn test_info_identical_across_layouts() {
    let pixels = gradient(6, 4);
    let layouts = [
        (ByteOrderType::LittleEndian, false),
        (ByteOrderType::BigEndian, false),
        (ByteOrderType::LittleEndian, true),
        (ByteOrderType::BigEndian, true),
    ];

    let mut infos = Vec::new();
    for (order, bigtiff) in layouts {
        let data = TiffBuilder::new()
            .with_byte_order(order)
            .with_bigtiff(bigtiff)
            .add_ifd(IfdBuilder::gray8(6, 4, 2, &pixels))
            .build();
        let mut file = TiffFile::open_bytes(&data, "gray.tif").unwrap();
        assert_eq!(file.header().is_bigtiff, bigtiff);
        infos.push(read_image_info(&mut file, None).unwrap());
    }

    assert_eq!(infos[0].width, 6);
    assert_eq!(infos[0].height, 4);
    for info in &infos[1..] {
        assert_eq!(info, &infos[0]);
    }
}

// =============================================================================
// Defaults and Inference
// =============================================================================

#[test]
fn test_defaults_apply_when_tags_absent() {
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::new()
                .tag(256, SHORT, &[16])
                .tag(257, SHORT, &[2])
                .tag(262, SHORT, &[0])
                .strips(vec![vec![0; 4]]),
        )
        .build();
    let mut file = TiffFile::open_bytes(&data, "bilevel.tif").unwrap();
    let info = read_image_info(&mut file, None).unwrap();

    assert_eq!(info.bits_per_sample, 1);
    assert_eq!(info.samples_per_pixel, 1);
    assert_eq!(info.planar_config, PlanarConfig::Contiguous);
    assert_eq!(info.photometric, Photometric::MinIsWhite);
    // No defaulting for these
    assert_eq!(info.compression, 0);
    assert_eq!(info.subfile_type, 0);
}

#[test]
fn test_direct_tags_read() {
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::gray8(2, 2, 2, &[1, 2, 3, 4])
                .tag(254, SHORT, &[1])
                .tag(259, SHORT, &[1])
                .text(270, "reduced resolution"),
        )
        .build();
    let mut file = TiffFile::open_bytes(&data, "reduced.tif").unwrap();
    let info = read_image_info(&mut file, None).unwrap();

    assert_eq!(info.subfile_type, 1);
    assert_eq!(info.compression, 1);
    assert_eq!(info.description.as_deref(), Some("reduced resolution"));
}

#[test]
fn test_photometric_inferred_from_samples() {
    let gray = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::gray8(2, 1, 1, &[0, 1])
                .without(262)
                .tag(277, BYTE, &[1]),
        )
        .build();
    let mut file = TiffFile::open_bytes(&gray, "gray.tif").unwrap();
    assert_eq!(
        read_image_info(&mut file, None).unwrap().photometric,
        Photometric::MinIsBlack
    );

    let rgb = TiffBuilder::new()
        .add_ifd(IfdBuilder::rgb8(1, 1, &[1, 2, 3]).without(262))
        .build();
    let mut file = TiffFile::open_bytes(&rgb, "rgb.tif").unwrap();
    assert_eq!(
        read_image_info(&mut file, None).unwrap().photometric,
        Photometric::Rgb
    );
}

#[test]
fn test_two_samples_without_photometric_fails() {
    let data = TiffBuilder::new()
        .add_ifd(
            IfdBuilder::gray8(1, 1, 1, &[0, 0])
                .without(262)
                .tag(277, SHORT, &[2]),
        )
        .build();
    let mut file = TiffFile::open_bytes(&data, "gray-alpha.tif").unwrap();
    assert!(matches!(
        read_image_info(&mut file, None),
        Err(DecodeError::UnsupportedFormat { .. })
    ));
}

// =============================================================================
// Image Selection
// =============================================================================

fn three_images() -> Vec<u8> {
    TiffBuilder::new()
        .add_ifd(IfdBuilder::gray8(8, 8, 8, &gradient(8, 8)))
        .add_ifd(IfdBuilder::gray8(4, 4, 4, &gradient(4, 4)))
        .add_ifd(IfdBuilder::rgb8(2, 1, &[1, 2, 3, 4, 5, 6]))
        .build()
}

#[test]
fn test_select_each_image() {
    let data = three_images();
    let mut file = TiffFile::open_bytes(&data, "pages.tif").unwrap();
    assert_eq!(file.image_count(), 3);

    let third = read_image_info(&mut file, Some(2)).unwrap();
    assert_eq!(third.image_index, Some(2));
    assert_eq!(third.width, 2);
    assert_eq!(third.photometric, Photometric::Rgb);
    assert_eq!(third.num_images, 3);
    assert_eq!(file.current_image(), 2);

    let first = read_image_info(&mut file, Some(0)).unwrap();
    assert_eq!(first.width, 8);
}

#[test]
fn test_index_out_of_range_fails_selection() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::gray8(2, 1, 1, &[0, 1]))
        .build();
    let mut file = TiffFile::open_bytes(&data, "single.tif").unwrap();

    match read_image_info(&mut file, Some(5)) {
        Err(DecodeError::ImageSelection { index, source }) => {
            assert_eq!(index, 5);
            assert!(matches!(
                source,
                TiffError::DirectoryOutOfRange { index: 5, count: 1 }
            ));
        }
        other => panic!("expected selection error, got {:?}", other),
    }
}

#[test]
fn test_current_image_read_twice_is_identical() {
    let data = three_images();
    let mut file = TiffFile::open_bytes(&data, "pages.tif").unwrap();
    read_image_info(&mut file, Some(1)).unwrap();

    let first = read_image_info(&mut file, None).unwrap();
    let second = read_image_info(&mut file, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.image_index, None);
    assert_eq!(first.width, 4);
}

#[test]
fn test_info_json_shape() {
    let data = three_images();
    let mut file = TiffFile::open_bytes(&data, "pages.tif").unwrap();
    let info = read_image_info(&mut file, Some(2)).unwrap();

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["image_index"], 2);
    assert_eq!(json["photometric"], "rgb");
    assert_eq!(json["samples_per_pixel"], 3);
    assert_eq!(json["error"], false);
    assert!(json.get("description").is_none());
}
