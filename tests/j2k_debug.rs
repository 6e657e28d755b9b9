//! JPEG 2000 lossless decode validation against a known-raw reference.

use dicom_pixel_codecs::jpeg2000::decoder::J2kDecoder;
use dicom_pixel_codecs::jpeg_stream_reader::JpegStreamReader;

#[test]
fn test_j2k_lossless_decode() {
    let data = std::fs::read("tests/jpegls_test_images/gradient_64x64_gray_lossless.j2c")
        .expect("Failed to read test file");

    let mut reader = JpegStreamReader::new(&data);
    let mut decoder = J2kDecoder::new(&mut reader);
    let pixels = decoder.decode().expect("Failed to decode");
    let frame_info = decoder.frame_info();

    assert_eq!(frame_info.width, 64);
    assert_eq!(frame_info.height, 64);
    assert_eq!(frame_info.component_count, 1);

    let expected = std::fs::read("tests/jpegls_test_images/gradient_64x64_gray.raw")
        .expect("Failed to read raw file");
    assert_eq!(pixels, expected, "lossless JPEG 2000 decode must be bit-exact");
}
