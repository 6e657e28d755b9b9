/*!
# dicom-pixel-codecs

A pure Rust library of pixel codecs for DICOM image transfer syntaxes.

Each supported DICOM Transfer Syntax UID is backed by a codec that
implements encode/decode between raw sample planes and the
standard's compressed bitstream. A small registry keyed by UID
dispatches to the right codec so callers don't need to special-case
each family.

## Supported standards

### JPEG Baseline / Extended (ISO/IEC 10918-1)
- DCT-based lossy compression, Huffman coding.
- Modules: `jpeg1`

### JPEG Lossless, Non-Hierarchical (ISO/IEC 10918-1, process 14, SOF3)
- Seven spatial predictors, Huffman-coded residuals.
- Modules: `jpeg1::lossless`

### JPEG-LS (ISO/IEC 14495-1)
- Lossless and near-lossless compression via LOCO-I context modeling,
  8-16 bit depth, custom presets. Grayscale only; RGB sample-interleave
  is not supported (see `jpegls` module docs).
- Modules: `jpegls`

### JPEG 2000 (ISO/IEC 15444-1)
- DWT-based compression with EBCOT Tier-1/Tier-2 entropy coding and
  an MQ arithmetic coder.
- Modules: `jpeg2000`

## Entry points

[`registry::Registry`] is the façade: look codecs up by DICOM
Transfer Syntax UID and call [`registry::Codec::encode`] /
[`registry::Codec::decode`]. Codec families can also be driven
directly (`jpeg1::Jpeg1Encoder`, `jpegls::JpeglsEncoder`, ...) when a
caller already knows which one it needs.
*/

pub mod constants;
pub mod error;
pub mod jpeg_marker_code;
pub mod jpeg_stream_reader;
pub mod jpeg_stream_writer;

pub mod jpeg1;
pub mod jpeg2000;
pub mod jpegls;

pub mod registry;
pub mod sample_plane;

pub use error::{CodecError, JpeglsError};
pub use sample_plane::SamplePlane;

/// Basic information about an image frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// Width of the frame in pixels.
    pub width: u32,
    /// Height of the frame in pixels.
    pub height: u32,
    /// Bits per sample (2-16).
    pub bits_per_sample: i32,
    /// Number of components (e.g., 1 for grayscale, 3 for RGB).
    pub component_count: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::global_registry;

    #[test]
    fn registry_has_all_transfer_syntaxes() {
        let registry = global_registry();
        for uid in [
            "1.2.840.10008.1.2.4.50",
            "1.2.840.10008.1.2.4.51",
            "1.2.840.10008.1.2.4.57",
            "1.2.840.10008.1.2.4.70",
            "1.2.840.10008.1.2.4.80",
            "1.2.840.10008.1.2.4.81",
            "1.2.840.10008.1.2.4.90",
            "1.2.840.10008.1.2.4.91",
        ] {
            assert!(registry.get(uid).is_some(), "missing codec for {uid}");
        }
    }

    #[test]
    fn frame_info_default_is_zeroed() {
        let info = FrameInfo::default();
        assert_eq!(info.width, 0);
        assert_eq!(info.component_count, 0);
    }
}
