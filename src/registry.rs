//! Codec registry: look up a codec implementation by DICOM Transfer Syntax
//! UID (or stable name) and encode/decode through a single trait object.
//!
//! Registration happens once, lazily, behind a process-wide [`OnceLock`].
//! Lookups take a read lock only; re-registration (tests, custom codecs)
//! takes a write lock and replaces whatever was there before.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::CodecError;
use crate::jpeg1::quantization::{
    get_scaled_quant_table, STD_CHROMINANCE_QUANT_TABLE, STD_LUMINANCE_QUANT_TABLE,
};
use crate::jpeg1::{Jpeg1Decoder, Jpeg1Encoder};
use crate::jpeg2000::{J2kDecoder, J2kEncoder};
use crate::jpeg_stream_reader::JpegStreamReader;
use crate::jpegls::{JpeglsDecoder, JpeglsEncoder};
use crate::FrameInfo;

/// Progression order for a JPEG 2000 packet stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionOrder {
    Lrcp,
    Rlcp,
    Rpcl,
    Pcrl,
    Cprl,
}

/// Per-family encode options. `Codec::encode` validates that the variant it
/// receives matches its own family and rejects anything else as an
/// `InvalidParameter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CodecOptions {
    JpegBaseline {
        quality: u8,
    },
    JpegExtended {
        quality: u8,
        bit_depth: u8,
    },
    JpegLossless {
        /// 0 = auto, 1..=7 pin a specific predictor.
        predictor: u8,
    },
    JpegLs {
        /// 0 = lossless.
        near_lossless: i32,
    },
    J2kLossless {
        num_levels: u8,
        allow_mct: bool,
        num_layers: u32,
        progression_order: ProgressionOrder,
        target_ratio: f32,
        use_pcrd_opt: bool,
        append_lossless_layer: bool,
    },
    J2kLossy {
        quality: u8,
        num_levels: u8,
        allow_mct: bool,
        num_layers: u32,
        progression_order: ProgressionOrder,
        target_ratio: f32,
    },
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions::JpegBaseline { quality: 85 }
    }
}

/// Result of a successful decode: raw samples plus the geometry needed to
/// interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub frame_info: FrameInfo,
}

/// The capability set every codec family exposes to the registry.
pub trait Codec: Send + Sync {
    fn encode(
        &self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        options: Option<&CodecOptions>,
    ) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// DICOM Transfer Syntax UID this codec implements.
    fn uid(&self) -> &'static str;

    /// Stable human-readable name, also usable as a registry lookup key.
    fn name(&self) -> &'static str;
}

fn validate_frame(
    frame_info: &FrameInfo,
    allowed_bits: &[i32],
    pixels_len: usize,
) -> Result<(), CodecError> {
    if frame_info.width == 0 || frame_info.height == 0 {
        return Err(CodecError::InvalidParameter(
            "width and height must be non-zero".to_string(),
        ));
    }
    if frame_info.component_count != 1 && frame_info.component_count != 3 {
        return Err(CodecError::InvalidParameter(format!(
            "component count {} not in {{1, 3}}",
            frame_info.component_count
        )));
    }
    if !allowed_bits.contains(&frame_info.bits_per_sample) {
        return Err(CodecError::InvalidParameter(format!(
            "bit depth {} not supported by this codec",
            frame_info.bits_per_sample
        )));
    }
    let expected = pixel_buffer_len(frame_info);
    if pixels_len < expected {
        return Err(CodecError::InvalidParameter(format!(
            "pixel buffer of {pixels_len} bytes too small for {}x{}x{} at {} bits (need {expected})",
            frame_info.width, frame_info.height, frame_info.component_count, frame_info.bits_per_sample
        )));
    }
    Ok(())
}

fn bytes_per_sample(bits_per_sample: i32) -> usize {
    if bits_per_sample <= 8 {
        1
    } else {
        2
    }
}

fn pixel_buffer_len(frame_info: &FrameInfo) -> usize {
    frame_info.width as usize
        * frame_info.height as usize
        * frame_info.component_count as usize
        * bytes_per_sample(frame_info.bits_per_sample)
}

fn validate_quality(quality: u8) -> Result<(), CodecError> {
    if !(1..=100).contains(&quality) {
        return Err(CodecError::InvalidQuality(format!(
            "quality {quality} out of range 1..=100"
        )));
    }
    Ok(())
}

/// JPEG Baseline (SOF0), 8-bit. DICOM `1.2.840.10008.1.2.4.50`.
pub struct JpegBaselineCodec;

impl Codec for JpegBaselineCodec {
    fn encode(
        &self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        options: Option<&CodecOptions>,
    ) -> Result<Vec<u8>, CodecError> {
        let quality = match options {
            None => 85,
            Some(CodecOptions::JpegBaseline { quality }) => *quality,
            Some(_) => {
                return Err(CodecError::InvalidParameter(
                    "expected JpegBaseline options".to_string(),
                ))
            }
        };
        validate_quality(quality)?;
        validate_frame(frame_info, &[8], pixels.len())?;

        let mut encoder = Jpeg1Encoder::new();
        encoder.quantization_table_lum =
            get_scaled_quant_table(&STD_LUMINANCE_QUANT_TABLE, quality as u32);
        encoder.quantization_table_chrom =
            get_scaled_quant_table(&STD_CHROMINANCE_QUANT_TABLE, quality as u32);

        let mut destination = vec![0u8; pixel_buffer_len(frame_info) * 2 + 4096];
        let len = encoder
            .encode(pixels, frame_info, &mut destination)
            .map_err(CodecError::from)?;
        destination.truncate(len);
        Ok(destination)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let mut decoder = Jpeg1Decoder::new(bytes);
        decoder.read_header().map_err(CodecError::from)?;
        let frame_info = decoder.frame_info();
        let mut pixels = vec![0u8; pixel_buffer_len(&frame_info)];
        decoder.decode(&mut pixels).map_err(CodecError::from)?;
        Ok(DecodedImage { pixels, frame_info })
    }

    fn uid(&self) -> &'static str {
        "1.2.840.10008.1.2.4.50"
    }

    fn name(&self) -> &'static str {
        "JPEG Baseline"
    }
}

/// JPEG Extended (SOF1), 12-bit. DICOM `1.2.840.10008.1.2.4.51`.
///
/// The underlying DCT pipeline only ever codes 8-bit samples, so 12-bit
/// input is scaled down (`>> 4`) before encoding and scaled back up (`<< 4`)
/// after decoding; this is a lossy approximation of true 12-bit precision,
/// not a bit-exact extended-process implementation. The SOF0 marker the
/// shared encoder writes is patched to SOF1 after the fact so the bitstream
/// correctly declares itself extended rather than baseline.
pub struct JpegExtendedCodec;

impl JpegExtendedCodec {
    fn rewrite_sof_marker(buffer: &mut [u8]) {
        let mut i = 0;
        while i + 1 < buffer.len() {
            if buffer[i] == 0xFF && buffer[i + 1] == 0xC0 {
                buffer[i + 1] = 0xC1;
                return;
            }
            i += 1;
        }
    }
}

impl Codec for JpegExtendedCodec {
    fn encode(
        &self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        options: Option<&CodecOptions>,
    ) -> Result<Vec<u8>, CodecError> {
        let (quality, bit_depth) = match options {
            None => (85, 12),
            Some(CodecOptions::JpegExtended { quality, bit_depth }) => (*quality, *bit_depth),
            Some(_) => {
                return Err(CodecError::InvalidParameter(
                    "expected JpegExtended options".to_string(),
                ))
            }
        };
        validate_quality(quality)?;
        if bit_depth != 8 && bit_depth != 12 {
            return Err(CodecError::InvalidParameter(format!(
                "bit depth {bit_depth} not in {{8, 12}}"
            )));
        }
        validate_frame(frame_info, &[bit_depth as i32], pixels.len())?;

        let pixel_count =
            (frame_info.width * frame_info.height) as usize * frame_info.component_count as usize;
        let source_8bit: Vec<u8> = if bit_depth == 8 {
            pixels[..pixel_count].to_vec()
        } else {
            let (head, body, tail) = unsafe { pixels.align_to::<u16>() };
            if !head.is_empty() || !tail.is_empty() || body.len() < pixel_count {
                return Err(CodecError::invalid_data("misaligned 12-bit sample buffer"));
            }
            body[..pixel_count].iter().map(|&s| (s >> 4) as u8).collect()
        };
        let scaled_frame_info = FrameInfo {
            bits_per_sample: 8,
            ..*frame_info
        };

        let mut encoder = Jpeg1Encoder::new();
        encoder.quantization_table_lum =
            get_scaled_quant_table(&STD_LUMINANCE_QUANT_TABLE, quality as u32);
        encoder.quantization_table_chrom =
            get_scaled_quant_table(&STD_CHROMINANCE_QUANT_TABLE, quality as u32);

        let mut destination = vec![0u8; pixel_count * 2 + 4096];
        let len = encoder
            .encode(&source_8bit, &scaled_frame_info, &mut destination)
            .map_err(CodecError::from)?;
        destination.truncate(len);
        Self::rewrite_sof_marker(&mut destination);
        Ok(destination)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let mut decoder = Jpeg1Decoder::new(bytes);
        decoder.read_header().map_err(CodecError::from)?;
        let frame_info = decoder.frame_info();
        let mut pixels = vec![0u8; pixel_buffer_len(&frame_info)];
        decoder.decode(&mut pixels).map_err(CodecError::from)?;
        Ok(DecodedImage { pixels, frame_info })
    }

    fn uid(&self) -> &'static str {
        "1.2.840.10008.1.2.4.51"
    }

    fn name(&self) -> &'static str {
        "JPEG Extended"
    }
}

/// JPEG Lossless (SOF3), any predictor. DICOM `1.2.840.10008.1.2.4.57`, or
/// (pinned to predictor 1) `1.2.840.10008.1.2.4.70`.
pub struct JpegLosslessCodec {
    uid: &'static str,
    name: &'static str,
    /// `Some(p)` pins the predictor regardless of caller options (SV1).
    pinned_predictor: Option<u8>,
}

impl JpegLosslessCodec {
    pub fn any_predictor() -> Self {
        Self {
            uid: "1.2.840.10008.1.2.4.57",
            name: "JPEG Lossless",
            pinned_predictor: None,
        }
    }

    pub fn sv1() -> Self {
        Self {
            uid: "1.2.840.10008.1.2.4.70",
            name: "JPEG Lossless SV1",
            pinned_predictor: Some(1),
        }
    }
}

impl Codec for JpegLosslessCodec {
    fn encode(
        &self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        options: Option<&CodecOptions>,
    ) -> Result<Vec<u8>, CodecError> {
        let requested = match options {
            None => 0,
            Some(CodecOptions::JpegLossless { predictor }) => *predictor,
            Some(_) => {
                return Err(CodecError::InvalidParameter(
                    "expected JpegLossless options".to_string(),
                ))
            }
        };
        if requested > 7 {
            return Err(CodecError::InvalidParameter(format!(
                "predictor {requested} out of range 0..=7"
            )));
        }
        validate_frame(frame_info, &(2..=16).collect::<Vec<_>>(), pixels.len())?;

        let predictor = match self.pinned_predictor {
            Some(p) => p,
            // 0 = auto: predictor 7 (average of left/above/upper-left) is a
            // reasonable general-purpose default absent per-image tuning.
            None if requested == 0 => 7,
            None => requested,
        };

        let mut encoder = Jpeg1Encoder::new();
        let mut destination = vec![0u8; pixel_buffer_len(frame_info) * 2 + 4096];
        let len = encoder
            .encode_lossless(pixels, frame_info, predictor, &mut destination)
            .map_err(CodecError::from)?;
        destination.truncate(len);
        Ok(destination)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let mut decoder = Jpeg1Decoder::new(bytes);
        decoder.read_header().map_err(CodecError::from)?;
        let frame_info = decoder.frame_info();
        let mut pixels = vec![0u8; pixel_buffer_len(&frame_info)];
        decoder.decode(&mut pixels).map_err(CodecError::from)?;
        Ok(DecodedImage { pixels, frame_info })
    }

    fn uid(&self) -> &'static str {
        self.uid
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// JPEG-LS. DICOM `1.2.840.10008.1.2.4.80` (lossless) or
/// `1.2.840.10008.1.2.4.81` (near-lossless).
pub struct JpeglsCodec {
    uid: &'static str,
    name: &'static str,
    /// `Some(n)` pins near_lossless regardless of caller options (lossless).
    pinned_near_lossless: Option<i32>,
}

impl JpeglsCodec {
    pub fn lossless() -> Self {
        Self {
            uid: "1.2.840.10008.1.2.4.80",
            name: "JPEG-LS Lossless",
            pinned_near_lossless: Some(0),
        }
    }

    pub fn near_lossless() -> Self {
        Self {
            uid: "1.2.840.10008.1.2.4.81",
            name: "JPEG-LS Near-Lossless",
            pinned_near_lossless: None,
        }
    }
}

impl Codec for JpeglsCodec {
    fn encode(
        &self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        options: Option<&CodecOptions>,
    ) -> Result<Vec<u8>, CodecError> {
        let requested = match options {
            None => 0,
            Some(CodecOptions::JpegLs { near_lossless }) => *near_lossless,
            Some(_) => {
                return Err(CodecError::InvalidParameter(
                    "expected JpegLs options".to_string(),
                ))
            }
        };
        if requested < 0 {
            return Err(CodecError::InvalidParameter(
                "near_lossless must be >= 0".to_string(),
            ));
        }
        validate_frame(frame_info, &(2..=16).collect::<Vec<_>>(), pixels.len())?;

        let near_lossless = self.pinned_near_lossless.unwrap_or(requested);

        let mut destination = vec![0u8; pixel_buffer_len(frame_info) * 2 + 4096];
        let mut encoder = JpeglsEncoder::new(&mut destination);
        encoder.set_frame_info(*frame_info).map_err(CodecError::from)?;
        encoder
            .set_near_lossless(near_lossless)
            .map_err(CodecError::from)?;
        let len = encoder.encode(pixels).map_err(CodecError::from)?;
        destination.truncate(len);
        Ok(destination)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let mut decoder = JpeglsDecoder::new(bytes);
        decoder.read_header().map_err(CodecError::from)?;
        let frame_info = decoder.frame_info();
        let mut pixels = vec![0u8; pixel_buffer_len(&frame_info)];
        decoder.decode(&mut pixels).map_err(CodecError::from)?;
        Ok(DecodedImage { pixels, frame_info })
    }

    fn uid(&self) -> &'static str {
        self.uid
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// JPEG 2000. DICOM `1.2.840.10008.1.2.4.90` (lossless, reversible 5/3) or
/// `1.2.840.10008.1.2.4.91` (lossy, irreversible 9/7).
///
/// `J2kEncoder` is deliberately scoped to one tile and one quality layer
/// (see `jpeg2000::encoder` docs); `num_layers`, `progression_order`,
/// `target_ratio`, `use_pcrd_opt` and `append_lossless_layer` are accepted
/// here for contract fidelity but are not wired to distinct behaviour below
/// that scope.
pub struct J2kCodec {
    uid: &'static str,
    name: &'static str,
    lossless: bool,
}

impl J2kCodec {
    pub fn lossless() -> Self {
        Self {
            uid: "1.2.840.10008.1.2.4.90",
            name: "JPEG 2000 Lossless",
            lossless: true,
        }
    }

    pub fn lossy() -> Self {
        Self {
            uid: "1.2.840.10008.1.2.4.91",
            name: "JPEG 2000",
            lossless: false,
        }
    }
}

impl Codec for J2kCodec {
    fn encode(
        &self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        options: Option<&CodecOptions>,
    ) -> Result<Vec<u8>, CodecError> {
        let (quality, num_levels) = if self.lossless {
            match options {
                None => (100, 5),
                Some(CodecOptions::J2kLossless { num_levels, .. }) => (100, *num_levels),
                Some(_) => {
                    return Err(CodecError::InvalidParameter(
                        "expected J2kLossless options".to_string(),
                    ))
                }
            }
        } else {
            match options {
                None => (85, 5),
                Some(CodecOptions::J2kLossy {
                    quality,
                    num_levels,
                    ..
                }) => (*quality, *num_levels),
                Some(_) => {
                    return Err(CodecError::InvalidParameter(
                        "expected J2kLossy options".to_string(),
                    ))
                }
            }
        };
        if !self.lossless {
            validate_quality(quality)?;
        }
        if num_levels > 32 {
            return Err(CodecError::InvalidParameter(format!(
                "decomposition levels {num_levels} exceed 32"
            )));
        }
        validate_frame(frame_info, &(2..=16).collect::<Vec<_>>(), pixels.len())?;

        let mut encoder = J2kEncoder::new();
        encoder.set_decomposition_levels(num_levels);
        encoder.set_irreversible(!self.lossless);
        if !self.lossless {
            encoder.set_quality(quality);
        }

        let mut destination = vec![0u8; pixel_buffer_len(frame_info) * 2 + 8192];
        let len = encoder
            .encode(pixels, frame_info, &mut destination)
            .map_err(CodecError::from)?;
        destination.truncate(len);
        Ok(destination)
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let mut reader = JpegStreamReader::new(bytes);
        let mut decoder = J2kDecoder::new(&mut reader);
        let pixels = decoder.decode().map_err(CodecError::from)?;
        let frame_info = decoder.frame_info();
        Ok(DecodedImage { pixels, frame_info })
    }

    fn uid(&self) -> &'static str {
        self.uid
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Looks codecs up by DICOM Transfer Syntax UID or stable name. Safe for
/// concurrent lookups from many readers; registration takes a write lock.
pub struct Registry {
    by_key: RwLock<HashMap<String, Arc<dyn Codec>>>,
}

impl Registry {
    /// An empty registry with nothing registered.
    pub fn new() -> Self {
        Self {
            by_key: RwLock::new(HashMap::new()),
        }
    }

    /// Registers (or replaces) a codec under both its UID and its name.
    pub fn register(&self, codec: Arc<dyn Codec>) {
        let mut map = self.by_key.write().expect("registry lock poisoned");
        map.insert(codec.uid().to_string(), codec.clone());
        map.insert(codec.name().to_string(), codec);
    }

    /// Looks up a codec by UID or name. Logs a warning on miss, since a miss
    /// here is almost always a typo'd UID on the caller's side.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Codec>> {
        let map = self.by_key.read().expect("registry lock poisoned");
        match map.get(key) {
            Some(codec) => Some(codec.clone()),
            None => {
                log::warn!("codec lookup miss for {key:?}");
                None
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn register_builtins(registry: &Registry) {
    registry.register(Arc::new(JpegBaselineCodec));
    registry.register(Arc::new(JpegExtendedCodec));
    registry.register(Arc::new(JpegLosslessCodec::any_predictor()));
    registry.register(Arc::new(JpegLosslessCodec::sv1()));
    registry.register(Arc::new(JpeglsCodec::lossless()));
    registry.register(Arc::new(JpeglsCodec::near_lossless()));
    registry.register(Arc::new(J2kCodec::lossless()));
    registry.register(Arc::new(J2kCodec::lossy()));
}

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, populated with every built-in codec on first
/// use.
pub fn global_registry() -> &'static Registry {
    GLOBAL_REGISTRY.get_or_init(|| {
        let registry = Registry::new();
        register_builtins(&registry);
        registry
    })
}

/// A fresh registry, populated with the same built-in codecs as
/// `global_registry()` but independently owned, for tests that don't want
/// to share (or risk mutating) process-global state.
pub fn new_registry() -> Registry {
    let registry = Registry::new();
    register_builtins(&registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grayscale_frame(width: u32, height: u32, bits: i32) -> FrameInfo {
        FrameInfo {
            width,
            height,
            bits_per_sample: bits,
            component_count: 1,
        }
    }

    #[test]
    fn lookup_by_uid_and_name() {
        let registry = new_registry();
        let by_uid = registry.get("1.2.840.10008.1.2.4.50").unwrap();
        let by_name = registry.get("JPEG Baseline").unwrap();
        assert_eq!(by_uid.uid(), by_name.uid());
    }

    #[test]
    fn unknown_uid_is_none() {
        let registry = new_registry();
        assert!(registry.get("1.2.840.10008.1.2.4.999").is_none());
    }

    #[test]
    fn jpeg_baseline_roundtrip_via_registry() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.50").unwrap();
        let frame_info = grayscale_frame(16, 16, 8);
        let source: Vec<u8> = (0..256).map(|i| (i % 256) as u8).collect();

        let encoded = codec.encode(&source, &frame_info, None).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.frame_info, frame_info);
        assert_eq!(decoded.pixels.len(), source.len());
    }

    #[test]
    fn jpeg_lossless_roundtrip_is_bit_exact() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.57").unwrap();
        let frame_info = grayscale_frame(12, 10, 8);
        let source: Vec<u8> = (0..120).map(|i| ((i * 37) % 256) as u8).collect();

        let options = CodecOptions::JpegLossless { predictor: 4 };
        let encoded = codec.encode(&source, &frame_info, Some(&options)).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.pixels, source);
    }

    #[test]
    fn jpeg_lossless_sv1_pins_predictor_one() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.70").unwrap();
        let frame_info = grayscale_frame(8, 8, 8);
        let source: Vec<u8> = (0..64).map(|i| (i * 3) as u8).collect();

        // Even requesting a different predictor, SV1 must pin to 1.
        let options = CodecOptions::JpegLossless { predictor: 6 };
        let encoded = codec.encode(&source, &frame_info, Some(&options)).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.pixels, source);
    }

    #[test]
    fn jpeg_lossless_16bit_roundtrip_uses_extended_table() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.57").unwrap();
        let frame_info = grayscale_frame(8, 4, 16);

        // Checkerboard of 0/65535 forces a category-16 residual on every
        // interior sample, which only the extended DC table can encode.
        let (width, height) = (8usize, 4usize);
        let mut samples = vec![0u16; width * height];
        for y in 0..height {
            for x in 0..width {
                samples[y * width + x] = if (x + y) % 2 == 0 { 0 } else { 65535 };
            }
        }
        let source: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();

        let options = CodecOptions::JpegLossless { predictor: 7 };
        let encoded = codec.encode(&source, &frame_info, Some(&options)).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.pixels, source);
    }

    #[test]
    fn invalid_quality_is_rejected() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.50").unwrap();
        let frame_info = grayscale_frame(8, 8, 8);
        let source = vec![0u8; 64];
        let options = CodecOptions::JpegBaseline { quality: 0 };
        let result = codec.encode(&source, &frame_info, Some(&options));
        assert!(matches!(result, Err(CodecError::InvalidQuality(_))));
    }

    #[test]
    fn mismatched_component_count_is_rejected() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.50").unwrap();
        let frame_info = FrameInfo {
            width: 4,
            height: 4,
            bits_per_sample: 8,
            component_count: 2,
        };
        let source = vec![0u8; 32];
        let result = codec.encode(&source, &frame_info, None);
        assert!(matches!(result, Err(CodecError::InvalidParameter(_))));
    }

    #[test]
    fn jpegls_lossless_roundtrip_via_registry() {
        let registry = new_registry();
        let codec = registry.get("1.2.840.10008.1.2.4.80").unwrap();
        let frame_info = grayscale_frame(16, 16, 8);
        let source: Vec<u8> = (0..256).map(|i| ((i * 5) % 256) as u8).collect();

        let encoded = codec.encode(&source, &frame_info, None).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded.pixels, source);
    }
}
