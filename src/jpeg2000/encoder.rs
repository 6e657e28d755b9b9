//! JPEG 2000 Encoder.
//!
//! Ties together level shifting, the optional component transform (RCT/ICT),
//! the multi-level wavelet transform, scalar quantization, EBCOT Tier-1
//! bit-plane coding and Tier-2 packet assembly into a single-tile codestream.
//!
//! Scoped to one tile and one quality layer (see `packet` module docs); within
//! that scope every stage implements the real algorithm.

use super::bit_io::J2kBitWriter;
use super::bit_plane_coder::BitPlaneCoder;
use super::code_block::partition_subband;
use super::colour::{forward_ict, forward_rct};
use super::dwt::{forward_multilevel_53, forward_multilevel_97};
use super::image::{J2kCod, J2kQcd, J2kSubband, SubbandOrientation};
use super::packet::{CodeBlockInfo, PacketHeader, PrecinctState};
use super::quantization;
use super::writer::J2kWriter;
use crate::FrameInfo;
use crate::JpeglsError;

/// Guard bits added to the nominal dynamic range of every subband (Annex
/// E.1); fixed rather than signalled, matching the encoder's single QCD.
const GUARD_BITS: u8 = 2;

/// JPEG 2000 Encoder.
pub struct J2kEncoder {
    decomposition_levels: u8,
    use_irreversible: bool,
    quality: u8,
}

impl J2kEncoder {
    pub fn new() -> Self {
        Self {
            decomposition_levels: 5,
            use_irreversible: false,
            quality: 85,
        }
    }

    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(1, 100);
    }

    pub fn set_decomposition_levels(&mut self, levels: u8) {
        self.decomposition_levels = levels.min(32);
    }

    pub fn set_irreversible(&mut self, irreversible: bool) {
        self.use_irreversible = irreversible;
    }

    /// Encode raw (unsigned, interleaved) pixel data to a JPEG 2000 codestream.
    pub fn encode(
        &mut self,
        pixels: &[u8],
        frame_info: &FrameInfo,
        destination: &mut [u8],
    ) -> Result<usize, JpeglsError> {
        let width = frame_info.width;
        let height = frame_info.height;
        let components = frame_info.component_count as usize;
        let depth = frame_info.bits_per_sample as u8;

        let expected_size = width as usize * height as usize * components;
        if pixels.len() < expected_size {
            return Err(JpeglsError::InvalidData);
        }

        log::debug!(
            "encoding {width}x{height}, {components} components, depth={depth}, irreversible={}",
            self.use_irreversible
        );

        let mut writer = J2kWriter::new(destination);
        writer.write_soc()?;
        writer.write_siz(width, height, width, height, components as u16, depth, 1, 1)?;

        let transformation = if self.use_irreversible { 0 } else { 1 };
        let mct = if components >= 3 { 1 } else { 0 };
        let cod = J2kCod {
            coding_style: 0,
            progression_order: 0, // LRCP
            number_of_layers: 1,
            mct,
            decomposition_levels: self.decomposition_levels,
            codeblock_width_exp: 4, // 64x64 code-blocks
            codeblock_height_exp: 4,
            transformation,
            precinct_sizes: Vec::new(),
        };
        writer.write_cod(&cod)?;

        let levels = self.decomposition_levels;
        let cb_w = cod.codeblock_width();
        let cb_h = cod.codeblock_height();

        // Level-shift to a signed representation centred on zero.
        let level_shift = 1i32 << (depth - 1);
        let mut per_component: Vec<Vec<i32>> = (0..components)
            .map(|c| {
                (0..(width * height) as usize)
                    .map(|i| pixels[i * components + c] as i32 - level_shift)
                    .collect()
            })
            .collect();

        if mct == 1 {
            if cod.is_reversible() {
                let (y, cb, cr) =
                    forward_rct(&per_component[0], &per_component[1], &per_component[2]);
                per_component[0] = y;
                per_component[1] = cb;
                per_component[2] = cr;
            } else {
                let (y, cb, cr) =
                    forward_ict(&per_component[0], &per_component[1], &per_component[2]);
                per_component[0] = y.iter().map(|v| v.round() as i32).collect();
                per_component[1] = cb.iter().map(|v| v.round() as i32).collect();
                per_component[2] = cr.iter().map(|v| v.round() as i32).collect();
            }
        }

        // Per-subband step sizes, in QCD order: LL, then (HL, LH, HH) from
        // the coarsest resolution up to the finest.
        let num_subbands = 1 + 3 * levels as usize;
        let mut step_sizes = Vec::with_capacity(num_subbands);
        let orientations = Self::subband_orientations(levels);
        for orientation in &orientations {
            let range_bits = depth + GUARD_BITS + orientation.gain_bits();
            let delta = if cod.is_reversible() {
                1.0
            } else {
                Self::quality_step(range_bits, self.quality)
            };
            let (epsilon, mu) = quantization::step_size_to_exponent_mantissa(delta);
            step_sizes.push(quantization::pack_exponent_mantissa(epsilon, mu));
        }
        let qcd = J2kQcd {
            quant_style: (GUARD_BITS << 5)
                | if cod.is_reversible() {
                    quantization::QUANT_STYLE_NONE
                } else {
                    quantization::QUANT_STYLE_SCALAR_EXPOUNDED
                },
            step_sizes: step_sizes.clone(),
        };
        writer.write_qcd(&qcd)?;

        let mut component_subbands: Vec<Vec<J2kSubband>> = Vec::with_capacity(components);
        for comp_data in &per_component {
            let subbands = if cod.is_reversible() {
                self.build_subbands_53(comp_data, width, height)
            } else {
                self.build_subbands_97(comp_data, width, height, depth, &step_sizes)
            };
            component_subbands.push(subbands);
        }

        let sot_pos = writer.len();
        writer.write_sot(0, 0, 0, 1)?;
        writer.write_sod()?;

        let num_resolutions = (levels + 1) as usize;
        for res in 0..num_resolutions {
            for (_comp_idx, subbands) in component_subbands.iter().enumerate() {
                for sb in Self::resolution_subbands(subbands, res, levels) {
                    let depth_val = depth;
                    let range_bits = depth_val + GUARD_BITS + sb.gain_bits();
                    let packet_bytes = self.encode_subband_packet(sb, cb_w, cb_h, range_bits)?;
                    writer.write_bytes(&packet_bytes)?;
                }
            }
        }

        let tile_len = (writer.len() - sot_pos) as u32;
        writer.write_eoc()?;
        let total_len = writer.len();
        drop(writer);

        let psot_offset = sot_pos + 6;
        if psot_offset + 4 <= destination.len() {
            destination[psot_offset..psot_offset + 4].copy_from_slice(&tile_len.to_be_bytes());
        }

        Ok(total_len)
    }

    /// Subband orientations in QCD order: LL, then (HL, LH, HH) coarsest to finest.
    fn subband_orientations(levels: u8) -> Vec<SubbandOrientation> {
        let mut out = vec![SubbandOrientation::LL];
        for _ in 0..levels {
            out.push(SubbandOrientation::HL);
            out.push(SubbandOrientation::LH);
            out.push(SubbandOrientation::HH);
        }
        out
    }

    /// Returns the subbands that make up resolution `res` (0 = LL-only,
    /// otherwise HL/LH/HH for that level), given `subbands` built by
    /// `build_subbands_53`/`build_subbands_97` (same [LL, ...] ordering as
    /// `subband_orientations`).
    fn resolution_subbands(subbands: &[J2kSubband], res: usize, levels: u8) -> Vec<&J2kSubband> {
        if res == 0 {
            return vec![&subbands[0]];
        }
        let level = res; // 1..=levels, level `res` is the `res`-th coarsest detail level
        let base = 1 + 3 * (level - 1);
        if base + 2 >= subbands.len() {
            return Vec::new();
        }
        let _ = levels;
        vec![&subbands[base], &subbands[base + 1], &subbands[base + 2]]
    }

    /// A simple quality-to-step-size mapping: higher quality halves the step
    /// size roughly every 12 quality points, clamped to the lossless minimum.
    fn quality_step(range_bits: u8, quality: u8) -> f64 {
        if quality >= 100 {
            return 1.0;
        }
        let scale = (100 - quality as i32) as f64 / 12.0;
        (2f64.powf(scale)).max(1.0).min(2f64.powi(range_bits as i32))
    }

    fn build_subbands_53(&self, data: &[i32], width: u32, height: u32) -> Vec<J2kSubband> {
        let levels = self.decomposition_levels;
        let (stages, ll, ll_w, ll_h) = forward_multilevel_53(data, width, height, levels);
        let mut subbands = vec![J2kSubband {
            orientation: SubbandOrientation::LL,
            x0: 0,
            y0: 0,
            width: ll_w,
            height: ll_h,
            codeblocks: Vec::new(),
            data: ll,
        }];
        for stage in stages.iter().rev() {
            let hl_w = stage.input_width / 2;
            let ll_h_stage = stage.input_height.div_ceil(2);
            let ll_w_stage = stage.input_width.div_ceil(2);
            let lh_h = stage.input_height / 2;
            subbands.push(J2kSubband {
                orientation: SubbandOrientation::HL,
                x0: 0,
                y0: 0,
                width: hl_w,
                height: ll_h_stage,
                codeblocks: Vec::new(),
                data: stage.hl.clone(),
            });
            subbands.push(J2kSubband {
                orientation: SubbandOrientation::LH,
                x0: 0,
                y0: 0,
                width: ll_w_stage,
                height: lh_h,
                codeblocks: Vec::new(),
                data: stage.lh.clone(),
            });
            subbands.push(J2kSubband {
                orientation: SubbandOrientation::HH,
                x0: 0,
                y0: 0,
                width: hl_w,
                height: lh_h,
                codeblocks: Vec::new(),
                data: stage.hh.clone(),
            });
        }
        subbands
    }

    fn build_subbands_97(
        &self,
        data: &[i32],
        width: u32,
        height: u32,
        depth: u8,
        step_sizes: &[u16],
    ) -> Vec<J2kSubband> {
        let levels = self.decomposition_levels;
        let float_data: Vec<f32> = data.iter().map(|&v| v as f32).collect();
        let (stages, ll, ll_w, ll_h) = forward_multilevel_97(&float_data, width, height, levels);

        let orientations = Self::subband_orientations(levels);
        let mut subbands = Vec::with_capacity(orientations.len());
        let quantize = |value: f32, idx: usize, orientation: SubbandOrientation| -> i32 {
            let range_bits = depth + GUARD_BITS + orientation.gain_bits();
            let packed = step_sizes.get(idx).copied().unwrap_or(0);
            let step = quantization::step_size_from_packed(packed, range_bits) as f32;
            quantization::quantize_scalar(value, step)
        };

        subbands.push(J2kSubband {
            orientation: SubbandOrientation::LL,
            x0: 0,
            y0: 0,
            width: ll_w,
            height: ll_h,
            codeblocks: Vec::new(),
            data: ll.iter().map(|&v| quantize(v, 0, SubbandOrientation::LL)).collect(),
        });

        let mut idx = 1;
        for stage in stages.iter().rev() {
            let hl_w = stage.input_width / 2;
            let ll_h_stage = stage.input_height.div_ceil(2);
            let ll_w_stage = stage.input_width.div_ceil(2);
            let lh_h = stage.input_height / 2;

            subbands.push(J2kSubband {
                orientation: SubbandOrientation::HL,
                x0: 0,
                y0: 0,
                width: hl_w,
                height: ll_h_stage,
                codeblocks: Vec::new(),
                data: stage
                    .hl
                    .iter()
                    .map(|&v| quantize(v, idx, SubbandOrientation::HL))
                    .collect(),
            });
            subbands.push(J2kSubband {
                orientation: SubbandOrientation::LH,
                x0: 0,
                y0: 0,
                width: ll_w_stage,
                height: lh_h,
                codeblocks: Vec::new(),
                data: stage
                    .lh
                    .iter()
                    .map(|&v| quantize(v, idx + 1, SubbandOrientation::LH))
                    .collect(),
            });
            subbands.push(J2kSubband {
                orientation: SubbandOrientation::HH,
                x0: 0,
                y0: 0,
                width: hl_w,
                height: lh_h,
                codeblocks: Vec::new(),
                data: stage
                    .hh
                    .iter()
                    .map(|&v| quantize(v, idx + 2, SubbandOrientation::HH))
                    .collect(),
            });
            idx += 3;
        }
        subbands
    }

    /// Tier-1 encode every code-block in `sb`, then assemble the Tier-2
    /// packet (header + code-block bodies) for this single-layer, single-
    /// precinct subband.
    fn encode_subband_packet(
        &self,
        sb: &J2kSubband,
        cb_w: u32,
        cb_h: u32,
        range_bits: u8,
    ) -> Result<Vec<u8>, JpeglsError> {
        let bounds_list = partition_subband(sb, cb_w, cb_h);
        if bounds_list.is_empty() {
            let mut bw = J2kBitWriter::new();
            bw.write_bit(0);
            return Ok(bw.finish());
        }

        let grid_w = sb.width.div_ceil(cb_w) as usize;
        let grid_h = sb.height.div_ceil(cb_h) as usize;
        let band = sb.orientation.band_index();
        log::trace!(
            "subband {:?} {}x{}: {} code-blocks, range_bits={range_bits}",
            sb.orientation,
            sb.width,
            sb.height,
            bounds_list.len()
        );

        let mut included_cblks = Vec::new();
        let mut bodies: Vec<u8> = Vec::new();

        for bounds in &bounds_list {
            let grid_x = (bounds.x0 / cb_w) as usize;
            let grid_y = (bounds.y0 / cb_h) as usize;
            let block = super::code_block::extract_block(sb, bounds);
            let max_abs = block.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0);
            if max_abs == 0 {
                continue;
            }

            let max_bit_plane = BitPlaneCoder::compute_max_bit_plane(&block);
            let zero_bp = (range_bits as i32 - 1 - max_bit_plane as i32).max(0) as u8;
            let mut bpc =
                BitPlaneCoder::with_band(bounds.width, bounds.height, &block, band);
            let compressed = bpc.encode_codeblock(max_bit_plane);
            let num_passes = 3 * (max_bit_plane as u32 + 1);

            included_cblks.push(CodeBlockInfo {
                x: grid_x,
                y: grid_y,
                included: true,
                num_passes,
                data_len: compressed.len() as u32,
                zero_bp,
            });
            bodies.extend_from_slice(&compressed);
        }

        let mut state = PrecinctState::new(grid_w, grid_h);
        let header = PacketHeader {
            packet_seq_num: 0,
            empty: included_cblks.is_empty(),
            layer_index: 0,
            included_cblks,
        };
        let mut bw = J2kBitWriter::new();
        header.write(&mut bw, &mut state, grid_w, grid_h);
        let mut packet_bytes = bw.finish();
        packet_bytes.extend_from_slice(&bodies);
        Ok(packet_bytes)
    }
}

impl Default for J2kEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::decoder::J2kDecoder;
    use crate::jpeg_stream_reader::JpegStreamReader;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..(width * height))
            .map(|i| {
                let x = i % width;
                let y = i / width;
                ((x + y) * 4) as u8
            })
            .collect()
    }

    #[test]
    fn test_encode_header_structure() {
        let width = 16u32;
        let height = 16u32;
        let pixels = gradient(width, height);
        let frame_info = FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 1,
        };

        let mut encoder = J2kEncoder::new();
        encoder.set_decomposition_levels(2);
        let mut dest = vec![0u8; 16384];
        let len = encoder.encode(&pixels, &frame_info, &mut dest).unwrap();
        dest.truncate(len);

        assert_eq!(dest[0], 0xFF);
        assert_eq!(dest[1], 0x4F);
        assert_eq!(dest[len - 2], 0xFF);
        assert_eq!(dest[len - 1], 0xD9);

        let mut reader = JpegStreamReader::new(&dest);
        let mut parser = crate::jpeg2000::parser::J2kParser::new(&mut reader);
        parser.parse_main_header().unwrap();
        assert_eq!(parser.image.width, width);
        assert_eq!(parser.image.height, height);
        assert_eq!(parser.image.component_count, 1);
    }

    #[test]
    fn test_encode_decode_roundtrip_grayscale_constant() {
        let width = 16u32;
        let height = 16u32;
        let pixels = vec![128u8; (width * height) as usize];
        let frame_info = FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 1,
        };

        let mut encoder = J2kEncoder::new();
        encoder.set_decomposition_levels(2);
        let mut dest = vec![0u8; 16384];
        let len = encoder.encode(&pixels, &frame_info, &mut dest).unwrap();
        dest.truncate(len);

        let mut reader = JpegStreamReader::new(&dest);
        let mut decoder = J2kDecoder::new(&mut reader);
        let decoded = decoder.decode().expect("decode should succeed");
        assert_eq!(decoded.len(), pixels.len());
        for &p in &decoded {
            assert!((p as i32 - 128).abs() <= 2, "pixel {p} far from 128");
        }
    }

    #[test]
    fn test_encode_decode_roundtrip_gradient() {
        let width = 32u32;
        let height = 32u32;
        let pixels = gradient(width, height);
        let frame_info = FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 1,
        };

        let mut encoder = J2kEncoder::new();
        encoder.set_decomposition_levels(3);
        let mut dest = vec![0u8; 32768];
        let len = encoder.encode(&pixels, &frame_info, &mut dest).unwrap();
        dest.truncate(len);

        let mut reader = JpegStreamReader::new(&dest);
        let mut decoder = J2kDecoder::new(&mut reader);
        let decoded = decoder.decode().expect("decode should succeed");
        assert_eq!(decoded.len(), pixels.len());
    }

    #[test]
    fn test_encode_decode_roundtrip_rgb() {
        let width = 16u32;
        let height = 16u32;
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for i in 0..(width * height) {
            pixels.push((i % 255) as u8);
            pixels.push(((i * 2) % 255) as u8);
            pixels.push(((i * 3) % 255) as u8);
        }
        let frame_info = FrameInfo {
            width,
            height,
            bits_per_sample: 8,
            component_count: 3,
        };

        let mut encoder = J2kEncoder::new();
        encoder.set_decomposition_levels(2);
        let mut dest = vec![0u8; 65536];
        let len = encoder.encode(&pixels, &frame_info, &mut dest).unwrap();
        dest.truncate(len);

        let mut reader = JpegStreamReader::new(&dest);
        let mut decoder = J2kDecoder::new(&mut reader);
        let decoded = decoder.decode().expect("decode should succeed");
        assert_eq!(decoded.len(), pixels.len());
    }
}
