//! JPEG 2000 Decoder.
//!
//! Parses the codestream header, then reconstructs pixel data by running
//! Tier-2 packet parsing, Tier-1 bit-plane decoding, dequantization, the
//! inverse wavelet transform and the inverse component transform in sequence.
//!
//! Scoped to a single tile and a single quality layer, matching `J2kEncoder`.

use super::bit_io::J2kBitReader;
use super::bit_plane_coder::BitPlaneCoder;
use super::code_block::{partition_subband, scatter_block, CodeBlockBounds};
use super::colour::{inverse_ict, inverse_rct};
use super::dwt::{inverse_multilevel_53, inverse_multilevel_97, DwtLevel};
use super::image::{J2kImage, J2kQcd, J2kSubband, SubbandOrientation};
use super::jp2::Jp2Reader;
use super::packet::{PacketHeader, PrecinctState};
use super::parser::J2kParser;
use super::quantization;
use crate::JpeglsError;
use crate::jpeg_marker_code::JpegMarkerCode;
use crate::jpeg_stream_reader::JpegStreamReader;

const GUARD_BITS: u8 = 2;

/// High-level JPEG 2000 decoder: orchestrates parsing and reconstruction.
pub struct J2kDecoder<'a, 'b> {
    parser: J2kParser<'a, 'b>,
    frame_info: crate::FrameInfo,
}

impl<'a, 'b> J2kDecoder<'a, 'b> {
    pub fn new(reader: &'b mut JpegStreamReader<'a>) -> Self {
        Self {
            parser: J2kParser::new(reader),
            frame_info: crate::FrameInfo::default(),
        }
    }

    /// Frame dimensions and sample format of the last successful `decode`
    /// call. Populated from the codestream's SIZ/component metadata, not
    /// known before decoding.
    pub fn frame_info(&self) -> crate::FrameInfo {
        self.frame_info
    }

    /// Decodes the codestream and returns interleaved pixel samples.
    pub fn decode(&mut self) -> Result<Vec<u8>, JpeglsError> {
        let remaining = self.parser.reader.remaining_data();
        let codestream_bytes = {
            let mut jp2_reader = Jp2Reader::new(remaining);
            match jp2_reader.find_codestream()? {
                Some(bytes) => bytes.to_vec(),
                None => remaining.to_vec(),
            }
        };
        let icc_profile = {
            let mut jp2_reader = Jp2Reader::new(remaining);
            jp2_reader.find_icc_profile()?
        };

        let mut cs_reader = JpegStreamReader::new(&codestream_bytes);
        let mut parser = J2kParser::new(&mut cs_reader);
        let last_marker = parser.parse_main_header()?;
        if last_marker != JpegMarkerCode::StartOfTile {
            return Err(JpeglsError::InvalidData);
        }
        parser.image.icc_profile = icc_profile;
        let _ = parser.parse_tile_part_header()?;

        let image = (*parser.image).clone();
        self.frame_info = crate::FrameInfo {
            width: image.width,
            height: image.height,
            bits_per_sample: image.components.first().map(|c| c.depth as i32).unwrap_or(8),
            component_count: image.component_count as i32,
        };
        Self::reconstruct(&mut cs_reader, &image)
    }

    fn reconstruct(reader: &mut JpegStreamReader, image: &J2kImage) -> Result<Vec<u8>, JpeglsError> {
        let width = image.width;
        let height = image.height;
        let components = image.component_count as usize;
        let cod = image.cod.clone().ok_or(JpeglsError::InvalidData)?;
        let levels = cod.decomposition_levels;
        let num_resolutions = (levels + 1) as usize;
        log::debug!(
            "decoding {width}x{height}, {components} components, {levels} levels, reversible={}",
            cod.is_reversible()
        );

        let mut component_subbands: Vec<Vec<J2kSubband>> = (0..components)
            .map(|_| Self::empty_subbands(width, height, levels))
            .collect();

        for res in 0..num_resolutions {
            for comp in 0..components {
                let comp_cod = image
                    .cod_for_component(comp as u16)
                    .cloned()
                    .unwrap_or_else(|| cod.clone());
                let cb_w = comp_cod.codeblock_width();
                let cb_h = comp_cod.codeblock_height();
                let depth = image.components.get(comp).map(|c| c.depth).unwrap_or(8);

                for idx in Self::resolution_subband_indices(res) {
                    let sb = &mut component_subbands[comp][idx];
                    let range_bits = depth + GUARD_BITS + sb.gain_bits();
                    Self::decode_subband_packet(reader, sb, cb_w, cb_h, range_bits)?;
                }
            }
        }

        let mut out_components: Vec<Vec<i32>> = Vec::with_capacity(components);
        for comp in 0..components {
            let depth = image.components.get(comp).map(|c| c.depth).unwrap_or(8);
            let data = if cod.is_reversible() {
                Self::reconstruct_53(&component_subbands[comp])
            } else {
                let qcd = image
                    .qcd_for_component(comp as u16)
                    .cloned()
                    .unwrap_or_default();
                Self::reconstruct_97(&component_subbands[comp], depth, &qcd)
            };
            out_components.push(data);
        }

        if cod.mct != 0 && components >= 3 {
            if cod.is_reversible() {
                let (r, g, b) =
                    inverse_rct(&out_components[0], &out_components[1], &out_components[2]);
                out_components[0] = r;
                out_components[1] = g;
                out_components[2] = b;
            } else {
                let to_f32 = |v: &[i32]| -> Vec<f32> { v.iter().map(|&x| x as f32).collect() };
                let (r, g, b) = inverse_ict(
                    &to_f32(&out_components[0]),
                    &to_f32(&out_components[1]),
                    &to_f32(&out_components[2]),
                );
                out_components[0] = r;
                out_components[1] = g;
                out_components[2] = b;
            }
        }

        let pixel_count = (width * height) as usize;
        let mut output = vec![0u8; pixel_count * components];
        for comp in 0..components {
            let depth = image.components.get(comp).map(|c| c.depth).unwrap_or(8);
            let is_signed = image
                .components
                .get(comp)
                .map(|c| c.is_signed)
                .unwrap_or(false);
            let level_shift = if is_signed { 0 } else { 1i32 << (depth - 1) };
            let max_val = (1i32 << depth) - 1;
            for i in 0..pixel_count {
                let v = out_components[comp][i] + level_shift;
                output[i * components + comp] = v.clamp(0, max_val) as u8;
            }
        }

        Ok(output)
    }

    /// Zero-filled subbands in [LL, then (HL, LH, HH) coarsest..finest] order.
    fn empty_subbands(width: u32, height: u32, levels: u8) -> Vec<J2kSubband> {
        let mut dims = Vec::with_capacity(levels as usize);
        let (mut cur_w, mut cur_h) = (width, height);
        for _ in 0..levels {
            if cur_w <= 1 && cur_h <= 1 {
                break;
            }
            dims.push((cur_w, cur_h));
            cur_w = cur_w.div_ceil(2);
            cur_h = cur_h.div_ceil(2);
        }

        let mk = |orientation, w: u32, h: u32| J2kSubband {
            orientation,
            x0: 0,
            y0: 0,
            width: w,
            height: h,
            codeblocks: Vec::new(),
            data: vec![0i32; (w * h) as usize],
        };

        let mut subbands = vec![mk(SubbandOrientation::LL, cur_w, cur_h)];
        for &(w, h) in dims.iter().rev() {
            let hl_w = w / 2;
            let ll_h = h.div_ceil(2);
            let ll_w = w.div_ceil(2);
            let lh_h = h / 2;
            subbands.push(mk(SubbandOrientation::HL, hl_w, ll_h));
            subbands.push(mk(SubbandOrientation::LH, ll_w, lh_h));
            subbands.push(mk(SubbandOrientation::HH, hl_w, lh_h));
        }
        subbands
    }

    fn resolution_subband_indices(res: usize) -> Vec<usize> {
        if res == 0 {
            return vec![0];
        }
        let base = 1 + 3 * (res - 1);
        vec![base, base + 1, base + 2]
    }

    fn decode_subband_packet(
        reader: &mut JpegStreamReader,
        sb: &mut J2kSubband,
        cb_w: u32,
        cb_h: u32,
        range_bits: u8,
    ) -> Result<(), JpeglsError> {
        let bounds_list = partition_subband(sb, cb_w, cb_h);
        if bounds_list.is_empty() {
            return Ok(());
        }

        let grid_w = sb.width.div_ceil(cb_w) as usize;
        let grid_h = sb.height.div_ceil(cb_h) as usize;
        let band = sb.orientation.band_index();
        log::trace!(
            "subband {:?} {}x{}: grid {grid_w}x{grid_h}",
            sb.orientation,
            sb.width,
            sb.height
        );

        reader.align_to_byte();
        let header = {
            let mut state = PrecinctState::new(grid_w, grid_h);
            let mut bit_reader = J2kBitReader::new(reader);
            PacketHeader::read(&mut bit_reader, &mut state, 0, grid_w, grid_h)
                .map_err(|_| JpeglsError::InvalidData)?
        };
        reader.align_to_byte();

        for cb_info in &header.included_cblks {
            let x0 = cb_info.x as u32 * cb_w;
            let y0 = cb_info.y as u32 * cb_h;
            let bw = cb_w.min(sb.width - x0);
            let bh = cb_h.min(sb.height - y0);
            let bounds = CodeBlockBounds {
                x0,
                y0,
                width: bw,
                height: bh,
            };

            let data_len = cb_info.data_len as usize;
            let mut data = vec![0u8; data_len];
            for byte in &mut data {
                *byte = reader.read_u8()?;
            }

            let max_bit_plane = (range_bits as i32 - 1 - cb_info.zero_bp as i32).max(0) as u8;
            let mut bpc = BitPlaneCoder::with_band(bw, bh, &[], band);
            let coefficients = bpc
                .decode_codeblock(&data, bw, bh, max_bit_plane)
                .map_err(|_| JpeglsError::InvalidData)?;
            scatter_block(sb, &bounds, &coefficients);
        }

        Ok(())
    }

    fn reconstruct_53(subbands: &[J2kSubband]) -> Vec<i32> {
        let ll = &subbands[0];
        let stages = Self::build_stages_i32(subbands);
        inverse_multilevel_53(&ll.data, ll.width, ll.height, &stages)
    }

    fn reconstruct_97(subbands: &[J2kSubband], depth: u8, qcd: &J2kQcd) -> Vec<i32> {
        let step_for = |idx: usize, orientation: SubbandOrientation| -> f32 {
            let range_bits = depth + GUARD_BITS + orientation.gain_bits();
            let packed = qcd.step_sizes.get(idx).copied().unwrap_or(0);
            quantization::step_size_from_packed(packed, range_bits) as f32
        };
        let dequant = |v: i32, idx: usize, orientation: SubbandOrientation| -> f32 {
            quantization::dequantize_scalar(v, step_for(idx, orientation))
        };

        let ll = &subbands[0];
        let ll_f: Vec<f32> = ll
            .data
            .iter()
            .map(|&v| dequant(v, 0, SubbandOrientation::LL))
            .collect();

        let mut stages = Vec::new();
        let mut idx = 1;
        for group in subbands[1..].chunks(3) {
            let (hl, lh, hh) = (&group[0], &group[1], &group[2]);
            stages.push(DwtLevel {
                hl: hl
                    .data
                    .iter()
                    .map(|&v| dequant(v, idx, SubbandOrientation::HL))
                    .collect(),
                lh: lh
                    .data
                    .iter()
                    .map(|&v| dequant(v, idx + 1, SubbandOrientation::LH))
                    .collect(),
                hh: hh
                    .data
                    .iter()
                    .map(|&v| dequant(v, idx + 2, SubbandOrientation::HH))
                    .collect(),
                input_width: lh.width + hl.width,
                input_height: hl.height + hh.height,
            });
            idx += 3;
        }
        stages.reverse(); // groups were coarsest-first; stages must be finest-first

        let reconstructed = inverse_multilevel_97(&ll_f, ll.width, ll.height, &stages);
        reconstructed.iter().map(|&v| v.round() as i32).collect()
    }

    fn build_stages_i32(subbands: &[J2kSubband]) -> Vec<DwtLevel<i32>> {
        let mut stages = Vec::new();
        for group in subbands[1..].chunks(3) {
            let (hl, lh, hh) = (&group[0], &group[1], &group[2]);
            stages.push(DwtLevel {
                hl: hl.data.clone(),
                lh: lh.data.clone(),
                hh: hh.data.clone(),
                input_width: lh.width + hl.width,
                input_height: hl.height + hh.height,
            });
        }
        stages.reverse();
        stages
    }
}
