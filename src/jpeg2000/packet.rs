//! Tile-part packet headers (ISO/IEC 15444-1 Annex B.10): per-precinct,
//! per-layer code-block inclusion, zero-bit-plane counts, number of coding
//! passes and compressed data length.
//!
//! Scoped to a single quality layer per precinct (LRCP-style, one packet per
//! precinct/resolution/component), which is what `J2kDecoder`/`J2kEncoder`
//! produce and expect; the tag-tree/VLC mechanics below are the real
//! algorithm and are not specific to that restriction.

use super::bit_io::{BitIoError, J2kBitReader, J2kBitWriter};
use super::tag_tree::TagTree;

/// Per-code-block state that persists across layers within a precinct:
/// once a block is included, its `Lblock` value only ever grows.
#[derive(Debug, Clone, Copy)]
pub struct CodeBlockState {
    pub included: bool,
    pub lblock: u32,
}

impl Default for CodeBlockState {
    fn default() -> Self {
        Self {
            included: false,
            lblock: 3,
        }
    }
}

/// Tag trees and per-code-block state for one precinct.
pub struct PrecinctState {
    pub inclusion_tree: TagTree,
    pub zero_bp_tree: TagTree,
    pub cblk_state: Vec<CodeBlockState>,
    grid_width: usize,
}

impl PrecinctState {
    pub fn new(w: usize, h: usize) -> Self {
        let mut state = Self {
            inclusion_tree: TagTree::new(w, h),
            zero_bp_tree: TagTree::new(w, h),
            cblk_state: vec![CodeBlockState::default(); w * h],
            grid_width: w,
        };
        state.reset();
        state
    }

    /// Clear per-layer tag-tree decode progress. Does not touch inclusion
    /// state or Lblock, which persist across layers.
    pub fn reset(&mut self) {
        self.inclusion_tree.reset();
        self.zero_bp_tree.reset();
    }

    fn cblk_index(&self, x: usize, y: usize) -> usize {
        y * self.grid_width + x
    }
}

pub struct PacketHeader {
    pub packet_seq_num: u32,
    pub empty: bool,
    pub layer_index: u32,
    pub included_cblks: Vec<CodeBlockInfo>,
}

#[derive(Debug, Clone)]
pub struct CodeBlockInfo {
    pub x: usize,
    pub y: usize,
    pub included: bool,
    pub num_passes: u32,
    pub data_len: u32,
    pub zero_bp: u8,
}

/// Number-of-coding-passes VLC (Annex B.10.5): a short prefix code keeps
/// the common case (1 or 2 passes) cheap while still covering the full
/// range up to 164 passes.
fn write_num_passes(writer: &mut J2kBitWriter, num_passes: u32) {
    match num_passes {
        1 => writer.write_bit(0),
        2 => {
            writer.write_bit(1);
            writer.write_bit(0);
        }
        3..=4 => {
            writer.write_bits(0b11, 2);
            writer.write_bits(num_passes - 3, 1);
            writer.write_bit(0);
        }
        5..=36 => {
            writer.write_bits(0b1111, 4);
            writer.write_bits(num_passes - 5, 5);
            writer.write_bit(0);
        }
        _ => {
            writer.write_bits(0b11111, 5);
            writer.write_bits((num_passes - 37).min(127), 7);
        }
    }
}

fn read_num_passes(reader: &mut J2kBitReader) -> Result<u32, BitIoError> {
    if reader.read_bit()? == 0 {
        return Ok(1);
    }
    if reader.read_bit()? == 0 {
        return Ok(2);
    }
    if reader.read_bit()? == 0 {
        let extra = reader.read_bits(1)?;
        return Ok(3 + extra);
    }
    if reader.read_bit()? == 0 {
        let extra = reader.read_bits(5)?;
        return Ok(5 + extra);
    }
    let extra = reader.read_bits(7)?;
    Ok(37 + extra)
}

fn bits_for_passes(num_passes: u32) -> u32 {
    32 - num_passes.max(1).leading_zeros()
}

impl PacketHeader {
    pub fn read(
        reader: &mut J2kBitReader,
        state: &mut PrecinctState,
        layer: u32,
        grid_width: usize,
        grid_height: usize,
    ) -> Result<Self, BitIoError> {
        let mut header = PacketHeader {
            packet_seq_num: 0,
            empty: false,
            layer_index: layer,
            included_cblks: Vec::new(),
        };

        if reader.read_bit()? == 0 {
            header.empty = true;
            return Ok(header);
        }

        for y in 0..grid_height {
            for x in 0..grid_width {
                let idx = state.cblk_index(x, y);
                let already_included = state.cblk_state[idx].included;

                let included = if already_included {
                    reader.read_bit()? != 0
                } else {
                    !state
                        .inclusion_tree
                        .decode(reader, x, y, (layer + 1) as i32)?
                };

                if !included {
                    continue;
                }

                let zero_bp = if already_included {
                    0
                } else {
                    state.cblk_state[idx].included = true;
                    state.zero_bp_tree.decode_value(reader, x, y)? as u8
                };

                let num_passes = read_num_passes(reader)?;

                while reader.read_bit()? != 0 {
                    state.cblk_state[idx].lblock += 1;
                }
                let length_bits = state.cblk_state[idx].lblock + bits_for_passes(num_passes);
                let data_len = reader.read_bits(length_bits.min(32) as u8)?;

                header.included_cblks.push(CodeBlockInfo {
                    x,
                    y,
                    included: true,
                    num_passes,
                    data_len,
                    zero_bp,
                });
            }
        }

        Ok(header)
    }

    pub fn write(&self, writer: &mut J2kBitWriter, state: &mut PrecinctState, grid_width: usize, grid_height: usize) {
        if self.empty {
            writer.write_bit(0);
            return;
        }
        writer.write_bit(1);

        for y in 0..grid_height {
            for x in 0..grid_width {
                let idx = state.cblk_index(x, y);
                let cb_info = self.included_cblks.iter().find(|c| c.x == x && c.y == y);
                let included_now = cb_info.is_some();
                let already_included = state.cblk_state[idx].included;

                if already_included {
                    writer.write_bit(if included_now { 1 } else { 0 });
                } else {
                    state
                        .inclusion_tree
                        .set_value(x, y, if included_now { self.layer_index as i32 } else { i32::MAX / 2 });
                    state
                        .inclusion_tree
                        .encode(writer, x, y, (self.layer_index + 1) as i32);
                }

                if !included_now {
                    continue;
                }
                let cb = cb_info.unwrap();

                if !already_included {
                    state.cblk_state[idx].included = true;
                    state.zero_bp_tree.set_value(x, y, cb.zero_bp as i32);
                    state.zero_bp_tree.encode(writer, x, y, (cb.zero_bp as i32) + 1);
                }

                write_num_passes(writer, cb.num_passes);

                let needed_bits = 32 - cb.data_len.max(1).leading_zeros();
                while state.cblk_state[idx].lblock + bits_for_passes(cb.num_passes) < needed_bits {
                    writer.write_bit(1);
                    state.cblk_state[idx].lblock += 1;
                }
                writer.write_bit(0);

                let length_bits = state.cblk_state[idx].lblock + bits_for_passes(cb.num_passes);
                writer.write_bits(cb.data_len, length_bits.min(32) as u8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg_stream_reader::JpegStreamReader;

    #[test]
    fn test_packet_read_empty() {
        let data = [0x00u8];
        let mut stream_reader = JpegStreamReader::new(&data);
        let mut reader = J2kBitReader::new(&mut stream_reader);
        let mut state = PrecinctState::new(2, 2);

        let header = PacketHeader::read(&mut reader, &mut state, 0, 2, 2).unwrap();
        assert!(header.empty);
    }

    #[test]
    fn test_packet_single_block_roundtrip() {
        let mut enc_state = PrecinctState::new(1, 1);
        let header = PacketHeader {
            packet_seq_num: 0,
            empty: false,
            layer_index: 0,
            included_cblks: vec![CodeBlockInfo {
                x: 0,
                y: 0,
                included: true,
                num_passes: 7,
                data_len: 212,
                zero_bp: 2,
            }],
        };
        let mut writer = J2kBitWriter::new();
        header.write(&mut writer, &mut enc_state, 1, 1);
        let bytes = writer.finish();

        let mut stream_reader = JpegStreamReader::new(&bytes);
        let mut reader = J2kBitReader::new(&mut stream_reader);
        let mut dec_state = PrecinctState::new(1, 1);
        let decoded = PacketHeader::read(&mut reader, &mut dec_state, 0, 1, 1).unwrap();

        assert!(!decoded.empty);
        assert_eq!(decoded.included_cblks.len(), 1);
        let cb = &decoded.included_cblks[0];
        assert_eq!(cb.num_passes, 7);
        assert_eq!(cb.data_len, 212);
        assert_eq!(cb.zero_bp, 2);
    }
}
