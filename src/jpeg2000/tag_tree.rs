//! Tag tree coding (ISO/IEC 15444-1 Annex B.10.2), used for packet-header
//! code-block inclusion and zero-bit-plane signalling.
//!
//! A tag tree is a quad-merged binary tree over a `width x height` grid of
//! leaves; each internal node holds the minimum of its children. Querying
//! "is leaf (x, y) <= threshold" only costs the bits needed to resolve that
//! question, reusing whatever upper bound earlier queries (at lower
//! thresholds) already established along the path to the root.

use super::bit_io::{BitIoError, J2kBitReader, J2kBitWriter};

const UNKNOWN: i32 = i32::MAX;

#[derive(Debug, Clone, Copy)]
struct TagTreeNode {
    parent: Option<usize>,
    value: i32,
    low: i32,
    known: bool,
}

pub struct TagTree {
    width: usize,
    height: usize,
    nodes: Vec<TagTreeNode>,
}

impl TagTree {
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let mut level_dims = vec![(width, height)];
        let mut level_offsets = vec![0usize];
        let mut total = width * height;
        let (mut w, mut h) = (width, height);
        while w > 1 || h > 1 {
            w = w.div_ceil(2);
            h = h.div_ceil(2);
            level_offsets.push(total);
            level_dims.push((w, h));
            total += w * h;
        }

        let mut nodes = vec![
            TagTreeNode {
                parent: None,
                value: UNKNOWN,
                low: 0,
                known: false,
            };
            total
        ];

        for level in 0..level_dims.len() - 1 {
            let (lw, lh) = level_dims[level];
            let (pw, _ph) = level_dims[level + 1];
            let base = level_offsets[level];
            let parent_base = level_offsets[level + 1];
            for y in 0..lh {
                for x in 0..lw {
                    let idx = base + y * lw + x;
                    let parent_idx = parent_base + (y / 2) * pw + (x / 2);
                    nodes[idx].parent = Some(parent_idx);
                }
            }
        }

        Self {
            width,
            height,
            nodes,
        }
    }

    fn leaf_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn path_to_root(&self, x: usize, y: usize) -> Vec<usize> {
        let mut path = vec![self.leaf_index(x, y)];
        while let Some(parent) = self.nodes[*path.last().unwrap()].parent {
            path.push(parent);
        }
        path
    }

    /// Set the true value of a leaf (encoder side). Must be called before
    /// any `encode` call involving this leaf or an ancestor.
    pub fn set_value(&mut self, x: usize, y: usize, value: i32) {
        let mut idx = self.leaf_index(x, y);
        loop {
            if value < self.nodes[idx].value {
                self.nodes[idx].value = value;
            }
            match self.nodes[idx].parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
    }

    /// Clear per-layer decoding progress. Leaf values set via `set_value`
    /// are preserved; call once when the tree is created, not between layers.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.low = 0;
            node.known = false;
        }
    }

    /// Encoder side: communicate whether leaf (x, y)'s value is `< threshold`,
    /// emitting only the bits not already implied by previous (lower
    /// threshold) calls for this leaf.
    pub fn encode(&mut self, writer: &mut J2kBitWriter, x: usize, y: usize, threshold: i32) {
        let path = self.path_to_root(x, y);
        let mut low = 0i32;
        for &idx in path.iter().rev() {
            if low > self.nodes[idx].low {
                self.nodes[idx].low = low;
            } else {
                low = self.nodes[idx].low;
            }
            loop {
                if low >= threshold {
                    break;
                }
                if low >= self.nodes[idx].value {
                    if !self.nodes[idx].known {
                        writer.write_bit(1);
                        self.nodes[idx].known = true;
                    }
                    break;
                }
                writer.write_bit(0);
                low += 1;
            }
            self.nodes[idx].low = low;
        }
    }

    /// Decoder side: returns true if leaf (x, y)'s value is `< threshold`.
    pub fn decode(
        &mut self,
        reader: &mut J2kBitReader,
        x: usize,
        y: usize,
        threshold: i32,
    ) -> Result<bool, BitIoError> {
        let path = self.path_to_root(x, y);
        let mut low = 0i32;
        for &idx in path.iter().rev() {
            if low > self.nodes[idx].low {
                self.nodes[idx].low = low;
            } else {
                low = self.nodes[idx].low;
            }
            while low < threshold && low < self.nodes[idx].value {
                if reader.read_bit()? != 0 {
                    self.nodes[idx].value = low;
                } else {
                    low += 1;
                }
            }
            self.nodes[idx].low = low;
        }
        let leaf = self.leaf_index(x, y);
        Ok(self.nodes[leaf].value < threshold)
    }

    /// Decode the exact value of a leaf by probing increasing thresholds.
    /// Used for zero-bit-plane counts, where the true value (not just a
    /// comparison against a known threshold) must be recovered.
    pub fn decode_value(
        &mut self,
        reader: &mut J2kBitReader,
        x: usize,
        y: usize,
    ) -> Result<i32, BitIoError> {
        let mut threshold = 1;
        loop {
            if self.decode(reader, x, y, threshold)? {
                return Ok(self.nodes[self.leaf_index(x, y)].value);
            }
            threshold += 1;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_tree_creation() {
        let tt = TagTree::new(4, 4);
        assert_eq!(tt.width(), 4);
        assert_eq!(tt.height(), 4);
    }

    #[test]
    fn test_single_leaf_roundtrip() {
        let mut enc_tree = TagTree::new(1, 1);
        enc_tree.set_value(0, 0, 3);
        enc_tree.reset();
        let mut writer = J2kBitWriter::new();
        enc_tree.encode(&mut writer, 0, 0, 4);
        let bytes = writer.finish();

        let mut reader = crate::jpeg_stream_reader::JpegStreamReader::new(&bytes);
        let mut bit_reader = J2kBitReader::new(&mut reader);
        let mut dec_tree = TagTree::new(1, 1);
        let value = dec_tree.decode_value(&mut bit_reader, 0, 0).unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_grid_roundtrip() {
        let values = [[0, 2, 5, 1], [3, 0, 0, 4], [1, 1, 2, 2], [0, 0, 0, 0]];

        let mut enc_tree = TagTree::new(4, 4);
        for (y, row) in values.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                enc_tree.set_value(x, y, v);
            }
        }
        enc_tree.reset();

        let mut writer = J2kBitWriter::new();
        for (y, row) in values.iter().enumerate() {
            for (x, _) in row.iter().enumerate() {
                enc_tree.encode(&mut writer, x, y, 8);
            }
        }
        let bytes = writer.finish();

        let mut reader = crate::jpeg_stream_reader::JpegStreamReader::new(&bytes);
        let mut bit_reader = J2kBitReader::new(&mut reader);
        let mut dec_tree = TagTree::new(4, 4);
        for (y, row) in values.iter().enumerate() {
            for (x, &expected) in row.iter().enumerate() {
                let got = dec_tree.decode_value(&mut bit_reader, x, y).unwrap();
                assert_eq!(got, expected, "mismatch at ({x}, {y})");
            }
        }
    }
}
