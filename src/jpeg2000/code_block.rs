//! Partitioning of a subband into code-blocks (ISO/IEC 15444-1 B.7).
//!
//! Code-blocks tile a subband on a grid aligned to the global codestream
//! origin, not the subband's own origin; this module only needs the
//! subband's offset plus the nominal code-block size to reproduce that grid.

use super::image::J2kSubband;

#[derive(Debug, Clone, Copy)]
pub struct CodeBlockBounds {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the grid of code-block boundaries covering `subband`, given the
/// nominal code-block width/height from COD (already clamped to <= 64 there).
pub fn partition_subband(
    subband: &J2kSubband,
    codeblock_width: u32,
    codeblock_height: u32,
) -> Vec<CodeBlockBounds> {
    if subband.width == 0 || subband.height == 0 {
        return Vec::new();
    }

    let mut blocks = Vec::new();
    let grid_x0 = (subband.x0 / codeblock_width) * codeblock_width;
    let grid_y0 = (subband.y0 / codeblock_height) * codeblock_height;

    let mut y = grid_y0;
    while y < subband.y0 + subband.height {
        let mut x = grid_x0;
        while x < subband.x0 + subband.width {
            let x0 = x.max(subband.x0);
            let y0 = y.max(subband.y0);
            let x1 = (x + codeblock_width).min(subband.x0 + subband.width);
            let y1 = (y + codeblock_height).min(subband.y0 + subband.height);
            if x1 > x0 && y1 > y0 {
                blocks.push(CodeBlockBounds {
                    x0,
                    y0,
                    width: x1 - x0,
                    height: y1 - y0,
                });
            }
            x += codeblock_width;
        }
        y += codeblock_height;
    }
    blocks
}

/// Extract a code-block's coefficients from a subband's row-major data into
/// a tightly packed `width x height` buffer.
pub fn extract_block(subband: &J2kSubband, bounds: &CodeBlockBounds) -> Vec<i32> {
    let mut out = Vec::with_capacity((bounds.width * bounds.height) as usize);
    for row in 0..bounds.height {
        let src_y = bounds.y0 - subband.y0 + row;
        let src_x0 = bounds.x0 - subband.x0;
        let start = (src_y * subband.width + src_x0) as usize;
        let end = start + bounds.width as usize;
        out.extend_from_slice(&subband.data[start..end]);
    }
    out
}

/// Inverse of `extract_block`: scatter a code-block's coefficients back into
/// a subband's row-major data buffer.
pub fn scatter_block(subband: &mut J2kSubband, bounds: &CodeBlockBounds, block: &[i32]) {
    for row in 0..bounds.height {
        let src_y = bounds.y0 - subband.y0 + row;
        let src_x0 = bounds.x0 - subband.x0;
        let start = (src_y * subband.width + src_x0) as usize;
        let row_start = (row * bounds.width) as usize;
        let row_end = row_start + bounds.width as usize;
        subband.data[start..start + bounds.width as usize].copy_from_slice(&block[row_start..row_end]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg2000::image::SubbandOrientation;

    #[test]
    fn test_partition_exact_multiple() {
        let subband = J2kSubband {
            orientation: SubbandOrientation::LL,
            x0: 0,
            y0: 0,
            width: 8,
            height: 8,
            codeblocks: Vec::new(),
            data: vec![0; 64],
        };
        let blocks = partition_subband(&subband, 4, 4);
        assert_eq!(blocks.len(), 4);
    }

    #[test]
    fn test_partition_ragged() {
        let subband = J2kSubband {
            orientation: SubbandOrientation::HL,
            x0: 0,
            y0: 0,
            width: 6,
            height: 5,
            codeblocks: Vec::new(),
            data: vec![0; 30],
        };
        let blocks = partition_subband(&subband, 4, 4);
        assert_eq!(blocks.len(), 4);
        let total: u32 = blocks.iter().map(|b| b.width * b.height).sum();
        assert_eq!(total, 30);
    }

    #[test]
    fn test_extract_scatter_roundtrip() {
        let mut subband = J2kSubband {
            orientation: SubbandOrientation::LL,
            x0: 0,
            y0: 0,
            width: 6,
            height: 5,
            codeblocks: Vec::new(),
            data: (0..30).collect(),
        };
        let blocks = partition_subband(&subband, 4, 4);
        let extracted: Vec<Vec<i32>> = blocks.iter().map(|b| extract_block(&subband, b)).collect();

        let mut cleared = subband.clone();
        cleared.data.iter_mut().for_each(|v| *v = -1);
        for (bounds, block) in blocks.iter().zip(extracted.iter()) {
            scatter_block(&mut cleared, bounds, block);
        }
        assert_eq!(cleared.data, subband.data);
    }
}
