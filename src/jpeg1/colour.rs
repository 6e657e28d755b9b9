//! BT.601 RGB/YCbCr transform used by JPEG baseline/extended scans.
//!
//! Kept separate from `jpeg2000::colour`'s RCT/ICT: this family never mixes
//! bitstreams with JPEG 2000, and its encoder/decoder work directly on
//! level-shifted DCT block samples rather than whole sample planes.

/// Converts one RGB triple (each 0..255) to Y/Cb/Cr (each 0..255).
pub fn rgb_to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.1687 * r - 0.3313 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.4187 * g - 0.0813 * b + 128.0;
    (y, cb, cr)
}

/// Converts a level-shifted Y/Cb/Cr triple (each already shifted by -128,
/// as reconstructed straight out of the IDCT) back to unclamped RGB. Callers
/// clamp to 0..255 themselves after this.
pub fn ycbcr_to_rgb(y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
    let r = y + 1.402 * cr + 128.0;
    let g = y - 0.344136 * cb - 0.714136 * cr + 128.0;
    let b = y + 1.772 * cb + 128.0;
    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_approximate() {
        let samples = [(10.0, 20.0, 30.0), (200.0, 150.0, 100.0), (255.0, 255.0, 255.0), (0.0, 0.0, 0.0)];
        for (r, g, b) in samples {
            let (y, cb, cr) = rgb_to_ycbcr(r, g, b);
            let (r2, g2, b2) = ycbcr_to_rgb(y - 128.0, cb - 128.0, cr - 128.0);
            assert!((r - r2).abs() < 0.01);
            assert!((g - g2).abs() < 0.01);
            assert!((b - b2).abs() < 0.01);
        }
    }
}
