//! Multiple component transformations (ISO/IEC 15444-1 Annex G): the
//! reversible (integer) and irreversible (floating point) transforms
//! between RGB-like components and a YCbCr-like representation, applied
//! before the wavelet transform when COD's MCT bit is set.

/// Reversible Colour Transform (RCT), lossless, used with the 5-3 wavelet.
pub fn forward_rct(r: &[i32], g: &[i32], b: &[i32]) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
    let n = r.len();
    let mut y = Vec::with_capacity(n);
    let mut cb = Vec::with_capacity(n);
    let mut cr = Vec::with_capacity(n);
    for i in 0..n {
        let (rv, gv, bv) = (r[i], g[i], b[i]);
        y.push((rv + 2 * gv + bv) >> 2);
        cb.push(bv - gv);
        cr.push(rv - gv);
    }
    (y, cb, cr)
}

pub fn inverse_rct(y: &[i32], cb: &[i32], cr: &[i32]) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
    let n = y.len();
    let mut r = Vec::with_capacity(n);
    let mut g = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    for i in 0..n {
        let g_val = y[i] - ((cb[i] + cr[i]) >> 2);
        let r_val = cr[i] + g_val;
        let b_val = cb[i] + g_val;
        r.push(r_val);
        g.push(g_val);
        b.push(b_val);
    }
    (r, g, b)
}

/// Irreversible Colour Transform (ICT), lossy, used with the 9-7 wavelet.
/// Coefficients match ITU-R BT.601, consistent with Annex G.2.
pub fn forward_ict(r: &[i32], g: &[i32], b: &[i32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let n = r.len();
    let mut y = Vec::with_capacity(n);
    let mut cb = Vec::with_capacity(n);
    let mut cr = Vec::with_capacity(n);
    for i in 0..n {
        let (rv, gv, bv) = (r[i] as f32, g[i] as f32, b[i] as f32);
        y.push(0.299 * rv + 0.587 * gv + 0.114 * bv);
        cb.push(-0.168_736 * rv - 0.331_264 * gv + 0.5 * bv);
        cr.push(0.5 * rv - 0.418_688 * gv - 0.081_312 * bv);
    }
    (y, cb, cr)
}

pub fn inverse_ict(y: &[f32], cb: &[f32], cr: &[f32]) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
    let n = y.len();
    let mut r = Vec::with_capacity(n);
    let mut g = Vec::with_capacity(n);
    let mut b = Vec::with_capacity(n);
    for i in 0..n {
        let r_val = y[i] + 1.402 * cr[i];
        let g_val = y[i] - 0.344_136 * cb[i] - 0.714_136 * cr[i];
        let b_val = y[i] + 1.772 * cb[i];
        r.push(r_val.round() as i32);
        g.push(g_val.round() as i32);
        b.push(b_val.round() as i32);
    }
    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rct_roundtrip() {
        let r = vec![10, 200, 255, 0];
        let g = vec![20, 150, 255, 0];
        let b = vec![30, 100, 255, 0];

        let (y, cb, cr) = forward_rct(&r, &g, &b);
        let (r2, g2, b2) = inverse_rct(&y, &cb, &cr);

        assert_eq!(r, r2);
        assert_eq!(g, g2);
        assert_eq!(b, b2);
    }

    #[test]
    fn test_ict_roundtrip_approximate() {
        let r = vec![10, 200, 255, 0];
        let g = vec![20, 150, 255, 0];
        let b = vec![30, 100, 255, 0];

        let (y, cb, cr) = forward_ict(&r, &g, &b);
        let (r2, g2, b2) = inverse_ict(&y, &cb, &cr);

        for i in 0..r.len() {
            assert!((r[i] - r2[i]).abs() <= 1);
            assert!((g[i] - g2[i]).abs() <= 1);
            assert!((b[i] - b2[i]).abs() <= 1);
        }
    }
}
