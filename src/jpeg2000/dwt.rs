//! Discrete Wavelet Transforms for JPEG 2000

#[allow(dead_code)]
pub struct Dwt53;

impl Dwt53 {
    /// Forward 5/3 Reversible Transform (1D)
    /// Input: `signal` (spatial domain)
    /// Output: `coeffs` (interleaved Low/High pass coeffs)
    /// Note: This is an in-place implementation sketch or we can return new vec.
    /// Standard usually separates into Low (first half) and High (second half) subbands.
    pub fn forward(signal: &[i32], out_l: &mut [i32], out_h: &mut [i32]) {
        let len = signal.len();
        if len == 0 {
            return;
        }
        if len == 1 {
            out_l[0] = signal[0];
            return;
        }

        // 1. Lifting Step 1: Prediction
        // y[2n+1] = x[2n+1] - floor((x[2n] + x[2n+2])/2)
        // We need to handle extending signal.

        // Let's implement simpler buffer approach first.
        let mut x = signal.to_vec();

        // Count of low and high pass coefficients
        #[allow(clippy::manual_div_ceil)]
        let _l_count = (len + 1) / 2;
        let _h_count = len / 2;

        // Prediction (Odd samples updated based on Even samples)
        for i in 0..len {
            if i % 2 != 0 {
                let left = x[i - 1];
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] }; // Symmetric extension
                x[i] -= (left + right) >> 1;
            }
        }

        // Update (Even samples updated based on Odd samples)
        // y[2n] = x[2n] + floor((y[2n-1] + y[2n+1] + 2)/4)
        for i in 0..len {
            if i % 2 == 0 {
                let left = if i > 0 { x[i - 1] } else { x[i + 1] }; // Symmetric extension
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] += (left + right + 2) >> 2;
            }
        }

        // De-interleave
        let mut l_idx = 0;
        let mut h_idx = 0;
        for i in 0..len {
            if i % 2 == 0 {
                if l_idx < out_l.len() {
                    out_l[l_idx] = x[i];
                    l_idx += 1;
                }
            } else {
                if h_idx < out_h.len() {
                    out_h[h_idx] = x[i];
                    h_idx += 1;
                }
            }
        }
    }

    /// Inverse 5/3 Reversible Transform (1D)
    pub fn inverse(in_l: &[i32], in_h: &[i32], output: &mut [i32]) {
        let len = output.len();
        // Re-interleave
        let mut x = vec![0i32; len];
        let mut l_idx = 0;
        let mut h_idx = 0;
        for i in 0..len {
            if i % 2 == 0 {
                if l_idx < in_l.len() {
                    x[i] = in_l[l_idx];
                    l_idx += 1;
                }
            } else {
                if h_idx < in_h.len() {
                    x[i] = in_h[h_idx];
                    h_idx += 1;
                }
            }
        }

        // Reverse Update
        // x[2n] = y[2n] - floor((y[2n-1] + y[2n+1] + 2)/4)
        for i in 0..len {
            if i % 2 == 0 {
                let left = if i > 0 { x[i - 1] } else { x[i + 1] };
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] -= (left + right + 2) >> 2;
            }
        }

        // Reverse Prediction
        // x[2n+1] = y[2n+1] + floor((x[2n] + x[2n+2])/2)
        for i in 0..len {
            if i % 2 != 0 {
                let left = x[i - 1];
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] += (left + right) >> 1;
            }
        }

        output.copy_from_slice(&x);
    }

    /// Inverse 2D 5/3 Transform
    /// Reconstructs image from LL, HL, LH, HH subbands
    pub fn inverse_2d(
        ll: &[i32],
        hl: &[i32],
        lh: &[i32],
        hh: &[i32],
        width: u32,
        height: u32,
        output: &mut [i32],
    ) {
        let w = width as usize;
        let h = height as usize;
        #[allow(clippy::manual_div_ceil)]
        let ll_w = (w + 1) / 2;
        let hl_w = w / 2;
        #[allow(clippy::manual_div_ceil)]
        let ll_h = (h + 1) / 2;
        let lh_h = h / 2;

        // Temporary buffers for intermediate results
        let mut temp = vec![0i32; w * h];

        // First pass: Inverse transform each row
        for y in 0..ll_h.max(lh_h) {
            let row_ll = if y < ll_h {
                &ll[y * ll_w..(y + 1) * ll_w]
            } else {
                &[]
            };
            let row_hl = if y < hl_w && y * hl_w < hl.len() {
                let start = y * hl_w;
                let end = (start + hl_w).min(hl.len());
                &hl[start..end]
            } else {
                &[]
            };

            let mut row_output = vec![0i32; w];
            if !row_ll.is_empty() || !row_hl.is_empty() {
                let mut row_l = vec![0i32; ll_w];
                let mut row_h = vec![0i32; hl_w];
                if y < ll_h {
                    row_l[..row_ll.len()].copy_from_slice(row_ll);
                }
                if y * hl_w < hl.len() {
                    row_h[..row_hl.len().min(hl_w)].copy_from_slice(row_hl);
                }
                Self::inverse(&row_l, &row_h, &mut row_output);
                for x in 0..w {
                    temp[y * w + x] = row_output[x];
                }
            }
        }

        // Second pass: Inverse transform each column
        for x in 0..w {
            let mut col_l = vec![0i32; ll_h];
            let mut col_h = vec![0i32; lh_h];

            // Extract LL column
            for y in 0..ll_h {
                if y < ll_h && x < ll_w {
                    col_l[y] = ll[y * ll_w + x];
                }
            }

            // Extract LH column
            for y in 0..lh_h {
                if y < lh_h && x < ll_w && y * ll_w + x < lh.len() {
                    col_h[y] = lh[y * ll_w + x];
                }
            }

            let mut col_output = vec![0i32; h];
            Self::inverse(&col_l, &col_h, &mut col_output);

            for y in 0..h {
                if x < w && y < h {
                    output[y * w + x] = col_output[y];
                }
            }
        }
    }

    /// Forward 2D 5/3 Transform: decomposes `input` into LL/HL/LH/HH.
    /// Subband layout matches `inverse_2d`: LL and LH share width
    /// `ceil(width/2)`, HL and HH share width `width/2`; LL and HL share
    /// height `ceil(height/2)`, LH and HH share height `height/2`.
    pub fn forward_2d(
        input: &[i32],
        width: u32,
        height: u32,
        ll: &mut [i32],
        hl: &mut [i32],
        lh: &mut [i32],
        hh: &mut [i32],
    ) {
        let w = width as usize;
        let h = height as usize;
        #[allow(clippy::manual_div_ceil)]
        let ll_w = (w + 1) / 2;
        let hl_w = w / 2;
        #[allow(clippy::manual_div_ceil)]
        let ll_h = (h + 1) / 2;
        let lh_h = h / 2;

        let mut rows_transformed = vec![0i32; w * h];
        for y in 0..h {
            let row = &input[y * w..(y + 1) * w];
            let mut row_l = vec![0i32; ll_w];
            let mut row_h = vec![0i32; hl_w];
            Self::forward(row, &mut row_l, &mut row_h);
            rows_transformed[y * w..y * w + ll_w].copy_from_slice(&row_l);
            rows_transformed[y * w + ll_w..y * w + ll_w + hl_w].copy_from_slice(&row_h);
        }

        for x in 0..ll_w {
            let col: Vec<i32> = (0..h).map(|y| rows_transformed[y * w + x]).collect();
            let mut col_l = vec![0i32; ll_h];
            let mut col_h = vec![0i32; lh_h];
            Self::forward(&col, &mut col_l, &mut col_h);
            for y in 0..ll_h {
                ll[y * ll_w + x] = col_l[y];
            }
            for y in 0..lh_h {
                lh[y * ll_w + x] = col_h[y];
            }
        }

        for x in 0..hl_w {
            let col: Vec<i32> = (0..h).map(|y| rows_transformed[y * w + ll_w + x]).collect();
            let mut col_l = vec![0i32; ll_h];
            let mut col_h = vec![0i32; lh_h];
            Self::forward(&col, &mut col_l, &mut col_h);
            for y in 0..ll_h {
                hl[y * hl_w + x] = col_l[y];
            }
            for y in 0..lh_h {
                hh[y * hl_w + x] = col_h[y];
            }
        }
    }
}

/// One level of a recursive wavelet decomposition: the detail subbands
/// produced by transforming an image of `input_width` x `input_height`,
/// plus the dimensions needed to split/recombine them with the LL band.
pub struct DwtLevel<T> {
    pub hl: Vec<T>,
    pub lh: Vec<T>,
    pub hh: Vec<T>,
    pub input_width: u32,
    pub input_height: u32,
}

/// Apply the 5/3 transform recursively to the LL band, `levels` times,
/// returning the detail subbands (finest level first) and the final LL band
/// with its dimensions.
pub fn forward_multilevel_53(
    data: &[i32],
    width: u32,
    height: u32,
    levels: u8,
) -> (Vec<DwtLevel<i32>>, Vec<i32>, u32, u32) {
    let mut stages = Vec::with_capacity(levels as usize);
    let mut ll = data.to_vec();
    let mut cur_w = width;
    let mut cur_h = height;

    for _ in 0..levels {
        if cur_w <= 1 && cur_h <= 1 {
            break;
        }
        let ll_w = cur_w.div_ceil(2);
        let hl_w = cur_w / 2;
        let ll_h = cur_h.div_ceil(2);
        let lh_h = cur_h / 2;

        let mut next_ll = vec![0i32; (ll_w * ll_h) as usize];
        let mut hl = vec![0i32; (hl_w * ll_h) as usize];
        let mut lh = vec![0i32; (ll_w * lh_h) as usize];
        let mut hh = vec![0i32; (hl_w * lh_h) as usize];
        Dwt53::forward_2d(&ll, cur_w, cur_h, &mut next_ll, &mut hl, &mut lh, &mut hh);

        stages.push(DwtLevel {
            hl,
            lh,
            hh,
            input_width: cur_w,
            input_height: cur_h,
        });

        ll = next_ll;
        cur_w = ll_w;
        cur_h = ll_h;
    }

    (stages, ll, cur_w, cur_h)
}

/// Inverse of `forward_multilevel_53`: reconstructs the original image from
/// the final LL band and the detail subbands, finest level first.
pub fn inverse_multilevel_53(
    ll_final: &[i32],
    ll_width: u32,
    ll_height: u32,
    stages: &[DwtLevel<i32>],
) -> Vec<i32> {
    let mut ll = ll_final.to_vec();
    let mut ll_w = ll_width;
    let mut ll_h = ll_height;

    for stage in stages.iter().rev() {
        let mut output = vec![0i32; (stage.input_width * stage.input_height) as usize];
        Dwt53::inverse_2d(
            &ll,
            &stage.hl,
            &stage.lh,
            &stage.hh,
            stage.input_width,
            stage.input_height,
            &mut output,
        );
        ll = output;
        ll_w = stage.input_width;
        ll_h = stage.input_height;
    }
    let _ = (ll_w, ll_h);
    ll
}

#[allow(dead_code)]
pub struct Dwt97;

impl Dwt97 {
    // 9/7 Filter Constants
    const ALPHA: f32 = -1.586134342;
    const BETA: f32 = -0.052980118;
    const GAMMA: f32 = 0.882911075;
    const DELTA: f32 = 0.443506852;
    const K: f32 = 1.230174105;
    const INV_K: f32 = 1.0 / 1.230174105;

    pub fn forward(signal: &[f32], out_l: &mut [f32], out_h: &mut [f32]) {
        let len = signal.len();
        if len == 0 {
            return;
        }
        let mut x = signal.to_vec();

        // 1. Splitting (already done by indexing)

        // 2. Lifting Steps
        // Prediction 1
        for i in 0..len {
            if i % 2 != 0 {
                let left = x[i - 1];
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] += Self::ALPHA * (left + right);
            }
        }
        // Update 1
        for i in 0..len {
            if i % 2 == 0 {
                let left = if i > 0 { x[i - 1] } else { x[i + 1] };
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] += Self::BETA * (left + right);
            }
        }
        // Prediction 2
        for i in 0..len {
            if i % 2 != 0 {
                let left = x[i - 1];
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] += Self::GAMMA * (left + right);
            }
        }
        // Update 2
        for i in 0..len {
            if i % 2 == 0 {
                let left = if i > 0 { x[i - 1] } else { x[i + 1] };
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] += Self::DELTA * (left + right);
            }
        }

        // Scaling
        for i in 0..len {
            if i % 2 == 0 {
                x[i] *= Self::INV_K; // Low pass
            } else {
                x[i] *= Self::K; // High pass
            }
        }

        // De-interleave
        let mut l_idx = 0;
        let mut h_idx = 0;
        for i in 0..len {
            if i % 2 == 0 {
                if l_idx < out_l.len() {
                    out_l[l_idx] = x[i];
                    l_idx += 1;
                }
            } else {
                if h_idx < out_h.len() {
                    out_h[h_idx] = x[i];
                    h_idx += 1;
                }
            }
        }
    }

    pub fn inverse(in_l: &[f32], in_h: &[f32], output: &mut [f32]) {
        let len = output.len();
        let mut x = vec![0.0f32; len];
        let mut l_idx = 0;
        let mut h_idx = 0;

        // Interleave
        for i in 0..len {
            if i % 2 == 0 {
                if l_idx < in_l.len() {
                    x[i] = in_l[l_idx];
                    l_idx += 1;
                }
            } else {
                if h_idx < in_h.len() {
                    x[i] = in_h[h_idx];
                    h_idx += 1;
                }
            }
        }

        // Inverse Scaling
        for i in 0..len {
            if i % 2 == 0 {
                x[i] *= Self::K;
            } else {
                x[i] *= Self::INV_K;
            }
        }

        // Inverse Lifting (Reverse Order, Reverse Signs)
        // Update 2
        for i in 0..len {
            if i % 2 == 0 {
                let left = if i > 0 { x[i - 1] } else { x[i + 1] };
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] -= Self::DELTA * (left + right);
            }
        }
        // Prediction 2
        for i in 0..len {
            if i % 2 != 0 {
                let left = x[i - 1];
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] -= Self::GAMMA * (left + right);
            }
        }
        // Update 1
        for i in 0..len {
            if i % 2 == 0 {
                let left = if i > 0 { x[i - 1] } else { x[i + 1] };
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] -= Self::BETA * (left + right);
            }
        }
        // Prediction 1
        for i in 0..len {
            if i % 2 != 0 {
                let left = x[i - 1];
                let right = if i + 1 < len { x[i + 1] } else { x[i - 1] };
                x[i] -= Self::ALPHA * (left + right);
            }
        }

        output.copy_from_slice(&x);
    }

    /// Inverse 2D 9/7 Transform
    /// Reconstructs image from LL, HL, LH, HH subbands
    pub fn inverse_2d(
        ll: &[f32],
        hl: &[f32],
        lh: &[f32],
        hh: &[f32],
        width: u32,
        height: u32,
        output: &mut [f32],
    ) {
        let w = width as usize;
        let h = height as usize;
        #[allow(clippy::manual_div_ceil)]
        let ll_w = (w + 1) / 2;
        let hl_w = w / 2;
        #[allow(clippy::manual_div_ceil)]
        let ll_h = (h + 1) / 2;
        let lh_h = h / 2;

        let mut temp = vec![0.0f32; w * h];

        // 1. Row Inverse Transform
        // Process Low-Vertical band (LL + HL -> L)
        for y in 0..ll_h {
            let row_ll = &ll[y * ll_w..(y + 1) * ll_w];
            let row_hl = if y * hl_w < hl.len() {
                let start = y * hl_w;
                let end = (start + hl_w).min(hl.len());
                &hl[start..end]
            } else {
                &[]
            };

            // We need full length buffers for inverse
            let mut row_l = vec![0.0f32; ll_w];
            let mut row_h = vec![0.0f32; hl_w];
            row_l[..row_ll.len()].copy_from_slice(row_ll);
            row_h[..row_hl.len()].copy_from_slice(row_hl);

            let mut row_out = vec![0.0f32; w];
            Self::inverse(&row_l, &row_h, &mut row_out);

            // Store in top half of temp
            for x in 0..w {
                temp[y * w + x] = row_out[x];
            }
        }

        // Process High-Vertical band (LH + HH -> H)
        for y in 0..lh_h {
            let row_lh = if y * ll_w < lh.len() {
                let start = y * ll_w;
                let end = (start + ll_w).min(lh.len());
                &lh[start..end]
            } else {
                &[]
            };

            let row_hh = if y * hl_w < hh.len() {
                let start = y * hl_w;
                let end = (start + hl_w).min(hh.len());
                &hh[start..end]
            } else {
                &[]
            };

            // We need full length buffers for inverse
            let mut row_l = vec![0.0f32; ll_w]; // Input L is LH (Low X)
            let mut row_h = vec![0.0f32; hl_w]; // Input H is HH (High X)
            row_l[..row_lh.len()].copy_from_slice(row_lh);
            row_h[..row_hh.len()].copy_from_slice(row_hh);

            let mut row_out = vec![0.0f32; w];
            Self::inverse(&row_l, &row_h, &mut row_out);

            // Store in bottom half of temp
            // Offset y by ll_h
            for x in 0..w {
                temp[(ll_h + y) * w + x] = row_out[x];
            }
        }

        // 2. Column Inverse Transform
        for x in 0..w {
            let mut col_l = vec![0.0f32; ll_h];
            let mut col_h = vec![0.0f32; lh_h];

            // Extract L from top half of temp
            for y in 0..ll_h {
                col_l[y] = temp[y * w + x];
            }
            // Extract H from bottom half of temp
            for y in 0..lh_h {
                col_h[y] = temp[(ll_h + y) * w + x];
            }

            let mut col_out = vec![0.0f32; h];
            Self::inverse(&col_l, &col_h, &mut col_out);

            for y in 0..h {
                output[y * w + x] = col_out[y];
            }
        }
    }

    /// Forward 2D 9/7 Transform: decomposes `input` into LL/HL/LH/HH, with
    /// the same subband layout convention as `Dwt53::forward_2d`.
    pub fn forward_2d(
        input: &[f32],
        width: u32,
        height: u32,
        ll: &mut [f32],
        hl: &mut [f32],
        lh: &mut [f32],
        hh: &mut [f32],
    ) {
        let w = width as usize;
        let h = height as usize;
        #[allow(clippy::manual_div_ceil)]
        let ll_w = (w + 1) / 2;
        let hl_w = w / 2;
        #[allow(clippy::manual_div_ceil)]
        let ll_h = (h + 1) / 2;
        let lh_h = h / 2;

        let mut rows_transformed = vec![0.0f32; w * h];
        for y in 0..h {
            let row = &input[y * w..(y + 1) * w];
            let mut row_l = vec![0.0f32; ll_w];
            let mut row_h = vec![0.0f32; hl_w];
            Self::forward(row, &mut row_l, &mut row_h);
            rows_transformed[y * w..y * w + ll_w].copy_from_slice(&row_l);
            rows_transformed[y * w + ll_w..y * w + ll_w + hl_w].copy_from_slice(&row_h);
        }

        for x in 0..ll_w {
            let col: Vec<f32> = (0..h).map(|y| rows_transformed[y * w + x]).collect();
            let mut col_l = vec![0.0f32; ll_h];
            let mut col_h = vec![0.0f32; lh_h];
            Self::forward(&col, &mut col_l, &mut col_h);
            for y in 0..ll_h {
                ll[y * ll_w + x] = col_l[y];
            }
            for y in 0..lh_h {
                lh[y * ll_w + x] = col_h[y];
            }
        }

        for x in 0..hl_w {
            let col: Vec<f32> = (0..h).map(|y| rows_transformed[y * w + ll_w + x]).collect();
            let mut col_l = vec![0.0f32; ll_h];
            let mut col_h = vec![0.0f32; lh_h];
            Self::forward(&col, &mut col_l, &mut col_h);
            for y in 0..ll_h {
                hl[y * hl_w + x] = col_l[y];
            }
            for y in 0..lh_h {
                hh[y * hl_w + x] = col_h[y];
            }
        }
    }
}

/// Apply the 9/7 transform recursively to the LL band, `levels` times.
pub fn forward_multilevel_97(
    data: &[f32],
    width: u32,
    height: u32,
    levels: u8,
) -> (Vec<DwtLevel<f32>>, Vec<f32>, u32, u32) {
    let mut stages = Vec::with_capacity(levels as usize);
    let mut ll = data.to_vec();
    let mut cur_w = width;
    let mut cur_h = height;

    for _ in 0..levels {
        if cur_w <= 1 && cur_h <= 1 {
            break;
        }
        let ll_w = cur_w.div_ceil(2);
        let hl_w = cur_w / 2;
        let ll_h = cur_h.div_ceil(2);
        let lh_h = cur_h / 2;

        let mut next_ll = vec![0.0f32; (ll_w * ll_h) as usize];
        let mut hl = vec![0.0f32; (hl_w * ll_h) as usize];
        let mut lh = vec![0.0f32; (ll_w * lh_h) as usize];
        let mut hh = vec![0.0f32; (hl_w * lh_h) as usize];
        Dwt97::forward_2d(&ll, cur_w, cur_h, &mut next_ll, &mut hl, &mut lh, &mut hh);

        stages.push(DwtLevel {
            hl,
            lh,
            hh,
            input_width: cur_w,
            input_height: cur_h,
        });

        ll = next_ll;
        cur_w = ll_w;
        cur_h = ll_h;
    }

    (stages, ll, cur_w, cur_h)
}

/// Inverse of `forward_multilevel_97`.
pub fn inverse_multilevel_97(
    ll_final: &[f32],
    ll_width: u32,
    ll_height: u32,
    stages: &[DwtLevel<f32>],
) -> Vec<f32> {
    let mut ll = ll_final.to_vec();

    for stage in stages.iter().rev() {
        let mut output = vec![0.0f32; (stage.input_width * stage.input_height) as usize];
        Dwt97::inverse_2d(
            &ll,
            &stage.hl,
            &stage.lh,
            &stage.hh,
            stage.input_width,
            stage.input_height,
            &mut output,
        );
        ll = output;
    }
    let _ = (ll_width, ll_height);
    ll
}

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn test_dwt_53_forward_2d_roundtrip() {
        let width = 8u32;
        let height = 6u32;
        let input: Vec<i32> = (0..(width * height) as i32).collect();

        let ll_w = width.div_ceil(2);
        let hl_w = width / 2;
        let ll_h = height.div_ceil(2);
        let lh_h = height / 2;

        let mut ll = vec![0i32; (ll_w * ll_h) as usize];
        let mut hl = vec![0i32; (hl_w * ll_h) as usize];
        let mut lh = vec![0i32; (ll_w * lh_h) as usize];
        let mut hh = vec![0i32; (hl_w * lh_h) as usize];
        Dwt53::forward_2d(&input, width, height, &mut ll, &mut hl, &mut lh, &mut hh);

        let mut output = vec![0i32; (width * height) as usize];
        Dwt53::inverse_2d(&ll, &hl, &lh, &hh, width, height, &mut output);

        assert_eq!(input, output);
    }

    #[test]
    fn test_dwt_53_multilevel_roundtrip() {
        let width = 16u32;
        let height = 16u32;
        let input: Vec<i32> = (0..(width * height) as i32).map(|v| v % 173).collect();

        let (stages, ll, ll_w, ll_h) = forward_multilevel_53(&input, width, height, 3);
        let reconstructed = inverse_multilevel_53(&ll, ll_w, ll_h, &stages);

        assert_eq!(input, reconstructed);
    }

    #[test]
    fn test_dwt_97_multilevel_roundtrip_approximate() {
        let width = 16u32;
        let height = 16u32;
        let input: Vec<f32> = (0..(width * height) as i32).map(|v| (v % 173) as f32).collect();

        let (stages, ll, ll_w, ll_h) = forward_multilevel_97(&input, width, height, 2);
        let reconstructed = inverse_multilevel_97(&ll, ll_w, ll_h, &stages);

        for (a, b) in input.iter().zip(reconstructed.iter()) {
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }

    #[test]
    fn test_dwt_53_roundtrip() {
        let input = [10, 20, 30, 40, 50, 60, 70, 80];
        let len = input.len();
        #[allow(clippy::manual_div_ceil)]
        let l_len = (len + 1) / 2;
        let h_len = len / 2;
        let mut l = vec![0i32; l_len];
        let mut h = vec![0i32; h_len];

        Dwt53::forward(&input, &mut l, &mut h);

        let mut output = vec![0i32; len];
        Dwt53::inverse(&l, &h, &mut output);

        assert_eq!(input.to_vec(), output);
    }

    #[test]
    fn test_dwt_53_odd_length() {
        let input = [10, 20, 30, 40, 50];
        let len = input.len();
        #[allow(clippy::manual_div_ceil)]
        let l_len = (len + 1) / 2;
        let h_len = len / 2;
        let mut l = vec![0i32; l_len];
        let mut h = vec![0i32; h_len];

        Dwt53::forward(&input, &mut l, &mut h);

        let mut output = vec![0i32; len];
        Dwt53::inverse(&l, &h, &mut output);

        assert_eq!(input.to_vec(), output);
    }

    #[test]
    fn test_dwt_97_roundtrip() {
        let input = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
        let len = input.len();
        #[allow(clippy::manual_div_ceil)]
        let l_len = (len + 1) / 2;
        let h_len = len / 2;
        let mut l = vec![0.0f32; l_len];
        let mut h = vec![0.0f32; h_len];

        Dwt97::forward(&input, &mut l, &mut h);

        let mut output = vec![0.0f32; len];
        Dwt97::inverse(&l, &h, &mut output);

        for i in 0..len {
            let diff = (input[i] - output[i]).abs();
            assert!(
                diff < 1e-4,
                "Mismatch at {}: {} vs {}",
                i,
                input[i],
                output[i]
            );
        }
    }
}
