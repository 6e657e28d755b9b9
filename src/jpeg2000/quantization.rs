//! Scalar quantization of wavelet coefficients (ISO/IEC 15444-1 Annex E).
//!
//! Step sizes are derived from a (exponent, mantissa) pair carried per
//! subband in the QCD/QCC marker's SPqcd field:
//!
//! `delta = 2^(R_b - epsilon_b) * (1 + mu_b / 2^11)`
//!
//! where `R_b = image_bit_depth + gain_bits` is the nominal dynamic range of
//! subband `b`, `epsilon_b` is the exponent and `mu_b` the 11-bit mantissa.

/// Quantization style values carried in the low 5 bits of SPqcd/SPqcc.
pub const QUANT_STYLE_NONE: u8 = 0;
pub const QUANT_STYLE_SCALAR_DERIVED: u8 = 1;
pub const QUANT_STYLE_SCALAR_EXPOUNDED: u8 = 2;

/// Decompose a step size into the (exponent, mantissa) pair used by
/// QCD/QCC, per Annex E Equation E.3.
pub fn step_size_to_exponent_mantissa(delta: f64) -> (u8, u16) {
    if delta <= 0.0 {
        return (0, 0);
    }
    let exponent = delta.log2().floor() as i32;
    let exponent = exponent.clamp(0, 31) as u8;
    let ratio = delta / 2f64.powi(exponent as i32) - 1.0;
    let mantissa = (ratio * 2048.0).round().clamp(0.0, 2047.0) as u16;
    (exponent, mantissa)
}

/// Reconstruct the real-valued step size for a subband with nominal dynamic
/// range `range_bits` (image bit depth plus the subband's gain bits) from a
/// packed SPqcd/SPqcc entry: bits 11..15 hold the exponent, bits 0..10 the
/// mantissa.
pub fn step_size_from_packed(packed: u16, range_bits: u8) -> f64 {
    let epsilon = (packed >> 11) as u8;
    let mu = packed & 0x07FF;
    step_size(range_bits, epsilon, mu)
}

pub fn pack_exponent_mantissa(epsilon: u8, mu: u16) -> u16 {
    ((epsilon as u16) << 11) | (mu & 0x07FF)
}

/// `delta_b = 2^(R_b - epsilon_b) * (1 + mu_b / 2^11)`
pub fn step_size(range_bits: u8, epsilon: u8, mu: u16) -> f64 {
    let mantissa_term = 1.0 + (mu as f64) / 2048.0;
    2f64.powi(range_bits as i32 - epsilon as i32) * mantissa_term
}

/// For the 5-3 reversible transform, quantization is the identity (step
/// size 1); integer coefficients pass through unchanged.
pub fn quantize_scalar(coeff: f32, step_size: f32) -> i32 {
    if step_size <= 0.0 {
        return coeff.round() as i32;
    }
    let sign = if coeff < 0.0 { -1 } else { 1 };
    sign * (coeff.abs() / step_size).floor() as i32
}

pub fn dequantize_scalar(q: i32, step_size: f32) -> f32 {
    if q == 0 {
        return 0.0;
    }
    let sign = if q < 0 { -1.0 } else { 1.0 };
    let magnitude = q.unsigned_abs() as f32;
    sign * (magnitude + 0.5) * step_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantization_roundtrip() {
        let step = 2.5f32;
        let original = 17.3f32;
        let q = quantize_scalar(original, step);
        let reconstructed = dequantize_scalar(q, step);
        assert!((original - reconstructed).abs() < step * 2.0);
    }

    #[test]
    fn test_exponent_mantissa_roundtrip() {
        let range_bits = 8u8;
        let delta = step_size(range_bits, 5, 100);
        let (epsilon, mu) = step_size_to_exponent_mantissa(delta);
        let packed = pack_exponent_mantissa(epsilon, mu);
        let recovered = step_size_from_packed(packed, range_bits);
        assert!((delta - recovered).abs() / delta < 0.01);
    }

    #[test]
    fn test_gain_bits_increase_range() {
        let base = step_size(8, 8, 0);
        let hl = step_size(9, 8, 0);
        assert!(hl > base);
    }
}
