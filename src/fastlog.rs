//! Table-driven approximate natural logarithm over `f32`.
//!
//! `ln(x) = (e + log2(1.m)) * ln 2`, where `e` is the unbiased binary exponent and
//! `log2(1.m)` is looked up by the top [`MANTISSA_BITS`] bits of the mantissa.
//! Absolute error stays below `1e-3` for every positive finite input.

use std::f32::consts::LN_2;
use std::sync::OnceLock;

/// Mantissa bits used to index the lookup table.
pub const MANTISSA_BITS: u32 = 14;

const F32_MANTISSA_BITS: u32 = 23;
const F32_EXPONENT_BIAS: i32 = 127;

static LOG2_TABLE: OnceLock<Vec<f32>> = OnceLock::new();

fn log2_table() -> &'static [f32] {
    LOG2_TABLE.get_or_init(|| {
        let size = 1usize << MANTISSA_BITS;
        (0..size)
            .map(|i| (1.0 + i as f64 / size as f64).log2() as f32)
            .collect()
    })
}

/// Approximate natural logarithm.
///
/// `ln(0) = -inf`, `ln(+inf) = +inf`, negative inputs and NaN give NaN.
pub fn ln(x: f32) -> f32 {
    if x.is_nan() || x < 0.0 {
        return f32::NAN;
    }
    if x == 0.0 {
        return f32::NEG_INFINITY;
    }
    if x.is_infinite() {
        return f32::INFINITY;
    }
    if !x.is_normal() {
        // subnormal: lift into the normal range first
        let lift = (1u32 << F32_MANTISSA_BITS) as f32;
        return ln(x * lift) - F32_MANTISSA_BITS as f32 * LN_2;
    }

    let bits = x.to_bits();
    let exponent = ((bits >> F32_MANTISSA_BITS) & 0xff) as i32 - F32_EXPONENT_BIAS;
    let mantissa = bits & ((1 << F32_MANTISSA_BITS) - 1);
    let slot = (mantissa >> (F32_MANTISSA_BITS - MANTISSA_BITS)) as usize;
    (exponent as f32 + log2_table()[slot]) * LN_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_at_powers_of_two() {
        assert_eq!(ln(1.0), 0.0);
        assert_eq!(ln(2.0), LN_2);
        assert_eq!(ln(0.5), -LN_2);
    }

    #[test]
    fn special_values() {
        assert_eq!(ln(0.0), f32::NEG_INFINITY);
        assert_eq!(ln(f32::INFINITY), f32::INFINITY);
        assert!(ln(-1.0).is_nan());
        assert!(ln(f32::NAN).is_nan());
    }

    #[test]
    fn close_to_std() {
        let mut x = 1e-6f32;
        while x < 1e6 {
            let err = (ln(x) - x.ln()).abs();
            assert!(err < 1e-3, "ln({}) off by {}", x, err);
            x *= 1.37;
        }
    }

    #[test]
    fn subnormal_inputs() {
        let x = f32::MIN_POSITIVE / 4.0;
        assert!(!x.is_normal());
        assert!((ln(x) - (x as f64).ln() as f32).abs() < 1e-3);
    }
}
