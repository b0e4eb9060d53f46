use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display/FFI, never in sim loop.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Fraction of `demand` covered by `supply`, clamped to `[0, 1]`.
///
/// Zero (or negative) demand counts as fully covered.
pub fn coverage_ratio(supply: Fixed64, demand: Fixed64) -> Fixed64 {
    if demand <= Fixed64::ZERO {
        return Fixed64::ONE;
    }
    match checked_div_64(supply, demand) {
        Some(ratio) => ratio.clamp(Fixed64::ZERO, Fixed64::ONE),
        // Only overflows when supply dwarfs demand.
        None => Fixed64::ONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        let sum = a + b;
        assert_eq!(fixed64_to_f64(sum), 3.5);
    }

    #[test]
    fn fixed64_checked_div_by_zero() {
        let a = f64_to_fixed64(1.0);
        let zero = f64_to_fixed64(0.0);
        assert!(checked_div_64(a, zero).is_none());
    }

    #[test]
    fn coverage_ratio_partial() {
        let r = coverage_ratio(f64_to_fixed64(25.0), f64_to_fixed64(100.0));
        assert_eq!(r, f64_to_fixed64(0.25));
    }

    #[test]
    fn coverage_ratio_clamps_surplus_to_one() {
        let r = coverage_ratio(f64_to_fixed64(300.0), f64_to_fixed64(100.0));
        assert_eq!(r, Fixed64::ONE);
    }

    #[test]
    fn coverage_ratio_zero_demand_is_one() {
        assert_eq!(coverage_ratio(Fixed64::ZERO, Fixed64::ZERO), Fixed64::ONE);
        assert_eq!(coverage_ratio(f64_to_fixed64(5.0), Fixed64::ZERO), Fixed64::ONE);
    }

    #[test]
    fn coverage_ratio_overflow_is_one() {
        let r = coverage_ratio(Fixed64::MAX, Fixed64::DELTA);
        assert_eq!(r, Fixed64::ONE);
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(1.0 / 3.0);
        let b = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(a, b);
        assert_eq!(a * f64_to_fixed64(3.0), b * f64_to_fixed64(3.0));
    }
}
