//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Clamp a modifier into `[min, max]`, collapsing NaN to `fallback`.
#[must_use]
pub fn clamp_finite(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        return fallback;
    }
    value.clamp(min, max)
}

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).ceil();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Round a f64 to the nearest integer cent amount, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    cast::<f64, i64>(value.clamp(min, max).round()).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert a count (field size, place, index) to f64.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a 1-based place or lane index into `u8`, saturating at `u8::MAX`.
#[must_use]
pub fn usize_to_u8(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_finite_handles_nan_and_bounds() {
        assert!((clamp_finite(f64::NAN, 0.9, 1.1, 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_finite(5.0, 0.9, 1.1, 1.0) - 1.1).abs() < f64::EPSILON);
        assert!((clamp_finite(f64::NEG_INFINITY, 0.9, 1.1, 1.0) - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i32(1.6), 2);
        assert_eq!(round_f64_to_i32(f64::NAN), 0);
        assert_eq!(round_f64_to_i32(f64::from(i32::MAX) * 2.0), i32::MAX);
        assert_eq!(round_f64_to_i64(1_999.5), 2_000);
        assert_eq!(round_f64_to_i64(f64::INFINITY), 0);
    }

    #[test]
    fn ceil_clamps_and_handles_nan() {
        assert_eq!(ceil_f64_to_u32(236.2), 237);
        assert_eq!(ceil_f64_to_u32(-4.0), 0);
        assert_eq!(ceil_f64_to_u32(f64::NAN), 0);
    }

    #[test]
    fn small_casts_saturate() {
        assert_eq!(usize_to_u8(300), u8::MAX);
        assert_eq!(usize_to_u8(7), 7);
        assert!((usize_to_f64(12) - 12.0).abs() < f64::EPSILON);
    }
}
