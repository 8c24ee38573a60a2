//! Checked float-to-integer conversions for case file columns
//!
//! Every column of a MATPOWER matrix is read as `f64`. Columns that are
//! integers by meaning (bus numbers, cost model codes, breakpoint counts) go
//! through these instead of `as` casts so NaN, infinities, negative counts and
//! overflow are rejected rather than silently wrapped.

use anyhow::{anyhow, Result};

/// Convert a non-negative finite value to `usize`, truncating any fraction.
///
/// # Examples
/// ```
/// use smkt_io::helpers::safe_f64_to_usize;
///
/// assert_eq!(safe_f64_to_usize(3.0).unwrap(), 3);
/// assert!(safe_f64_to_usize(-1.0).is_err());
/// assert!(safe_f64_to_usize(f64::NAN).is_err());
/// ```
pub fn safe_f64_to_usize(value: f64) -> Result<usize> {
    if !value.is_finite() {
        return Err(anyhow!(
            "Cannot convert non-finite value to usize: {}",
            value
        ));
    }
    if value < 0.0 {
        return Err(anyhow!("Cannot convert negative value to usize: {}", value));
    }
    if value > usize::MAX as f64 {
        return Err(anyhow!(
            "Value {} exceeds maximum usize ({})",
            value,
            usize::MAX
        ));
    }
    Ok(value as usize)
}

/// Convert a finite value within `i32` range to `i32`, truncating any fraction.
pub fn safe_f64_to_i32(value: f64) -> Result<i32> {
    if !value.is_finite() {
        return Err(anyhow!("Cannot convert non-finite value to i32: {}", value));
    }
    if value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(anyhow!("Value {} is outside the i32 range", value));
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usize_conversion() {
        assert_eq!(safe_f64_to_usize(0.0).unwrap(), 0);
        assert_eq!(safe_f64_to_usize(42.9).unwrap(), 42);
        assert!(safe_f64_to_usize(-0.1).is_err());
        assert!(safe_f64_to_usize(f64::INFINITY).is_err());
        assert!(safe_f64_to_usize(1e30).is_err());
    }

    #[test]
    fn test_i32_conversion() {
        assert_eq!(safe_f64_to_i32(-100.0).unwrap(), -100);
        assert_eq!(safe_f64_to_i32(2.0).unwrap(), 2);
        assert!(safe_f64_to_i32(3e10).is_err());
        assert!(safe_f64_to_i32(f64::NAN).is_err());
    }
}
