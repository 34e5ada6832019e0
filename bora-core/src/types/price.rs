//! Price type for representing instrument prices.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ValidationError, Volume};

/// Price type - a finite, strictly positive price value.
///
/// Wraps an `f64` with validation at construction: NaN, infinities, and
/// non-positive values are rejected so downstream aggregation never has to
/// re-check numeric sanity.
///
/// # Examples
///
/// ```
/// use bora_core::types::Price;
///
/// let price = Price::new(100.25).unwrap();
/// assert_eq!(price.as_f64(), 100.25);
/// assert!(Price::new(f64::NAN).is_err());
/// assert!(Price::new(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Price(f64);

impl Price {
    /// Creates a new `Price`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPrice` if the value is not finite
    /// or is not strictly positive.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ValidationError::InvalidPrice(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Price` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is finite and strictly positive.
    #[must_use]
    pub const fn new_unchecked(value: f64) -> Self {
        Self(value)
    }

    /// Returns the raw price value.
    #[must_use]
    pub const fn as_f64(&self) -> f64 {
        self.0
    }

    /// Returns the notional value of `volume` lots at this price.
    #[must_use]
    pub fn notional(&self, volume: Volume) -> f64 {
        self.0 * volume.as_f64()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_new_valid() {
        let price = Price::new(99.5).unwrap();
        assert_eq!(price.as_f64(), 99.5);
    }

    #[test]
    fn test_price_rejects_nan() {
        assert!(matches!(
            Price::new(f64::NAN),
            Err(ValidationError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_price_rejects_infinity() {
        assert!(Price::new(f64::INFINITY).is_err());
        assert!(Price::new(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_price_rejects_non_positive() {
        assert!(Price::new(0.0).is_err());
        assert!(Price::new(-0.01).is_err());
    }

    #[test]
    fn test_price_notional() {
        let price = Price::new(100.0).unwrap();
        let volume = Volume::new(150).unwrap();
        assert_eq!(price.notional(volume), 15_000.0);
    }
}
