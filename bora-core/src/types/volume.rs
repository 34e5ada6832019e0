//! Volume type for representing lot counts.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Volume type - a strictly positive lot count.
///
/// # Examples
///
/// ```
/// use bora_core::types::Volume;
///
/// let volume = Volume::new(150).unwrap();
/// assert_eq!(volume.as_i32(), 150);
/// assert!(Volume::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Volume(i32);

impl Volume {
    /// Creates a new `Volume`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidVolume` if the value is zero or
    /// negative.
    pub fn new(value: i32) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::InvalidVolume(value));
        }
        Ok(Self(value))
    }

    /// Creates a new `Volume` without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure the value is strictly positive.
    #[must_use]
    pub const fn new_unchecked(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw lot count.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns the lot count as an `f64` for notional arithmetic.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        f64::from(self.0)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_new_valid() {
        let volume = Volume::new(10).unwrap();
        assert_eq!(volume.as_i32(), 10);
    }

    #[test]
    fn test_volume_rejects_zero() {
        assert!(matches!(
            Volume::new(0),
            Err(ValidationError::InvalidVolume(0))
        ));
    }

    #[test]
    fn test_volume_rejects_negative() {
        assert!(Volume::new(-5).is_err());
    }
}
