use crate::TrError;

/// Floating point type used throughout the system.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TrError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TrError::NonFinite { what, value: v })
    }
}

/// Inclusive admissible range for a configuration field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub min: Real,
    pub max: Real,
}

impl Range {
    pub const fn new(min: Real, max: Real) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: Real) -> bool {
        v.is_finite() && v >= self.min && v <= self.max
    }

    /// Accept `v` if finite and inside the range.
    pub fn check(&self, v: Real, what: &'static str) -> Result<Real, TrError> {
        let v = ensure_finite(v, what)?;
        if self.contains(v) {
            Ok(v)
        } else {
            Err(TrError::OutOfRange {
                what,
                value: v,
                min: self.min,
                max: self.max,
            })
        }
    }
}
