use serde::{Deserialize, Serialize};

use crate::error::{NumericError, Result};

/// Numeric thresholds shared by every comparison site in the crate.
///
/// A single value is threaded through normalization, division, Sturm sign
/// counting and the iterative solvers so none of them carry their own magic
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Coefficients with a smaller magnitude are snapped to exactly zero.
    pub coefficient: f64,
    /// Evaluations with a smaller magnitude carry no sign when counting
    /// Sturm sign variations.
    pub sign: f64,
    /// Ceiling for every iterative loop.
    pub max_iterations: usize,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coefficient: 1.0e-12,
            sign: 1.0e-15,
            max_iterations: 1000,
        }
    }
}

impl Tolerance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coefficient(mut self, eps: f64) -> Self {
        self.coefficient = eps;
        self
    }

    pub fn with_sign(mut self, eps: f64) -> Self {
        self.sign = eps;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Reject thresholds that would make comparisons meaningless.
    pub fn validate(&self) -> Result<()> {
        if !(self.coefficient.is_finite() && self.coefficient >= 0.0) {
            return Err(NumericError::InvalidInput(format!(
                "coefficient tolerance must be finite and non-negative, got {}",
                self.coefficient
            )));
        }
        if !(self.sign.is_finite() && self.sign >= 0.0) {
            return Err(NumericError::InvalidInput(format!(
                "sign tolerance must be finite and non-negative, got {}",
                self.sign
            )));
        }
        if self.max_iterations == 0 {
            return Err(NumericError::InvalidInput(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn is_zero(&self, value: f64) -> bool {
        value.abs() < self.coefficient
    }

    pub(crate) fn snap(&self, value: f64) -> f64 {
        if self.is_zero(value) { 0.0 } else { value }
    }
}
