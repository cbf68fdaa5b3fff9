//! Sigmoid (Platt) probability calibration
//!
//! Maps a raw classifier score `f` to `1 / (1 + exp(a * f + b))`.
//! Fitting lives in the trainer; this type only carries the fitted
//! parameters and applies them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SigmoidCalibrator {
    /// Slope parameter A (negative when higher scores mean more positives)
    pub a: f64,
    /// Intercept parameter B
    pub b: f64,
}

impl SigmoidCalibrator {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    /// Calibrated probability for a raw score
    pub fn apply(&self, score: f64) -> f64 {
        let z = self.a * score + self.b;
        // Split by sign so exp never overflows.
        if z >= 0.0 {
            let e = (-z).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + z.exp())
        }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }
}
