//! Sigmoid (Platt) calibration fitting
//!
//! Fits `P(y=1 | f) = 1 / (1 + exp(A*f + B))` on held-out scores by
//! Newton's method with backtracking line search, using Platt's
//! prior-corrected targets to avoid overfitting small calibration sets.

use tracing::debug;
use winerate_model::SigmoidCalibrator;

use crate::errors::{Result, TrainerError};

const MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
/// Hessian ridge keeping the Newton system invertible
const SIGMA: f64 = 1e-12;
const GRADIENT_TOL: f64 = 1e-5;

/// Platt calibration fitter
#[derive(Debug, Clone)]
pub struct PlattFitter {
    max_iter: usize,
}

impl Default for PlattFitter {
    fn default() -> Self {
        Self { max_iter: MAX_ITER }
    }
}

/// Negative log-likelihood of targets under `(a, b)`, computed stably
fn objective(scores: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    scores
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let z = f * a + b;
            if z >= 0.0 {
                t * z + (-z).exp().ln_1p()
            } else {
                (t - 1.0) * z + z.exp().ln_1p()
            }
        })
        .sum()
}

impl PlattFitter {
    /// Fit on raw classifier scores and their true labels
    pub fn fit(&self, scores: &[f64], labels: &[bool]) -> Result<SigmoidCalibrator> {
        if scores.len() != labels.len() {
            return Err(TrainerError::Calibration(
                "scores and labels must have same length".to_string(),
            ));
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(TrainerError::Calibration("scores must be finite".to_string()));
        }

        let n_pos = labels.iter().filter(|&&l| l).count();
        let n_neg = labels.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(TrainerError::Calibration(format!(
                "calibration set needs both classes ({n_pos} positive, {n_neg} negative)"
            )));
        }

        let target_pos = (n_pos as f64 + 1.0) / (n_pos as f64 + 2.0);
        let target_neg = 1.0 / (n_neg as f64 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&l| if l { target_pos } else { target_neg })
            .collect();

        let mut a = 0.0;
        let mut b = ((n_neg as f64 + 1.0) / (n_pos as f64 + 1.0)).ln();
        let mut fval = objective(scores, &targets, a, b);

        for iter in 0..self.max_iter {
            let mut h11 = SIGMA;
            let mut h22 = SIGMA;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;

            for (&f, &t) in scores.iter().zip(&targets) {
                let z = f * a + b;
                let (p, q) = if z >= 0.0 {
                    let e = (-z).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = z.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < GRADIENT_TOL && g2.abs() < GRADIENT_TOL {
                debug!(iter, a, b, "platt scaling converged");
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = a + step * da;
                let new_b = b + step * db;
                let new_f = objective(scores, &targets, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                debug!(iter, a, b, "platt line search stalled");
                break;
            }
        }

        let calibrator = SigmoidCalibrator::new(a, b);
        if !calibrator.is_finite() {
            return Err(TrainerError::Calibration(format!(
                "fit produced non-finite parameters a={a}, b={b}"
            )));
        }
        Ok(calibrator)
    }
}
