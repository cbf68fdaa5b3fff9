//! Binary classification metrics
//!
//! Predictions are positive when `probability >= threshold`. Precision,
//! recall and F1 are 0 when their denominator is 0.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TrainerError};

/// Number of thresholds examined by [`threshold_sweep`]
pub const SWEEP_STEPS: usize = 101;

fn check_inputs(probs: &[f64], labels: &[bool]) -> Result<()> {
    if probs.len() != labels.len() {
        return Err(TrainerError::Metrics(format!(
            "probabilities ({}) and labels ({}) must have same length",
            probs.len(),
            labels.len()
        )));
    }
    if probs.is_empty() {
        return Err(TrainerError::Metrics("empty input".to_string()));
    }
    Ok(())
}

/// Confusion matrix counts at a decision threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub fn at_threshold(probs: &[f64], labels: &[bool], threshold: f64) -> Self {
        let mut counts = Self::default();
        for (&p, &label) in probs.iter().zip(labels) {
            match (p >= threshold, label) {
                (true, true) => counts.true_positive += 1,
                (true, false) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
                (false, true) => counts.false_negative += 1,
            }
        }
        counts
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// `2 TP / (2 TP + FP + FN)`
    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }

    pub fn accuracy(&self) -> f64 {
        ratio(
            self.true_positive + self.true_negative,
            self.true_positive + self.true_negative + self.false_positive + self.false_negative,
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// F1 score at a decision threshold
pub fn f1_score(probs: &[f64], labels: &[bool], threshold: f64) -> Result<f64> {
    check_inputs(probs, labels)?;
    Ok(ConfusionCounts::at_threshold(probs, labels, threshold).f1())
}

/// Mean squared error between probability and outcome
pub fn brier_score(probs: &[f64], labels: &[bool]) -> Result<f64> {
    check_inputs(probs, labels)?;
    let sum: f64 = probs
        .iter()
        .zip(labels)
        .map(|(&p, &y)| (p - if y { 1.0 } else { 0.0 }).powi(2))
        .sum();
    Ok(sum / probs.len() as f64)
}

/// Area under the ROC curve via the rank-sum statistic; tied scores share
/// their average rank.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Result<f64> {
    check_inputs(scores, labels)?;
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(TrainerError::Metrics(
            "ROC AUC is undefined when only one class is present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; positions start..end share the mean rank.
        let mean_rank = (start + 1 + end) as f64 / 2.0;
        let tied_pos = order[start..end].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += mean_rank * tied_pos as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Outcome of a decision-threshold sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearch {
    pub threshold: f64,
    pub f1: f64,
}

/// `steps` equally spaced thresholds from 0 to 1 inclusive
pub fn sweep_thresholds(steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = 1.0 / (steps - 1) as f64;
            (0..steps)
                .map(|i| if i == steps - 1 { 1.0 } else { i as f64 * step })
                .collect()
        }
    }
}

/// Pick the F1-maximizing threshold.
///
/// Only a strictly greater F1 replaces the incumbent, so the lowest
/// threshold wins ties. Starts from threshold 0 with F1 0.
pub fn threshold_sweep(probs: &[f64], labels: &[bool], steps: usize) -> Result<ThresholdSearch> {
    check_inputs(probs, labels)?;

    let mut best = ThresholdSearch {
        threshold: 0.0,
        f1: 0.0,
    };
    for t in sweep_thresholds(steps) {
        let f1 = ConfusionCounts::at_threshold(probs, labels, t).f1();
        if f1 > best.f1 {
            best = ThresholdSearch { threshold: t, f1 };
        }
    }
    Ok(best)
}
