//! Per-group accuracy, disparity index and the biased-mode adjustments.
//!
//! The adjustments are simulation heuristics: a dataset flagged as biased
//! has its confidence scaled down by measured accuracy and its disparity
//! scaled up by a fixed factor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Factor applied to the disparity index in biased mode. Not capped.
pub const BIASED_DISPARITY_FACTOR: f64 = 1.5;

/// Decision threshold for the binary risk label. A tie is "Low".
pub const HIGH_RISK_THRESHOLD: f64 = 0.5;

/// Below this overall accuracy, scaled class counts are floored at 1.
pub const DISTRIBUTION_FLOOR_ACCURACY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub accuracy: f64,
    pub count: u64,
}

/// Encoded ancestry value (as a string) → metrics for that group.
pub type FairnessMetrics = BTreeMap<String, GroupMetrics>;

/// Fraction of positions where prediction equals truth. 0.0 when empty.
pub fn accuracy(y_true: &[i64], y_pred: &[i64]) -> Result<f64, ScoreError> {
    if y_true.len() != y_pred.len() {
        return Err(ScoreError::ShapeMismatch(format!(
            "{} labels vs {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Ok(0.0);
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Accuracy restricted to each distinct ancestry value.
/// Only groups that actually occur are present, so every count is ≥ 1.
pub fn group_accuracy(
    y_true: &[i64],
    y_pred: &[i64],
    ancestry: &[i64],
) -> Result<FairnessMetrics, ScoreError> {
    if y_true.len() != y_pred.len() || y_true.len() != ancestry.len() {
        return Err(ScoreError::ShapeMismatch(format!(
            "{} labels, {} predictions, {} ancestry values",
            y_true.len(),
            y_pred.len(),
            ancestry.len()
        )));
    }

    // group -> (correct, total)
    let mut tallies: BTreeMap<i64, (u64, u64)> = BTreeMap::new();
    for ((t, p), g) in y_true.iter().zip(y_pred).zip(ancestry) {
        let entry = tallies.entry(*g).or_insert((0, 0));
        if t == p {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    Ok(tallies
        .into_iter()
        .map(|(group, (correct, total))| {
            (
                group.to_string(),
                GroupMetrics { accuracy: correct as f64 / total as f64, count: total },
            )
        })
        .collect())
}

/// Spread between the best and worst group accuracy; 0.0 for no groups.
pub fn disparity_index(metrics: &FairnessMetrics) -> f64 {
    let mut accs = metrics.values().map(|m| m.accuracy);
    let Some(first) = accs.next() else {
        return 0.0;
    };
    let (min, max) = accs.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a)));
    max - min
}

pub fn amplify_disparity(disparity: f64, is_biased: bool) -> f64 {
    if is_biased {
        disparity * BIASED_DISPARITY_FACTOR
    } else {
        disparity
    }
}

/// Scale the mean positive-class probability by overall accuracy in biased
/// mode, clamped to [0, 1]. Unbiased scores pass through untouched.
pub fn adjust_risk(base_risk: f64, overall_accuracy: f64, is_biased: bool) -> f64 {
    if is_biased {
        (base_risk * overall_accuracy).clamp(0.0, 1.0)
    } else {
        base_risk
    }
}

/// Scale class counts by overall accuracy in biased mode, flooring each at 1
/// when accuracy is below one half.
pub fn adjust_distribution(
    counts: &BTreeMap<String, u64>,
    overall_accuracy: f64,
    is_biased: bool,
) -> BTreeMap<String, f64> {
    counts
        .iter()
        .map(|(class, &n)| {
            let mut v = n as f64;
            if is_biased {
                v *= overall_accuracy;
                if overall_accuracy < DISTRIBUTION_FLOOR_ACCURACY {
                    v = v.max(1.0);
                }
            }
            (class.clone(), v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_group_scenario() {
        // A: 2/2 correct, B: 1/2 correct
        let y_true   = [1, 0, 1, 0];
        let y_pred   = [1, 0, 1, 1];
        let ancestry = [0, 0, 1, 1];
        let metrics = group_accuracy(&y_true, &y_pred, &ancestry).unwrap();

        let mut expected = FairnessMetrics::new();
        expected.insert("0".into(), GroupMetrics { accuracy: 1.0, count: 2 });
        expected.insert("1".into(), GroupMetrics { accuracy: 0.5, count: 2 });
        assert_eq!(metrics, expected);
        assert_eq!(disparity_index(&metrics), 0.5);
    }

    #[test]
    fn test_empty_groups() {
        let metrics = group_accuracy(&[], &[], &[]).unwrap();
        assert!(metrics.is_empty());
        assert_eq!(disparity_index(&metrics), 0.0);
    }

    #[test]
    fn test_single_group_has_zero_disparity() {
        let metrics = group_accuracy(&[1, 0, 1], &[1, 1, 1], &[3, 3, 3]).unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics["3"].count, 3);
        assert_eq!(disparity_index(&metrics), 0.0);
    }

    #[test]
    fn test_group_metrics_bounds() {
        let y_true   = [0, 1, 2, 0, 1, 2, 0, 1];
        let y_pred   = [0, 2, 2, 1, 1, 0, 0, 0];
        let ancestry = [0, 1, 2, 3, 0, 1, 2, 3];
        let metrics = group_accuracy(&y_true, &y_pred, &ancestry).unwrap();
        let total: u64 = metrics.values().map(|m| m.count).sum();
        assert_eq!(total, 8);
        for m in metrics.values() {
            assert!(m.count >= 1);
            assert!((0.0..=1.0).contains(&m.accuracy));
        }
        let accs: Vec<f64> = metrics.values().map(|m| m.accuracy).collect();
        let max = accs.iter().copied().fold(f64::MIN, f64::max);
        let min = accs.iter().copied().fold(f64::MAX, f64::min);
        assert_eq!(disparity_index(&metrics), max - min);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(group_accuracy(&[1, 0], &[1], &[0, 0]).is_err());
        assert!(accuracy(&[1], &[]).is_err());
    }

    #[test]
    fn test_amplification_is_uncapped() {
        assert_eq!(amplify_disparity(0.5, false), 0.5);
        assert_eq!(amplify_disparity(0.5, true), 0.75);
        assert_eq!(amplify_disparity(0.9, true), 0.9 * 1.5);
        assert!(amplify_disparity(0.9, true) > 1.0);
    }

    #[test]
    fn test_risk_adjustment() {
        assert_eq!(adjust_risk(0.8, 0.5, false), 0.8);
        assert!((adjust_risk(0.8, 0.5, true) - 0.4).abs() < 1e-12);
        assert_eq!(adjust_risk(1.0, 1.0, true), 1.0);
    }

    #[test]
    fn test_distribution_floor_at_low_accuracy() {
        let mut counts = BTreeMap::new();
        counts.insert("Adenocarcinoma".to_string(), 10);
        counts.insert("SCLC".to_string(), 2);

        let raw = adjust_distribution(&counts, 0.4, false);
        assert_eq!(raw["Adenocarcinoma"], 10.0);
        assert_eq!(raw["SCLC"], 2.0);

        let scaled = adjust_distribution(&counts, 0.4, true);
        assert!((scaled["Adenocarcinoma"] - 4.0).abs() < 1e-12);
        // 2 × 0.4 = 0.8, floored to 1
        assert_eq!(scaled["SCLC"], 1.0);
    }

    #[test]
    fn test_distribution_no_floor_at_high_accuracy() {
        let mut counts = BTreeMap::new();
        counts.insert("SCLC".to_string(), 1);
        let scaled = adjust_distribution(&counts, 0.6, true);
        assert!((scaled["SCLC"] - 0.6).abs() < 1e-12);
    }
}
