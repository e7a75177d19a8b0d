//! Adaptive thresholds (§4.L): a per-(task, name) Beta-distributed
//! decision threshold that drifts toward the Beta mode as confusion-matrix
//! evidence accumulates.

use crate::types::AdaptiveThreshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfusionCell {
    TruePositive,
    FalsePositive,
    TrueNegative,
    FalseNegative,
}

fn classify(predicted_positive: bool, actual_positive: bool) -> ConfusionCell {
    match (predicted_positive, actual_positive) {
        (true, true) => ConfusionCell::TruePositive,
        (true, false) => ConfusionCell::FalsePositive,
        (false, false) => ConfusionCell::TrueNegative,
        (false, true) => ConfusionCell::FalseNegative,
    }
}

/// Tallies one outcome, adjusts alpha/beta, and moves `current_value`
/// toward the Beta mode `(alpha-1)/(alpha+beta-2)`, clamped to
/// [min_value, max_value].
pub fn update(mut threshold: AdaptiveThreshold, predicted_positive: bool, actual_positive: bool) -> AdaptiveThreshold {
    match classify(predicted_positive, actual_positive) {
        ConfusionCell::TruePositive => {
            threshold.tp += 1;
            threshold.alpha += 1.0;
        }
        ConfusionCell::FalsePositive => {
            threshold.fp += 1;
            threshold.beta += 1.0;
        }
        ConfusionCell::TrueNegative => {
            threshold.tn += 1;
            threshold.alpha += 1.0;
        }
        ConfusionCell::FalseNegative => {
            threshold.fn_ += 1;
            threshold.beta += 1.0;
        }
    }

    let denom = threshold.alpha + threshold.beta - 2.0;
    if denom > 1e-9 {
        let mode = (threshold.alpha - 1.0) / denom;
        threshold.current_value = mode.clamp(threshold.min_value, threshold.max_value);
    }

    threshold
}

/// Result of applying a threshold to a raw score.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdResult {
    pub exceeds: bool,
    pub confidence: f64,
}

/// Applies the current threshold to `score`: `exceeds` is whether score
/// clears the bar, `confidence` is the normalized distance from the bar.
pub fn apply(threshold: &AdaptiveThreshold, score: f64) -> ThresholdResult {
    let exceeds = score >= threshold.current_value;
    let denom = threshold.current_value.max(1.0 - threshold.current_value).max(1e-9);
    let confidence = (score - threshold.current_value).abs() / denom;
    ThresholdResult { exceeds, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_value_stays_within_bounds() {
        let mut t = AdaptiveThreshold::default();
        for _ in 0..50 {
            t = update(t, true, true);
        }
        assert!(t.current_value >= t.min_value && t.current_value <= t.max_value);
    }

    #[test]
    fn test_false_positives_push_threshold_up() {
        let mut t = AdaptiveThreshold::default();
        let initial = t.current_value;
        for _ in 0..20 {
            t = update(t, true, false);
        }
        assert!(t.current_value >= initial);
        assert!(t.current_value <= t.max_value);
    }

    #[test]
    fn test_apply_reports_exceeds_correctly() {
        let t = AdaptiveThreshold::default();
        let result = apply(&t, 0.9);
        assert!(result.exceeds);
        let result = apply(&t, 0.1);
        assert!(!result.exceeds);
    }
}
