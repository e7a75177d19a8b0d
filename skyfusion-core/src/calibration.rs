//! Confidence calibrator (§4.K): per-task Platt scaling, trained by batch
//! gradient descent over recorded outcomes.

use crate::config::CalibrationConfig;
use crate::types::CalibrationModel;

/// Applies Platt scaling: `1 / (1 + exp(A*raw + B))`, clamped to [0,1].
/// Returns `raw` unchanged when the model has fewer than the configured
/// minimum sample count — an untrained calibrator is a no-op, not a
/// degenerate transform.
pub fn calibrate(model: &CalibrationModel, raw: f64, cfg: &CalibrationConfig) -> f64 {
    if model.sample_count < cfg.min_sample_count {
        return raw;
    }
    let z = model.a * raw + model.b;
    (1.0 / (1.0 + z.exp())).clamp(0.0, 1.0)
}

/// One recorded (raw_score, outcome) pair used for training.
#[derive(Debug, Clone, Copy)]
pub struct Outcome {
    pub raw_score: f64,
    pub verified: bool,
}

/// Trains Platt parameters via batch gradient descent on logistic loss,
/// using up to `max_training_outcomes` most recent outcomes.
pub fn train(outcomes: &[Outcome], cfg: &CalibrationConfig) -> CalibrationModel {
    let data: Vec<&Outcome> = outcomes.iter().rev().take(cfg.max_training_outcomes).collect();
    if data.is_empty() {
        return CalibrationModel::default();
    }

    let mut a: f64 = 1.0;
    let mut b: f64 = 0.0;
    let n = data.len() as f64;

    for _ in 0..cfg.training_iterations {
        let mut grad_a = 0.0;
        let mut grad_b = 0.0;
        for o in &data {
            let z = a * o.raw_score + b;
            let pred = 1.0 / (1.0 + z.exp());
            let y = if o.verified { 1.0 } else { 0.0 };
            let err = pred - y;
            grad_a += err * o.raw_score;
            grad_b += err;
        }
        a -= cfg.learning_rate * grad_a / n;
        b -= cfg.learning_rate * grad_b / n;
    }

    let ece = expected_calibration_error(&data, a, b, cfg.ece_bins);

    CalibrationModel {
        a,
        b,
        sample_count: data.len() as u32,
        ece,
    }
}

fn expected_calibration_error(data: &[&Outcome], a: f64, b: f64, bins: usize) -> f64 {
    if data.is_empty() || bins == 0 {
        return 0.0;
    }
    let mut bin_conf = vec![0.0; bins];
    let mut bin_acc = vec![0.0; bins];
    let mut bin_count = vec![0usize; bins];

    for o in data {
        let z = a * o.raw_score + b;
        let pred = (1.0 / (1.0 + z.exp())).clamp(0.0, 1.0);
        let idx = ((pred * bins as f64) as usize).min(bins - 1);
        bin_conf[idx] += pred;
        bin_acc[idx] += if o.verified { 1.0 } else { 0.0 };
        bin_count[idx] += 1;
    }

    let n = data.len() as f64;
    (0..bins)
        .filter(|&i| bin_count[i] > 0)
        .map(|i| {
            let count = bin_count[i] as f64;
            let avg_conf = bin_conf[i] / count;
            let avg_acc = bin_acc[i] / count;
            (count / n) * (avg_conf - avg_acc).abs()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibrate_is_identity_below_sample_floor() {
        let cfg = CalibrationConfig {
            min_sample_count: 50,
            max_training_outcomes: 1000,
            training_iterations: 1000,
            learning_rate: 0.1,
            ece_bins: 10,
            threat_valid_window_hours: 6.0,
        };
        let model = CalibrationModel { a: 2.0, b: 1.0, sample_count: 10, ece: 0.0 };
        assert_eq!(calibrate(&model, 0.7, &cfg), 0.7);
    }

    #[test]
    fn test_calibrate_applies_platt_scaling_once_trained() {
        let cfg = CalibrationConfig {
            min_sample_count: 50,
            max_training_outcomes: 1000,
            training_iterations: 1000,
            learning_rate: 0.1,
            ece_bins: 10,
            threat_valid_window_hours: 6.0,
        };
        let model = CalibrationModel { a: -4.0, b: 0.0, sample_count: 100, ece: 0.0 };
        let out = calibrate(&model, 0.9, &cfg);
        assert!(out > 0.7, "got {out}");
    }

    #[test]
    fn test_train_produces_discriminating_model() {
        let cfg = CalibrationConfig {
            min_sample_count: 50,
            max_training_outcomes: 1000,
            training_iterations: 200,
            learning_rate: 0.1,
            ece_bins: 10,
            threat_valid_window_hours: 6.0,
        };
        let mut outcomes = Vec::new();
        for _ in 0..30 {
            outcomes.push(Outcome { raw_score: 0.9, verified: true });
            outcomes.push(Outcome { raw_score: 0.1, verified: false });
        }
        let model = train(&outcomes, &cfg);
        let high = calibrate(&model, 0.9, &cfg);
        let low = calibrate(&model, 0.1, &cfg);
        assert!(high > low, "high={high} low={low}");
    }
}
