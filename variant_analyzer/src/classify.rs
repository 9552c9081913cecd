use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::AnalyzerError;

/// Constants derived from a one-time offline calibration run against the
/// BRCA1 saturation genome editing dataset (see the `validator` crate).
/// They are a frozen snapshot, never recomputed on the live path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationConstants {
    pub threshold: f64,
    pub lof_class_std: f64,
    pub func_class_std: f64,
}

impl CalibrationConstants {
    /// Both standard deviations are used as divisors and must be
    /// strictly positive; a violation is a fatal configuration error.
    pub fn new(threshold: f64, lof_class_std: f64, func_class_std: f64) -> Result<Self, AnalyzerError> {
        Self {
            threshold,
            lof_class_std,
            func_class_std,
        }
        .validated()
    }

    /// Snapshot of the calibration run over the first 500 BRCA1 variants.
    pub fn brca1() -> Self {
        Self {
            threshold: -0.0009178519,
            lof_class_std: 0.0015140239,
            func_class_std: 0.0009016589,
        }
    }

    /// Loads recalibrated constants from a JSON file, e.g. the
    /// `calibration_constants.json` written by the validator.
    pub fn from_json_file(path: &Path) -> Result<Self, AnalyzerError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::InvalidConstants(format!("cannot read {}: {}", path.display(), e))
        })?;
        let constants: Self = serde_json::from_str(&raw).map_err(|e| {
            AnalyzerError::InvalidConstants(format!("cannot parse {}: {}", path.display(), e))
        })?;
        constants.validated()
    }

    fn validated(self) -> Result<Self, AnalyzerError> {
        if !(self.lof_class_std > 0.0) {
            return Err(AnalyzerError::InvalidConstants(format!(
                "lof_class_std must be > 0, got {}",
                self.lof_class_std
            )));
        }
        if !(self.func_class_std > 0.0) {
            return Err(AnalyzerError::InvalidConstants(format!(
                "func_class_std must be > 0, got {}",
                self.func_class_std
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prediction {
    #[serde(rename = "Likely pathogenic")]
    LikelyPathogenic,
    #[serde(rename = "Likely benign")]
    LikelyBenign,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::LikelyPathogenic => write!(f, "Likely pathogenic"),
            Prediction::LikelyBenign => write!(f, "Likely benign"),
        }
    }
}

/// Converts a reference/variant score pair into a pathogenicity call.
///
/// A delta below the threshold means the model finds the variant sequence
/// less plausible than the reference, which correlates with loss of
/// function. The confidence is the distance from the threshold scaled by
/// the class-conditional score dispersion, capped at 1.0: a bounded
/// distance signal, not a calibrated probability.
pub fn classify(
    ref_score: f64,
    var_score: f64,
    constants: &CalibrationConstants,
) -> (f64, Prediction, f64) {
    let delta = var_score - ref_score;

    if delta < constants.threshold {
        let confidence = ((delta - constants.threshold).abs() / constants.lof_class_std).min(1.0);
        (delta, Prediction::LikelyPathogenic, confidence)
    } else {
        let confidence = ((delta - constants.threshold).abs() / constants.func_class_std).min(1.0);
        (delta, Prediction::LikelyBenign, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brca1_snapshot_classifies_known_delta() {
        let constants = CalibrationConstants::brca1();
        let (delta, prediction, confidence) = classify(0.0, -0.002, &constants);
        assert_eq!(delta, -0.002);
        assert_eq!(prediction, Prediction::LikelyPathogenic);
        assert!((confidence - 0.7148).abs() < 1e-3);
    }

    #[test]
    fn delta_at_or_above_threshold_is_benign() {
        let constants = CalibrationConstants::brca1();
        let (_, prediction, _) = classify(0.0, constants.threshold, &constants);
        assert_eq!(prediction, Prediction::LikelyBenign);
        let (_, prediction, _) = classify(0.0, 0.001, &constants);
        assert_eq!(prediction, Prediction::LikelyBenign);
    }

    #[test]
    fn classification_is_monotonic_in_delta() {
        let constants = CalibrationConstants::brca1();
        let mut seen_benign = false;
        // Sweep delta upwards; once a benign call appears, no later
        // (larger) delta may flip back to pathogenic.
        for step in -100..100 {
            let delta = step as f64 * 1e-4;
            let (_, prediction, _) = classify(0.0, delta, &constants);
            if prediction == Prediction::LikelyBenign {
                seen_benign = true;
            } else {
                assert!(!seen_benign, "pathogenic call after benign at delta {}", delta);
            }
        }
        assert!(seen_benign);
    }

    #[test]
    fn confidence_is_bounded() {
        let constants = CalibrationConstants::brca1();
        for step in -1000..1000 {
            let delta = step as f64 * 1e-3;
            let (_, _, confidence) = classify(0.0, delta, &constants);
            assert!((0.0..=1.0).contains(&confidence), "confidence {} for delta {}", confidence, delta);
        }
    }

    #[test]
    fn non_positive_stds_are_rejected() {
        assert!(CalibrationConstants::new(0.0, 0.0, 1.0).is_err());
        assert!(CalibrationConstants::new(0.0, 1.0, -0.1).is_err());
        assert!(CalibrationConstants::new(0.0, 1.0, 1.0).is_ok());
    }
}
