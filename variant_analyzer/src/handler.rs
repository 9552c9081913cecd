use tracing::info;

use crate::classify::{classify, CalibrationConstants};
use crate::error::AnalyzerError;
use crate::fetch::SequenceSource;
use crate::scorer::Scorer;
use crate::variant::{substitute, ClassificationResult, VariantRequest};

/// Runs the full single-variant pipeline: fetch window, splice the
/// alternate allele, score both sequences, classify the delta.
///
/// The reference and variant sequences are scored with two independent
/// single-sequence calls on this path; batching only pays off in the
/// offline calibration run.
pub fn analyze_variant<S, M>(
    source: &S,
    scorer: &M,
    constants: &CalibrationConstants,
    request: &VariantRequest,
    window_size: usize,
) -> Result<ClassificationResult, AnalyzerError>
where
    S: SequenceSource,
    M: Scorer,
{
    info!(
        "Analyzing variant {}:{} alt {} ({})",
        request.chromosome, request.variant_pos, request.alt_allele, request.genome
    );

    let window = source.fetch_window(
        request.variant_pos,
        &request.genome,
        &request.chromosome,
        window_size,
    )?;

    let relative = request.variant_pos as i64 - window.start as i64 - 1;
    // The second length check also covers windows that came back shorter
    // than requested at a chromosome boundary.
    if relative < 0 || relative as usize >= window_size || relative as usize >= window.sequence.len()
    {
        return Err(AnalyzerError::OutOfBounds {
            position: request.variant_pos,
            relative_pos: relative,
            window_start: window.start,
            window_len: window.sequence.len(),
            window_size,
        });
    }
    let relative = relative as usize;
    info!("Relative position: {}", relative);

    let reference_allele = window.sequence[relative..relative + 1].to_string();
    info!("Reference allele: {}", reference_allele);

    let variant_sequence = substitute(&window.sequence, relative, &request.alt_allele);

    let ref_score = single_score(scorer, &window.sequence)?;
    info!("Reference score: {}", ref_score);
    let var_score = single_score(scorer, &variant_sequence)?;
    info!("Variant score: {}", var_score);

    let (delta_score, prediction, confidence) = classify(ref_score, var_score, constants);
    info!("Delta score: {}", delta_score);

    Ok(ClassificationResult {
        reference: reference_allele,
        variant: request.alt_allele.clone(),
        delta_score,
        prediction,
        confidence,
        position: request.variant_pos,
    })
}

fn single_score<M: Scorer>(scorer: &M, sequence: &str) -> Result<f64, AnalyzerError> {
    let batch = [sequence.to_string()];
    let scores = scorer.score_batch(&batch)?;
    scores
        .into_iter()
        .next()
        .ok_or_else(|| AnalyzerError::Scorer("scorer returned no score".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Prediction;
    use crate::fetch::SequenceWindow;
    use std::cell::RefCell;

    struct StubSource {
        sequence: String,
        start: u64,
    }

    impl SequenceSource for StubSource {
        fn fetch_window(
            &self,
            _position: u64,
            _genome: &str,
            _chromosome: &str,
            _window_size: usize,
        ) -> Result<SequenceWindow, AnalyzerError> {
            Ok(SequenceWindow {
                sequence: self.sequence.clone(),
                start: self.start,
            })
        }
    }

    /// Returns queued scores one call at a time, recording each batch.
    struct QueueScorer {
        responses: RefCell<Vec<f64>>,
        batches: RefCell<Vec<Vec<String>>>,
    }

    impl QueueScorer {
        fn new(responses: Vec<f64>) -> Self {
            Self {
                responses: RefCell::new(responses),
                batches: RefCell::new(Vec::new()),
            }
        }
    }

    impl Scorer for QueueScorer {
        fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>, AnalyzerError> {
            self.batches.borrow_mut().push(sequences.to_vec());
            let mut responses = self.responses.borrow_mut();
            Ok(sequences.iter().map(|_| responses.remove(0)).collect())
        }
    }

    fn request(position: u64) -> VariantRequest {
        VariantRequest {
            variant_pos: position,
            alt_allele: "G".to_string(),
            genome: "hg38".to_string(),
            chromosome: "chr17".to_string(),
        }
    }

    #[test]
    fn pipeline_classifies_a_variant() {
        let source = StubSource {
            sequence: "AACCTTGG".to_string(),
            start: 99,
        };
        // Reference scored first, then variant; delta = -0.002.
        let scorer = QueueScorer::new(vec![-1.0, -1.002]);
        let constants = CalibrationConstants::brca1();

        // relative = 103 - 99 - 1 = 3 -> reference allele C.
        let result = analyze_variant(&source, &scorer, &constants, &request(103), 8).unwrap();

        assert_eq!(result.reference, "C");
        assert_eq!(result.variant, "G");
        assert_eq!(result.position, 103);
        assert!((result.delta_score + 0.002).abs() < 1e-12);
        assert_eq!(result.prediction, Prediction::LikelyPathogenic);
        assert!((result.confidence - 0.7148).abs() < 1e-3);

        let batches = scorer.batches.borrow();
        assert_eq!(batches.len(), 2, "two independent single-sequence calls");
        assert_eq!(batches[0], vec!["AACCTTGG".to_string()]);
        assert_eq!(batches[1], vec!["AACGTTGG".to_string()]);
    }

    #[test]
    fn position_before_window_is_rejected() {
        let source = StubSource {
            sequence: "AACCTTGG".to_string(),
            start: 200,
        };
        let scorer = QueueScorer::new(vec![]);
        let constants = CalibrationConstants::brca1();

        let err = analyze_variant(&source, &scorer, &constants, &request(150), 8).unwrap_err();
        assert!(matches!(err, AnalyzerError::OutOfBounds { .. }));
        assert!(scorer.batches.borrow().is_empty(), "no scoring on invalid input");
    }

    #[test]
    fn short_window_is_rejected_when_offset_exceeds_it() {
        // Requested size 8 but the service returned 4 bases; an offset of
        // 5 is inside the requested window but outside the real one.
        let source = StubSource {
            sequence: "AACC".to_string(),
            start: 99,
        };
        let scorer = QueueScorer::new(vec![]);
        let constants = CalibrationConstants::brca1();

        let err = analyze_variant(&source, &scorer, &constants, &request(105), 8).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::OutOfBounds { window_len: 4, .. }
        ));
    }
}
