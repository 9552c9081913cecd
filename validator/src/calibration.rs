use anyhow::{ensure, Context, Result};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use tracing::{info, warn};

use variant_analyzer::classify::CalibrationConstants;
use variant_analyzer::scorer::Scorer;
use variant_analyzer::variant::substitute;

use crate::dataset::{Brca1Record, VariantClass};
use crate::roc::{auc, roc_points, youden_threshold, RocPoint};

/// Output of the offline calibration run: the discrimination metric, the
/// derived constants to freeze into the live path, per-variant deltas and
/// the ROC points backing the plot.
#[derive(Debug)]
pub struct CalibrationSummary {
    pub auroc: f64,
    pub constants: CalibrationConstants,
    pub deltas: Vec<ScoredVariant>,
    pub roc: Vec<RocPoint>,
}

#[derive(Debug)]
pub struct ScoredVariant {
    pub record: Brca1Record,
    pub delta_score: f64,
}

/// Reference window and substituted variant sequence for one labeled
/// record, built from the in-memory chromosome sequence.
///
/// Unlike the live fetch path, which clamps only the window start and
/// leaves the end to the remote service, both ends are clamped against
/// the actual sequence here. Positions that do not fall on the supplied
/// sequence at all (0, or past its end, e.g. a wrong-chromosome FASTA)
/// are errors. Returns the 0-based offset of the SNV within the window
/// alongside the two sequences.
pub fn window_pair(
    full_sequence: &str,
    pos_1based: u64,
    alt_allele: &str,
    window_size: usize,
) -> Result<(String, String, usize)> {
    ensure!(pos_1based >= 1, "variant position must be 1-based, got 0");
    let p = (pos_1based - 1) as usize;
    ensure!(
        p < full_sequence.len(),
        "variant position {} lies beyond the reference sequence ({} bases)",
        pos_1based,
        full_sequence.len()
    );

    let half = window_size / 2;
    let start = p.saturating_sub(half);
    let end = (p + half).min(full_sequence.len());
    let ref_seq = &full_sequence[start..end];

    let snv_pos = half.min(p);
    let var_seq = substitute(ref_seq, snv_pos, alt_allele);

    Ok((ref_seq.to_string(), var_seq, snv_pos))
}

/// Scores every labeled variant against its reference window and derives
/// the classification constants: the Youden-optimal delta threshold and
/// the per-class delta dispersions.
pub fn calibrate<M: Scorer>(
    scorer: &M,
    records: &[Brca1Record],
    full_sequence: &str,
    window_size: usize,
) -> Result<CalibrationSummary> {
    ensure!(!records.is_empty(), "no labeled variants to calibrate on");

    // Neighbouring variants share reference windows; score each distinct
    // window once and remember which score every variant maps to.
    let mut ref_seqs: Vec<String> = Vec::new();
    let mut ref_seq_to_index: HashMap<String, usize> = HashMap::new();
    let mut ref_indexes: Vec<usize> = Vec::with_capacity(records.len());
    let mut var_seqs: Vec<String> = Vec::with_capacity(records.len());

    for record in records {
        let (ref_seq, var_seq, snv_pos) =
            window_pair(full_sequence, record.pos, &record.alt_allele, window_size)
                .with_context(|| format!("bad dataset row at {}:{}", record.chrom, record.pos))?;

        let observed = &ref_seq[snv_pos..snv_pos + 1];
        if observed != record.ref_allele {
            warn!(
                "Dataset ref allele {} disagrees with reference base {} at {}:{}",
                record.ref_allele, observed, record.chrom, record.pos
            );
        }

        let index = match ref_seq_to_index.get(&ref_seq) {
            Some(&index) => index,
            None => {
                let index = ref_seqs.len();
                ref_seq_to_index.insert(ref_seq.clone(), index);
                ref_seqs.push(ref_seq);
                index
            }
        };
        ref_indexes.push(index);
        var_seqs.push(var_seq);
    }

    info!(
        "Scoring likelihoods of {} distinct reference sequences...",
        ref_seqs.len()
    );
    let ref_scores = scorer.score_batch(&ref_seqs)?;

    info!("Scoring likelihoods of {} variant sequences...", var_seqs.len());
    let var_scores = scorer.score_batch(&var_seqs)?;

    let deltas: Vec<f64> = var_scores
        .iter()
        .zip(&ref_indexes)
        .map(|(&var_score, &index)| var_score - ref_scores[index])
        .collect();

    // More negative delta is the LOF-like direction, so rank on the
    // negated score and negate the winning threshold back afterwards.
    let labels: Vec<bool> = records
        .iter()
        .map(|r| r.class == VariantClass::Lof)
        .collect();
    let negated: Vec<f64> = deltas.iter().map(|d| -d).collect();

    let roc = roc_points(&negated, &labels);
    let auroc = auc(&roc);
    let threshold = -youden_threshold(&roc);

    let lof_deltas: Vec<f64> = deltas
        .iter()
        .zip(&labels)
        .filter(|(_, &is_lof)| is_lof)
        .map(|(&d, _)| d)
        .collect();
    let func_deltas: Vec<f64> = deltas
        .iter()
        .zip(&labels)
        .filter(|(_, &is_lof)| !is_lof)
        .map(|(&d, _)| d)
        .collect();
    ensure!(
        lof_deltas.len() >= 2 && func_deltas.len() >= 2,
        "need at least two variants per class to estimate dispersions \
         (got {} LOF, {} FUNC/INT)",
        lof_deltas.len(),
        func_deltas.len()
    );

    // Sample (n-1) standard deviations, one per class.
    let lof_class_std = lof_deltas.iter().std_dev();
    let func_class_std = func_deltas.iter().std_dev();

    let constants = CalibrationConstants::new(threshold, lof_class_std, func_class_std)?;

    let scored = records
        .iter()
        .cloned()
        .zip(&deltas)
        .map(|(record, &delta_score)| ScoredVariant {
            record,
            delta_score,
        })
        .collect();

    Ok(CalibrationSummary {
        auroc,
        constants,
        deltas: scored,
        roc,
    })
}
