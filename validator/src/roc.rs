use std::cmp::Ordering;
use tracing::warn;

/// One operating point of a ROC curve. `threshold` is the score at or
/// above which a sample is called positive at this point.
#[derive(Debug, Clone, Copy)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// Computes ROC points over `scores` (higher means more positive-looking)
/// against boolean labels. Tied scores share a single point; the curve
/// starts at (0, 0) and ends at (1, 1).
pub fn roc_points(scores: &[f64], labels: &[bool]) -> Vec<RocPoint> {
    assert_eq!(scores.len(), labels.len());

    let positive_count = labels.iter().filter(|&&l| l).count();
    let negative_count = labels.len() - positive_count;

    if positive_count == 0 || negative_count == 0 {
        warn!("All samples are in one class; ROC curve is degenerate");
        return vec![
            RocPoint {
                threshold: f64::INFINITY,
                fpr: 0.0,
                tpr: 0.0,
            },
            RocPoint {
                threshold: f64::NEG_INFINITY,
                fpr: 1.0,
                tpr: 1.0,
            },
        ];
    }

    let mut paired: Vec<(f64, bool)> = scores
        .iter()
        .copied()
        .zip(labels.iter().copied())
        .collect();
    paired.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < paired.len() {
        let threshold = paired[i].0;
        // Consume the whole tie group before emitting a point.
        while i < paired.len() && paired[i].0 == threshold {
            if paired[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            fpr: fp as f64 / negative_count as f64,
            tpr: tp as f64 / positive_count as f64,
        });
    }

    points
}

/// Area under the ROC curve by the trapezoidal rule.
pub fn auc(points: &[RocPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut auc = 0.0;
    for i in 1..points.len() {
        let width = points[i].fpr - points[i - 1].fpr;
        let height = (points[i].tpr + points[i - 1].tpr) / 2.0;
        auc += width * height;
    }
    auc
}

/// Score threshold maximizing Youden's J statistic (tpr - fpr). The first
/// maximum wins when several points tie.
pub fn youden_threshold(points: &[RocPoint]) -> f64 {
    let mut best = f64::NEG_INFINITY;
    let mut threshold = 0.0;
    for point in points {
        let j = point.tpr - point.fpr;
        if j > best {
            best = j;
            threshold = point.threshold;
        }
    }
    threshold
}
