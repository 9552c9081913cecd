use serde::{Deserialize, Serialize};

use crate::classify::Prediction;

/// JSON request body for the single-variant path.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantRequest {
    pub variant_pos: u64,
    pub alt_allele: String,
    pub genome: String,
    pub chromosome: String,
}

/// JSON response body for the single-variant path.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub reference: String,
    pub variant: String,
    pub delta_score: f64,
    pub prediction: Prediction,
    pub confidence: f64,
    pub position: u64,
}

/// Splices a single-nucleotide substitution into a window sequence.
///
/// Pure string operation; callers must have validated
/// `relative_pos < window.len()` first (the request handler rejects
/// out-of-range offsets before ever reaching this point).
pub fn substitute(window: &str, relative_pos: usize, alt_allele: &str) -> String {
    let mut out = String::with_capacity(window.len());
    out.push_str(&window[..relative_pos]);
    out.push_str(alt_allele);
    out.push_str(&window[relative_pos + 1..]);
    out
}
