use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The sequence lookup service failed or returned a malformed payload.
    #[error("failed to fetch genome sequence: {0}")]
    Fetch(String),

    /// The variant position maps outside the fetched window. Never
    /// silently clamped; surfaced as a request-validation failure.
    #[error(
        "variant position {position} maps to offset {relative_pos} outside the fetched window \
         (window start {window_start}, length {window_len}, requested size {window_size})"
    )]
    OutOfBounds {
        position: u64,
        relative_pos: i64,
        window_start: u64,
        window_len: usize,
        window_size: usize,
    },

    /// The scoring oracle failed or returned the wrong number of scores.
    #[error("sequence scorer failed: {0}")]
    Scorer(String),

    /// The calibration constants violate their invariants (both class
    /// standard deviations must be strictly positive).
    #[error("invalid calibration constants: {0}")]
    InvalidConstants(String),
}
