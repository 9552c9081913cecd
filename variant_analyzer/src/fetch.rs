use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::AnalyzerError;

pub const DEFAULT_WINDOW_SIZE: usize = 8192;
pub const UCSC_API_BASE: &str = "https://api.genome.ucsc.edu";

/// A fetched reference window. `start` is the 0-based inclusive offset of
/// the first base within the chromosome. The sequence may be shorter than
/// requested near a chromosome boundary; that is not an error.
#[derive(Debug, Clone)]
pub struct SequenceWindow {
    pub sequence: String,
    pub start: u64,
}

/// Sequence lookup abstraction so the analysis pipeline can be exercised
/// against deterministic stand-ins instead of the live UCSC API.
pub trait SequenceSource {
    fn fetch_window(
        &self,
        position: u64,
        genome: &str,
        chromosome: &str,
        window_size: usize,
    ) -> Result<SequenceWindow, AnalyzerError>;
}

/// Half-open 0-based coordinates of the window around a 1-based position.
/// The start is clamped at zero; the end is left to the remote service,
/// which clamps against the chromosome length itself.
pub fn window_bounds(position: u64, window_size: usize) -> (u64, u64) {
    let half = (window_size / 2) as u64;
    let zero_based = position.saturating_sub(1);
    let start = zero_based.saturating_sub(half);
    let end = zero_based + half + 1;
    (start, end)
}

#[derive(Deserialize, Debug)]
struct UcscSequencePayload {
    dna: Option<String>,
    error: Option<String>,
}

/// Turns a UCSC payload into the uppercased window sequence. A missing
/// `dna` field is a fetch failure carrying the service's reported error;
/// a shorter-than-requested sequence near a chromosome end is logged and
/// tolerated, since downstream bounds checks handle it.
fn sequence_from_payload(
    payload: UcscSequencePayload,
    expected_length: usize,
) -> Result<String, AnalyzerError> {
    let sequence = match payload.dna {
        Some(dna) => dna.to_uppercase(),
        None => {
            let error = payload.error.unwrap_or_else(|| "Unknown error".to_string());
            return Err(AnalyzerError::Fetch(format!(
                "UCSC API response missing dna field: {}",
                error
            )));
        }
    };

    if sequence.len() != expected_length {
        warn!(
            "Sequence length {} does not match expected length {}",
            sequence.len(),
            expected_length
        );
    }

    Ok(sequence)
}

/// Client for the UCSC `getData/sequence` endpoint.
pub struct UcscClient {
    client: Client,
    base_url: String,
}

impl UcscClient {
    pub fn new() -> Result<Self, AnalyzerError> {
        Self::with_base_url(UCSC_API_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, AnalyzerError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("variant-analyzer/0.1"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AnalyzerError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_with_retry(&self, url: &str, max_attempts: u32) -> Result<UcscSequencePayload, AnalyzerError> {
        let mut attempts = 0;

        loop {
            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| AnalyzerError::Fetch(format!("request to {} failed: {}", url, e)))?;

            if response.status().is_success() {
                return response
                    .json()
                    .map_err(|e| AnalyzerError::Fetch(format!("invalid JSON from {}: {}", url, e)));
            } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;
                if attempts >= max_attempts {
                    return Err(AnalyzerError::Fetch(format!(
                        "exceeded maximum retries for URL: {}",
                        url
                    )));
                }

                let wait_time = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!("Rate limited. Waiting {} seconds before retrying...", wait_time);
                thread::sleep(Duration::from_secs(wait_time));
            } else {
                let status = response.status();
                let error_text = response.text().unwrap_or_default();
                return Err(AnalyzerError::Fetch(format!(
                    "UCSC API returned {} for {}: {}",
                    status, url, error_text
                )));
            }
        }
    }
}

impl SequenceSource for UcscClient {
    fn fetch_window(
        &self,
        position: u64,
        genome: &str,
        chromosome: &str,
        window_size: usize,
    ) -> Result<SequenceWindow, AnalyzerError> {
        let (start, end) = window_bounds(position, window_size);

        info!(
            "Fetching genome sequence for chromosome {}, position {}, window size {}",
            chromosome, position, window_size
        );
        info!("Coordinates: {}:{}-{}", chromosome, start, end);

        let url = format!(
            "{}/getData/sequence?genome={};chrom={};start={};end={}",
            self.base_url, genome, chromosome, start, end
        );
        let payload = self.get_with_retry(&url, 3)?;
        let sequence = sequence_from_payload(payload, (end - start) as usize)?;

        info!(
            "Loaded reference genome sequence window (length: {} bases)",
            sequence.len()
        );

        Ok(SequenceWindow { sequence, start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_bounds_centers_on_position() {
        let (start, end) = window_bounds(43_119_628, 8192);
        assert_eq!(start, 43_119_628 - 1 - 4096);
        assert_eq!(end, 43_119_628 - 1 + 4096 + 1);
        assert_eq!((end - start) as usize, 8193);
        // 1-based position recovered as a 0-based offset into the window.
        assert_eq!(43_119_628 - start - 1, 4096);
    }

    #[test]
    fn window_bounds_clamps_start_at_zero() {
        let (start, end) = window_bounds(10, 8192);
        assert_eq!(start, 0);
        assert_eq!(end, 9 + 4096 + 1);
    }

    #[test]
    fn payload_sequence_is_uppercased() {
        let payload = UcscSequencePayload {
            dna: Some("acgtACGT".to_string()),
            error: None,
        };
        assert_eq!(sequence_from_payload(payload, 8).unwrap(), "ACGTACGT");
    }

    #[test]
    fn missing_dna_surfaces_the_service_error() {
        let payload = UcscSequencePayload {
            dna: None,
            error: Some("chrom not found".to_string()),
        };
        let err = sequence_from_payload(payload, 8).unwrap_err();
        assert!(matches!(err, AnalyzerError::Fetch(_)));
        assert!(err.to_string().contains("chrom not found"));

        let payload = UcscSequencePayload {
            dna: None,
            error: None,
        };
        let err = sequence_from_payload(payload, 8).unwrap_err();
        assert!(err.to_string().contains("Unknown error"));
    }

    #[test]
    fn short_sequence_is_tolerated() {
        // Boundary windows come back shorter than requested; that is
        // logged, not fatal.
        let payload = UcscSequencePayload {
            dna: Some("ACGT".to_string()),
            error: None,
        };
        assert_eq!(sequence_from_payload(payload, 8192).unwrap(), "ACGT");
    }

    #[test]
    fn relative_position_in_range_away_from_ends() {
        for position in [5000u64, 100_000, 43_119_628] {
            let window_size = 8192;
            let (start, _) = window_bounds(position, window_size);
            let relative = position - start - 1;
            assert!((relative as usize) < window_size);
        }
    }
}
