use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, error, info};

use crate::error::AnalyzerError;

/// Sequence likelihood oracle. Returns one score per input sequence,
/// order-preserving. Scores are log-likelihood-style values; no
/// determinism is guaranteed across model versions.
pub trait Scorer {
    fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>, AnalyzerError>;
}

#[derive(Debug, Clone)]
pub struct Evo2ScorerOptions {
    pub python_executable: String,
    pub scorer_script: String,
    pub model_name: String,
}

impl Default for Evo2ScorerOptions {
    fn default() -> Self {
        Self {
            python_executable: "python3".to_string(),
            scorer_script: "scripts/score_sequences.py".to_string(),
            model_name: "evo2_7b".to_string(),
        }
    }
}

/// Scores sequences by shelling out to the Evo 2 scoring script.
///
/// Sequences are written one per line to a temporary work directory; the
/// script is expected to write one float per line to the output path.
pub struct Evo2CommandScorer {
    options: Evo2ScorerOptions,
}

impl Evo2CommandScorer {
    pub fn new(options: Evo2ScorerOptions) -> Self {
        Self { options }
    }
}

impl Scorer for Evo2CommandScorer {
    fn score_batch(&self, sequences: &[String]) -> Result<Vec<f64>, AnalyzerError> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let workdir = TempDir::new()
            .map_err(|e| AnalyzerError::Scorer(format!("failed to create work directory: {}", e)))?;
        let input_path = workdir.path().join("sequences.txt");
        let output_path = workdir.path().join("scores.txt");

        let mut input = File::create(&input_path)
            .map_err(|e| AnalyzerError::Scorer(format!("failed to write scorer input: {}", e)))?;
        for sequence in sequences {
            writeln!(input, "{}", sequence)
                .map_err(|e| AnalyzerError::Scorer(format!("failed to write scorer input: {}", e)))?;
        }

        info!(
            "Scoring likelihoods of {} sequences with {}...",
            sequences.len(),
            self.options.model_name
        );

        let output = Command::new(&self.options.python_executable)
            .arg(&self.options.scorer_script)
            .arg("--model")
            .arg(&self.options.model_name)
            .arg("--input")
            .arg(&input_path)
            .arg("--output")
            .arg(&output_path)
            .output()
            .map_err(|e| AnalyzerError::Scorer(format!("failed to launch scorer: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Scorer STDERR: {}", stderr);
            return Err(AnalyzerError::Scorer(format!(
                "scorer exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let reader = BufReader::new(File::open(&output_path).map_err(|e| {
            AnalyzerError::Scorer(format!("scorer produced no output file: {}", e))
        })?);

        let mut scores = Vec::with_capacity(sequences.len());
        for line in reader.lines() {
            let line =
                line.map_err(|e| AnalyzerError::Scorer(format!("failed to read scores: {}", e)))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let score = trimmed.parse::<f64>().map_err(|e| {
                AnalyzerError::Scorer(format!("unparseable score line {:?}: {}", trimmed, e))
            })?;
            scores.push(score);
        }

        if scores.len() != sequences.len() {
            return Err(AnalyzerError::Scorer(format!(
                "scorer returned {} scores for {} sequences",
                scores.len(),
                sequences.len()
            )));
        }

        debug!("Scored {} sequences", scores.len());
        Ok(scores)
    }
}
