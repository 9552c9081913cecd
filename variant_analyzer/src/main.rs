use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use variant_analyzer::classify::CalibrationConstants;
use variant_analyzer::fetch::{UcscClient, DEFAULT_WINDOW_SIZE};
use variant_analyzer::handler::analyze_variant;
use variant_analyzer::scorer::{Evo2CommandScorer, Evo2ScorerOptions};
use variant_analyzer::variant::VariantRequest;

/// Scores a single-nucleotide variant with Evo 2 and reports a
/// pathogenicity call, as JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "variant_analyzer")]
struct Args {
    /// JSON request file with variant_pos, alt_allele, genome and
    /// chromosome fields; `-` reads from stdin. Overrides the flags below.
    #[arg(long)]
    request: Option<String>,

    /// 1-based variant position.
    #[arg(long)]
    position: Option<u64>,

    /// Alternate allele (single base).
    #[arg(long)]
    alt: Option<String>,

    #[arg(long, default_value = "hg38")]
    genome: String,

    #[arg(long, default_value = "chr17")]
    chromosome: String,

    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Calibration constants JSON; defaults to the frozen BRCA1 snapshot.
    #[arg(long)]
    constants: Option<PathBuf>,

    #[arg(long, default_value = "python3")]
    python: String,

    #[arg(long, default_value = "scripts/score_sequences.py")]
    scorer_script: String,

    #[arg(long, default_value = "evo2_7b")]
    model: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let request = read_request(&args)?;
    validate_alt_allele(&request.alt_allele)?;

    let constants = match &args.constants {
        Some(path) => CalibrationConstants::from_json_file(path)?,
        None => CalibrationConstants::brca1(),
    };

    let source = UcscClient::new()?;
    let scorer = Evo2CommandScorer::new(Evo2ScorerOptions {
        python_executable: args.python.clone(),
        scorer_script: args.scorer_script.clone(),
        model_name: args.model.clone(),
    });

    let result = analyze_variant(&source, &scorer, &constants, &request, args.window_size)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// The substitution is byte-wise, so anything other than exactly one
/// nucleotide letter would corrupt the spliced sequence.
fn validate_alt_allele(alt: &str) -> Result<()> {
    if !matches!(alt, "A" | "C" | "G" | "T" | "a" | "c" | "g" | "t") {
        bail!("alternate allele must be a single base (A/C/G/T), got {:?}", alt);
    }
    Ok(())
}

fn read_request(args: &Args) -> Result<VariantRequest> {
    if let Some(path) = &args.request {
        let raw = if path == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read request file {}", path))?
        };
        return serde_json::from_str(&raw).context("invalid variant request JSON");
    }

    let (Some(position), Some(alt)) = (args.position, args.alt.clone()) else {
        bail!("either --request or both --position and --alt must be given");
    };

    Ok(VariantRequest {
        variant_pos: position,
        alt_allele: alt,
        genome: args.genome.clone(),
        chromosome: args.chromosome.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alt_allele_must_be_one_nucleotide() {
        for alt in ["A", "C", "G", "T", "g", "t"] {
            assert!(validate_alt_allele(alt).is_ok());
        }
        // Multi-byte single chars pass a char count check but would
        // splice more than one byte into the sequence.
        for alt in ["", "AG", "N", "é", "Ä", "-"] {
            assert!(validate_alt_allele(alt).is_err(), "accepted {:?}", alt);
        }
    }
}
