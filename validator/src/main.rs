use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use variant_analyzer::fetch::DEFAULT_WINDOW_SIZE;
use variant_analyzer::scorer::{Evo2CommandScorer, Evo2ScorerOptions};

mod calibration;
mod dataset;
mod fasta;
mod plots;
mod roc;

use calibration::CalibrationSummary;

/// Offline calibration run: scores the labeled BRCA1 SNVs with Evo 2,
/// reports the zero-shot AUROC, and derives the classification constants
/// consumed by the live single-variant path.
#[derive(Parser, Debug)]
#[command(name = "validator")]
struct Args {
    /// Labeled BRCA1 variants CSV (chrom,pos,ref,alt,class columns).
    #[arg(long)]
    dataset: PathBuf,

    /// Reference chromosome 17 FASTA (GRCh37), optionally gzipped.
    #[arg(long)]
    reference: PathBuf,

    #[arg(long, default_value = "./calibration_results")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Number of dataset rows to calibrate on.
    #[arg(long, default_value_t = 500)]
    limit: usize,

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
    info!("Starting BRCA1 calibration run");

    let records = dataset::load_brca1_dataset(&args.dataset, args.limit)?;
    let full_sequence = fasta::read_first_sequence(&args.reference)?;

    let scorer = Evo2CommandScorer::new(Evo2ScorerOptions {
        python_executable: args.python.clone(),
        scorer_script: args.scorer_script.clone(),
        model_name: args.model.clone(),
    });

    let summary = calibration::calibrate(&scorer, &records, &full_sequence, args.window_size)?;

    info!("AUROC of zero-shot predictions: {:.4}", summary.auroc);
    info!(
        "Derived constants: threshold={:.10}, lof_class_std={:.10}, func_class_std={:.10}",
        summary.constants.threshold,
        summary.constants.lof_class_std,
        summary.constants.func_class_std
    );

    create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;

    let constants_path = args.output_dir.join("calibration_constants.json");
    serde_json::to_writer_pretty(File::create(&constants_path)?, &summary.constants)?;
    info!("Calibration constants saved to: {}", constants_path.display());

    write_delta_csv(&args.output_dir.join("delta_scores.csv"), &summary)?;

    plots::draw_roc_plot(
        &args.output_dir.join("roc_curve.png"),
        &summary.roc,
        summary.auroc,
    )?;
    plots::draw_delta_distribution(
        &args.output_dir.join("delta_distribution.png"),
        &summary.deltas,
        summary.constants.threshold,
    )?;

    info!("Calibration run complete");
    Ok(())
}

fn write_delta_csv(path: &Path, summary: &CalibrationSummary) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    wtr.write_record(["chrom", "pos", "ref", "alt", "class", "evo2_delta_score"])?;
    for variant in &summary.deltas {
        wtr.write_record(&[
            variant.record.chrom.clone(),
            variant.record.pos.to_string(),
            variant.record.ref_allele.clone(),
            variant.record.alt_allele.clone(),
            variant.record.class.to_string(),
            format!("{:.10}", variant.delta_score),
        ])?;
    }
    wtr.flush()?;

    info!("Delta scores saved to: {}", path.display());
    Ok(())
}
