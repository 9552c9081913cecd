use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

/// Reads the first sequence record from a FASTA file, plain or gzipped.
/// The calibration run only needs the single chromosome 17 record, so any
/// further records are ignored. The sequence is uppercased to match what
/// the live fetch path returns.
pub fn read_first_sequence(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let is_gzipped = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "gz")
        .unwrap_or(false);

    let reader: Box<dyn Read> = if is_gzipped {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let reader = BufReader::new(reader);

    let mut sequence = String::new();
    let mut in_record = false;
    for line in reader.lines() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.starts_with('>') {
            if in_record {
                break;
            }
            in_record = true;
            continue;
        }
        if !in_record {
            bail!("{} is not a FASTA file (no header line)", path.display());
        }
        sequence.push_str(line.trim_end().to_uppercase().as_str());
    }

    if sequence.is_empty() {
        bail!("no sequence data found in {}", path.display());
    }

    info!(
        "Loaded reference sequence ({} bases) from {}",
        sequence.len(),
        path.display()
    );
    Ok(sequence)
}
