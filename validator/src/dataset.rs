use anyhow::{Context, Result};
use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Functional class of a BRCA1 SNV, already collapsed to the two-class
/// system used for calibration: LOF vs everything functional or
/// intermediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantClass {
    Lof,
    FuncInt,
}

impl fmt::Display for VariantClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantClass::Lof => write!(f, "LOF"),
            VariantClass::FuncInt => write!(f, "FUNC/INT"),
        }
    }
}

fn deserialize_class<'de, D>(deserializer: D) -> Result<VariantClass, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.as_str() {
        "LOF" => Ok(VariantClass::Lof),
        "FUNC" | "INT" | "FUNC/INT" => Ok(VariantClass::FuncInt),
        other => Err(D::Error::custom(format!(
            "unknown func.class value {:?}",
            other
        ))),
    }
}

/// One labeled SNV from the Findlay et al. BRCA1 saturation genome
/// editing table (chromosome 17, GRCh37 coordinates).
#[derive(Debug, Clone, Deserialize)]
pub struct Brca1Record {
    pub chrom: String,
    pub pos: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    #[serde(rename = "class", deserialize_with = "deserialize_class")]
    pub class: VariantClass,
}

/// Loads up to `limit` labeled variants from the dataset CSV.
pub fn load_brca1_dataset(path: &Path, limit: usize) -> Result<Vec<Brca1Record>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize() {
        if records.len() >= limit {
            break;
        }
        let record: Brca1Record = row.context("malformed dataset row")?;
        records.push(record);
    }

    info!("Loaded {} labeled variants from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "chrom,pos,ref,alt,class\n";

    fn write_dataset(rows: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}{}", HEADER, rows).unwrap();
        file
    }

    #[test]
    fn collapses_three_class_labels() {
        let file = write_dataset(
            "17,41276135,T,G,LOF\n17,41276136,A,C,FUNC\n17,41276137,G,T,INT\n",
        );
        let records = load_brca1_dataset(file.path(), 500).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].class, VariantClass::Lof);
        assert_eq!(records[1].class, VariantClass::FuncInt);
        assert_eq!(records[2].class, VariantClass::FuncInt);
        assert_eq!(records[0].ref_allele, "T");
        assert_eq!(records[0].pos, 41276135);
    }

    #[test]
    fn respects_the_row_limit() {
        let file = write_dataset(
            "17,1,A,C,LOF\n17,2,A,C,LOF\n17,3,A,C,FUNC\n17,4,A,C,FUNC\n",
        );
        let records = load_brca1_dataset(file.path(), 2).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn rejects_unknown_class_labels() {
        let file = write_dataset("17,1,A,C,WEIRD\n");
        assert!(load_brca1_dataset(file.path(), 500).is_err());
    }
}
