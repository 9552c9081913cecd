//! Zero-shot single-nucleotide variant effect analysis with a genomic
//! foundation model.
//!
//! The live path is: fetch a reference window around the variant from the
//! UCSC sequence API, splice the alternate allele into it, score both
//! sequences with an external Evo 2 scorer, and turn the likelihood delta
//! into a pathogenicity call using constants calibrated offline against
//! the BRCA1 saturation genome editing dataset (see the `validator` crate
//! for the calibration run).

pub mod classify;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod scorer;
pub mod variant;
