//! # Workflows Module
//!
//! The user-facing entry points: assembling an absorbent-analyte complex and the
//! complete analysis pipeline built on it.
//!
//! [`analyze::run`] performs every computational step and returns an
//! [`analyze::AnalysisResult`]; [`analyze::write_outputs`] persists it.
//! [`analyze::batch_pairs`] enumerates the pairings of a directory of inputs.

pub mod analyze;
pub mod complex;
