//! # molcomplex Core Library
//!
//! Builds absorbent-analyte complexes from Gaussian input files, relaxes them
//! with a classical force field and reports heuristic molecular properties.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Element`),
//!   GJF and XYZ file formats, the classical force field with its `Calculator`
//!   trait, and the property estimators.
//!
//! - **[`engine`]: The Logic Core.** Analysis configuration, the BFGS optimizer,
//!   progress reporting and the engine error type.
//!
//! - **[`workflows`]: The Public API.** Complex assembly and the end-to-end
//!   analysis pipeline, including output writing and batch pairing.

pub mod core;
pub mod engine;
pub mod workflows;
