use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::forcefield::calculator::CalculatorError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::io::gjf::GjfError;
use crate::core::io::xyz::XyzError;
use crate::core::models::structure::StructureError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read structure from {path:?}: {source}")]
    Read { path: PathBuf, source: GjfError },

    #[error("Failed to write Gaussian input {path:?}: {source}")]
    WriteGjf { path: PathBuf, source: GjfError },

    #[error("Failed to write trajectory {path:?}: {source}")]
    WriteTrajectory { path: PathBuf, source: XyzError },

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Force field parameters could not be loaded: {source}")]
    Forcefield {
        #[from]
        source: ParamLoadError,
    },

    #[error("Energy evaluation failed: {source}")]
    Calculator {
        #[from]
        source: CalculatorError,
    },

    #[error("Invalid structure: {source}")]
    Structure {
        #[from]
        source: StructureError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("The {role} structure contains no atoms")]
    EmptyStructure { role: &'static str },

    #[error("Failed to serialize property report: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}
