use crate::core::forcefield::calculator::CalculatorKind;
use crate::core::io::gjf::GjfWriteOptions;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SEPARATION: f64 = 3.0;
pub const DEFAULT_OUTPUT_TITLE: &str = "Optimized Absorbent-Analyte Complex";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Convergence and step control for one BFGS run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizationSettings {
    /// Converged once every per-atom force norm is at or below this (kcal/mol/Angstrom).
    pub fmax: f64,
    pub steps: usize,
    /// Largest displacement of any single atom per step (Angstrom).
    pub max_step: f64,
    /// Diagonal of the initial Hessian guess (kcal/mol/Angstrom^2).
    pub initial_curvature: f64,
    /// Keep a [`Frame`](super::optimizer::Frame) per iteration.
    pub record_trajectory: bool,
}

impl OptimizationSettings {
    pub const fn individual() -> Self {
        Self {
            fmax: 0.05,
            steps: 200,
            max_step: 0.2,
            initial_curvature: 70.0,
            record_trajectory: false,
        }
    }

    pub const fn complex() -> Self {
        Self {
            steps: 300,
            ..Self::individual()
        }
    }

    fn validate(&self, scope: &'static str) -> Result<(), ConfigError> {
        positive(scope, "fmax", self.fmax)?;
        positive(scope, "max_step", self.max_step)?;
        positive(scope, "initial_curvature", self.initial_curvature)
    }
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self::individual()
    }
}

fn positive(scope: &'static str, name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: scope,
            reason: format!("{} must be a positive finite number, got {}", name, value),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub calculator: CalculatorKind,
    /// Force field parameter file; the built-in set is used when absent.
    pub forcefield_path: Option<PathBuf>,
    pub individual: OptimizationSettings,
    pub complex: OptimizationSettings,
    /// Offset along z between the two centers of mass (Angstrom).
    pub separation: f64,
    pub seed: Option<u64>,
    pub record_trajectory: bool,
    pub output: GjfWriteOptions,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    calculator: Option<CalculatorKind>,
    forcefield_path: Option<PathBuf>,
    individual: Option<OptimizationSettings>,
    complex: Option<OptimizationSettings>,
    separation: Option<f64>,
    seed: Option<u64>,
    record_trajectory: bool,
    output: Option<GjfWriteOptions>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calculator(mut self, kind: CalculatorKind) -> Self {
        self.calculator = Some(kind);
        self
    }
    pub fn forcefield_path(mut self, path: Option<PathBuf>) -> Self {
        self.forcefield_path = path;
        self
    }
    pub fn individual(mut self, settings: OptimizationSettings) -> Self {
        self.individual = Some(settings);
        self
    }
    pub fn complex(mut self, settings: OptimizationSettings) -> Self {
        self.complex = Some(settings);
        self
    }
    pub fn separation(mut self, separation: f64) -> Self {
        self.separation = Some(separation);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn record_trajectory(mut self, record: bool) -> Self {
        self.record_trajectory = record;
        self
    }
    pub fn output(mut self, options: GjfWriteOptions) -> Self {
        self.output = Some(options);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let calculator = self
            .calculator
            .ok_or(ConfigError::MissingParameter("calculator"))?;

        let mut individual = self.individual.unwrap_or_else(OptimizationSettings::individual);
        individual.validate("individual optimization")?;
        individual.record_trajectory = self.record_trajectory;
        let mut complex = self.complex.unwrap_or_else(OptimizationSettings::complex);
        complex.validate("complex optimization")?;
        complex.record_trajectory = self.record_trajectory;

        let separation = self.separation.unwrap_or(DEFAULT_SEPARATION);
        positive("complex", "separation", separation)?;

        let output = self.output.unwrap_or_else(|| GjfWriteOptions {
            title: DEFAULT_OUTPUT_TITLE.to_string(),
            ..GjfWriteOptions::default()
        });
        if output.multiplicity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "output",
                reason: "multiplicity must be at least 1".to_string(),
            });
        }

        Ok(AnalysisConfig {
            calculator,
            forcefield_path: self.forcefield_path,
            individual,
            complex,
            separation,
            seed: self.seed,
            record_trajectory: self.record_trajectory,
            output,
        })
    }
}
