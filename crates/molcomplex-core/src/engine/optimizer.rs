//! Quasi-Newton geometry optimization.
//!
//! The step follows the standard BFGS scheme: an approximate Hessian
//! starts as a scaled identity and is refined from successive force differences,
//! the step is obtained from its eigen-decomposition, and the step is scaled down
//! whenever any atom would move further than `max_step`.

use super::config::OptimizationSettings;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::forcefield::calculator::{
    Calculator, CalculatorError, CalculatorKind, build_calculator,
};
use crate::core::forcefield::params::ForcefieldParams;
use crate::core::models::structure::Structure;
use nalgebra::{DMatrix, DVector, Point3, SymmetricEigen, Vector3};
use tracing::{debug, info, warn};

const MIN_DISPLACEMENT: f64 = 1e-7;
const MIN_CURVATURE: f64 = 1e-12;

/// A snapshot of the structure after an optimizer iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub step: usize,
    pub energy: f64,
    pub max_force: f64,
    pub structure: Structure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    pub structure: Structure,
    pub steps: usize,
    pub converged: bool,
    /// `None` when no calculator was available.
    pub initial_energy: Option<f64>,
    pub final_energy: Option<f64>,
    /// Starting geometry followed by one frame per step, when recording was requested.
    pub trajectory: Vec<Frame>,
}

impl OptimizationOutcome {
    /// The outcome of not optimizing at all.
    pub fn unchanged(structure: &Structure) -> Self {
        Self {
            structure: structure.clone(),
            steps: 0,
            converged: false,
            initial_energy: None,
            final_energy: None,
            trajectory: Vec::new(),
        }
    }
}

/// BFGS state over flattened Cartesian coordinates.
pub struct Bfgs {
    max_step: f64,
    initial_curvature: f64,
    hessian: Option<DMatrix<f64>>,
    previous: Option<(DVector<f64>, DVector<f64>)>,
}

impl Bfgs {
    pub fn new(settings: &OptimizationSettings) -> Self {
        Self {
            max_step: settings.max_step,
            initial_curvature: settings.initial_curvature,
            hessian: None,
            previous: None,
        }
    }

    /// Returns the next positions given the current positions and forces.
    pub fn step(&mut self, positions: &[Point3<f64>], forces: &[Vector3<f64>]) -> Vec<Point3<f64>> {
        let r = flatten(positions.iter().map(|p| &p.coords));
        let f = flatten(forces.iter());
        self.update(&r, &f);

        let alpha = self.initial_curvature;
        let hessian = self
            .hessian
            .get_or_insert_with(|| DMatrix::identity(r.len(), r.len()) * alpha);
        let eigen = SymmetricEigen::new(hessian.clone());
        let projected = eigen.eigenvectors.transpose() * &f;
        let scaled = DVector::from_iterator(
            projected.len(),
            projected
                .iter()
                .zip(eigen.eigenvalues.iter())
                .map(|(p, w)| p / w.abs().max(MIN_CURVATURE)),
        );
        let mut dr = &eigen.eigenvectors * scaled;

        let longest = dr
            .as_slice()
            .chunks(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]).norm())
            .fold(0.0, f64::max);
        if longest >= self.max_step {
            dr *= self.max_step / longest;
        }

        self.previous = Some((r.clone(), f));
        let next = r + dr;
        next.as_slice()
            .chunks(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect()
    }

    fn update(&mut self, r: &DVector<f64>, f: &DVector<f64>) {
        let (Some(hessian), Some((r0, f0))) = (self.hessian.as_mut(), self.previous.as_ref()) else {
            return;
        };
        let dr = r - r0;
        if dr.amax() < MIN_DISPLACEMENT {
            return;
        }
        // Gradient difference; forces are the negative gradient.
        let dg = f0 - f;
        let a = dr.dot(&dg);
        let h_dr = &*hessian * &dr;
        let b = dr.dot(&h_dr);
        if a <= MIN_CURVATURE || b <= MIN_CURVATURE {
            debug!(a, b, "Skipping Hessian update with non-positive curvature");
            return;
        }
        *hessian += &dg * dg.transpose() / a - &h_dr * h_dr.transpose() / b;
    }
}

fn flatten<'a>(vectors: impl Iterator<Item = &'a Vector3<f64>>) -> DVector<f64> {
    DVector::from_vec(vectors.flat_map(|v| [v.x, v.y, v.z]).collect())
}

/// Relaxes `structure` with `calculator` until converged or out of steps.
pub fn minimize(
    calculator: &dyn Calculator,
    structure: &Structure,
    settings: &OptimizationSettings,
    reporter: &ProgressReporter,
) -> Result<OptimizationOutcome, CalculatorError> {
    let mut current = structure.clone();
    let mut evaluation = calculator.evaluate(&current)?;
    let initial_energy = evaluation.energy.total();
    let mut trajectory = Vec::new();
    if settings.record_trajectory {
        trajectory.push(Frame {
            step: 0,
            energy: initial_energy,
            max_force: evaluation.max_force(),
            structure: current.clone(),
        });
    }

    let mut bfgs = Bfgs::new(settings);
    let mut steps = 0;
    let mut converged = false;

    reporter.report(Progress::TaskStart {
        total_steps: settings.steps as u64,
    });
    loop {
        let max_force = evaluation.max_force();
        if max_force <= settings.fmax {
            converged = true;
            break;
        }
        if steps >= settings.steps {
            break;
        }

        let next = bfgs.step(&current.positions(), &evaluation.forces);
        current
            .set_positions(&next)
            .map_err(|_| CalculatorError::AtomCountMismatch {
                expected: structure.len(),
                found: next.len(),
            })?;
        evaluation = calculator.evaluate(&current)?;
        steps += 1;

        let energy = evaluation.energy.total();
        let max_force = evaluation.max_force();
        debug!(step = steps, energy, max_force, "{} BFGS step", calculator.name());
        if settings.record_trajectory {
            trajectory.push(Frame {
                step: steps,
                energy,
                max_force,
                structure: current.clone(),
            });
        }
        reporter.report(Progress::OptimizerStep {
            step: steps,
            energy,
            max_force,
        });
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let final_energy = evaluation.energy.total();
    if converged {
        info!(
            "Optimization converged in {} steps ({:.4} -> {:.4} kcal/mol)",
            steps, initial_energy, final_energy
        );
    } else {
        warn!(
            "Optimization stopped after {} steps without reaching fmax {} (max force {:.4})",
            steps,
            settings.fmax,
            evaluation.max_force()
        );
    }

    Ok(OptimizationOutcome {
        structure: current,
        steps,
        converged,
        initial_energy: Some(initial_energy),
        final_energy: Some(final_energy),
        trajectory,
    })
}

/// Optimizes with an existing calculator, or returns the input untouched without one.
pub fn optimize_with(
    calculator: Option<&dyn Calculator>,
    structure: &Structure,
    settings: &OptimizationSettings,
    reporter: &ProgressReporter,
) -> Result<OptimizationOutcome, EngineError> {
    match calculator {
        Some(calc) => Ok(minimize(calc, structure, settings, reporter)?),
        None => {
            warn!("No calculator available; returning the unoptimized structure.");
            Ok(OptimizationOutcome::unchanged(structure))
        }
    }
}

/// Builds the calculator selected by `kind` for `structure` and relaxes it.
pub fn optimize_structure(
    structure: &Structure,
    kind: CalculatorKind,
    params: &ForcefieldParams,
    settings: &OptimizationSettings,
    reporter: &ProgressReporter,
) -> Result<OptimizationOutcome, EngineError> {
    let calculator = build_calculator(kind, structure, params);
    optimize_with(calculator.as_deref(), structure, settings, reporter)
}
