use super::params::{BondReference, ForcefieldParams, VdwParam};
use super::potentials::{
    harmonic, harmonic_derivative, lennard_jones_12_6, lennard_jones_12_6_derivative,
};
use super::term::EnergyTerm;
use super::topology::Topology;
use crate::core::models::structure::Structure;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error, PartialEq)]
pub enum CalculatorError {
    #[error("Calculator was set up for {expected} atoms but received {found}")]
    AtomCountMismatch { expected: usize, found: usize },
    #[error("Energy evaluation produced a non-finite value")]
    NonFinite,
}

/// Energy and per-atom forces (negative gradient, kcal/mol/Angstrom).
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub energy: EnergyTerm,
    pub forces: Vec<Vector3<f64>>,
}

impl Evaluation {
    pub fn max_force(&self) -> f64 {
        self.forces.iter().map(|f| f.norm()).fold(0.0, f64::max)
    }

    /// Root mean square over all Cartesian force components.
    pub fn forces_rms(&self) -> f64 {
        if self.forces.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.forces.iter().map(|f| f.norm_squared()).sum();
        (sum_sq / (3 * self.forces.len()) as f64).sqrt()
    }
}

/// Supplies energies and forces for a structure.
pub trait Calculator: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, structure: &Structure) -> Result<Evaluation, CalculatorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculatorKind {
    /// No calculator: optimizations are skipped and energy properties omitted.
    None,
    #[default]
    Classical,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown calculator '{0}'. Expected 'none' or 'classical'.")]
pub struct ParseCalculatorKindError(pub String);

impl FromStr for CalculatorKind {
    type Err = ParseCalculatorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(CalculatorKind::None),
            "classical" | "ff" => Ok(CalculatorKind::Classical),
            _ => Err(ParseCalculatorKindError(s.to_string())),
        }
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculatorKind::None => f.write_str("none"),
            CalculatorKind::Classical => f.write_str("classical"),
        }
    }
}

/// Creates the calculator selected by `kind` for `structure`, or `None` when disabled.
pub fn build_calculator(
    kind: CalculatorKind,
    structure: &Structure,
    params: &ForcefieldParams,
) -> Option<Box<dyn Calculator>> {
    match kind {
        CalculatorKind::None => None,
        CalculatorKind::Classical => Some(Box::new(ClassicalCalculator::new(structure, params))),
    }
}

#[derive(Debug, Clone, Copy)]
struct SpringPair {
    i: usize,
    j: usize,
    r0: f64,
    k: f64,
}

#[derive(Debug, Clone, Copy)]
struct VdwPair {
    i: usize,
    j: usize,
    param: VdwParam,
}

/// Harmonic bonds and 1-3 distances plus Lennard-Jones between non-excluded pairs.
///
/// Topology and reference distances are taken from the structure given at
/// construction and stay fixed for the lifetime of the calculator.
#[derive(Debug, Clone)]
pub struct ClassicalCalculator {
    n_atoms: usize,
    bonds: Vec<SpringPair>,
    angles: Vec<SpringPair>,
    vdw_pairs: Vec<VdwPair>,
    cutoff: f64,
}

impl ClassicalCalculator {
    pub fn new(structure: &Structure, params: &ForcefieldParams) -> Self {
        let globals = &params.globals;
        let atoms = structure.atoms();
        let topology = Topology::infer(structure, globals.bond_tolerance);
        let distance = |i: usize, j: usize| (atoms[i].position - atoms[j].position).norm();

        let bonds = topology
            .bonds
            .iter()
            .map(|&(i, j)| {
                let r0 = match globals.bond_reference {
                    BondReference::Input => distance(i, j),
                    BondReference::Covalent => {
                        atoms[i].element.covalent_radius() + atoms[j].element.covalent_radius()
                    }
                };
                SpringPair {
                    i,
                    j,
                    r0,
                    k: globals.bond_force_constant,
                }
            })
            .collect();

        let angles = topology
            .angles
            .iter()
            .map(|&(i, j)| SpringPair {
                i,
                j,
                r0: distance(i, j),
                k: globals.angle_force_constant,
            })
            .collect();

        let vdw_pairs: Vec<VdwPair> = (0..atoms.len())
            .tuple_combinations()
            .filter(|&(i, j)| !topology.is_excluded(i, j))
            .map(|(i, j)| VdwPair {
                i,
                j,
                param: params
                    .vdw_for(atoms[i].element)
                    .combine(&params.vdw_for(atoms[j].element)),
            })
            .collect();

        debug!(
            atoms = atoms.len(),
            bonds = topology.bonds.len(),
            angles = topology.angles.len(),
            vdw_pairs = vdw_pairs.len(),
            fragments = topology.fragments().len(),
            "Classical calculator set up."
        );

        Self {
            n_atoms: atoms.len(),
            bonds,
            angles,
            vdw_pairs,
            cutoff: globals.nonbonded_cutoff,
        }
    }
}

struct Accumulator {
    energy: f64,
    forces: Vec<Vector3<f64>>,
}

impl Accumulator {
    fn new(n: usize) -> Self {
        Self {
            energy: 0.0,
            forces: vec![Vector3::zeros(); n],
        }
    }

    /// Adds a radial pair term with energy `e` and derivative `de_dr`.
    fn add_pair(&mut self, i: usize, j: usize, rij: &Vector3<f64>, dist: f64, e: f64, de_dr: f64) {
        self.energy += e;
        if dist > 0.0 {
            let force_on_i = rij * (-de_dr / dist);
            self.forces[i] += force_on_i;
            self.forces[j] -= force_on_i;
        }
    }

    fn merge(mut self, other: Accumulator) -> Self {
        self.energy += other.energy;
        for (a, b) in self.forces.iter_mut().zip(other.forces) {
            *a += b;
        }
        self
    }
}

trait PairTerm: Sync {
    fn atoms(&self) -> (usize, usize);
}

impl PairTerm for SpringPair {
    fn atoms(&self) -> (usize, usize) {
        (self.i, self.j)
    }
}

impl PairTerm for VdwPair {
    fn atoms(&self) -> (usize, usize) {
        (self.i, self.j)
    }
}

/// Sums a radial term over `pairs`. `term` returns `(energy, dE/dr)` or `None` to skip.
fn sum_pairs<T, F>(pairs: &[T], positions: &[Point3<f64>], term: F) -> Accumulator
where
    T: PairTerm,
    F: Fn(&T, f64) -> Option<(f64, f64)> + Sync,
{
    let n = positions.len();
    let apply = |mut acc: Accumulator, pair: &T| {
        let (i, j) = pair.atoms();
        let rij = positions[i] - positions[j];
        let dist = rij.norm();
        if let Some((e, de_dr)) = term(pair, dist) {
            acc.add_pair(i, j, &rij, dist, e, de_dr);
        }
        acc
    };

    #[cfg(feature = "parallel")]
    {
        pairs
            .par_iter()
            .fold(|| Accumulator::new(n), apply)
            .reduce(|| Accumulator::new(n), Accumulator::merge)
    }

    #[cfg(not(feature = "parallel"))]
    {
        pairs.iter().fold(Accumulator::new(n), apply)
    }
}

impl Calculator for ClassicalCalculator {
    fn name(&self) -> &str {
        "classical"
    }

    fn evaluate(&self, structure: &Structure) -> Result<Evaluation, CalculatorError> {
        if structure.len() != self.n_atoms {
            return Err(CalculatorError::AtomCountMismatch {
                expected: self.n_atoms,
                found: structure.len(),
            });
        }
        let positions = structure.positions();

        let spring = |p: &SpringPair, dist: f64| {
            Some((harmonic(dist, p.r0, p.k), harmonic_derivative(dist, p.r0, p.k)))
        };
        let cutoff = self.cutoff;
        let vdw = |p: &VdwPair, dist: f64| {
            if dist > cutoff {
                return None;
            }
            Some((
                lennard_jones_12_6(dist, p.param.radius, p.param.well_depth),
                lennard_jones_12_6_derivative(dist, p.param.radius, p.param.well_depth),
            ))
        };

        let bond = sum_pairs(&self.bonds, &positions, spring);
        let angle = sum_pairs(&self.angles, &positions, spring);
        let nonbonded = sum_pairs(&self.vdw_pairs, &positions, vdw);

        let energy = EnergyTerm::new(bond.energy, angle.energy, nonbonded.energy);
        let forces = bond.merge(angle).merge(nonbonded).forces;

        if !energy.total().is_finite() || forces.iter().any(|f| !f.iter().all(|c| c.is_finite())) {
            return Err(CalculatorError::NonFinite);
        }
        Ok(Evaluation { energy, forces })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn params() -> ForcefieldParams {
        ForcefieldParams::builtin().unwrap()
    }

    fn water() -> Structure {
        Structure::from_parts(
            &["O", "H", "H"],
            &[
                Point3::new(0.0, 0.0, 0.119),
                Point3::new(0.0, 0.757, -0.476),
                Point3::new(0.0, -0.757, -0.476),
            ],
        )
        .unwrap()
    }

    fn numeric_forces(calc: &dyn Calculator, structure: &Structure) -> Vec<Vector3<f64>> {
        let h = 1e-5;
        let base = structure.positions();
        (0..structure.len())
            .map(|i| {
                let mut f = Vector3::zeros();
                for dim in 0..3 {
                    let mut plus = base.clone();
                    let mut minus = base.clone();
                    plus[i][dim] += h;
                    minus[i][dim] -= h;
                    let mut sp = structure.clone();
                    let mut sm = structure.clone();
                    sp.set_positions(&plus).unwrap();
                    sm.set_positions(&minus).unwrap();
                    let ep = calc.evaluate(&sp).unwrap().energy.total();
                    let em = calc.evaluate(&sm).unwrap().energy.total();
                    f[dim] = -(ep - em) / (2.0 * h);
                }
                f
            })
            .collect()
    }

    #[test]
    fn reference_geometry_has_zero_bonded_energy() {
        let calc = ClassicalCalculator::new(&water(), &params());
        let eval = calc.evaluate(&water()).unwrap();
        assert_eq!(calc.bonds.len(), 2);
        assert!(eval.energy.bond.abs() < 1e-12);
        assert!(eval.energy.angle.abs() < 1e-12);
        assert_eq!(eval.energy.vdw, 0.0);
        assert!(eval.max_force() < 1e-9);
    }

    #[test]
    fn stretched_bond_is_pulled_back() {
        let calc = ClassicalCalculator::new(&water(), &params());
        let mut stretched = water();
        let mut positions = stretched.positions();
        positions[1].y += 0.1;
        stretched.set_positions(&positions).unwrap();

        let eval = calc.evaluate(&stretched).unwrap();
        assert!(eval.energy.bond > 0.0);
        assert!(eval.forces[1].y < 0.0);
    }

    #[test]
    fn analytic_forces_match_finite_differences() {
        let complex = water().concat(&water().translated(&Vector3::new(0.3, 0.2, 3.0)));
        let calc = ClassicalCalculator::new(&complex, &params());

        let mut perturbed = complex.clone();
        let mut positions = perturbed.positions();
        positions[0].x += 0.05;
        positions[4].z -= 0.08;
        perturbed.set_positions(&positions).unwrap();

        let analytic = calc.evaluate(&perturbed).unwrap().forces;
        let numeric = numeric_forces(&calc, &perturbed);
        for (a, n) in analytic.iter().zip(&numeric) {
            assert!((a - n).norm() < 1e-4, "analytic {:?} vs numeric {:?}", a, n);
        }
    }

    #[test]
    fn net_force_is_zero() {
        let complex = water().concat(&water().translated(&Vector3::new(0.0, 0.0, 2.8)));
        let calc = ClassicalCalculator::new(&complex, &params());
        let eval = calc.evaluate(&complex).unwrap();
        let net = eval.forces.iter().fold(Vector3::zeros(), |acc, f| acc + f);
        assert!(net.norm() < 1e-9);
        assert!(eval.energy.vdw != 0.0);
    }

    #[test]
    fn pairs_beyond_cutoff_do_not_interact() {
        let complex = water().concat(&water().translated(&Vector3::new(0.0, 0.0, 50.0)));
        let calc = ClassicalCalculator::new(&complex, &params());
        let eval = calc.evaluate(&complex).unwrap();
        assert_eq!(eval.energy.vdw, 0.0);
    }

    #[test]
    fn evaluate_rejects_structures_of_a_different_size() {
        let calc = ClassicalCalculator::new(&water(), &params());
        let err = calc.evaluate(&Structure::new()).unwrap_err();
        assert_eq!(
            err,
            CalculatorError::AtomCountMismatch {
                expected: 3,
                found: 0
            }
        );
    }

    #[test]
    fn forces_rms_averages_over_components() {
        let eval = Evaluation {
            energy: EnergyTerm::default(),
            forces: vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(-1.0, -1.0, -1.0)],
        };
        assert!((eval.forces_rms() - 1.0).abs() < 1e-12);
        assert!((eval.max_force() - 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn calculator_kind_parses_and_displays() {
        assert_eq!("none".parse::<CalculatorKind>(), Ok(CalculatorKind::None));
        assert_eq!(
            "Classical".parse::<CalculatorKind>(),
            Ok(CalculatorKind::Classical)
        );
        assert!("gemnet".parse::<CalculatorKind>().is_err());
        assert_eq!(CalculatorKind::Classical.to_string(), "classical");
    }

    #[test]
    fn build_calculator_honours_kind() {
        assert!(build_calculator(CalculatorKind::None, &water(), &params()).is_none());
        let calc = build_calculator(CalculatorKind::Classical, &water(), &params()).unwrap();
        assert_eq!(calc.name(), "classical");
    }
}
