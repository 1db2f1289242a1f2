use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use phf::{Map, phf_map};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use std::f64::consts::PI;

/// Van der Waals radii in Angstroms used for the volume estimate.
#[rustfmt::skip]
static VDW_RADII: Map<&'static str, f64> = phf_map! {
    "H" => 1.2, "C" => 1.7, "N" => 1.55, "O" => 1.52, "S" => 1.8, "P" => 1.8,
};
const DEFAULT_VDW_RADIUS: f64 = 1.5;

const BINDING_SITE_ELEMENTS: [Element; 3] = [Element::O, Element::N, Element::S];
const CHROMOPHORE_ELEMENTS: [Element; 3] = [Element::C, Element::N, Element::O];

const UV_VIS_BASE_NM: f64 = 200.0;
const UV_VIS_SLOPE_NM: f64 = 30.0;
const UV_VIS_CAP_NM: f64 = 800.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindingSite {
    pub atom_index: usize,
    pub element: Element,
    pub position: [f64; 3],
}

pub fn vdw_radius(element: Element) -> f64 {
    VDW_RADII
        .get(element.symbol())
        .copied()
        .unwrap_or(DEFAULT_VDW_RADIUS)
}

/// Sum of atomic van der Waals sphere volumes, in cubic Angstroms.
pub fn molecular_volume(structure: &Structure) -> f64 {
    structure
        .elements()
        .map(|e| 4.0 / 3.0 * PI * vdw_radius(e).powi(3))
        .sum()
}

/// Volume-proportional polarizability estimate.
pub fn polarizability(structure: &Structure) -> f64 {
    0.1 * molecular_volume(structure)
}

/// Every oxygen, nitrogen and sulfur atom, in structure order.
pub fn binding_sites(structure: &Structure) -> Vec<BindingSite> {
    structure
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, atom)| BINDING_SITE_ELEMENTS.contains(&atom.element))
        .map(|(atom_index, atom)| BindingSite {
            atom_index,
            element: atom.element,
            position: [atom.position.x, atom.position.y, atom.position.z],
        })
        .collect()
}

/// Characteristic stretch frequencies (cm^-1) implied by element presence, ascending.
pub fn ir_frequencies(structure: &Structure) -> Vec<u32> {
    let has = |e: Element| structure.contains(e);
    let mut frequencies = Vec::new();
    if has(Element::O) && has(Element::H) {
        frequencies.extend([3200, 3400]); // O-H
    }
    if has(Element::C) && has(Element::O) {
        frequencies.push(1700); // C=O
    }
    if has(Element::C) && has(Element::H) {
        frequencies.extend([2900, 3000]); // C-H
    }
    frequencies.sort_unstable();
    frequencies
}

/// Absorption maximum in nm, growing with the square root of the C/N/O count.
pub fn uv_vis_absorption(structure: &Structure) -> f64 {
    let n_pi = structure
        .elements()
        .filter(|e| CHROMOPHORE_ELEMENTS.contains(e))
        .count();
    (UV_VIS_BASE_NM + UV_VIS_SLOPE_NM * (n_pi as f64).sqrt()).min(UV_VIS_CAP_NM)
}

pub fn total_electrons(structure: &Structure) -> u32 {
    structure.atomic_numbers().iter().sum()
}

/// Source of the noisy estimates. Seeded generators give reproducible reports.
pub struct NoisyEstimator {
    rng: StdRng,
}

impl NoisyEstimator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    /// Gap in eV, centred by electron count: <10 → 8.0, <50 → 4.0, otherwise 2.0.
    pub fn homo_lumo_gap(&mut self, structure: &Structure) -> f64 {
        match total_electrons(structure) {
            n if n < 10 => self.gaussian(8.0, 0.5),
            n if n < 50 => self.gaussian(4.0, 1.0),
            _ => self.gaussian(2.0, 0.5),
        }
    }

    /// Norm of the dipole of mock partial charges drawn from N(0, 0.1).
    pub fn dipole_moment(&mut self, structure: &Structure) -> f64 {
        let mut dipole = nalgebra::Vector3::zeros();
        for atom in structure.atoms() {
            let charge = self.gaussian(0.0, 0.1);
            dipole += atom.position.coords * charge;
        }
        dipole.norm()
    }

    /// Binding energy in kcal/mol: -5.0 - 0.1 per atom, with N(0, 1) noise.
    pub fn binding_energy(&mut self, structure: &Structure) -> f64 {
        -5.0 - 0.1 * structure.len() as f64 + self.gaussian(0.0, 1.0)
    }
}
