use super::estimators::{
    BindingSite, NoisyEstimator, binding_sites, ir_frequencies, molecular_volume, polarizability,
    uv_vis_absorption,
};
use crate::core::forcefield::calculator::Calculator;
use crate::core::models::structure::Structure;
use serde::Serialize;
use tracing::{debug, warn};

pub const REPORT_HEADER: &str = "Molecular Complex Properties";

/// Property estimates for one structure.
///
/// Energy entries are present only when a calculator was available. When an
/// estimate cannot be produced, `error` describes why and the remaining entries
/// are still filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyReport {
    pub total_atoms: usize,
    pub molecular_volume: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_of_mass: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forces_rms: Option<f64>,
    pub homo_lumo_gap: f64,
    pub dipole_moment: f64,
    pub polarizability: f64,
    pub binding_energy: f64,
    pub binding_sites: Vec<BindingSite>,
    pub ir_frequencies: Vec<u32>,
    pub uv_vis_absorption: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Computes every property of `structure`.
///
/// `calculator`, when given, must have been set up for `structure`.
pub fn estimate_properties(
    structure: &Structure,
    calculator: Option<&dyn Calculator>,
    seed: Option<u64>,
) -> PropertyReport {
    let mut errors = Vec::new();
    let mut noisy = NoisyEstimator::new(seed);

    let center_of_mass = structure.center_of_mass().map(|c| [c.x, c.y, c.z]);
    if center_of_mass.is_none() {
        errors.push("structure has no atoms; center of mass is undefined".to_string());
    }

    let (total_energy, forces_rms) = match calculator {
        Some(calc) => match calc.evaluate(structure) {
            Ok(evaluation) => {
                debug!(
                    bond = evaluation.energy.bond,
                    angle = evaluation.energy.angle,
                    vdw = evaluation.energy.vdw,
                    "Final energy components"
                );
                (Some(evaluation.energy.total()), Some(evaluation.forces_rms()))
            }
            Err(e) => {
                warn!("Energy evaluation failed during property estimation: {}", e);
                errors.push(format!("energy evaluation failed: {}", e));
                (None, None)
            }
        },
        None => (None, None),
    };

    let volume = molecular_volume(structure);
    PropertyReport {
        total_atoms: structure.len(),
        molecular_volume: volume,
        center_of_mass,
        total_energy,
        forces_rms,
        homo_lumo_gap: noisy.homo_lumo_gap(structure),
        dipole_moment: noisy.dipole_moment(structure),
        polarizability: polarizability(structure),
        binding_energy: noisy.binding_energy(structure),
        binding_sites: binding_sites(structure),
        ir_frequencies: ir_frequencies(structure),
        uv_vis_absorption: uv_vis_absorption(structure),
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}

fn format_floats(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", items.join(", "))
}

impl PropertyReport {
    /// `(key, value)` pairs in report order, skipping absent entries.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![
            ("total_atoms", self.total_atoms.to_string()),
            ("molecular_volume", format!("{:?}", self.molecular_volume)),
        ];
        if let Some(com) = &self.center_of_mass {
            entries.push(("center_of_mass", format_floats(com)));
        }
        if let Some(energy) = self.total_energy {
            entries.push(("total_energy", format!("{:?}", energy)));
        }
        if let Some(rms) = self.forces_rms {
            entries.push(("forces_rms", format!("{:?}", rms)));
        }
        entries.push(("homo_lumo_gap", format!("{:?}", self.homo_lumo_gap)));
        entries.push(("dipole_moment", format!("{:?}", self.dipole_moment)));
        entries.push(("polarizability", format!("{:?}", self.polarizability)));
        entries.push(("binding_energy", format!("{:?}", self.binding_energy)));

        let sites: Vec<String> = self
            .binding_sites
            .iter()
            .map(|s| {
                format!(
                    "{{atom_index: {}, element: {}, position: {}}}",
                    s.atom_index,
                    s.element,
                    format_floats(&s.position)
                )
            })
            .collect();
        entries.push(("binding_sites", format!("[{}]", sites.join(", "))));

        let freqs: Vec<String> = self.ir_frequencies.iter().map(u32::to_string).collect();
        entries.push(("ir_frequencies", format!("[{}]", freqs.join(", "))));
        entries.push(("uv_vis_absorption", format!("{:?}", self.uv_vis_absorption)));
        if let Some(error) = &self.error {
            entries.push(("error", error.clone()));
        }
        entries
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n{}\n\n", REPORT_HEADER, "=".repeat(40));
        for (key, value) in self.entries() {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
