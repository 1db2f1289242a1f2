pub mod analyze;
pub mod batch;
pub mod example;

use molcomplex::core::properties::report::PropertyReport;

/// Properties echoed to the terminal after an analysis.
pub const KEY_PROPERTIES: [&str; 4] = ["total_atoms", "homo_lumo_gap", "binding_energy", "dipole_moment"];

pub fn key_properties(report: &PropertyReport) -> Vec<(&'static str, String)> {
    let entries = report.entries();
    KEY_PROPERTIES
        .iter()
        .filter_map(|key| entries.iter().find(|(k, _)| k == key).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use molcomplex::core::models::structure::Structure;
    use molcomplex::core::properties::report::estimate_properties;
    use nalgebra::Point3;

    #[test]
    fn key_properties_follow_display_order() {
        let water = Structure::from_parts(
            &["O", "H", "H"],
            &[Point3::origin(), Point3::new(0.96, 0.0, 0.0), Point3::new(-0.24, 0.93, 0.0)],
        )
        .unwrap();
        let report = estimate_properties(&water, None, Some(1));
        let keys: Vec<_> = key_properties(&report).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, KEY_PROPERTIES.to_vec());
    }
}
