use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::debug;

/// Places `analyte` above `absorbent` and returns the combined structure.
///
/// The analyte is translated so that its center of mass sits `separation`
/// Angstroms along +z from the absorbent's center of mass. Absorbent atoms come
/// first in the result. Neither input is modified.
pub fn create_complex(
    absorbent: &Structure,
    analyte: &Structure,
    separation: f64,
) -> Result<Structure, EngineError> {
    let absorbent_com = absorbent
        .center_of_mass()
        .ok_or(EngineError::EmptyStructure { role: "absorbent" })?;
    let analyte_com = analyte
        .center_of_mass()
        .ok_or(EngineError::EmptyStructure { role: "analyte" })?;

    let displacement = Vector3::new(0.0, 0.0, separation) + (absorbent_com - analyte_com);
    debug!(
        "Translating analyte by ({:.4}, {:.4}, {:.4})",
        displacement.x, displacement.y, displacement.z
    );
    Ok(absorbent.concat(&analyte.translated(&displacement)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn benzene() -> Structure {
        let c = [
            (0.0, 1.396),
            (1.209, 0.698),
            (1.209, -0.698),
            (0.0, -1.396),
            (-1.209, -0.698),
            (-1.209, 0.698),
        ];
        let h = [
            (0.0, 2.48),
            (2.147, 1.24),
            (2.147, -1.24),
            (0.0, -2.48),
            (-2.147, -1.24),
            (-2.147, 1.24),
        ];
        let symbols: Vec<&str> = ["C"; 6].into_iter().chain(["H"; 6]).collect();
        let positions: Vec<_> = c
            .iter()
            .chain(h.iter())
            .map(|&(x, y)| Point3::new(x, y, 0.0))
            .collect();
        Structure::from_parts(&symbols, &positions).unwrap()
    }

    fn water() -> Structure {
        Structure::from_parts(
            &["O", "H", "H"],
            &[
                Point3::new(5.0, 5.0, 5.119),
                Point3::new(5.0, 5.757, 4.524),
                Point3::new(5.0, 4.243, 4.524),
            ],
        )
        .unwrap()
    }

    #[test]
    fn analyte_com_sits_above_absorbent_com() {
        let absorbent = benzene();
        let analyte = water();
        let complex = create_complex(&absorbent, &analyte, 3.0).unwrap();

        assert_eq!(complex.len(), 15);
        let analyte_part = Structure::from_atoms(complex.atoms()[12..].to_vec());
        let expected = absorbent.center_of_mass().unwrap() + Vector3::new(0.0, 0.0, 3.0);
        assert!((analyte_part.center_of_mass().unwrap() - expected).norm() < 1e-9);
    }

    #[test]
    fn absorbent_atoms_are_unchanged_and_first() {
        let absorbent = benzene();
        let complex = create_complex(&absorbent, &water(), 2.5).unwrap();
        assert_eq!(&complex.atoms()[..12], absorbent.atoms());
        assert_eq!(complex.symbols()[12], "O");
    }

    #[test]
    fn inputs_are_not_mutated() {
        let absorbent = benzene();
        let analyte = water();
        let before = analyte.clone();
        let _ = create_complex(&absorbent, &analyte, 3.0).unwrap();
        assert_eq!(analyte, before);
    }

    #[test]
    fn analyte_geometry_is_rigidly_translated() {
        let analyte = water();
        let complex = create_complex(&benzene(), &analyte, 4.0).unwrap();
        let moved = &complex.atoms()[12..];
        let oh_before = analyte.atoms()[1].position - analyte.atoms()[0].position;
        let oh_after = moved[1].position - moved[0].position;
        assert!((oh_before - oh_after).norm() < 1e-12);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let err = create_complex(&Structure::new(), &water(), 3.0).unwrap_err();
        assert!(matches!(err, EngineError::EmptyStructure { role: "absorbent" }));
        let err = create_complex(&benzene(), &Structure::new(), 3.0).unwrap_err();
        assert!(matches!(err, EngineError::EmptyStructure { role: "analyte" }));
    }
}
