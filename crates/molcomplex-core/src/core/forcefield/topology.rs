use crate::core::models::structure::Structure;
use itertools::Itertools;
use std::collections::HashSet;

/// Connectivity inferred from interatomic distances.
///
/// Pairs are stored as `(i, j)` with `i < j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    pub bonds: Vec<(usize, usize)>,
    /// 1-3 pairs: atoms bonded to a common neighbour but not to each other.
    pub angles: Vec<(usize, usize)>,
    neighbors: Vec<Vec<usize>>,
    excluded: HashSet<(usize, usize)>,
}

#[inline]
fn ordered(i: usize, j: usize) -> (usize, usize) {
    if i < j { (i, j) } else { (j, i) }
}

impl Topology {
    /// Bonds every pair closer than `(r_cov_i + r_cov_j) * tolerance`.
    pub fn infer(structure: &Structure, tolerance: f64) -> Self {
        let atoms = structure.atoms();
        let mut neighbors = vec![Vec::new(); atoms.len()];
        let mut bonds = Vec::new();

        for (i, j) in (0..atoms.len()).tuple_combinations() {
            let cutoff =
                (atoms[i].element.covalent_radius() + atoms[j].element.covalent_radius()) * tolerance;
            let dist = (atoms[i].position - atoms[j].position).norm();
            if dist <= cutoff {
                bonds.push((i, j));
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }

        let bonded: HashSet<(usize, usize)> = bonds.iter().copied().collect();
        let mut angles: Vec<(usize, usize)> = neighbors
            .iter()
            .flat_map(|around| {
                around
                    .iter()
                    .tuple_combinations()
                    .map(|(&a, &b)| ordered(a, b))
            })
            .filter(|pair| !bonded.contains(pair))
            .collect();
        angles.sort_unstable();
        angles.dedup();

        let excluded = bonded.into_iter().chain(angles.iter().copied()).collect();

        Self {
            bonds,
            angles,
            neighbors,
            excluded,
        }
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        self.neighbors.get(atom).map_or([].as_slice(), |v| v.as_slice())
    }

    /// Whether the pair is a 1-2 or 1-3 pair and so has no non-bonded interaction.
    pub fn is_excluded(&self, i: usize, j: usize) -> bool {
        self.excluded.contains(&ordered(i, j))
    }

    /// Connected components as sorted atom index lists.
    pub fn fragments(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.neighbors.len()];
        let mut fragments = Vec::new();
        for start in 0..self.neighbors.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![start];
            let mut fragment = Vec::new();
            while let Some(atom) = stack.pop() {
                fragment.push(atom);
                for &next in &self.neighbors[atom] {
                    if !seen[next] {
                        seen[next] = true;
                        stack.push(next);
                    }
                }
            }
            fragment.sort_unstable();
            fragments.push(fragment);
        }
        fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

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

    #[test]
    fn water_has_two_bonds_and_one_angle() {
        let topology = Topology::infer(&water(), 1.2);
        assert_eq!(topology.bonds, vec![(0, 1), (0, 2)]);
        assert_eq!(topology.angles, vec![(1, 2)]);
        assert_eq!(topology.neighbors(0), &[1, 2]);
    }

    #[test]
    fn bonded_and_angle_pairs_are_excluded_in_either_order() {
        let topology = Topology::infer(&water(), 1.2);
        assert!(topology.is_excluded(1, 0));
        assert!(topology.is_excluded(2, 1));
    }

    #[test]
    fn distant_molecules_form_separate_fragments() {
        let far = water().translated(&nalgebra::Vector3::new(0.0, 0.0, 10.0));
        let pair = water().concat(&far);
        let topology = Topology::infer(&pair, 1.2);
        assert_eq!(topology.bonds.len(), 4);
        assert!(!topology.is_excluded(0, 3));
        assert_eq!(topology.fragments(), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn tight_tolerance_removes_bonds() {
        let topology = Topology::infer(&water(), 0.5);
        assert!(topology.bonds.is_empty());
        assert!(topology.angles.is_empty());
        assert_eq!(topology.fragments().len(), 3);
    }
}
