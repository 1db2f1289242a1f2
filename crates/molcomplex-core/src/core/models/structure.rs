use super::atom::Atom;
use super::element::{Element, ParseElementError};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use std::ops::Add;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StructureError {
    #[error("Length mismatch: {symbols} symbols but {positions} positions")]
    LengthMismatch { symbols: usize, positions: usize },
    #[error(transparent)]
    Element(#[from] ParseElementError),
}

/// An atomic structure: element symbols paired with 3D coordinates.
///
/// Each entry is stored as one [`Atom`], so the symbol and position sequences
/// always have the same length. Structures are plain values; operations that
/// combine or move structures either work in place or return a fresh copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    atoms: Vec<Atom>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_atoms(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    /// Builds a structure from parallel symbol and position sequences.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::LengthMismatch`] if the sequences differ in length,
    /// or [`StructureError::Element`] if a symbol is not a known element.
    pub fn from_parts<S: AsRef<str>>(
        symbols: &[S],
        positions: &[Point3<f64>],
    ) -> Result<Self, StructureError> {
        if symbols.len() != positions.len() {
            return Err(StructureError::LengthMismatch {
                symbols: symbols.len(),
                positions: positions.len(),
            });
        }
        let atoms = symbols
            .iter()
            .zip(positions)
            .map(|(symbol, position)| {
                let element: Element = symbol.as_ref().parse()?;
                Ok(Atom::new(element, *position))
            })
            .collect::<Result<Vec<_>, StructureError>>()?;
        Ok(Self { atoms })
    }

    pub fn push(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn symbols(&self) -> Vec<&'static str> {
        self.atoms.iter().map(Atom::symbol).collect()
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.atoms.iter().map(|a| a.element)
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn atomic_numbers(&self) -> Vec<u32> {
        self.atoms.iter().map(|a| a.element.atomic_number()).collect()
    }

    pub fn contains(&self, element: Element) -> bool {
        self.atoms.iter().any(|a| a.element == element)
    }

    pub fn total_mass(&self) -> f64 {
        self.atoms.iter().map(Atom::mass).sum()
    }

    /// Mass-weighted center of the structure, or `None` if it has no atoms.
    pub fn center_of_mass(&self) -> Option<Point3<f64>> {
        let total_mass = self.total_mass();
        if self.atoms.is_empty() || total_mass <= 0.0 {
            return None;
        }
        let weighted = self
            .atoms
            .iter()
            .fold(Vector3::zeros(), |acc, a| acc + a.position.coords * a.mass());
        Some(Point3::from(weighted / total_mass))
    }

    pub fn translate(&mut self, displacement: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.position += displacement;
        }
    }

    pub fn translated(&self, displacement: &Vector3<f64>) -> Self {
        let mut copy = self.clone();
        copy.translate(displacement);
        copy
    }

    /// Replaces all coordinates, keeping the element sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::LengthMismatch`] if `positions` does not have one
    /// entry per atom.
    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), StructureError> {
        if positions.len() != self.atoms.len() {
            return Err(StructureError::LengthMismatch {
                symbols: self.atoms.len(),
                positions: positions.len(),
            });
        }
        for (atom, position) in self.atoms.iter_mut().zip(positions) {
            atom.position = *position;
        }
        Ok(())
    }

    /// Appends the atoms of `other` after the atoms of `self`.
    pub fn concat(&self, other: &Structure) -> Structure {
        let mut atoms = Vec::with_capacity(self.len() + other.len());
        atoms.extend_from_slice(&self.atoms);
        atoms.extend_from_slice(&other.atoms);
        Structure { atoms }
    }

    /// Chemical formula in Hill order (C, then H, then the rest alphabetically).
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.symbol()).or_default() += 1;
        }

        let mut formula = String::new();
        let mut emit = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if let Some(c) = counts.remove("C") {
            emit("C", c);
            if let Some(h) = counts.remove("H") {
                emit("H", h);
            }
        }
        for (symbol, count) in counts {
            emit(symbol, count);
        }
        formula
    }
}

impl Add for Structure {
    type Output = Structure;

    fn add(mut self, rhs: Structure) -> Self::Output {
        self.atoms.extend(rhs.atoms);
        self
    }
}

impl FromIterator<Atom> for Structure {
    fn from_iter<T: IntoIterator<Item = Atom>>(iter: T) -> Self {
        Self {
            atoms: iter.into_iter().collect(),
        }
    }
}
