use serde::Serialize;
use std::ops::{Add, AddAssign};

/// Energy contributions of the classical force field, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnergyTerm {
    pub bond: f64,
    pub angle: f64,
    pub vdw: f64,
}

impl EnergyTerm {
    pub fn new(bond: f64, angle: f64, vdw: f64) -> Self {
        Self { bond, angle, vdw }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.bond + self.angle + self.vdw
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            bond: self.bond + rhs.bond,
            angle: self.angle + rhs.angle,
            vdw: self.vdw + rhs.vdw,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.bond += rhs.bond;
        self.angle += rhs.angle;
        self.vdw += rhs.vdw;
    }
}
