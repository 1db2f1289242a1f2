use phf::{Map, phf_map};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A chemical element supported by the structure model.
///
/// The discriminant of each variant is its atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Sc = 21,
    Ti = 22,
    V = 23,
    Cr = 24,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Kr = 36,
    Rb = 37,
    Sr = 38,
    Y = 39,
    Zr = 40,
    Nb = 41,
    Mo = 42,
    Tc = 43,
    Ru = 44,
    Rh = 45,
    Pd = 46,
    Ag = 47,
    Cd = 48,
    In = 49,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
    Xe = 54,
    Cs = 55,
    Ba = 56,
    La = 57,
    Ce = 58,
    Pr = 59,
    Nd = 60,
    Pm = 61,
    Sm = 62,
    Eu = 63,
    Gd = 64,
    Tb = 65,
    Dy = 66,
    Ho = 67,
    Er = 68,
    Tm = 69,
    Yb = 70,
    Lu = 71,
    Hf = 72,
    Ta = 73,
    W = 74,
    Re = 75,
    Os = 76,
    Ir = 77,
    Pt = 78,
    Au = 79,
    Hg = 80,
    Tl = 81,
    Pb = 82,
    Bi = 83,
}

#[rustfmt::skip]
static SYMBOL_LOOKUP: Map<&'static str, Element> = phf_map! {
    "H"  => Element::H,    "HE" => Element::He,   "LI" => Element::Li,   "BE" => Element::Be,
    "B"  => Element::B,    "C"  => Element::C,    "N"  => Element::N,    "O"  => Element::O,
    "F"  => Element::F,    "NE" => Element::Ne,   "NA" => Element::Na,   "MG" => Element::Mg,
    "AL" => Element::Al,   "SI" => Element::Si,   "P"  => Element::P,    "S"  => Element::S,
    "CL" => Element::Cl,   "AR" => Element::Ar,   "K"  => Element::K,    "CA" => Element::Ca,
    "SC" => Element::Sc,   "TI" => Element::Ti,   "V"  => Element::V,    "CR" => Element::Cr,
    "MN" => Element::Mn,   "FE" => Element::Fe,   "CO" => Element::Co,   "NI" => Element::Ni,
    "CU" => Element::Cu,   "ZN" => Element::Zn,   "GA" => Element::Ga,   "GE" => Element::Ge,
    "AS" => Element::As,   "SE" => Element::Se,   "BR" => Element::Br,   "KR" => Element::Kr,
    "RB" => Element::Rb,   "SR" => Element::Sr,   "Y"  => Element::Y,    "ZR" => Element::Zr,
    "NB" => Element::Nb,   "MO" => Element::Mo,   "TC" => Element::Tc,   "RU" => Element::Ru,
    "RH" => Element::Rh,   "PD" => Element::Pd,   "AG" => Element::Ag,   "CD" => Element::Cd,
    "IN" => Element::In,   "SN" => Element::Sn,   "SB" => Element::Sb,   "TE" => Element::Te,
    "I"  => Element::I,    "XE" => Element::Xe,   "CS" => Element::Cs,   "BA" => Element::Ba,
    "LA" => Element::La,   "CE" => Element::Ce,   "PR" => Element::Pr,   "ND" => Element::Nd,
    "PM" => Element::Pm,   "SM" => Element::Sm,   "EU" => Element::Eu,   "GD" => Element::Gd,
    "TB" => Element::Tb,   "DY" => Element::Dy,   "HO" => Element::Ho,   "ER" => Element::Er,
    "TM" => Element::Tm,   "YB" => Element::Yb,   "LU" => Element::Lu,   "HF" => Element::Hf,
    "TA" => Element::Ta,   "W"  => Element::W,    "RE" => Element::Re,   "OS" => Element::Os,
    "IR" => Element::Ir,   "PT" => Element::Pt,   "AU" => Element::Au,   "HG" => Element::Hg,
    "TL" => Element::Tl,   "PB" => Element::Pb,   "BI" => Element::Bi,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown element label: '{0}'")]
pub struct ParseElementError(pub String);

impl Element {
    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::He => "He",
            Element::Li => "Li",
            Element::Be => "Be",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Ne => "Ne",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Al => "Al",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Ar => "Ar",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Sc => "Sc",
            Element::Ti => "Ti",
            Element::V => "V",
            Element::Cr => "Cr",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Ga => "Ga",
            Element::Ge => "Ge",
            Element::As => "As",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::Kr => "Kr",
            Element::Rb => "Rb",
            Element::Sr => "Sr",
            Element::Y => "Y",
            Element::Zr => "Zr",
            Element::Nb => "Nb",
            Element::Mo => "Mo",
            Element::Tc => "Tc",
            Element::Ru => "Ru",
            Element::Rh => "Rh",
            Element::Pd => "Pd",
            Element::Ag => "Ag",
            Element::Cd => "Cd",
            Element::In => "In",
            Element::Sn => "Sn",
            Element::Sb => "Sb",
            Element::Te => "Te",
            Element::I => "I",
            Element::Xe => "Xe",
            Element::Cs => "Cs",
            Element::Ba => "Ba",
            Element::La => "La",
            Element::Ce => "Ce",
            Element::Pr => "Pr",
            Element::Nd => "Nd",
            Element::Pm => "Pm",
            Element::Sm => "Sm",
            Element::Eu => "Eu",
            Element::Gd => "Gd",
            Element::Tb => "Tb",
            Element::Dy => "Dy",
            Element::Ho => "Ho",
            Element::Er => "Er",
            Element::Tm => "Tm",
            Element::Yb => "Yb",
            Element::Lu => "Lu",
            Element::Hf => "Hf",
            Element::Ta => "Ta",
            Element::W => "W",
            Element::Re => "Re",
            Element::Os => "Os",
            Element::Ir => "Ir",
            Element::Pt => "Pt",
            Element::Au => "Au",
            Element::Hg => "Hg",
            Element::Tl => "Tl",
            Element::Pb => "Pb",
            Element::Bi => "Bi",
        }
    }

    #[inline]
    pub fn atomic_number(self) -> u32 {
        self as u8 as u32
    }

    /// Standard atomic weight in g/mol.
    pub fn atomic_mass(self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::He => 4.0026,
            Element::Li => 6.94,
            Element::Be => 9.0122,
            Element::B => 10.81,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Ne => 20.180,
            Element::Na => 22.990,
            Element::Mg => 24.305,
            Element::Al => 26.982,
            Element::Si => 28.085,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::Ar => 39.948,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Sc => 44.956,
            Element::Ti => 47.867,
            Element::V => 50.942,
            Element::Cr => 51.996,
            Element::Mn => 54.938,
            Element::Fe => 55.845,
            Element::Co => 58.933,
            Element::Ni => 58.693,
            Element::Cu => 63.546,
            Element::Zn => 65.38,
            Element::Ga => 69.723,
            Element::Ge => 72.630,
            Element::As => 74.922,
            Element::Se => 78.971,
            Element::Br => 79.904,
            Element::Kr => 83.798,
            Element::Rb => 85.468,
            Element::Sr => 87.62,
            Element::Y => 88.906,
            Element::Zr => 91.224,
            Element::Nb => 92.906,
            Element::Mo => 95.95,
            Element::Tc => 98.0,
            Element::Ru => 101.07,
            Element::Rh => 102.91,
            Element::Pd => 106.42,
            Element::Ag => 107.87,
            Element::Cd => 112.41,
            Element::In => 114.82,
            Element::Sn => 118.71,
            Element::Sb => 121.76,
            Element::Te => 127.60,
            Element::I => 126.90,
            Element::Xe => 131.29,
            Element::Cs => 132.91,
            Element::Ba => 137.33,
            Element::La => 138.91,
            Element::Ce => 140.12,
            Element::Pr => 140.91,
            Element::Nd => 144.24,
            Element::Pm => 145.0,
            Element::Sm => 150.36,
            Element::Eu => 151.96,
            Element::Gd => 157.25,
            Element::Tb => 158.93,
            Element::Dy => 162.50,
            Element::Ho => 164.93,
            Element::Er => 167.26,
            Element::Tm => 168.93,
            Element::Yb => 173.05,
            Element::Lu => 174.97,
            Element::Hf => 178.49,
            Element::Ta => 180.95,
            Element::W => 183.84,
            Element::Re => 186.21,
            Element::Os => 190.23,
            Element::Ir => 192.22,
            Element::Pt => 195.08,
            Element::Au => 196.97,
            Element::Hg => 200.59,
            Element::Tl => 204.38,
            Element::Pb => 207.2,
            Element::Bi => 208.98,
        }
    }

    /// Single-bond covalent radius in Angstroms (Cordero et al., 2008).
    pub fn covalent_radius(self) -> f64 {
        match self {
            Element::H => 0.31,
            Element::He => 0.28,
            Element::Li => 1.28,
            Element::Be => 0.96,
            Element::B => 0.84,
            Element::C => 0.76,
            Element::N => 0.71,
            Element::O => 0.66,
            Element::F => 0.57,
            Element::Ne => 0.58,
            Element::Na => 1.66,
            Element::Mg => 1.41,
            Element::Al => 1.21,
            Element::Si => 1.11,
            Element::P => 1.07,
            Element::S => 1.05,
            Element::Cl => 1.02,
            Element::Ar => 1.06,
            Element::K => 2.03,
            Element::Ca => 1.76,
            Element::Sc => 1.70,
            Element::Ti => 1.60,
            Element::V => 1.53,
            Element::Cr => 1.39,
            Element::Mn => 1.39,
            Element::Fe => 1.32,
            Element::Co => 1.26,
            Element::Ni => 1.24,
            Element::Cu => 1.32,
            Element::Zn => 1.22,
            Element::Ga => 1.22,
            Element::Ge => 1.20,
            Element::As => 1.19,
            Element::Se => 1.20,
            Element::Br => 1.20,
            Element::Kr => 1.16,
            Element::Rb => 2.20,
            Element::Sr => 1.95,
            Element::Y => 1.90,
            Element::Zr => 1.75,
            Element::Nb => 1.64,
            Element::Mo => 1.54,
            Element::Tc => 1.47,
            Element::Ru => 1.46,
            Element::Rh => 1.42,
            Element::Pd => 1.39,
            Element::Ag => 1.45,
            Element::Cd => 1.44,
            Element::In => 1.42,
            Element::Sn => 1.39,
            Element::Sb => 1.39,
            Element::Te => 1.38,
            Element::I => 1.39,
            Element::Xe => 1.40,
            Element::Cs => 2.44,
            Element::Ba => 2.15,
            Element::La => 2.07,
            Element::Ce => 2.04,
            Element::Pr => 2.03,
            Element::Nd => 2.01,
            Element::Pm => 1.99,
            Element::Sm => 1.98,
            Element::Eu => 1.98,
            Element::Gd => 1.96,
            Element::Tb => 1.94,
            Element::Dy => 1.92,
            Element::Ho => 1.92,
            Element::Er => 1.89,
            Element::Tm => 1.90,
            Element::Yb => 1.87,
            Element::Lu => 1.87,
            Element::Hf => 1.75,
            Element::Ta => 1.70,
            Element::W => 1.62,
            Element::Re => 1.51,
            Element::Os => 1.44,
            Element::Ir => 1.41,
            Element::Pt => 1.36,
            Element::Au => 1.36,
            Element::Hg => 1.32,
            Element::Tl => 1.45,
            Element::Pb => 1.46,
            Element::Bi => 1.48,
        }
    }

    pub fn from_atomic_number(z: u32) -> Option<Self> {
        SYMBOL_LOOKUP
            .values()
            .copied()
            .find(|element| element.atomic_number() == z)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        SYMBOL_LOOKUP.get(symbol.to_ascii_uppercase().as_str()).copied()
    }
}

/// Reduces a Gaussian-style atom label to its bare element part.
///
/// Handles `C1`, `C(Fragment=1)`, `C-CA-0.25` and `Cl_2` style labels.
fn normalize_label(label: &str) -> &str {
    let cut = label.find(['(', '-', '_']).unwrap_or(label.len());
    label[..cut].trim_end_matches(|c: char| c.is_ascii_digit())
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed
                .parse::<u32>()
                .ok()
                .and_then(Element::from_atomic_number)
                .ok_or_else(|| ParseElementError(s.to_string()));
        }

        let normalized = normalize_label(trimmed);
        if normalized.is_empty() {
            return Err(ParseElementError(s.to_string()));
        }
        Element::from_symbol(normalized).ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}
