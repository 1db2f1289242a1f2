use crate::core::models::element::Element;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const BUILTIN_FORCEFIELD: &str = include_str!("../../../data/forcefield/default.toml");
const BUILTIN_SOURCE: &str = "<builtin>";

/// Generic van der Waals parameters for elements without an explicit entry.
pub const FALLBACK_VDW: VdwParam = VdwParam {
    radius: 3.5,
    well_depth: 0.05,
};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct VdwParam {
    /// Pair distance of the energy minimum, in Angstroms.
    pub radius: f64,
    /// Well depth in kcal/mol.
    pub well_depth: f64,
}

impl VdwParam {
    /// Lorentz-Berthelot combination: arithmetic-mean radius, geometric-mean depth.
    pub fn combine(&self, other: &VdwParam) -> VdwParam {
        VdwParam {
            radius: 0.5 * (self.radius + other.radius),
            well_depth: (self.well_depth * other.well_depth).sqrt(),
        }
    }
}

/// Where harmonic bond equilibrium lengths come from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BondReference {
    /// The starting geometry's bond lengths.
    #[default]
    Input,
    /// Sums of covalent radii.
    Covalent,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GlobalParams {
    pub bond_force_constant: f64,
    pub angle_force_constant: f64,
    pub bond_tolerance: f64,
    pub nonbonded_cutoff: f64,
    #[serde(default)]
    pub bond_reference: BondReference,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ForcefieldParams {
    pub globals: GlobalParams,
    #[serde(default)]
    pub vdw: HashMap<String, VdwParam>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid parameter in '{path}': {message}")]
    Invalid { path: String, message: String },
}

impl ForcefieldParams {
    /// Parameters shipped with the crate.
    pub fn builtin() -> Result<Self, ParamLoadError> {
        Self::from_toml_str(BUILTIN_FORCEFIELD, BUILTIN_SOURCE)
    }

    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    /// Loads `path` if given, the built-in set otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ParamLoadError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    fn from_toml_str(content: &str, source: &str) -> Result<Self, ParamLoadError> {
        let mut params: ForcefieldParams =
            toml::from_str(content).map_err(|e| ParamLoadError::Toml {
                path: source.to_string(),
                source: e,
            })?;
        params.validate(source)?;
        params.vdw = params
            .vdw
            .into_iter()
            .map(|(symbol, param)| match Element::from_symbol(&symbol) {
                Some(element) => (element.symbol().to_string(), param),
                None => (symbol, param),
            })
            .collect();
        Ok(params)
    }

    fn validate(&self, source: &str) -> Result<(), ParamLoadError> {
        let invalid = |message: String| ParamLoadError::Invalid {
            path: source.to_string(),
            message,
        };
        let g = &self.globals;
        if g.bond_force_constant <= 0.0 || g.angle_force_constant <= 0.0 {
            return Err(invalid("force constants must be positive".into()));
        }
        if g.bond_tolerance <= 0.0 {
            return Err(invalid("bond_tolerance must be positive".into()));
        }
        if g.nonbonded_cutoff <= 0.0 {
            return Err(invalid("nonbonded_cutoff must be positive".into()));
        }
        for (symbol, param) in &self.vdw {
            if Element::from_symbol(symbol).is_none() {
                return Err(invalid(format!("unknown element '{}' in [vdw]", symbol)));
            }
            if param.radius <= 0.0 || param.well_depth <= 0.0 {
                return Err(invalid(format!("invalid vdw parameters for '{}'", symbol)));
            }
        }
        Ok(())
    }

    pub fn vdw_for(&self, element: Element) -> VdwParam {
        self.vdw
            .get(element.symbol())
            .copied()
            .unwrap_or(FALLBACK_VDW)
    }
}
