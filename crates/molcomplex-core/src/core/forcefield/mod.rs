//! # Force Field Module
//!
//! Classical energy and force evaluation used to relax structures.
//!
//! ## Key Components
//!
//! - [`potentials`] - Closed-form pair potentials and their radial derivatives
//! - [`params`] - Parameter sets loaded from TOML, with a built-in default
//! - [`topology`] - Bond and 1-3 pair inference from covalent radii
//! - [`term`] - Energy term aggregation
//! - [`calculator`] - The [`calculator::Calculator`] trait and the classical implementation
//!
//! ## Usage
//!
//! ```ignore
//! use molcomplex::core::forcefield::{calculator::ClassicalCalculator, params::ForcefieldParams};
//!
//! let params = ForcefieldParams::builtin()?;
//! let calculator = ClassicalCalculator::new(&structure, &params);
//! let evaluation = calculator.evaluate(&structure)?;
//! ```

pub mod calculator;
pub mod params;
pub(crate) mod potentials;
pub mod term;
pub mod topology;
