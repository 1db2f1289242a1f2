//! Molecular data model, file formats, the classical force field and property
//! estimators.

pub mod forcefield;
pub mod io;
pub mod models;
pub mod properties;
