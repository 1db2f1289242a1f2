//! Provides input/output functionality for molecular file formats.
//!
//! Readers and writers share the [`traits::MolecularFile`] interface. Gaussian input
//! files ([`gjf`]) are the primary exchange format; [`xyz`] is used for optimization
//! trajectories.

pub mod gjf;
pub mod traits;
pub mod xyz;
