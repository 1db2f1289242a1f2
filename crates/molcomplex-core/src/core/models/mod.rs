//! # Core Models Module
//!
//! Data structures for atomic structures: chemical elements, atoms, and the
//! [`structure::Structure`] container that every pipeline stage consumes and produces.
//!
//! A structure is nothing more than an ordered list of atoms, each an element paired
//! with a Cartesian position in Angstroms. It is created by the parsers in
//! [`crate::core::io`], moved and concatenated during complex formation, and updated
//! in place by the optimizer.

pub mod atom;
pub mod element;
pub mod structure;
