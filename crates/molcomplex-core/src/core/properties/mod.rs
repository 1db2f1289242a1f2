//! Heuristic property estimates for a relaxed complex.
//!
//! Every estimator here is independent of the others. Geometric quantities are
//! closed-form; electronic and binding quantities are coarse placeholders, some of
//! which add Gaussian noise drawn from a seedable generator.

pub mod estimators;
pub mod report;
