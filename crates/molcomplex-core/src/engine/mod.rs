//! # Engine Module
//!
//! Configuration, error reporting, progress events and the BFGS geometry
//! optimizer that drive an analysis.
//!
//! - **Configuration** ([`config`]) - [`config::AnalysisConfig`] and its builder
//! - **Optimization** ([`optimizer`]) - BFGS relaxation against any [`Calculator`](crate::core::forcefield::calculator::Calculator)
//! - **Progress Monitoring** ([`progress`]) - callback-based progress events
//! - **Error Handling** ([`error`]) - [`error::EngineError`] for every failure an analysis can hit

pub mod config;
pub mod error;
pub mod optimizer;
pub mod progress;
