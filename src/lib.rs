//! Residential PV + battery what-if simulator.
//!
//! Replays a merged timeline of solar production and grid-meter readings with
//! a simulated battery, aggregates before/after energy metrics, prices both
//! scenarios under a two-tier import tariff, and sweeps battery capacities.

pub mod cli;
/// TOML scenario configuration and built-in presets.
pub mod config;
pub mod error;
/// Timeline CSV import and result export.
pub mod io;
pub mod runner;
/// Dispatch simulation, metrics, tariff, and capacity sweep.
pub mod sim;
pub mod synthetic;
