/// Interval readings and simulated intervals.
pub mod types;
/// Battery parameters and inverter mode.
pub mod battery;
pub mod dispatch;
pub mod metrics;
/// Two-tier import tariff and financial summary.
pub mod tariff;
/// Capacity sweep over candidate battery sizes.
pub mod sweep;
