//! Solver constants. All amounts are plain `f64` units (discrete mode) or
//! units per period (continuous mode).

/// Nominal full scale for allocation weights. Weights are percentages of an
/// account's overflow, so a fully allocated account declares 100.
pub const FULL_SCALE: f64 = 100.0;

/// Absolute slack allowed when an account's weights sum above [`FULL_SCALE`].
pub const ALLOCATION_TOLERANCE: f64 = 0.01;

/// Absolute band above `min_threshold` in which a balance classifies as
/// [`AccountStatus::Minimum`](crate::types::AccountStatus::Minimum).
pub const MINIMUM_BAND: f64 = 0.01;

/// Default round cap for the discrete distribution engine.
pub const DEFAULT_DISCRETE_MAX_ITERATIONS: usize = 100;

/// Default convergence threshold on total overflow (discrete).
pub const DEFAULT_DISCRETE_EPSILON: f64 = 0.01;

/// Default round cap for the continuous equilibrium engine.
pub const DEFAULT_CONTINUOUS_MAX_ITERATIONS: usize = 1000;

/// Default convergence threshold on the largest inflow change (continuous).
pub const DEFAULT_CONTINUOUS_EPSILON: f64 = 0.001;

/// A node enters the capacity zone once its total inflow reaches
/// `CAPACITY_MULTIPLIER * max_threshold`.
pub const CAPACITY_MULTIPLIER: f64 = 1.5;

/// Share of `max_threshold` a node passes on at the top of the building zone.
///
/// Equals `CAPACITY_MULTIPLIER - 1.0`, which keeps the building and capacity
/// formulas continuous at the capacity threshold.
pub const BUILDING_OUTFLOW_SHARE: f64 = 0.5;
