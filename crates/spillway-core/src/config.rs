//! Solver configuration shared by both engines.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTINUOUS_EPSILON, DEFAULT_CONTINUOUS_MAX_ITERATIONS, DEFAULT_DISCRETE_EPSILON,
    DEFAULT_DISCRETE_MAX_ITERATIONS,
};
use crate::error::ConfigError;

/// Iteration cap, convergence threshold and diagnostics switch.
///
/// `max_iterations` is a hard ceiling: engines stop there even when the
/// convergence test can never pass. `verbose` only enables per-round
/// tracing and never changes results.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub epsilon: f64,
    #[serde(default)]
    pub verbose: bool,
}

impl SolverConfig {
    /// Defaults for lump-sum distribution: 100 rounds, epsilon 0.01.
    pub fn discrete() -> Self {
        Self {
            max_iterations: DEFAULT_DISCRETE_MAX_ITERATIONS,
            epsilon: DEFAULT_DISCRETE_EPSILON,
            verbose: false,
        }
    }

    /// Defaults for rate equilibrium: 1000 rounds, epsilon 0.001.
    pub fn continuous() -> Self {
        Self {
            max_iterations: DEFAULT_CONTINUOUS_MAX_ITERATIONS,
            epsilon: DEFAULT_CONTINUOUS_EPSILON,
            verbose: false,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }
}
