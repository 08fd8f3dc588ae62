//! Scenario and property test suite for Spillway.
//!
//! Integration tests under `tests/` drive both engines end to end through
//! the public API and check conservation, convergence and determinism
//! properties across randomized networks.

pub mod helpers;
