//! Progressive outflow function for continuous mode.
//!
//! Given a node's total inflow rate and its thresholds, with
//! `capacity = 1.5 * max`:
//!
//! - **Deficit** (`inflow < min`): nothing flows out.
//! - **Building** (`min <= inflow < capacity`): outflow rises linearly from 0
//!   to `0.5 * max`.
//! - **Capacity** (`inflow >= capacity`): the node keeps exactly `max` and
//!   passes on the rest.
//!
//! The building segment ends at `0.5 * max == capacity - max`, so the curve
//! is continuous at both boundaries. When `capacity == min` (only possible for
//! `min == max == 0`) the capacity formula is used directly.

use spillway_core::constants::BUILDING_OUTFLOW_SHARE;
use spillway_core::types::{capacity_threshold, FlowNode};

/// Outflow rate for `total_inflow` under the given thresholds.
pub fn calculate_outflow(total_inflow: f64, min_threshold: f64, max_threshold: f64) -> f64 {
    if total_inflow < min_threshold {
        return 0.0;
    }

    let capacity = capacity_threshold(max_threshold);
    if total_inflow >= capacity || capacity <= min_threshold {
        return total_inflow - max_threshold;
    }

    let progress = (total_inflow - min_threshold) / (capacity - min_threshold);
    progress * (BUILDING_OUTFLOW_SHARE * max_threshold)
}

/// [`calculate_outflow`] with the node's own thresholds.
pub fn outflow_for(node: &FlowNode, total_inflow: f64) -> f64 {
    calculate_outflow(total_inflow, node.min_threshold, node.max_threshold)
}
