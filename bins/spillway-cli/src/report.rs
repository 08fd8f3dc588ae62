//! Plain-text rendering of validation reports and solver results.

use std::fmt::Write;

use spillway_core::network::NetworkSummary;
use spillway_core::trace::{DistributionResult, EquilibriumResult};
use spillway_core::validation::ValidationReport;

pub fn validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    let verdict = if report.is_valid() { "valid" } else { "INVALID" };
    let _ = writeln!(out, "network is {verdict}");
    for e in &report.errors {
        let _ = writeln!(out, "  error:   {e}");
    }
    for w in &report.warnings {
        let _ = writeln!(out, "  warning: {w}");
    }
    out
}

pub fn distribution(result: &DistributionResult, summary: &NetworkSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "funding {:.2}: {} after {} round(s)",
        result.total_funding,
        if result.converged { "converged" } else { "NOT converged" },
        result.iteration_count
    );
    let _ = writeln!(
        out,
        "{:<16} {:>12} {:>12} {:>12} {:>10}",
        "account", "initial", "final", "max", "status"
    );
    for (state, (_, initial)) in result.final_states.iter().zip(result.initial_balances.iter()) {
        let _ = writeln!(
            out,
            "{:<16} {:>12.2} {:>12.2} {:>12.2} {:>10}",
            state.id.as_str(),
            initial,
            state.balance,
            state.max_threshold,
            state.status
        );
    }
    let _ = writeln!(
        out,
        "deficit {} / minimum {} / healthy {} / overflow {}; total {:.2}, lost {:.2}",
        summary.deficit,
        summary.minimum,
        summary.healthy,
        summary.overflow,
        summary.total_balance,
        result.lost_overflow()
    );
    for w in &result.warnings {
        let _ = writeln!(out, "warning: {w}");
    }
    out
}

pub fn equilibrium(result: &EquilibriumResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "equilibrium: {} after {} round(s)",
        if result.converged { "converged" } else { "NOT converged" },
        result.iteration_count
    );
    let _ = writeln!(
        out,
        "{:<16} {:>12} {:>12} {:>12} {:>10} {:>12}",
        "node", "external", "inflow", "outflow", "zone", "balance"
    );
    for n in &result.nodes {
        let _ = writeln!(
            out,
            "{:<16} {:>12.3} {:>12.3} {:>12.3} {:>10} {:>12.3}",
            n.id.as_str(),
            n.external_inflow,
            n.total_inflow,
            n.total_outflow,
            n.zone,
            n.balance
        );
    }
    for f in &result.flows {
        let _ = writeln!(out, "  {} -> {}: {:.3}", f.source, f.target, f.amount);
    }
    if let Some(sink) = &result.overflow_sink {
        let _ = writeln!(out, "overflow sink: {:.3}", sink.total_inflow);
    }
    for w in &result.warnings {
        let _ = writeln!(out, "warning: {w}");
    }
    out
}
