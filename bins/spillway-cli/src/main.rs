//! spillway: command-line runner for threshold-based flow funding.
//!
//! Loads a JSON scenario, validates it, and runs either the discrete
//! distribution engine or the continuous equilibrium engine, printing a
//! text report or the full result as JSON.

mod report;
mod scenario;
mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use spillway_core::config::SolverConfig;
use spillway_core::traits::{Distributor, EquilibriumSolver};
use spillway_core::validation::validate;
use spillway_engine::{DistributionEngine, EquilibriumEngine};
use tracing::info;

use crate::scenario::Scenario;
use crate::settings::Settings;

/// Spillway: funds above the maximum spill over to where they are needed.
#[derive(Parser, Debug)]
#[command(name = "spillway", version, about = "Threshold-based flow funding solver")]
struct Cli {
    /// Settings file (default: <config dir>/spillway/spillway.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the settings file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json"). Overrides the settings file.
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a scenario's network for structural problems.
    Validate(ValidateArgs),
    /// Inject a lump sum and redistribute overflow (discrete mode).
    Distribute(DistributeArgs),
    /// Solve steady-state flow rates (continuous mode).
    Equilibrium(EquilibriumArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Scenario JSON file.
    scenario: PathBuf,
}

#[derive(Args, Debug)]
struct SolverArgs {
    /// Round cap. Overrides the settings file.
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Convergence threshold. Overrides the settings file.
    #[arg(long)]
    epsilon: Option<f64>,

    /// Trace every round at debug level.
    #[arg(long)]
    verbose: bool,

    /// Print the full result as JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

impl SolverArgs {
    fn apply(&self, mut config: SolverConfig) -> SolverConfig {
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(epsilon) = self.epsilon {
            config.epsilon = epsilon;
        }
        config.verbose |= self.verbose;
        config
    }
}

#[derive(Args, Debug)]
struct DistributeArgs {
    /// Scenario JSON file with "accounts".
    scenario: PathBuf,

    /// Lump sum to inject (default: the scenario's "funding", else 0).
    #[arg(short, long)]
    funding: Option<f64>,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args, Debug)]
struct EquilibriumArgs {
    /// Scenario JSON file with "nodes".
    scenario: PathBuf,

    /// Advance display balances by this many periods at equilibrium rates.
    #[arg(long, default_value_t = 0.0)]
    periods: f64,

    #[command(flatten)]
    solver: SolverArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&settings.log_level);
    let format = cli.log_format.as_deref().unwrap_or(&settings.log_format);
    init_logging(level, format);

    match cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Distribute(args) => run_distribute(args, &settings),
        Commands::Equilibrium(args) => run_equilibrium(args, &settings),
    }
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let mut invalid = false;

    if !scenario.accounts.is_empty() {
        let report = validate(&scenario.account_network()?);
        print!("accounts: {}", report::validation(&report));
        invalid |= !report.is_valid();
    }
    if !scenario.nodes.is_empty() {
        let report = validate(&scenario.flow_network()?);
        print!("nodes: {}", report::validation(&report));
        invalid |= !report.is_valid();
    }
    if scenario.accounts.is_empty() && scenario.nodes.is_empty() {
        bail!("scenario {} has neither accounts nor nodes", args.scenario.display());
    }
    if invalid {
        bail!("scenario {} failed validation", args.scenario.display());
    }
    Ok(())
}

fn run_distribute(args: DistributeArgs, settings: &Settings) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let network = scenario.account_network()?;
    let funding = args.funding.or(scenario.funding).unwrap_or(0.0);
    let config = args.solver.apply(settings.discrete);

    info!(
        scenario = %args.scenario.display(),
        accounts = network.len(),
        funding,
        "running discrete distribution"
    );
    let result = DistributionEngine::new(config)
        .distribute(&network, funding)
        .context("distribution failed")?;

    if args.solver.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let summary = network
            .with_balances(&result.final_balances.values())
            .summary();
        print!("{}", report::distribution(&result, &summary));
    }
    Ok(())
}

fn run_equilibrium(args: EquilibriumArgs, settings: &Settings) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let network = scenario.flow_network()?;
    let config = args.solver.apply(settings.continuous);

    info!(
        scenario = %args.scenario.display(),
        nodes = network.len(),
        "running continuous equilibrium"
    );
    let mut result = EquilibriumEngine::new(config)
        .solve(&network)
        .context("equilibrium failed")?;
    if args.periods > 0.0 {
        result.integrate_balances(args.periods);
    }

    if args.solver.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::equilibrium(&result));
    }
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// `RUST_LOG` takes precedence over `level_str`. Pass `format = "json"` for
/// structured JSON output; any other value gives human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_distribute() {
        let cli = Cli::parse_from([
            "spillway",
            "--log-level",
            "debug",
            "distribute",
            "net.json",
            "--funding",
            "150",
            "--max-iterations",
            "5",
            "--json",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Distribute(args) = cli.command else {
            panic!("expected distribute");
        };
        assert_eq!(args.funding, Some(150.0));
        assert!(args.solver.json);
        let config = args.solver.apply(SolverConfig::discrete());
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.epsilon, 0.01);
    }

    #[test]
    fn cli_flags_override_settings() {
        let args = SolverArgs {
            max_iterations: None,
            epsilon: Some(0.5),
            verbose: true,
            json: false,
        };
        let config = args.apply(SolverConfig::continuous());
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.epsilon, 0.5);
        assert!(config.verbose);
    }

    #[test]
    fn cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
