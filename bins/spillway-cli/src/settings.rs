//! CLI settings, layered with the `config` crate.
//!
//! Precedence, lowest first: built-in defaults, the TOML file (explicit
//! `--config` or `<config dir>/spillway/spillway.toml` when present),
//! `SPILLWAY__*` environment variables (e.g. `SPILLWAY__DISCRETE__EPSILON`),
//! then command-line flags applied by the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use spillway_core::config::SolverConfig;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Log level filter string (e.g. "info", "debug", "spillway_engine=trace").
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
    pub discrete: SolverConfig,
    pub continuous: SolverConfig,
}

/// Default settings file location, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("spillway").join("spillway.toml"))
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let discrete = SolverConfig::discrete();
        let continuous = SolverConfig::continuous();

        let mut builder = Config::builder()
            .set_default("log_level", "info")?
            .set_default("log_format", "text")?
            .set_default("discrete.max_iterations", discrete.max_iterations as i64)?
            .set_default("discrete.epsilon", discrete.epsilon)?
            .set_default("discrete.verbose", discrete.verbose)?
            .set_default("continuous.max_iterations", continuous.max_iterations as i64)?
            .set_default("continuous.epsilon", continuous.epsilon)?
            .set_default("continuous.verbose", continuous.verbose)?;

        match path {
            Some(path) => builder = builder.add_source(File::from(path).required(true)),
            None => {
                if let Some(default) = default_config_path() {
                    builder = builder.add_source(File::from(default).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("SPILLWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("invalid settings")?;

        settings.discrete.validate().context("invalid [discrete] settings")?;
        settings.continuous.validate().context("invalid [continuous] settings")?;
        Ok(settings)
    }
}
