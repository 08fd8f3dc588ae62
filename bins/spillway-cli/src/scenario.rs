//! JSON scenario files.
//!
//! ```json
//! { "funding": 500, "accounts": [ { "id": "a", "min_threshold": 100, ... } ] }
//! { "nodes": [ { "id": "a", "external_inflow": 200, ... } ] }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use spillway_core::network::{AccountNetwork, FlowNetwork, Network};
use spillway_core::types::{Account, FlowNode};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Lump sum for discrete runs when `--funding` is not given.
    #[serde(default)]
    pub funding: Option<f64>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn account_network(&self) -> Result<AccountNetwork> {
        if self.accounts.is_empty() {
            bail!("scenario has no \"accounts\" for a discrete run");
        }
        Ok(Network::new(self.accounts.clone()))
    }

    pub fn flow_network(&self) -> Result<FlowNetwork> {
        if self.nodes.is_empty() {
            bail!("scenario has no \"nodes\" for a continuous run");
        }
        Ok(Network::new(self.nodes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DISCRETE: &str = r#"{
        "name": "pair",
        "funding": 500,
        "accounts": [
            { "id": "a", "min_threshold": 100, "max_threshold": 200, "allocations": { "b": 100 } },
            { "id": "b", "min_threshold": 100, "max_threshold": 300, "allocations": { "a": 100 } }
        ]
    }"#;

    #[test]
    fn parses_discrete_scenario() {
        let scenario = Scenario::parse(DISCRETE).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("pair"));
        assert_eq!(scenario.funding, Some(500.0));
        let net = scenario.account_network().unwrap();
        assert_eq!(net.len(), 2);
        assert!(scenario.flow_network().is_err());
    }

    #[test]
    fn parses_continuous_scenario() {
        let scenario = Scenario::parse(
            r#"{ "nodes": [
                { "id": "n", "external_inflow": 5, "min_threshold": 1, "max_threshold": 2 }
            ] }"#,
        )
        .unwrap();
        let net = scenario.flow_network().unwrap();
        assert_eq!(net.total_external_inflow(), 5.0);
        assert!(scenario.account_network().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DISCRETE.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.accounts.len(), 2);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = Scenario::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse scenario"));
    }
}
