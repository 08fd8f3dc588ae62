//! Participant types: discrete accounts, continuous flow nodes, and the
//! status and zone classifications derived from them.
//!
//! Derived quantities (shortfall, capacity, overflow, status) are never
//! stored. They are computed from `balance` on every call, so they cannot
//! drift out of step with it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{CAPACITY_MULTIPLIER, MINIMUM_BAND};

/// Stable identity of an account or flow node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Outgoing allocation weights keyed by target. Ordered by target id so that
/// every sum over the map is evaluated in the same order on every run.
pub type Allocations = BTreeMap<AccountId, f64>;

/// Where a balance sits relative to its thresholds.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Below the minimum threshold.
    Deficit,
    /// At (or within [`MINIMUM_BAND`] above) the minimum threshold.
    Minimum,
    /// Between minimum and maximum.
    Healthy,
    /// At or above the maximum threshold.
    Overflow,
}

impl AccountStatus {
    /// Classify a balance. The overflow check runs before the minimum band,
    /// so an account whose band reaches its maximum reports `Overflow`.
    pub fn classify(balance: f64, min_threshold: f64, max_threshold: f64) -> Self {
        if balance < min_threshold {
            Self::Deficit
        } else if balance >= max_threshold {
            Self::Overflow
        } else if (balance - min_threshold).abs() < MINIMUM_BAND {
            Self::Minimum
        } else {
            Self::Healthy
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deficit => "deficit",
            Self::Minimum => "minimum",
            Self::Healthy => "healthy",
            Self::Overflow => "overflow",
        };
        f.pad(s)
    }
}

/// A participant in discrete (lump-sum) mode.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    /// Display name only.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub balance: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    #[serde(default)]
    pub allocations: Allocations,
}

impl Account {
    /// Create an account with zero balance, no allocations, and its id as name.
    pub fn new(id: impl Into<AccountId>, min_threshold: f64, max_threshold: f64) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            balance: 0.0,
            min_threshold,
            max_threshold,
            allocations: Allocations::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }

    /// Add (or replace) an outgoing allocation weight.
    pub fn allocate(mut self, target: impl Into<AccountId>, weight: f64) -> Self {
        self.allocations.insert(target.into(), weight);
        self
    }

    /// `max(0, min - balance)`
    pub fn shortfall(&self) -> f64 {
        (self.min_threshold - self.balance).max(0.0)
    }

    /// `max(0, max - balance)`
    pub fn capacity(&self) -> f64 {
        (self.max_threshold - self.balance).max(0.0)
    }

    /// `max(0, balance - max)`
    pub fn overflow(&self) -> f64 {
        (self.balance - self.max_threshold).max(0.0)
    }

    pub fn status(&self) -> AccountStatus {
        AccountStatus::classify(self.balance, self.min_threshold, self.max_threshold)
    }

    /// Snapshot of the balance together with every derived field.
    pub fn state(&self) -> AccountState {
        AccountState {
            id: self.id.clone(),
            name: self.name.clone(),
            balance: self.balance,
            min_threshold: self.min_threshold,
            max_threshold: self.max_threshold,
            shortfall: self.shortfall(),
            capacity: self.capacity(),
            overflow: self.overflow(),
            status: self.status(),
        }
    }
}

/// Read-only view of an account with its derived fields, all computed from
/// the same `balance`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountState {
    pub id: AccountId,
    pub name: String,
    pub balance: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub shortfall: f64,
    pub capacity: f64,
    pub overflow: f64,
    pub status: AccountStatus,
}

/// Outflow regime of a flow node in continuous mode.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Inflow below the minimum: keep everything.
    Deficit,
    /// Between the minimum and the capacity threshold: pass on a growing share.
    Building,
    /// At or above the capacity threshold: keep exactly the maximum.
    Capacity,
}

impl Zone {
    pub fn classify(total_inflow: f64, min_threshold: f64, max_threshold: f64) -> Self {
        if total_inflow < min_threshold {
            Self::Deficit
        } else if total_inflow >= capacity_threshold(max_threshold) {
            Self::Capacity
        } else {
            Self::Building
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Deficit => "deficit",
            Self::Building => "building",
            Self::Capacity => "capacity",
        };
        f.pad(s)
    }
}

/// Inflow at which a node enters the capacity zone.
pub fn capacity_threshold(max_threshold: f64) -> f64 {
    CAPACITY_MULTIPLIER * max_threshold
}

/// A participant in continuous (rate) mode. Thresholds bound rates per period.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FlowNode {
    pub id: AccountId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub external_inflow: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    #[serde(default)]
    pub allocations: Allocations,
    /// Accumulated display balance. Never read by the equilibrium solver.
    #[serde(default)]
    pub balance: f64,
}

impl FlowNode {
    pub fn new(id: impl Into<AccountId>, min_threshold: f64, max_threshold: f64) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            external_inflow: 0.0,
            min_threshold,
            max_threshold,
            allocations: Allocations::new(),
            balance: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_inflow(mut self, external_inflow: f64) -> Self {
        self.external_inflow = external_inflow;
        self
    }

    pub fn allocate(mut self, target: impl Into<AccountId>, weight: f64) -> Self {
        self.allocations.insert(target.into(), weight);
        self
    }

    pub fn capacity_threshold(&self) -> f64 {
        capacity_threshold(self.max_threshold)
    }
}
