//! The participant graph.
//!
//! A [`Network`] is an ordered list of participants plus an id index.
//! Allocation edges live on the participants themselves. Input order is kept
//! as the iteration order everywhere, which makes every solver run
//! reproducible. Cycles are allowed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::trace::Snapshot;
use crate::traits::Participant;
use crate::types::{Account, AccountId, AccountState, AccountStatus, FlowNode};

/// Ordered, id-indexed collection of participants.
#[derive(Clone, Debug, PartialEq)]
pub struct Network<P> {
    participants: Vec<P>,
    index: HashMap<AccountId, usize>,
}

/// Discrete-mode network.
pub type AccountNetwork = Network<Account>;

/// Continuous-mode network.
pub type FlowNetwork = Network<FlowNode>;

impl<P: Participant> Network<P> {
    /// Build a network. Duplicate ids are kept (the validator reports them);
    /// lookups resolve to the first occurrence.
    pub fn new(participants: Vec<P>) -> Self {
        let mut index = HashMap::with_capacity(participants.len());
        for (i, p) in participants.iter().enumerate() {
            index.entry(p.id().clone()).or_insert(i);
        }
        Self { participants, index }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.participants.iter()
    }

    pub fn participants(&self) -> &[P] {
        &self.participants
    }

    pub fn into_participants(self) -> Vec<P> {
        self.participants
    }

    /// Position of `id` in input order.
    pub fn index_of(&self, id: &AccountId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &AccountId) -> Option<&P> {
        self.index_of(id).map(|i| &self.participants[i])
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.index.contains_key(id)
    }

    /// Whether any other participant allocates a non-zero weight to `id`.
    pub fn has_incoming(&self, id: &AccountId) -> bool {
        self.participants.iter().any(|p| {
            p.id() != id && p.allocations().get(id).is_some_and(|w| *w > 0.0)
        })
    }

    /// Ids in input order.
    pub fn ids(&self) -> impl Iterator<Item = &AccountId> {
        self.participants.iter().map(|p| p.id())
    }
}

impl<P: Participant> FromIterator<P> for Network<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, P> IntoIterator for &'a Network<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.participants.iter()
    }
}

impl Network<Account> {
    pub fn total_balance(&self) -> f64 {
        self.participants.iter().map(|a| a.balance).sum()
    }

    /// Balances in input order.
    pub fn balances(&self) -> Snapshot {
        Snapshot::new(self.participants.iter().map(|a| (a.id.clone(), a.balance)))
    }

    /// Balance and derived fields for every account.
    pub fn states(&self) -> Vec<AccountState> {
        self.participants.iter().map(Account::state).collect()
    }

    /// Copy of this network with every balance replaced, in input order.
    ///
    /// `balances` must have one entry per account.
    pub fn with_balances(&self, balances: &[f64]) -> Self {
        debug_assert_eq!(balances.len(), self.participants.len());
        let participants = self
            .participants
            .iter()
            .zip(balances)
            .map(|(a, b)| Account { balance: *b, ..a.clone() })
            .collect();
        Self {
            participants,
            index: self.index.clone(),
        }
    }

    pub fn summary(&self) -> NetworkSummary {
        let mut s = NetworkSummary {
            accounts: self.participants.len(),
            ..NetworkSummary::default()
        };
        for a in &self.participants {
            match a.status() {
                AccountStatus::Deficit => s.deficit += 1,
                AccountStatus::Minimum => s.minimum += 1,
                AccountStatus::Healthy => s.healthy += 1,
                AccountStatus::Overflow => s.overflow += 1,
            }
            s.total_balance += a.balance;
            s.total_shortfall += a.shortfall();
            s.total_capacity += a.capacity();
            s.total_overflow += a.overflow();
        }
        s
    }
}

impl Network<FlowNode> {
    pub fn total_external_inflow(&self) -> f64 {
        self.participants.iter().map(|n| n.external_inflow).sum()
    }
}

/// Aggregate view of a discrete network.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NetworkSummary {
    pub accounts: usize,
    pub deficit: usize,
    pub minimum: usize,
    pub healthy: usize,
    pub overflow: usize,
    pub total_balance: f64,
    pub total_shortfall: f64,
    pub total_capacity: f64,
    pub total_overflow: f64,
}
