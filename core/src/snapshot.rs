//! Inventory snapshot: the unit of work handed over by the inventory
//! store, serialized as JSON.
//!
//! A snapshot captures everything one sweep needs: account balances,
//! their consumption histories, and pending consumption requests. The
//! engine reads it and never writes it back.

use crate::{
    error::WalletResult,
    history::ConsumptionHistory,
    optimizer::ConsumptionRequest,
    wallet::WalletAccount,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub as_of:     NaiveDate,
    pub accounts:  Vec<WalletAccount>,
    #[serde(default)]
    pub histories: Vec<ConsumptionHistory>,
    #[serde(default)]
    pub requests:  Vec<ConsumptionRequest>,
}

impl WalletSnapshot {
    pub fn new(as_of: NaiveDate) -> Self {
        Self { as_of, accounts: Vec::new(), histories: Vec::new(), requests: Vec::new() }
    }

    pub fn from_json(json: &str) -> WalletResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> WalletResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &str) -> WalletResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Histories keyed by account. Later entries win on duplicates.
    pub fn history_index(&self) -> HashMap<&str, &ConsumptionHistory> {
        self.histories
            .iter()
            .map(|h| (h.account_id.as_str(), h))
            .collect()
    }
}
