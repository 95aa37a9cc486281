use crate::error::{WalletError, WalletResult};
use serde::{Deserialize, Serialize};

// ── Alert tiers ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertPolicy {
    /// Days of cover at or below which an account is critical.
    #[serde(default = "default_critical_days")]
    pub critical_days: f64,
    /// Days of cover at or below which an account is high urgency.
    #[serde(default = "default_high_days")]
    pub high_days: f64,
    /// Balance below this fraction of the threshold stock is critical
    /// regardless of days left.
    #[serde(default = "default_critical_balance_fraction")]
    pub critical_balance_fraction: f64,
}

fn default_critical_days() -> f64 { 1.0 }
fn default_high_days() -> f64 { 3.0 }
fn default_critical_balance_fraction() -> f64 { 0.10 }

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            critical_days:             default_critical_days(),
            high_days:                 default_high_days(),
            critical_balance_fraction: default_critical_balance_fraction(),
        }
    }
}

impl AlertPolicy {
    pub fn validate(&self) -> WalletResult<()> {
        if !(self.critical_days >= 0.0)
            || !(self.high_days >= self.critical_days)
            || !self.high_days.is_finite()
        {
            return Err(WalletError::InvalidConfig(format!(
                "alert tiers must satisfy 0 <= critical_days ({}) <= high_days ({}) < inf",
                self.critical_days, self.high_days
            )));
        }
        if !(0.0..=1.0).contains(&self.critical_balance_fraction) {
            return Err(WalletError::InvalidConfig(format!(
                "critical_balance_fraction {} must be within [0, 1]",
                self.critical_balance_fraction
            )));
        }
        Ok(())
    }
}

// ── Consumption optimizer ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverStrategy {
    /// Largest-first greedy pass only.
    Greedy,
    /// Greedy pass followed by a budgeted depth-first search.
    #[default]
    BoundedSearch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizerPolicy {
    /// Physical limit on stamps affixed/merged into one document.
    #[serde(default = "default_max_stamps_per_txn")]
    pub max_stamps_per_txn: u32,
    #[serde(default = "default_loss_cap_percentage")]
    pub loss_cap_percentage: f64,
    #[serde(default)]
    pub strategy: SolverStrategy,
    /// Search nodes a single request may visit.
    #[serde(default = "default_search_budget")]
    pub search_budget: u64,
}

fn default_max_stamps_per_txn() -> u32 { 10 }
fn default_loss_cap_percentage() -> f64 { 5.0 }
fn default_search_budget() -> u64 { 200_000 }

impl Default for OptimizerPolicy {
    fn default() -> Self {
        Self {
            max_stamps_per_txn:  default_max_stamps_per_txn(),
            loss_cap_percentage: default_loss_cap_percentage(),
            strategy:            SolverStrategy::default(),
            search_budget:       default_search_budget(),
        }
    }
}

impl OptimizerPolicy {
    pub fn with_max_stamps(mut self, max_stamps_per_txn: u32) -> Self {
        self.max_stamps_per_txn = max_stamps_per_txn;
        self
    }

    pub fn with_loss_cap(mut self, loss_cap_percentage: f64) -> Self {
        self.loss_cap_percentage = loss_cap_percentage;
        self
    }

    pub fn with_strategy(mut self, strategy: SolverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_search_budget(mut self, search_budget: u64) -> Self {
        self.search_budget = search_budget;
        self
    }

    pub fn validate(&self) -> WalletResult<()> {
        if self.max_stamps_per_txn == 0 {
            return Err(WalletError::InvalidConfig("max_stamps_per_txn must be positive".into()));
        }
        if !(self.loss_cap_percentage >= 0.0) || !self.loss_cap_percentage.is_finite() {
            return Err(WalletError::InvalidConfig(format!(
                "loss_cap_percentage {} must be finite and >= 0",
                self.loss_cap_percentage
            )));
        }
        if self.search_budget == 0 {
            return Err(WalletError::InvalidConfig("search_budget must be positive".into()));
        }
        Ok(())
    }
}

// ── Engine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub alert:     AlertPolicy,
    #[serde(default)]
    pub optimizer: OptimizerPolicy,
}

impl EngineConfig {
    /// Load from a JSON file. Missing sections and fields fall back to
    /// the documented defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WalletResult<()> {
        self.alert.validate()?;
        self.optimizer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"optimizer": {"loss_cap_percentage": 10.0}}"#).unwrap();
        assert_eq!(config.optimizer.max_stamps_per_txn, 10);
        assert_eq!(config.optimizer.loss_cap_percentage, 10.0);
        assert_eq!(config.optimizer.strategy, SolverStrategy::BoundedSearch);
        assert_eq!(config.alert, AlertPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_stamp_cap_rejected() {
        let policy = OptimizerPolicy::default().with_max_stamps(0);
        assert!(matches!(policy.validate(), Err(WalletError::InvalidConfig(_))));
    }

    #[test]
    fn inverted_tiers_rejected() {
        let policy = AlertPolicy { critical_days: 5.0, high_days: 3.0, ..AlertPolicy::default() };
        assert!(policy.validate().is_err());
    }
}
