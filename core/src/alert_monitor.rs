//! Alert monitor: predictive low-balance alerts per wallet account.
//!
//! For every account this component:
//!   1. Converts the monthly usage rate into a daily rate
//!   2. Projects days of cover left at that rate
//!   3. Assigns an urgency tier
//!   4. Sizes the replenishment needed to reach max_days of cover
//!
//! Evaluation is a pure function of the account; batches run in
//! parallel with no shared state.

use crate::{
    config::AlertPolicy,
    error::WalletResult,
    history::ConsumptionHistory,
    types::AccountId,
    wallet::WalletAccount,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Urgency tiers, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None     => "none",
            Self::Low      => "low",
            Self::Medium   => "medium",
            Self::High     => "high",
            Self::Critical => "critical",
        }
    }
}

/// Result of one evaluation. Recomputed on every evaluation, never
/// updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub account_id:       AccountId,
    pub urgency:          Urgency,
    /// `f64::INFINITY` when the account sees no consumption.
    pub days_left:        f64,
    pub required_qty:     u64,
    pub daily_usage_rate: f64,
    /// Effective trigger threshold expressed in stamps.
    pub threshold_qty:    u64,
    pub current_balance:  u64,
    /// Last 30 days of usage against the 30 before, in percent. Only
    /// known when the rate came from a consumption history.
    pub usage_trend_percent: Option<f64>,
}

impl Alert {
    pub fn is_actionable(&self) -> bool {
        self.urgency != Urgency::None
    }

    /// Balance as a percentage of the threshold stock.
    pub fn coverage_percent(&self) -> f64 {
        if self.threshold_qty == 0 {
            return 100.0;
        }
        self.current_balance as f64 / self.threshold_qty as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertMonitor {
    policy: AlertPolicy,
}

impl AlertMonitor {
    /// Fails with `InvalidConfig` when the tier cutoffs are inconsistent
    /// or not finite.
    pub fn new(policy: AlertPolicy) -> WalletResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Evaluate one account. Fails only on an invalid account.
    pub fn evaluate(&self, account: &WalletAccount) -> WalletResult<Alert> {
        account.validate()?;

        // validate() guarantees a non-negative balance.
        let balance = account.current_balance as u64;
        let daily = account.daily_usage_rate();

        if daily == 0.0 {
            return Ok(Alert {
                account_id:       account.account_id.clone(),
                urgency:          Urgency::None,
                days_left:        f64::INFINITY,
                required_qty:     0,
                daily_usage_rate: 0.0,
                threshold_qty:    0,
                current_balance:  balance,
                usage_trend_percent: None,
            });
        }

        let threshold_days = f64::from(account.threshold_days);
        let effective_days = threshold_days * account.buffer_factor;
        let days_left = balance as f64 / daily;
        let threshold_stock = threshold_days * daily;

        let urgency = if days_left <= self.policy.critical_days
            || (balance as f64) < self.policy.critical_balance_fraction * threshold_stock
        {
            Urgency::Critical
        } else if days_left <= self.policy.high_days {
            Urgency::High
        } else if days_left <= threshold_days {
            Urgency::Medium
        } else if days_left <= effective_days {
            Urgency::Low
        } else {
            Urgency::None
        };

        let target_stock = (daily * f64::from(account.max_days)).ceil() as u64;
        let required_qty = target_stock.saturating_sub(balance);
        let threshold_qty = (daily * effective_days).ceil() as u64;

        log::debug!(
            "account={} balance={balance} daily={daily:.3} days_left={days_left:.2} urgency={}",
            account.account_id,
            urgency.as_str()
        );

        Ok(Alert {
            account_id: account.account_id.clone(),
            urgency,
            days_left,
            required_qty,
            daily_usage_rate: daily,
            threshold_qty,
            current_balance: balance,
            usage_trend_percent: None,
        })
    }

    /// Evaluate with the usage rate derived from `history` as of `as_of`.
    pub fn evaluate_with_history(
        &self,
        account: &WalletAccount,
        history: &ConsumptionHistory,
        as_of: NaiveDate,
    ) -> WalletResult<Alert> {
        let mut alert = self.evaluate(&history.apply_to(account, as_of))?;
        alert.usage_trend_percent = history.monthly_trend_percent(as_of);
        Ok(alert)
    }

    /// Evaluate many accounts in parallel. Results keep input order.
    pub fn evaluate_batch(&self, accounts: &[WalletAccount]) -> Vec<WalletResult<Alert>> {
        accounts.par_iter().map(|account| self.evaluate(account)).collect()
    }
}
