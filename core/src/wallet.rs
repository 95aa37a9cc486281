//! Wallet domain types: accounts and denomination stock.
//!
//! A wallet account is one (client, state, article code, denomination)
//! tuple. Accounts arrive from the inventory store as snapshots; the
//! engine never mutates them in place.

use crate::{
    error::{WalletError, WalletResult},
    types::{
        AccountId, Denomination, DAYS_PER_MONTH, DEFAULT_BUFFER_FACTOR, DEFAULT_MAX_DAYS,
        DEFAULT_THRESHOLD_DAYS,
    },
};
use serde::{Deserialize, Serialize};

/// Who holds the wallet and which stamp article it tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletKey {
    pub client:       String,
    /// State jurisdiction issuing the stamp (e.g. "Karnataka").
    pub state:        String,
    pub article_code: String,
    pub denomination: Denomination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub account_id:         AccountId,
    pub key:                WalletKey,
    /// Stamps on hand. Signed so a corrupt upstream snapshot is
    /// rejected instead of wrapping.
    pub current_balance:    i64,
    #[serde(default)]
    pub monthly_usage_rate: f64,
    #[serde(default = "default_threshold_days")]
    pub threshold_days:     u32,
    #[serde(default = "default_max_days")]
    pub max_days:           u32,
    #[serde(default = "default_buffer_factor")]
    pub buffer_factor:      f64,
}

fn default_threshold_days() -> u32 { DEFAULT_THRESHOLD_DAYS }
fn default_max_days() -> u32 { DEFAULT_MAX_DAYS }
fn default_buffer_factor() -> f64 { DEFAULT_BUFFER_FACTOR }

impl WalletAccount {
    /// Account with the documented default periods and buffer.
    pub fn new(
        account_id: impl Into<AccountId>,
        key: WalletKey,
        current_balance: i64,
        monthly_usage_rate: f64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            key,
            current_balance,
            monthly_usage_rate,
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            max_days: DEFAULT_MAX_DAYS,
            buffer_factor: DEFAULT_BUFFER_FACTOR,
        }
    }

    pub fn with_periods(mut self, threshold_days: u32, max_days: u32) -> Self {
        self.threshold_days = threshold_days;
        self.max_days = max_days;
        self
    }

    pub fn with_buffer_factor(mut self, buffer_factor: f64) -> Self {
        self.buffer_factor = buffer_factor;
        self
    }

    pub fn denomination(&self) -> Denomination {
        self.key.denomination
    }

    pub fn daily_usage_rate(&self) -> f64 {
        self.monthly_usage_rate / DAYS_PER_MONTH
    }

    /// Check the account invariants before any computation.
    pub fn validate(&self) -> WalletResult<()> {
        if self.current_balance < 0 {
            return Err(WalletError::invalid_account(
                &self.account_id,
                format!("negative balance {}", self.current_balance),
            ));
        }
        if self.threshold_days >= self.max_days {
            return Err(WalletError::invalid_account(
                &self.account_id,
                format!(
                    "threshold_days {} must be below max_days {}",
                    self.threshold_days, self.max_days
                ),
            ));
        }
        // NaN fails this comparison too.
        if !(self.buffer_factor >= 1.0) || !self.buffer_factor.is_finite() {
            return Err(WalletError::invalid_account(
                &self.account_id,
                format!("buffer_factor {} must be a finite value >= 1", self.buffer_factor),
            ));
        }
        if !(self.monthly_usage_rate >= 0.0) || !self.monthly_usage_rate.is_finite() {
            return Err(WalletError::invalid_account(
                &self.account_id,
                format!("monthly_usage_rate {} must be finite and >= 0", self.monthly_usage_rate),
            ));
        }
        Ok(())
    }
}

/// How many stamps of one face value are on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DenominationStock {
    pub denomination: Denomination,
    pub count:        u32,
}

impl DenominationStock {
    pub fn new(denomination: Denomination, count: u32) -> Self {
        Self { denomination, count }
    }
}
