//! Consumption history: append-only usage samples per account.
//!
//! The monthly usage rate fed to the alert monitor is the trailing
//! 30-day sum as of the evaluation date.

use crate::{
    error::{WalletError, WalletResult},
    types::AccountId,
    wallet::WalletAccount,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const USAGE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    pub date:            NaiveDate,
    pub stamps_consumed: u32,
}

/// Deserialization replays every sample through `append`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HistoryRecord")]
pub struct ConsumptionHistory {
    pub account_id: AccountId,
    samples:        Vec<UsageSample>,
}

#[derive(Deserialize)]
struct HistoryRecord {
    account_id: AccountId,
    #[serde(default)]
    samples:    Vec<UsageSample>,
}

impl TryFrom<HistoryRecord> for ConsumptionHistory {
    type Error = WalletError;

    fn try_from(record: HistoryRecord) -> Result<Self, Self::Error> {
        let mut history = ConsumptionHistory::new(record.account_id);
        for sample in record.samples {
            history.append(sample.date, sample.stamps_consumed)?;
        }
        Ok(history)
    }
}

impl ConsumptionHistory {
    pub fn new(account_id: impl Into<AccountId>) -> Self {
        Self { account_id: account_id.into(), samples: Vec::new() }
    }

    /// Append a sample. Samples must arrive in date order; several
    /// samples on the same date are allowed.
    pub fn append(&mut self, date: NaiveDate, stamps_consumed: u32) -> WalletResult<()> {
        if let Some(last) = self.samples.last() {
            if date < last.date {
                return Err(WalletError::HistoryOutOfOrder {
                    account_id: self.account_id.clone(),
                    date,
                    last: last.date,
                });
            }
        }
        self.samples.push(UsageSample { date, stamps_consumed });
        Ok(())
    }

    pub fn samples(&self) -> &[UsageSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stamps consumed in `(as_of - window_days, as_of]`.
    pub fn trailing_usage(&self, as_of: NaiveDate, window_days: i64) -> u64 {
        let start = as_of - Duration::days(window_days);
        self.samples
            .iter()
            .filter(|s| s.date > start && s.date <= as_of)
            .map(|s| u64::from(s.stamps_consumed))
            .sum()
    }

    pub fn monthly_usage_rate(&self, as_of: NaiveDate) -> f64 {
        self.trailing_usage(as_of, USAGE_WINDOW_DAYS) as f64
    }

    /// Last 30 days against the 30 days before, in percent.
    /// `None` when the earlier window saw no consumption.
    pub fn monthly_trend_percent(&self, as_of: NaiveDate) -> Option<f64> {
        let current = self.trailing_usage(as_of, USAGE_WINDOW_DAYS);
        let previous = self.trailing_usage(as_of - Duration::days(USAGE_WINDOW_DAYS), USAGE_WINDOW_DAYS);
        if previous == 0 {
            return None;
        }
        Some((current as f64 - previous as f64) / previous as f64 * 100.0)
    }

    /// Copy of `account` carrying the rate derived from this history.
    pub fn apply_to(&self, account: &WalletAccount, as_of: NaiveDate) -> WalletAccount {
        WalletAccount {
            monthly_usage_rate: self.monthly_usage_rate(as_of),
            ..account.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn trailing_window_excludes_start_day() {
        let mut h = ConsumptionHistory::new("a");
        h.append(day(1), 5).unwrap();
        h.append(day(2), 7).unwrap();
        h.append(day(3), 11).unwrap();
        // (day 1, day 3] covers days 2 and 3 only.
        assert_eq!(h.trailing_usage(day(3), 2), 18);
    }

    #[test]
    fn out_of_order_json_rejected() {
        let json = r#"{"account_id": "a", "samples": [
            {"date": "2024-03-05", "stamps_consumed": 1},
            {"date": "2024-03-04", "stamps_consumed": 1}
        ]}"#;
        assert!(serde_json::from_str::<ConsumptionHistory>(json).is_err());
    }

    #[test]
    fn same_day_samples_accepted() {
        let mut h = ConsumptionHistory::new("a");
        h.append(day(4), 1).unwrap();
        h.append(day(4), 2).unwrap();
        assert_eq!(h.samples().len(), 2);
    }

    #[test]
    fn trend_compares_consecutive_windows() {
        let as_of = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let mut h = ConsumptionHistory::new("a");
        assert_eq!(h.monthly_trend_percent(as_of), None);
        // 20 in the earlier window, 30 in the latest.
        h.append(as_of - Duration::days(45), 20).unwrap();
        h.append(as_of - Duration::days(10), 30).unwrap();
        assert_eq!(h.monthly_usage_rate(as_of), 30.0);
        assert_eq!(h.monthly_trend_percent(as_of), Some(50.0));
    }
}
