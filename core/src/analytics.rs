//! Batch analytics over optimizer outcomes and alerts.
//!
//! Loss bands:
//!   Perfect: zero loss
//!   Minimal: below 5%
//!   Higher:  5% and above

use crate::{
    alert_monitor::{Alert, Urgency},
    optimizer::{Combination, RejectedReason},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MINIMAL_LOSS_PERCENTAGE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossBand {
    Perfect,
    Minimal,
    Higher,
}

impl LossBand {
    pub fn classify(loss_percentage: f64) -> Self {
        if loss_percentage <= 0.0 {
            Self::Perfect
        } else if loss_percentage < MINIMAL_LOSS_PERCENTAGE {
            Self::Minimal
        } else {
            Self::Higher
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStats {
    pub accepted:              usize,
    pub perfect:               usize,
    pub minimal:               usize,
    pub higher:                usize,
    /// Rejection counts keyed by `RejectedReason::kind()`.
    pub rejected:              BTreeMap<String, usize>,
    pub mean_loss_percentage:  f64,
    pub total_loss:            u64,
    pub total_stamps_used:     u64,
}

impl OptimizationStats {
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a Result<Combination, RejectedReason>>,
    {
        let mut stats = Self::default();
        let mut loss_pct_sum = 0.0;
        for outcome in outcomes {
            match outcome {
                Ok(combination) => {
                    stats.accepted += 1;
                    match LossBand::classify(combination.loss_percentage) {
                        LossBand::Perfect => stats.perfect += 1,
                        LossBand::Minimal => stats.minimal += 1,
                        LossBand::Higher  => stats.higher += 1,
                    }
                    loss_pct_sum += combination.loss_percentage;
                    stats.total_loss = stats.total_loss.saturating_add(combination.loss);
                    stats.total_stamps_used += u64::from(combination.stamps_used);
                }
                Err(reason) => {
                    *stats.rejected.entry(reason.kind().to_string()).or_insert(0) += 1;
                }
            }
        }
        if stats.accepted > 0 {
            stats.mean_loss_percentage = loss_pct_sum / stats.accepted as f64;
        }
        stats
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Share of accepted combinations in `band`, in percent.
    pub fn band_share(&self, band: LossBand) -> f64 {
        if self.accepted == 0 {
            return 0.0;
        }
        let count = match band {
            LossBand::Perfect => self.perfect,
            LossBand::Minimal => self.minimal,
            LossBand::Higher  => self.higher,
        };
        count as f64 / self.accepted as f64 * 100.0
    }
}

/// Alert counts per urgency tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub critical: usize,
    pub high:     usize,
    pub medium:   usize,
    pub low:      usize,
    pub quiet:    usize,
}

impl AlertSummary {
    pub fn from_alerts<'a, I>(alerts: I) -> Self
    where
        I: IntoIterator<Item = &'a Alert>,
    {
        let mut summary = Self::default();
        for alert in alerts {
            match alert.urgency {
                Urgency::Critical => summary.critical += 1,
                Urgency::High     => summary.high += 1,
                Urgency::Medium   => summary.medium += 1,
                Urgency::Low      => summary.low += 1,
                Urgency::None     => summary.quiet += 1,
            }
        }
        summary
    }

    pub fn active(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}
