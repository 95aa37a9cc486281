//! The event log: everything a sweep reports to external collaborators.
//!
//! RULE: Collaborators (notification dispatcher, procurement workflow)
//! consume events only. They never read engine internals.
//! Event order within a sweep is deterministic: accounts in snapshot
//! order, then requests in snapshot order.

use crate::{
    alert_monitor::Urgency,
    types::{AccountId, Denomination, RequestId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every event emitted during a sweep.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    // ── Sweep lifecycle ────────────────────────────
    SweepStarted {
        as_of:    NaiveDate,
        accounts: usize,
        requests: usize,
    },
    SweepCompleted {
        as_of:      NaiveDate,
        alerts:     usize,
        orders:     usize,
        accepted:   usize,
        rejections: usize,
    },

    // ── Alert monitor ──────────────────────────────
    AlertRaised {
        account_id:   AccountId,
        urgency:      Urgency,
        days_left:    f64,
        required_qty: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage_trend_percent: Option<f64>,
    },
    AccountRejected {
        account_id: AccountId,
        reason:     String,
    },

    // ── Procurement ────────────────────────────────
    ReplenishmentRequested {
        order_id:     String,
        account_id:   AccountId,
        denomination: Denomination,
        quantity:     u64,
        face_value:   u64,
        urgency:      Urgency,
    },

    // ── Consumption optimizer ──────────────────────
    CombinationSelected {
        request_id:  RequestId,
        target:      u64,
        total_used:  u64,
        loss:        u64,
        stamps_used: u32,
    },
    ConsumptionRejected {
        request_id: RequestId,
        target:     u64,
        kind:       String,
        detail:     String,
    },
}

impl WalletEvent {
    /// Stable name of the variant, for log lines and event filters.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SweepStarted { .. }           => "sweep_started",
            Self::SweepCompleted { .. }         => "sweep_completed",
            Self::AlertRaised { .. }            => "alert_raised",
            Self::AccountRejected { .. }        => "account_rejected",
            Self::ReplenishmentRequested { .. } => "replenishment_requested",
            Self::CombinationSelected { .. }    => "combination_selected",
            Self::ConsumptionRejected { .. }    => "consumption_rejected",
        }
    }
}
