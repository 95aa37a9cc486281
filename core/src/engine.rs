//! The sweep engine: one pass of both components over a snapshot.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Usage rates derived from consumption histories
//!   2. Alert monitor over every account        (parallel)
//!   3. Replenishment orders for actionable alerts
//!   4. Consumption optimizer over every request (parallel)
//!   5. Analytics
//!
//! RULES:
//!   - The engine owns no mutable state between sweeps.
//!   - A bad account or request never aborts the sweep; it becomes a
//!     rejection event.
//!   - Results are collected in snapshot order, so the event log of a
//!     snapshot is always the same.

use crate::{
    alert_monitor::{Alert, AlertMonitor},
    analytics::{AlertSummary, OptimizationStats},
    config::EngineConfig,
    error::{WalletError, WalletResult},
    event::WalletEvent,
    optimizer::{Combination, ConsumptionOptimizer, RejectedReason},
    procurement::{draft_order, ReplenishmentOrder},
    snapshot::WalletSnapshot,
    types::RequestId,
    wallet::WalletAccount,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct RequestOutcome {
    pub request_id: RequestId,
    pub outcome:    Result<Combination, RejectedReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub as_of:         NaiveDate,
    /// Actionable alerts only, most urgent first.
    pub alerts:        Vec<Alert>,
    pub orders:        Vec<ReplenishmentOrder>,
    pub outcomes:      Vec<RequestOutcome>,
    pub alert_summary: AlertSummary,
    pub stats:         OptimizationStats,
    pub events:        Vec<WalletEvent>,
}

pub struct WalletEngine {
    config:    EngineConfig,
    monitor:   AlertMonitor,
    optimizer: ConsumptionOptimizer,
}

impl WalletEngine {
    pub fn new(config: EngineConfig) -> WalletResult<Self> {
        config.validate()?;
        Ok(Self {
            monitor:   AlertMonitor::new(config.alert.clone())?,
            optimizer: ConsumptionOptimizer::new(config.optimizer.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn monitor(&self) -> &AlertMonitor {
        &self.monitor
    }

    pub fn optimizer(&self) -> &ConsumptionOptimizer {
        &self.optimizer
    }

    /// Run every stage over `snapshot` and collect the report.
    pub fn sweep(&self, snapshot: &WalletSnapshot) -> WalletResult<SweepReport> {
        check_unique_accounts(&snapshot.accounts)?;

        let as_of = snapshot.as_of;
        log::info!(
            "sweep as_of={as_of}: {} accounts, {} requests",
            snapshot.accounts.len(),
            snapshot.requests.len()
        );

        let mut events = vec![WalletEvent::SweepStarted {
            as_of,
            accounts: snapshot.accounts.len(),
            requests: snapshot.requests.len(),
        }];

        // 1. Derive usage rates.
        let histories = snapshot.history_index();
        let accounts: Vec<WalletAccount> = snapshot
            .accounts
            .iter()
            .map(|account| match histories.get(account.account_id.as_str()) {
                Some(history) => history.apply_to(account, as_of),
                None => account.clone(),
            })
            .collect();

        // 2-3. Alerts and orders.
        let evaluations = self.monitor.evaluate_batch(&accounts);
        let mut evaluated = Vec::with_capacity(accounts.len());
        let mut alerts = Vec::new();
        let mut orders = Vec::new();

        for (account, result) in accounts.iter().zip(evaluations) {
            match result {
                Ok(mut alert) => {
                    alert.usage_trend_percent = histories
                        .get(account.account_id.as_str())
                        .and_then(|history| history.monthly_trend_percent(as_of));
                    if alert.is_actionable() {
                        events.push(WalletEvent::AlertRaised {
                            account_id:   alert.account_id.clone(),
                            urgency:      alert.urgency,
                            days_left:    alert.days_left,
                            required_qty: alert.required_qty,
                            usage_trend_percent: alert.usage_trend_percent,
                        });
                        if let Some(order) = draft_order(account, &alert, as_of) {
                            events.push(WalletEvent::ReplenishmentRequested {
                                order_id:     order.order_id.clone(),
                                account_id:   order.account_id.clone(),
                                denomination: order.denomination,
                                quantity:     order.quantity,
                                face_value:   order.face_value,
                                urgency:      order.urgency,
                            });
                            orders.push(order);
                        }
                        alerts.push(alert.clone());
                    }
                    evaluated.push(alert);
                }
                Err(e) => {
                    log::warn!("account {} rejected: {e}", account.account_id);
                    events.push(WalletEvent::AccountRejected {
                        account_id: account.account_id.clone(),
                        reason:     e.to_string(),
                    });
                }
            }
        }
        // Stable sort keeps snapshot order within a tier.
        alerts.sort_by(|a, b| b.urgency.cmp(&a.urgency));

        // 4. Consumption requests.
        let results = self.optimizer.optimize_batch(&snapshot.requests);
        let mut outcomes = Vec::with_capacity(results.len());
        for (request, outcome) in snapshot.requests.iter().zip(results) {
            match &outcome {
                Ok(combination) => events.push(WalletEvent::CombinationSelected {
                    request_id:  request.request_id.clone(),
                    target:      request.target,
                    total_used:  combination.total_used,
                    loss:        combination.loss,
                    stamps_used: combination.stamps_used,
                }),
                Err(reason) => {
                    log::warn!("request {} rejected: {reason}", request.request_id);
                    events.push(WalletEvent::ConsumptionRejected {
                        request_id: request.request_id.clone(),
                        target:     request.target,
                        kind:       reason.kind().to_string(),
                        detail:     reason.to_string(),
                    });
                }
            }
            outcomes.push(RequestOutcome { request_id: request.request_id.clone(), outcome });
        }

        // 5. Analytics.
        let alert_summary = AlertSummary::from_alerts(&evaluated);
        let stats = OptimizationStats::from_outcomes(outcomes.iter().map(|o| &o.outcome));

        events.push(WalletEvent::SweepCompleted {
            as_of,
            alerts:     alerts.len(),
            orders:     orders.len(),
            accepted:   stats.accepted,
            rejections: stats.rejected_total(),
        });

        log::info!(
            "sweep as_of={as_of} done: {} alerts, {} orders, {} accepted, {} rejected",
            alerts.len(),
            orders.len(),
            stats.accepted,
            stats.rejected_total()
        );

        Ok(SweepReport { as_of, alerts, orders, outcomes, alert_summary, stats, events })
    }
}

fn check_unique_accounts(accounts: &[WalletAccount]) -> WalletResult<()> {
    let mut seen = HashSet::with_capacity(accounts.len());
    for account in accounts {
        if !seen.insert(account.account_id.as_str()) {
            return Err(WalletError::DuplicateAccount { account_id: account.account_id.clone() });
        }
    }
    Ok(())
}
