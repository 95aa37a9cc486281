//! Consumption optimizer: pick the stamps that cover a contract value
//! with the least overshoot ("loss").
//!
//! Largest-first greedy is not globally optimal for arbitrary
//! denominations, so the default strategy follows the greedy pass with
//! a budgeted depth-first search over per-denomination quantities.
//!
//! RULES:
//!   - A returned combination never undershoots the target.
//!   - No candidate uses more than max_stamps_per_txn stamps.
//!   - Selection order: lowest loss, then fewest stamps, then the
//!     lexicographically smallest stamp sequence (largest-first).
//!   - An exact match ends the search immediately.

use crate::{
    config::{OptimizerPolicy, SolverStrategy},
    types::{Denomination, RequestId},
    wallet::DenominationStock,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampLine {
    pub denomination: Denomination,
    pub quantity:     u32,
}

impl StampLine {
    /// denomination × quantity, saturating.
    pub fn face_value(&self) -> u64 {
        self.denomination.saturating_mul(u64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    pub target:          u64,
    /// Largest denomination first, zero quantities omitted.
    pub lines:           Vec<StampLine>,
    pub total_used:      u64,
    pub loss:            u64,
    pub loss_percentage: f64,
    pub stamps_used:     u32,
}

impl Combination {
    /// The zero-target combination.
    pub fn empty() -> Self {
        Self {
            target:          0,
            lines:           Vec::new(),
            total_used:      0,
            loss:            0,
            loss_percentage: 0.0,
            stamps_used:     0,
        }
    }

    fn from_quantities(target: u64, stocks: &[DenominationStock], quantities: &[u32]) -> Self {
        let lines: Vec<StampLine> = stocks
            .iter()
            .zip(quantities)
            .filter(|(_, &q)| q > 0)
            .map(|(s, &q)| StampLine { denomination: s.denomination, quantity: q })
            .collect();
        let total_used = lines
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.face_value()));
        let stamps_used = lines.iter().map(|l| l.quantity).sum();
        let loss = total_used.saturating_sub(target);
        let loss_percentage = if target == 0 { 0.0 } else { loss as f64 / target as f64 * 100.0 };
        Self { target, lines, total_used, loss, loss_percentage, stamps_used }
    }

    pub fn quantity_of(&self, denomination: Denomination) -> u32 {
        self.lines
            .iter()
            .find(|l| l.denomination == denomination)
            .map_or(0, |l| l.quantity)
    }

    pub fn is_exact(&self) -> bool {
        self.loss == 0
    }

    /// Every stamp in the combination, largest first.
    pub fn sequence(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.lines
            .iter()
            .flat_map(|l| std::iter::repeat(l.denomination).take(l.quantity as usize))
    }

    /// Selection order between two candidates for the same target.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.loss
            .cmp(&other.loss)
            .then(self.stamps_used.cmp(&other.stamps_used))
            .then_with(|| self.sequence().cmp(other.sequence()))
    }
}

/// Why no combination was returned. These are business outcomes for
/// the procurement workflow, not system faults.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectedReason {
    #[error("insufficient inventory: {reachable} reachable within {max_stamps} stamps, {target} required")]
    InsufficientInventory { target: u64, reachable: u64, max_stamps: u32 },

    #[error("best combination loses {:.1}% against a cap of {cap_percentage}%", .best.loss_percentage)]
    LossCapExceeded { best: Box<Combination>, cap_percentage: f64 },

    #[error("search budget of {budget} nodes exhausted")]
    SearchBudgetExceeded { budget: u64 },

    #[error("invalid request: {detail}")]
    InvalidRequest { detail: String },
}

impl RejectedReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientInventory { .. } => "insufficient_inventory",
            Self::LossCapExceeded { .. }       => "loss_cap_exceeded",
            Self::SearchBudgetExceeded { .. }  => "search_budget_exceeded",
            Self::InvalidRequest { .. }        => "invalid_request",
        }
    }
}

/// One contract awaiting stamps, with optional per-request overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRequest {
    pub request_id: RequestId,
    pub target:     u64,
    pub inventory:  Vec<DenominationStock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stamps_per_txn: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_cap_percentage: Option<f64>,
}

// ── Entry points ─────────────────────────────────────────────────────────────

/// Select the stamps covering `target` with minimum loss.
pub fn optimize(
    target: u64,
    inventory: &[DenominationStock],
    policy: &OptimizerPolicy,
) -> Result<Combination, RejectedReason> {
    policy
        .validate()
        .map_err(|e| RejectedReason::InvalidRequest { detail: e.to_string() })?;
    let stocks = normalize(inventory)?;

    if target == 0 {
        return Ok(Combination::empty());
    }

    let max_stamps = policy.max_stamps_per_txn;
    let reachable = reachable_value(&stocks, max_stamps);
    if reachable < target {
        return Err(RejectedReason::InsufficientInventory { target, reachable, max_stamps });
    }

    let greedy = greedy_quantities(target, &stocks, loss_ceiling(target, policy), max_stamps)
        .map(|q| Combination::from_quantities(target, &stocks, &q));

    let best = match (greedy, policy.strategy) {
        (Some(candidate), _) if candidate.is_exact() => candidate,
        (Some(candidate), SolverStrategy::Greedy) => candidate,
        (seed, strategy) => {
            if strategy == SolverStrategy::Greedy {
                log::debug!("target={target}: greedy exhausted the stamp cap, searching");
            }
            bounded_search(target, &stocks, max_stamps, policy.search_budget, seed)?
                .ok_or(RejectedReason::InsufficientInventory { target, reachable, max_stamps })?
        }
    };

    log::debug!(
        "target={target} total={} loss={} stamps={}",
        best.total_used,
        best.loss,
        best.stamps_used
    );

    if best.loss as f64 * 100.0 > policy.loss_cap_percentage * target as f64 {
        return Err(RejectedReason::LossCapExceeded {
            best:           Box::new(best),
            cap_percentage: policy.loss_cap_percentage,
        });
    }
    Ok(best)
}

/// The greedy candidate alone, without the loss-cap check.
/// `None` when greedy cannot cover the target within the stamp cap.
pub fn greedy_candidate(
    target: u64,
    inventory: &[DenominationStock],
    policy: &OptimizerPolicy,
) -> Result<Option<Combination>, RejectedReason> {
    let stocks = normalize(inventory)?;
    if target == 0 {
        return Ok(Some(Combination::empty()));
    }
    Ok(
        greedy_quantities(target, &stocks, loss_ceiling(target, policy), policy.max_stamps_per_txn)
            .map(|q| Combination::from_quantities(target, &stocks, &q)),
    )
}

/// Stateless optimizer bound to a default policy.
#[derive(Debug, Clone, Default)]
pub struct ConsumptionOptimizer {
    policy: OptimizerPolicy,
}

impl ConsumptionOptimizer {
    pub fn new(policy: OptimizerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OptimizerPolicy {
        &self.policy
    }

    /// The default policy with the request's overrides applied.
    pub fn policy_for(&self, request: &ConsumptionRequest) -> OptimizerPolicy {
        let mut policy = self.policy.clone();
        if let Some(max_stamps) = request.max_stamps_per_txn {
            policy.max_stamps_per_txn = max_stamps;
        }
        if let Some(cap) = request.loss_cap_percentage {
            policy.loss_cap_percentage = cap;
        }
        policy
    }

    pub fn optimize_request(
        &self,
        request: &ConsumptionRequest,
    ) -> Result<Combination, RejectedReason> {
        optimize(request.target, &request.inventory, &self.policy_for(request))
    }

    /// Optimize independent requests in parallel. Results keep input order.
    pub fn optimize_batch(
        &self,
        requests: &[ConsumptionRequest],
    ) -> Vec<Result<Combination, RejectedReason>> {
        requests.par_iter().map(|r| self.optimize_request(r)).collect()
    }
}

// ── Internals ────────────────────────────────────────────────────────────────

/// Merge duplicate denominations, drop empty stock, sort largest first.
/// Inventories whose total face value overflows `u64` are rejected.
fn normalize(inventory: &[DenominationStock]) -> Result<Vec<DenominationStock>, RejectedReason> {
    let mut merged: BTreeMap<Denomination, u32> = BTreeMap::new();
    for stock in inventory {
        if stock.denomination == 0 {
            return Err(RejectedReason::InvalidRequest {
                detail: "denomination must be positive".into(),
            });
        }
        let count = merged.entry(stock.denomination).or_insert(0);
        *count = count.saturating_add(stock.count);
    }
    // Every subset total must be representable.
    merged
        .iter()
        .try_fold(0u64, |acc, (&denomination, &count)| {
            denomination.checked_mul(u64::from(count))?.checked_add(acc)
        })
        .ok_or_else(|| RejectedReason::InvalidRequest {
            detail: "inventory face value exceeds the representable range".into(),
        })?;
    Ok(merged
        .into_iter()
        .rev()
        .filter(|&(_, count)| count > 0)
        .map(|(denomination, count)| DenominationStock { denomination, count })
        .collect())
}

/// Highest value coverable with at most `max_stamps` stamps, saturating
/// at `u64::MAX`. `stocks` must be sorted largest first.
fn reachable_value(stocks: &[DenominationStock], max_stamps: u32) -> u64 {
    let mut allowance = max_stamps;
    let mut value = 0u64;
    for stock in stocks {
        if allowance == 0 {
            break;
        }
        let take = stock.count.min(allowance);
        value = value.saturating_add(stock.denomination.saturating_mul(u64::from(take)));
        allowance -= take;
    }
    value
}

/// Highest running total the greedy pass accepts without falling back.
/// The float-to-int cast saturates, so any finite cap is safe.
fn loss_ceiling(target: u64, policy: &OptimizerPolicy) -> u64 {
    target.saturating_add((target as f64 * policy.loss_cap_percentage / 100.0).floor() as u64)
}

fn greedy_quantities(
    target: u64,
    stocks: &[DenominationStock],
    ceiling: u64,
    max_stamps: u32,
) -> Option<Vec<u32>> {
    let mut left: Vec<u32> = stocks.iter().map(|s| s.count).collect();
    let mut quantities = vec![0u32; stocks.len()];
    let mut total = 0u64;
    let mut used = 0u32;

    while total < target {
        if used == max_stamps {
            return None;
        }
        // Largest stamp that stays under the ceiling, else the smallest
        // stamp left (least overshoot).
        let pick = (0..stocks.len())
            .find(|&i| left[i] > 0 && total.saturating_add(stocks[i].denomination) <= ceiling)
            .or_else(|| (0..stocks.len()).rev().find(|&i| left[i] > 0))?;
        left[pick] -= 1;
        quantities[pick] += 1;
        total = total.saturating_add(stocks[pick].denomination);
        used += 1;
    }
    Some(quantities)
}

struct Search<'a> {
    target:     u64,
    stocks:     &'a [DenominationStock],
    max_stamps: u32,
    budget:     u64,
    visited:    u64,
    quantities: Vec<u32>,
    best:       Option<Combination>,
}

fn bounded_search(
    target: u64,
    stocks: &[DenominationStock],
    max_stamps: u32,
    budget: u64,
    seed: Option<Combination>,
) -> Result<Option<Combination>, RejectedReason> {
    let mut search = Search {
        target,
        stocks,
        max_stamps,
        budget,
        visited: 0,
        quantities: vec![0; stocks.len()],
        best: seed,
    };
    search.descend(0, 0, 0)?;
    log::debug!("target={target}: search visited {} nodes", search.visited);
    Ok(search.best)
}

impl Search<'_> {
    /// Returns `Ok(true)` once an exact match has ended the search.
    ///
    /// On entry `quantities[index..]` is all zeros; every level restores
    /// that before returning normally.
    fn descend(&mut self, index: usize, total: u64, used: u32) -> Result<bool, RejectedReason> {
        self.visited += 1;
        if self.visited > self.budget {
            return Err(RejectedReason::SearchBudgetExceeded { budget: self.budget });
        }

        if total >= self.target {
            let candidate = Combination::from_quantities(self.target, self.stocks, &self.quantities);
            let exact = candidate.is_exact();
            self.consider(candidate);
            return Ok(exact);
        }

        let allowance = self.max_stamps - used;
        if index == self.stocks.len()
            || allowance == 0
            || total.saturating_add(reachable_value(&self.stocks[index..], allowance)) < self.target
        {
            return Ok(false);
        }

        let stock = self.stocks[index];
        // More stamps than needed to cover the remainder only add loss.
        let needed = (self.target - total).div_ceil(stock.denomination);
        let max_qty = u64::from(stock.count.min(allowance)).min(needed) as u32;

        for qty in (0..=max_qty).rev() {
            self.quantities[index] = qty;
            let next_total = total.saturating_add(stock.denomination.saturating_mul(u64::from(qty)));
            if self.descend(index + 1, next_total, used + qty)? {
                return Ok(true);
            }
        }
        self.quantities[index] = 0;
        Ok(false)
    }

    fn consider(&mut self, candidate: Combination) {
        let better = match &self.best {
            Some(best) => candidate.rank_cmp(best) == Ordering::Less,
            None => true,
        };
        if better {
            self.best = Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(pairs: &[(u64, u32)]) -> Vec<DenominationStock> {
        pairs.iter().map(|&(d, c)| DenominationStock::new(d, c)).collect()
    }

    #[test]
    fn normalize_merges_and_sorts() {
        let stocks = normalize(&stock(&[(20, 1), (100, 0), (50, 2), (20, 3)])).unwrap();
        assert_eq!(stocks, stock(&[(50, 2), (20, 4)]));
    }

    #[test]
    fn reachable_respects_stamp_cap() {
        let stocks = stock(&[(100, 2), (50, 5)]);
        assert_eq!(reachable_value(&stocks, 3), 250);
        assert_eq!(reachable_value(&stocks, 0), 0);
    }

    #[test]
    fn fewer_stamps_beat_equal_loss() {
        let stocks = stock(&[(60, 3), (40, 3)]);
        let two = Combination::from_quantities(110, &stocks, &[2, 0]);
        let three = Combination::from_quantities(110, &stocks, &[0, 3]);
        assert_eq!(two.loss, three.loss);
        assert_eq!(two.rank_cmp(&three), Ordering::Less);
    }

    #[test]
    fn smaller_sequence_breaks_remaining_ties() {
        let stocks = stock(&[(70, 1), (50, 2), (30, 1)]);
        let big_first = Combination::from_quantities(100, &stocks, &[1, 0, 1]);
        let halves = Combination::from_quantities(100, &stocks, &[0, 2, 0]);
        assert_eq!(halves.rank_cmp(&big_first), Ordering::Less);
    }

    #[test]
    fn greedy_respects_ceiling_then_falls_back() {
        let stocks = stock(&[(100, 4), (60, 6)]);
        let q = greedy_quantities(180, &stocks, 198, 10).unwrap();
        assert_eq!(q, vec![1, 2]);
    }
}
