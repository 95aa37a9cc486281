//! Synthetic snapshot generation for load runs and determinism tests.
//!
//! All generation is deterministic (same seed = same snapshot).

use crate::{
    error::WalletResult,
    history::ConsumptionHistory,
    optimizer::ConsumptionRequest,
    rng::{Stream, StreamRng},
    snapshot::WalletSnapshot,
    types::{Denomination, DAYS_PER_MONTH},
    wallet::{DenominationStock, WalletAccount, WalletKey},
};
use chrono::{Duration, NaiveDate};

const CLIENTS: &[&str] = &[
    "XYZ Bank",
    "Tech Startup",
    "Metro Housing Finance",
    "Sunrise Realty",
    "Apex Legal Services",
    "Northwind Leasing",
];

/// (state, article code) pairs.
const JURISDICTIONS: &[(&str, &str)] = &[
    ("Karnataka", "KA1008"),
    ("Maharashtra", "MH2001"),
    ("Tamil Nadu", "TN3005"),
    ("Delhi", "DL4002"),
    ("Gujarat", "GJ5010"),
];

const WALLET_DENOMINATIONS: &[Denomination] = &[10, 20, 50, 100, 500, 1000];
const STOCK_DENOMINATIONS: &[Denomination] = &[10, 20, 25, 50, 60, 100, 500, 1000];

#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    pub seed:         u64,
    pub accounts:     usize,
    pub requests:     usize,
    pub as_of:        NaiveDate,
    pub history_days: u32,
}

impl GeneratorSpec {
    pub fn new(seed: u64, accounts: usize, requests: usize, as_of: NaiveDate) -> Self {
        Self { seed, accounts, requests, as_of, history_days: 60 }
    }
}

pub fn synthetic_snapshot(spec: &GeneratorSpec) -> WalletResult<WalletSnapshot> {
    let mut account_rng = StreamRng::for_stream(spec.seed, Stream::Accounts);
    let mut usage_rng = StreamRng::for_stream(spec.seed, Stream::Usage);
    let mut request_rng = StreamRng::for_stream(spec.seed, Stream::Requests);

    let mut snapshot = WalletSnapshot::new(spec.as_of);

    for i in 0..spec.accounts {
        let account_id = format!("acct-{i:04}");
        let (state, article_code) = *account_rng.pick(JURISDICTIONS);
        let key = WalletKey {
            client:       account_rng.pick(CLIENTS).to_string(),
            state:        state.to_string(),
            article_code: article_code.to_string(),
            denomination: *account_rng.pick(WALLET_DENOMINATIONS),
        };

        // Heavy-tailed monthly usage: most wallets are small, a few busy.
        let monthly = account_rng.pareto(20.0, 1.8).min(400.0).round();
        let daily = monthly / DAYS_PER_MONTH;
        let cover_days = account_rng.range_inclusive(0, 75) as f64;
        let balance = (daily * cover_days).round() as i64;

        let history = usage_history(&account_id, daily, spec, &mut usage_rng)?;
        snapshot.accounts.push(WalletAccount::new(account_id, key, balance, monthly));
        snapshot.histories.push(history);
    }

    for i in 0..spec.requests {
        let target = request_rng.range_inclusive(2, 400) * 5;
        let distinct = request_rng.range_inclusive(2, 5) as usize;
        let mut inventory = Vec::with_capacity(distinct);
        for _ in 0..distinct {
            let denomination = *request_rng.pick(STOCK_DENOMINATIONS);
            let count = request_rng.range_inclusive(0, 15) as u32;
            inventory.push(DenominationStock::new(denomination, count));
        }
        snapshot.requests.push(ConsumptionRequest {
            request_id: format!("req-{i:04}"),
            target,
            inventory,
            max_stamps_per_txn: None,
            loss_cap_percentage: None,
        });
    }

    log::debug!(
        "generated snapshot seed={} accounts={} requests={}",
        spec.seed,
        snapshot.accounts.len(),
        snapshot.requests.len()
    );
    Ok(snapshot)
}

fn usage_history(
    account_id: &str,
    daily: f64,
    spec: &GeneratorSpec,
    rng: &mut StreamRng,
) -> WalletResult<ConsumptionHistory> {
    let mut history = ConsumptionHistory::new(account_id);
    let start = spec.as_of - Duration::days(i64::from(spec.history_days));
    for offset in 1..=i64::from(spec.history_days) {
        // Working-day jitter around the account's rate; some days idle.
        if rng.chance(0.15) {
            continue;
        }
        let consumed = (daily * (0.5 + rng.next_f64())).round() as u32;
        if consumed > 0 {
            history.append(start + Duration::days(offset), consumed)?;
        }
    }
    Ok(history)
}
