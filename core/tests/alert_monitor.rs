//! Alert monitor: urgency tiers, replenishment sizing, invalid accounts.

use chrono::{Duration, NaiveDate};
use stampwallet_core::{
    alert_monitor::{AlertMonitor, Urgency},
    config::AlertPolicy,
    error::WalletError,
    history::ConsumptionHistory,
    wallet::{WalletAccount, WalletKey},
};

fn key(denomination: u64) -> WalletKey {
    WalletKey {
        client:       "XYZ Bank".into(),
        state:        "Tamil Nadu".into(),
        article_code: "TN3005".into(),
        denomination,
    }
}

fn account(balance: i64, monthly: f64) -> WalletAccount {
    WalletAccount::new("acct-1", key(1000), balance, monthly)
}

fn monitor() -> AlertMonitor {
    AlertMonitor::new(AlertPolicy::default()).unwrap()
}

#[test]
fn zero_usage_never_alerts() {
    let alert = monitor().evaluate(&account(8, 0.0)).unwrap();
    assert_eq!(alert.urgency, Urgency::None);
    assert!(alert.days_left.is_infinite());
    assert_eq!(alert.required_qty, 0);
    assert!(!alert.is_actionable());
}

#[test]
fn one_day_left_is_critical() {
    // 240 a month = 8 a day; 8 on hand lasts exactly one day.
    let alert = monitor().evaluate(&account(8, 240.0)).unwrap();
    assert_eq!(alert.days_left, 1.0);
    assert_eq!(alert.urgency, Urgency::Critical);
    assert_eq!(alert.required_qty, 8 * 60 - 8);
}

#[test]
fn low_balance_fraction_is_critical_before_one_day() {
    // 10/day, threshold stock 300, 10% = 30; 25 on hand is 2.5 days.
    let alert = monitor().evaluate(&account(25, 300.0)).unwrap();
    assert!(alert.days_left > 1.0);
    assert_eq!(alert.urgency, Urgency::Critical);
}

#[test]
fn under_three_days_is_high() {
    // 20-day threshold: the balance floor sits at 2 days of cover.
    let acct = account(25, 300.0).with_periods(20, 60);
    let alert = monitor().evaluate(&acct).unwrap();
    assert_eq!(alert.days_left, 2.5);
    assert_eq!(alert.urgency, Urgency::High);
}

#[test]
fn inside_threshold_is_medium() {
    // Tech Startup wallet: 25 on hand at 75 a month.
    let alert = monitor().evaluate(&account(25, 75.0)).unwrap();
    assert_eq!(alert.days_left, 10.0);
    assert_eq!(alert.urgency, Urgency::Medium);
    assert_eq!(alert.required_qty, 150 - 25);
}

#[test]
fn inside_buffer_is_low() {
    // 2/day, 64 on hand = 32 days: past 30, inside 30 × 1.1.
    let alert = monitor().evaluate(&account(64, 60.0)).unwrap();
    assert_eq!(alert.urgency, Urgency::Low);
    assert!(alert.is_actionable());
}

#[test]
fn beyond_buffer_is_quiet_but_sized() {
    let alert = monitor().evaluate(&account(80, 60.0)).unwrap();
    assert_eq!(alert.days_left, 40.0);
    assert_eq!(alert.urgency, Urgency::None);
    assert_eq!(alert.required_qty, 120 - 80);
}

#[test]
fn overstocked_requires_nothing() {
    let alert = monitor().evaluate(&account(500, 60.0)).unwrap();
    assert_eq!(alert.required_qty, 0);
}

#[test]
fn threshold_qty_uses_buffer_factor() {
    let acct = account(45, 60.0).with_buffer_factor(1.5);
    let alert = monitor().evaluate(&acct).unwrap();
    // 2/day × 30 days × 1.5
    assert_eq!(alert.threshold_qty, 90);
    assert!((alert.coverage_percent() - 50.0).abs() < 1e-9);
}

#[test]
fn custom_tiers_are_honoured() {
    let policy = AlertPolicy { critical_days: 2.0, high_days: 5.0, ..AlertPolicy::default() };
    let alert = AlertMonitor::new(policy).unwrap().evaluate(&account(40, 300.0)).unwrap();
    assert_eq!(alert.days_left, 4.0);
    assert_eq!(alert.urgency, Urgency::High);
}

#[test]
fn non_finite_tiers_rejected_at_construction() {
    let policy = AlertPolicy { critical_days: f64::NAN, ..AlertPolicy::default() };
    assert!(matches!(AlertMonitor::new(policy), Err(WalletError::InvalidConfig(_))));

    let policy = AlertPolicy { high_days: f64::INFINITY, ..AlertPolicy::default() };
    assert!(matches!(AlertMonitor::new(policy), Err(WalletError::InvalidConfig(_))));
}

#[test]
fn negative_balance_is_invalid() {
    let err = monitor().evaluate(&account(-1, 30.0)).unwrap_err();
    assert!(matches!(err, WalletError::InvalidAccountState { .. }), "got {err}");
}

#[test]
fn threshold_not_below_max_is_invalid() {
    let acct = account(10, 30.0).with_periods(60, 60);
    assert!(matches!(
        monitor().evaluate(&acct),
        Err(WalletError::InvalidAccountState { .. })
    ));
}

#[test]
fn buffer_below_one_is_invalid() {
    let acct = account(10, 30.0).with_buffer_factor(0.9);
    assert!(matches!(
        monitor().evaluate(&acct),
        Err(WalletError::InvalidAccountState { .. })
    ));
}

#[test]
fn history_drives_usage_rate() {
    let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let mut history = ConsumptionHistory::new("acct-1");
    for offset in (0..30).rev() {
        history.append(as_of - Duration::days(offset), 4).unwrap();
    }
    // Stale snapshot rate is ignored in favour of the history.
    let alert = monitor()
        .evaluate_with_history(&account(20, 0.0), &history, as_of)
        .unwrap();
    assert_eq!(alert.daily_usage_rate, 4.0);
    assert_eq!(alert.days_left, 5.0);
    assert_eq!(alert.urgency, Urgency::Medium);
}

#[test]
fn history_reports_month_over_month_trend() {
    let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let mut history = ConsumptionHistory::new("acct-1");
    history.append(as_of - Duration::days(45), 40).unwrap();
    history.append(as_of - Duration::days(5), 30).unwrap();

    let alert = monitor()
        .evaluate_with_history(&account(5, 0.0), &history, as_of)
        .unwrap();
    assert_eq!(alert.usage_trend_percent, Some(-25.0));

    // A plain evaluation has no history to compare against.
    let alert = monitor().evaluate(&account(5, 30.0)).unwrap();
    assert_eq!(alert.usage_trend_percent, None);
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let accounts = vec![
        WalletAccount::new("a", key(500), 45, 150.0),
        WalletAccount::new("b", key(100), -3, 75.0),
        WalletAccount::new("c", key(1000), 8, 240.0),
    ];
    let results = monitor().evaluate_batch(&accounts);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().account_id, "a");
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().urgency, Urgency::Critical);
}
