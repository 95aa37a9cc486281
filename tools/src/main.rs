//! wallet-runner: headless runner for the stamp wallet engine.
//!
//! Usage:
//!   wallet-runner --snapshot wallets.json [--config engine.json] [--json]
//!   wallet-runner --seed 12345 --accounts 200 --requests 50
//!   wallet-runner --ipc-mode

use anyhow::Result;
use chrono::NaiveDate;
use stampwallet_core::{
    alert_monitor::Alert,
    analytics::LossBand,
    config::EngineConfig,
    engine::{SweepReport, WalletEngine},
    generator::{synthetic_snapshot, GeneratorSpec},
    optimizer::{Combination, ConsumptionRequest, RejectedReason},
    snapshot::WalletSnapshot,
    wallet::WalletAccount,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Evaluate {
        account: WalletAccount,
    },
    Optimize {
        request: ConsumptionRequest,
    },
    Sweep {
        snapshot: WalletSnapshot,
    },
    Quit,
}

#[derive(serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum OptimizeReply {
    Selected { combination: Combination },
    Rejected { kind: &'static str, detail: String, rejection: RejectedReason },
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let accounts = parse_arg(&args, "--accounts", 100usize);
    let requests = parse_arg(&args, "--requests", 25usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let json_out = args.iter().any(|a| a == "--json");
    let snapshot_path = string_arg(&args, "--snapshot");
    let config = match string_arg(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let engine = WalletEngine::new(config)?;

    if ipc_mode {
        return run_ipc_loop(&engine);
    }

    let snapshot = match snapshot_path {
        Some(path) => WalletSnapshot::load(path)?,
        None => {
            let as_of = match string_arg(&args, "--as-of") {
                Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
                None => chrono::Local::now().date_naive(),
            };
            synthetic_snapshot(&GeneratorSpec::new(seed, accounts, requests, as_of))?
        }
    };

    let report = engine.sweep(&snapshot)?;
    if json_out {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, snapshot_path, seed);
    }
    Ok(())
}

fn run_ipc_loop(engine: &WalletEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Evaluate { account } => match engine.monitor().evaluate(&account) {
                Ok(alert) => writeln!(stdout, "{}", alert_json(&alert))?,
                Err(e) => reply_error(&mut stdout, &e.to_string())?,
            },
            IpcCommand::Optimize { request } => {
                let reply = match engine.optimizer().optimize_request(&request) {
                    Ok(combination) => OptimizeReply::Selected { combination },
                    Err(rejection) => OptimizeReply::Rejected {
                        kind: rejection.kind(),
                        detail: rejection.to_string(),
                        rejection,
                    },
                };
                writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
            }
            IpcCommand::Sweep { snapshot } => match engine.sweep(&snapshot) {
                Ok(report) => writeln!(stdout, "{}", serde_json::to_string(&report)?)?,
                Err(e) => reply_error(&mut stdout, &e.to_string())?,
            },
        }
        stdout.flush()?;
    }
    Ok(())
}

fn reply_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

/// JSON for a single alert; days_left is null when there is no usage.
fn alert_json(alert: &Alert) -> serde_json::Value {
    serde_json::json!({
        "account_id":       alert.account_id,
        "urgency":          alert.urgency,
        "days_left":        alert.days_left.is_finite().then_some(alert.days_left),
        "required_qty":     alert.required_qty,
        "threshold_qty":    alert.threshold_qty,
        "coverage_percent": alert.coverage_percent(),
        "usage_trend_percent": alert.usage_trend_percent,
    })
}

fn print_summary(report: &SweepReport, snapshot_path: Option<&str>, seed: u64) {
    println!("Stamp Wallet Engine - wallet-runner");
    match snapshot_path {
        Some(path) => println!("  snapshot:  {path}"),
        None => println!("  seed:      {seed} (synthetic)"),
    }
    println!("  as_of:     {}", report.as_of);
    println!();

    let s = &report.alert_summary;
    println!("=== ALERTS ===");
    println!("  active:    {}", s.active());
    println!("  critical:  {}", s.critical);
    println!("  high:      {}", s.high);
    println!("  medium:    {}", s.medium);
    println!("  low:       {}", s.low);
    println!("  quiet:     {}", s.quiet);
    for alert in report.alerts.iter().take(10) {
        let trend = match alert.usage_trend_percent {
            Some(pct) => format!("{pct:+.0}% vs prior month"),
            None => "no trend".to_string(),
        };
        println!(
            "  {:<10} {:<9} {:>6.1} days left, reorder {:<6} {trend}",
            alert.account_id,
            alert.urgency.as_str(),
            alert.days_left,
            alert.required_qty
        );
    }

    let face_value: u64 = report.orders.iter().map(|o| o.face_value).sum();
    println!();
    println!("=== PROCUREMENT ===");
    println!("  orders:      {}", report.orders.len());
    println!("  face value:  {face_value}");

    let stats = &report.stats;
    println!();
    println!("=== CONSUMPTION ===");
    println!("  accepted:    {}", stats.accepted);
    println!("  perfect:     {:.1}%", stats.band_share(LossBand::Perfect));
    println!("  minimal:     {:.1}%", stats.band_share(LossBand::Minimal));
    println!("  higher:      {:.1}%", stats.band_share(LossBand::Higher));
    println!("  mean loss:   {:.2}%", stats.mean_loss_percentage);
    println!("  total loss:  {}", stats.total_loss);
    if stats.rejected.is_empty() {
        println!("  rejections:  none");
    } else {
        for (kind, count) in &stats.rejected {
            println!("  rejected ({kind}): {count}");
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
