//! Stamp wallet engine: predictive low-balance alerts and loss-minimizing
//! stamp selection over in-memory inventory snapshots.

pub mod alert_monitor;
pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod generator;
pub mod history;
pub mod optimizer;
pub mod procurement;
pub mod rng;
pub mod snapshot;
pub mod types;
pub mod wallet;
