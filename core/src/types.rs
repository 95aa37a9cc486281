//! Shared primitive types used across the entire engine.

/// A stable, unique identifier for a wallet account.
pub type AccountId = String;

/// Identifier of a single consumption request (one contract to stamp).
pub type RequestId = String;

/// Face value of a stamp, in whole currency units.
pub type Denomination = u64;

/// Days in the month used to convert monthly usage into daily usage.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Minimum inventory period when an account does not specify one.
pub const DEFAULT_THRESHOLD_DAYS: u32 = 30;

/// Maximum inventory period when an account does not specify one.
pub const DEFAULT_MAX_DAYS: u32 = 60;

/// Lead-time multiplier when an account does not specify one.
pub const DEFAULT_BUFFER_FACTOR: f64 = 1.1;
