use crate::types::AccountId;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid account state for '{account_id}': {reason}")]
    InvalidAccountState { account_id: AccountId, reason: String },

    #[error("History for '{account_id}' is append-only: {date} is before last sample {last}")]
    HistoryOutOfOrder {
        account_id: AccountId,
        date: NaiveDate,
        last: NaiveDate,
    },

    #[error("Account '{account_id}' appears more than once in the snapshot")]
    DuplicateAccount { account_id: AccountId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WalletError {
    pub(crate) fn invalid_account(account_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAccountState {
            account_id: account_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
