use thiserror::Error;

use crate::domain::{AmountError, Cents, InvalidAccountId, LedgerError};
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid account id: {0}")]
    InvalidAccountId(#[from] InvalidAccountId),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient funds in account {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: String,
        balance: Cents,
        required: Cents,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::InvalidAmount(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(err) => err.into(),
            LedgerError::AccountNotFound(id) => AppError::AccountNotFound(id.to_string()),
            LedgerError::InsufficientFunds {
                account,
                balance,
                required,
            } => AppError::InsufficientFunds {
                account: account.to_string(),
                balance,
                required,
            },
            // Only produced while loading, where it surfaces as corruption
            LedgerError::NegativeBalance { .. } => AppError::InvalidAmount(err.to_string()),
        }
    }
}
