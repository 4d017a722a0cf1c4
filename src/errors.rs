// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::TransactionType;

/// Domain failures raised by the ledger. They travel inside `anyhow::Error`
/// and can be recovered with `downcast_ref::<LedgerError>()`.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Budget range is empty: start {start} is after end {end}")]
    InvalidDateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Category '{name}' ({kind}) already exists")]
    DuplicateCategory { name: String, kind: TransactionType },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid exchange rate {rate} for {code}")]
    InvalidRate { code: String, rate: Decimal },

    #[error("Invalid amount {0}: must not be negative")]
    InvalidAmount(Decimal),

    #[error("Unsupported export format '{0}' (use csv|json)")]
    UnsupportedFormat(String),

    #[error("Currency {0} is the base currency and cannot be removed")]
    BaseCurrencyLocked(String),

    #[error("Amounts are too large to compute {0}")]
    Overflow(&'static str),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
