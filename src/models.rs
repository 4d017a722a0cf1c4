// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Usage fraction at or above which a budget counts as near its limit.
pub const NEAR_LIMIT: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(anyhow!("Invalid transaction type '{}', expected income|expense", s)),
        }
    }
}

/// Recurrence granularity shared by budget periods and recurring transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "DAILY",
            Period::Weekly => "WEEKLY",
            Period::Monthly => "MONTHLY",
            Period::Yearly => "YEARLY",
        }
    }

    /// Last second of the day, ISO week, month or year containing `start`.
    pub fn end_from(&self, start: NaiveDateTime) -> NaiveDateTime {
        let d = start.date();
        let last_day = match self {
            Period::Daily => d,
            Period::Weekly => {
                d + Duration::days(6 - i64::from(d.weekday().num_days_from_monday()))
            }
            Period::Monthly => YearMonth::from_date(d).last_day(),
            Period::Yearly => NaiveDate::from_ymd_opt(d.year(), 12, 31).unwrap_or(d),
        };
        last_day.and_time(end_of_day())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Period::Daily),
            "WEEKLY" => Ok(Period::Weekly),
            "MONTHLY" => Ok(Period::Monthly),
            "YEARLY" => Ok(Period::Yearly),
            _ => Err(anyhow!(
                "Invalid period '{}', expected daily|weekly|monthly|yearly",
                s
            )),
        }
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// A calendar month, the unit the monthly summary is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("Invalid month {}-{:02}", year, month))?;
        Ok(YearMonth { year, month })
    }

    pub fn from_date(d: NaiveDate) -> Self {
        YearMonth {
            year: d.year(),
            month: d.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Inclusive `[first day 00:00:00, last day 23:59:59]`.
    pub fn range(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.first_day().and_time(NaiveTime::MIN),
            self.last_day().and_time(end_of_day()),
        )
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            YearMonth { year: self.year + 1, month: 1 }
        } else {
            YearMonth { year: self.year, month: self.month + 1 }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
        Ok(YearMonth::from_date(d))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDateTime,
    pub note: String,
    pub image_path: Option<String>,
    pub location: Option<String>,
    pub tags: Option<String>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<Period>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionImage {
    pub id: i64,
    pub transaction_id: i64,
    pub image_path: String,
    pub thumbnail_path: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub icon: String,
    pub color: String,
    pub is_default: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithStats {
    #[serde(flatten)]
    pub category: Category,
    pub total_amount: Decimal,
    pub transaction_count: usize,
    pub last_used: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: i64,
    /// `None` marks the total budget spanning every category.
    pub category: Option<String>,
    pub amount: Decimal,
    pub period: Period,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Budget {
    pub fn label(&self) -> &str {
        self.category.as_deref().unwrap_or("Total budget")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub symbol: String,
    /// Units of this currency per one unit of the base currency.
    pub exchange_rate: Decimal,
    pub is_base: bool,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Currency {
    pub fn format_amount(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.symbol, amount.round_dp(2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetUsage {
    #[serde(flatten)]
    pub budget: Budget,
    pub used_amount: Decimal,
    pub remaining_amount: Decimal,
    /// Fraction of `amount` consumed; 1 means fully used.
    pub usage_percentage: Decimal,
}

impl BudgetUsage {
    /// Fails with `LedgerError::Overflow` when `used_amount / amount` leaves
    /// the `Decimal` range, as with a near-zero amount against a large spend.
    pub fn new(budget: Budget, used_amount: Decimal) -> Result<Self, LedgerError> {
        let usage_percentage = if budget.amount > Decimal::ZERO {
            used_amount
                .checked_div(budget.amount)
                .ok_or(LedgerError::Overflow("budget usage percentage"))?
        } else {
            Decimal::ZERO
        };
        let remaining_amount = budget
            .amount
            .checked_sub(used_amount)
            .ok_or(LedgerError::Overflow("budget remaining amount"))?;
        Ok(BudgetUsage {
            remaining_amount,
            usage_percentage,
            used_amount,
            budget,
        })
    }

    pub fn is_over_budget(&self) -> bool {
        self.used_amount > self.budget.amount
    }

    pub fn is_near_limit(&self) -> bool {
        self.usage_percentage >= NEAR_LIMIT
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
    pub expense_categories: Vec<CategoryTotal>,
    pub income_categories: Vec<CategoryTotal>,
}
