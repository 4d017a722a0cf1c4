// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Pure aggregation over in-memory records. Nothing here touches storage;
//! the command modules load rows and hand them over.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::LedgerError;
use crate::models::{
    Budget, BudgetUsage, CategoryTotal, Currency, MonthlySummary, Transaction, TransactionType,
    YearMonth,
};

fn in_range(t: &Transaction, start: NaiveDateTime, end: NaiveDateTime) -> bool {
    t.date >= start && t.date <= end
}

fn counts_against(budget: &Budget, t: &Transaction) -> bool {
    t.kind == TransactionType::Expense
        && in_range(t, budget.start_date, budget.end_date)
        && budget
            .category
            .as_deref()
            .is_none_or(|c| c == t.category)
}

/// Adds up `amounts`, failing with `LedgerError::Overflow` instead of
/// panicking when the total leaves the `Decimal` range.
pub fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, LedgerError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a))
        .ok_or(LedgerError::Overflow(what))
}

/// Usage of every active budget, in input order. Inactive budgets are skipped.
pub fn budget_usage(
    budgets: &[Budget],
    transactions: &[Transaction],
) -> Result<Vec<BudgetUsage>, LedgerError> {
    let usages = budgets
        .iter()
        .filter(|b| b.is_active)
        .map(|b| {
            let used = checked_sum(
                transactions
                    .iter()
                    .filter(|t| counts_against(b, t))
                    .map(|t| t.amount),
                "budget usage",
            )?;
            BudgetUsage::new(b.clone(), used)
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        budgets = usages.len(),
        transactions = transactions.len(),
        "computed budget usage"
    );
    Ok(usages)
}

pub fn total_by_type(
    kind: TransactionType,
    start: NaiveDateTime,
    end: NaiveDateTime,
    transactions: &[Transaction],
) -> Result<Decimal, LedgerError> {
    checked_sum(
        transactions
            .iter()
            .filter(|t| t.kind == kind && in_range(t, start, end))
            .map(|t| t.amount),
        "total by type",
    )
}

/// Per-category totals, largest first, ties broken by name.
pub fn category_totals(
    kind: TransactionType,
    start: NaiveDateTime,
    end: NaiveDateTime,
    transactions: &[Transaction],
) -> Result<Vec<CategoryTotal>, LedgerError> {
    let mut agg: BTreeMap<&str, Decimal> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == kind && in_range(t, start, end))
    {
        let total = agg.entry(t.category.as_str()).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(t.amount)
            .ok_or(LedgerError::Overflow("category totals"))?;
    }
    let mut items: Vec<CategoryTotal> = agg
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(items)
}

pub fn monthly_summary(
    month: YearMonth,
    transactions: &[Transaction],
) -> Result<MonthlySummary, LedgerError> {
    let (start, end) = month.range();
    let income = total_by_type(TransactionType::Income, start, end, transactions)?;
    let expense = total_by_type(TransactionType::Expense, start, end, transactions)?;
    debug!(%month, %income, %expense, "computed monthly summary");
    Ok(MonthlySummary {
        month,
        income,
        expense,
        balance: income
            .checked_sub(expense)
            .ok_or(LedgerError::Overflow("monthly balance"))?,
        expense_categories: category_totals(TransactionType::Expense, start, end, transactions)?,
        income_categories: category_totals(TransactionType::Income, start, end, transactions)?,
    })
}

/// `amount * (to.rate / from.rate)`, identity when the codes match.
pub fn convert(amount: Decimal, from: &Currency, to: &Currency) -> Result<Decimal, LedgerError> {
    if from.code == to.code {
        return Ok(amount);
    }
    if from.exchange_rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidRate {
            code: from.code.clone(),
            rate: from.exchange_rate,
        });
    }
    to.exchange_rate
        .checked_div(from.exchange_rate)
        .and_then(|ratio| amount.checked_mul(ratio))
        .ok_or(LedgerError::Overflow("currency conversion"))
}
