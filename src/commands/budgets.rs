// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics;
use crate::commands::transactions::{self, TransactionFilter};
use crate::errors::LedgerError;
use crate::models::{Budget, BudgetUsage, Period, TransactionType};
use crate::utils::{
    decimal_col, fmt_money, fmt_percent, fmt_ts, maybe_print_json, now, opt_ts_col,
    parse_datetime, parse_decimal, parse_end_datetime, parsed_col, pretty_table, ts_col,
};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

const COLUMNS: &str =
    "id, category, amount, period, start_date, end_date, is_active, created_at, updated_at";
const ORDER: &str = " ORDER BY created_at DESC, id DESC";

#[derive(Debug, Clone)]
pub struct NewBudget {
    /// `None` creates the total budget.
    pub category: Option<String>,
    pub amount: Decimal,
    pub period: Period,
    pub start_date: NaiveDateTime,
    /// Derived from `period` when unset.
    pub end_date: Option<NaiveDateTime>,
}

fn from_row(r: &Row) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        category: r.get(1)?,
        amount: decimal_col(r, 2)?,
        period: parsed_col(r, 3)?,
        start_date: ts_col(r, 4)?,
        end_date: ts_col(r, 5)?,
        is_active: r.get(6)?,
        created_at: opt_ts_col(r, 7)?,
        updated_at: opt_ts_col(r, 8)?,
    })
}

fn collect(conn: &Connection, sql: &str, p: impl rusqlite::Params) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(p, from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn check_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if start > end {
        return Err(LedgerError::InvalidDateRange { start, end }.into());
    }
    Ok(())
}

pub fn insert(conn: &Connection, b: &NewBudget) -> Result<i64> {
    if b.amount < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(b.amount).into());
    }
    let end = b.end_date.unwrap_or_else(|| b.period.end_from(b.start_date));
    check_range(b.start_date, end)?;
    let ts = fmt_ts(&now());
    conn.execute(
        "INSERT INTO budgets(category, amount, period, start_date, end_date, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
        params![
            b.category,
            b.amount.to_string(),
            b.period.as_str(),
            fmt_ts(&b.start_date),
            fmt_ts(&end),
            ts
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, category = ?b.category, amount = %b.amount, "budget added");
    Ok(id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Budget>> {
    let sql = format!("SELECT {COLUMNS} FROM budgets WHERE id=?1");
    Ok(conn.query_row(&sql, params![id], from_row).optional()?)
}

/// Budgets newest first; `active_only` drops deactivated ones.
pub fn list(conn: &Connection, active_only: bool) -> Result<Vec<Budget>> {
    let filter = if active_only { " WHERE is_active=1" } else { "" };
    collect(conn, &format!("SELECT {COLUMNS} FROM budgets{filter}{ORDER}"), [])
}

/// Active budget for `category`, or the total budget when `category` is `None`.
pub fn by_category(conn: &Connection, category: Option<&str>) -> Result<Option<Budget>> {
    let sql = match category {
        Some(_) => format!("SELECT {COLUMNS} FROM budgets WHERE category=?1 AND is_active=1{ORDER} LIMIT 1"),
        None => format!("SELECT {COLUMNS} FROM budgets WHERE category IS NULL AND is_active=1{ORDER} LIMIT 1"),
    };
    let found = match category {
        Some(c) => conn.query_row(&sql, params![c], from_row),
        None => conn.query_row(&sql, [], from_row),
    };
    Ok(found.optional()?)
}

pub fn total_budget(conn: &Connection) -> Result<Option<Budget>> {
    by_category(conn, None)
}

pub fn by_period(conn: &Connection, period: Period) -> Result<Vec<Budget>> {
    collect(
        conn,
        &format!("SELECT {COLUMNS} FROM budgets WHERE period=?1 AND is_active=1{ORDER}"),
        params![period.as_str()],
    )
}

/// Active budgets whose range contains `date`.
pub fn covering(conn: &Connection, date: NaiveDateTime) -> Result<Vec<Budget>> {
    collect(
        conn,
        &format!(
            "SELECT {COLUMNS} FROM budgets WHERE start_date<=?1 AND end_date>=?1 AND is_active=1{ORDER}"
        ),
        params![fmt_ts(&date)],
    )
}

fn expect_row(n: usize, id: i64) -> Result<()> {
    if n == 0 {
        return Err(LedgerError::not_found("Budget", id).into());
    }
    Ok(())
}

pub fn set_active(conn: &Connection, id: i64, active: bool) -> Result<()> {
    let n = conn.execute(
        "UPDATE budgets SET is_active=?2, updated_at=?3 WHERE id=?1",
        params![id, active, fmt_ts(&now())],
    )?;
    expect_row(n, id)
}

pub fn update_amount(conn: &Connection, id: i64, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount).into());
    }
    let n = conn.execute(
        "UPDATE budgets SET amount=?2, updated_at=?3 WHERE id=?1",
        params![id, amount.to_string(), fmt_ts(&now())],
    )?;
    expect_row(n, id)
}

pub fn update_end_date(conn: &Connection, id: i64, end: NaiveDateTime) -> Result<()> {
    let b = get(conn, id)?.ok_or_else(|| LedgerError::not_found("Budget", id))?;
    check_range(b.start_date, end)?;
    conn.execute(
        "UPDATE budgets SET end_date=?2, updated_at=?3 WHERE id=?1",
        params![id, fmt_ts(&end), fmt_ts(&now())],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    Ok(conn.execute("DELETE FROM budgets WHERE id=?1", params![id])? > 0)
}

pub fn active_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM budgets WHERE is_active=1",
        [],
        |r| r.get(0),
    )?)
}

/// Usage of every active budget against the stored expenses, newest budget first.
pub fn usage(conn: &Connection) -> Result<Vec<BudgetUsage>> {
    let budgets = list(conn, true)?;
    let (Some(from), Some(to)) = (
        budgets.iter().map(|b| b.start_date).min(),
        budgets.iter().map(|b| b.end_date).max(),
    ) else {
        return Ok(Vec::new());
    };
    let expenses = transactions::list(
        conn,
        &TransactionFilter {
            kind: Some(TransactionType::Expense),
            from: Some(from),
            to: Some(to),
            ..Default::default()
        },
    )?;
    Ok(analytics::budget_usage(&budgets, &expenses)?)
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetAlert {
    pub usage: BudgetUsage,
    pub message: String,
}

/// Budgets that are over their amount or at/above the near-limit threshold.
pub fn alerts(conn: &Connection) -> Result<Vec<BudgetAlert>> {
    let out: Vec<BudgetAlert> = usage(conn)?
        .into_iter()
        .filter(|u| u.is_over_budget() || u.is_near_limit())
        .map(|u| {
            let message = if u.is_over_budget() {
                format!(
                    "{} is over budget by {}",
                    u.budget.label(),
                    fmt_money(&(u.used_amount - u.budget.amount))
                )
            } else {
                format!(
                    "{} has used {} of its budget",
                    u.budget.label(),
                    fmt_percent(&u.usage_percentage)
                )
            };
            BudgetAlert { usage: u, message }
        })
        .collect();
    for a in &out {
        warn!(budget = a.usage.budget.id, "{}", a.message);
    }
    Ok(out)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageRow<'a> {
    #[serde(flatten)]
    usage: &'a BudgetUsage,
    is_over_budget: bool,
    is_near_limit: bool,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => print_list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            if !delete(conn, id)? {
                return Err(LedgerError::not_found("Budget", id).into());
            }
            println!("Removed budget #{}", id);
        }
        Some(("enable", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            set_active(conn, id, true)?;
            println!("Enabled budget #{}", id);
        }
        Some(("disable", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            set_active(conn, id, false)?;
            println!("Disabled budget #{}", id);
        }
        Some(("set", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            get(conn, id)?.ok_or_else(|| LedgerError::not_found("Budget", id))?;
            if let Some(a) = sub.get_one::<String>("amount") {
                update_amount(conn, id, parse_decimal(a)?)?;
            }
            if let Some(e) = sub.get_one::<String>("end") {
                update_end_date(conn, id, parse_end_datetime(e)?)?;
            }
            println!("Updated budget #{}", id);
        }
        Some(("usage", sub)) => print_usage(conn, sub)?,
        Some(("alerts", sub)) => {
            let data = alerts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                if data.is_empty() {
                    println!("All budgets are within limits");
                }
                for a in data {
                    println!("{}", a.message);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let b = NewBudget {
        category: sub.get_one::<String>("category").cloned(),
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        period: sub.get_one::<String>("period").unwrap().parse()?,
        start_date: match sub.get_one::<String>("start") {
            Some(s) => parse_datetime(s)?,
            None => now(),
        },
        end_date: sub
            .get_one::<String>("end")
            .map(|e| parse_end_datetime(e))
            .transpose()?,
    };
    let id = insert(conn, &b)?;
    let label = b.category.as_deref().unwrap_or("Total budget");
    println!("Budget #{} set for {} = {} ({})", id, label, b.amount, b.period);
    Ok(())
}

fn print_list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = list(conn, !sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.label().to_string(),
                    fmt_money(&b.amount),
                    b.period.to_string(),
                    b.start_date.to_string(),
                    b.end_date.to_string(),
                    if b.is_active { "yes" } else { "no" }.into(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Category", "Amount", "Period", "Start", "End", "Active"],
                rows
            )
        );
    }
    Ok(())
}

fn print_usage(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = usage(conn)?;
    let out: Vec<UsageRow> = data
        .iter()
        .map(|u| UsageRow {
            usage: u,
            is_over_budget: u.is_over_budget(),
            is_near_limit: u.is_near_limit(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        let rows = data
            .iter()
            .map(|u| {
                let status = if u.is_over_budget() {
                    "OVER"
                } else if u.is_near_limit() {
                    "NEAR"
                } else {
                    "ok"
                };
                vec![
                    u.budget.label().to_string(),
                    fmt_money(&u.budget.amount),
                    fmt_money(&u.used_amount),
                    fmt_money(&u.remaining_amount),
                    fmt_percent(&u.usage_percentage),
                    status.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Budget", "Amount", "Used", "Remaining", "Usage", "Status"],
                rows
            )
        );
    }
    Ok(())
}
