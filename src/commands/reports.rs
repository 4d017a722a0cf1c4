// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics;
use crate::commands::transactions::{self, TransactionFilter};
use crate::models::{CategoryTotal, MonthlySummary, TransactionType, YearMonth};
use crate::utils::{current_month, fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

/// Income, expense, balance and per-category totals for `month`.
pub fn monthly_summary(conn: &Connection, month: YearMonth) -> Result<MonthlySummary> {
    let (start, end) = month.range();
    let rows = transactions::list(
        conn,
        &TransactionFilter {
            from: Some(start),
            to: Some(end),
            ..Default::default()
        },
    )?;
    Ok(analytics::monthly_summary(month, &rows)?)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("categories", sub)) => categories(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn month_arg(sub: &clap::ArgMatches) -> Result<YearMonth> {
    match sub.get_one::<String>("month") {
        Some(m) => parse_month(m),
        None => Ok(current_month()),
    }
}

fn totals_table(header: &str, totals: &[CategoryTotal]) -> comfy_table::Table {
    let rows = totals
        .iter()
        .map(|t| vec![t.category.clone(), fmt_money(&t.total)])
        .collect();
    pretty_table(&[header, "Total"], rows)
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let s = monthly_summary(conn, month_arg(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Month", "Income", "Expense", "Balance"],
            vec![vec![
                s.month.to_string(),
                fmt_money(&s.income),
                fmt_money(&s.expense),
                fmt_money(&s.balance),
            ]],
        )
    );
    if !s.expense_categories.is_empty() {
        println!("{}", totals_table("Expense category", &s.expense_categories));
    }
    if !s.income_categories.is_empty() {
        println!("{}", totals_table("Income category", &s.income_categories));
    }
    Ok(())
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let (start, end) = month_arg(sub)?.range();
    let data = transactions::category_totals(conn, kind, start, end)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", totals_table("Category", &data));
    }
    Ok(())
}
