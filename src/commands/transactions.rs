// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics;
use crate::errors::LedgerError;
use crate::models::{CategoryTotal, Period, Transaction, TransactionType};
use crate::utils::{
    decimal_col, fmt_money, fmt_ts, maybe_print_json, now, opt_parsed_col, opt_ts_col, parse_datetime,
    parse_decimal, parse_end_datetime, parse_month, parsed_col, pretty_table, ts_col,
};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::info;

const COLUMNS: &str = "id, type, amount, category, date, note, image_path, location, tags, \
                       is_recurring, recurring_pattern, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewTransaction {
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
}

impl NewTransaction {
    pub fn new(
        kind: TransactionType,
        amount: Decimal,
        category: impl Into<String>,
        date: NaiveDateTime,
    ) -> Self {
        NewTransaction {
            kind,
            amount,
            category: category.into(),
            date,
            note: String::new(),
            image_path: None,
            location: None,
            tags: None,
            is_recurring: false,
            recurring_pattern: None,
        }
    }
}

/// Row filter for `list`; every field narrows the result when set.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    pub limit: Option<usize>,
}

fn from_row(r: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        kind: parsed_col(r, 1)?,
        amount: decimal_col(r, 2)?,
        category: r.get(3)?,
        date: ts_col(r, 4)?,
        note: r.get(5)?,
        image_path: r.get(6)?,
        location: r.get(7)?,
        tags: r.get(8)?,
        is_recurring: r.get(9)?,
        recurring_pattern: opt_parsed_col(r, 10)?,
        created_at: opt_ts_col(r, 11)?,
        updated_at: opt_ts_col(r, 12)?,
    })
}

fn check_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount).into());
    }
    Ok(())
}

pub fn insert(conn: &Connection, t: &NewTransaction) -> Result<i64> {
    check_amount(t.amount)?;
    let ts = fmt_ts(&now());
    conn.execute(
        "INSERT INTO transactions(type, amount, category, date, note, image_path, location, tags, is_recurring, recurring_pattern, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            t.kind.as_str(),
            t.amount.to_string(),
            t.category,
            fmt_ts(&t.date),
            t.note,
            t.image_path,
            t.location,
            t.tags,
            t.is_recurring,
            t.recurring_pattern.map(|p| p.as_str()),
            ts
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, kind = %t.kind, amount = %t.amount, category = %t.category, "transaction recorded");
    Ok(id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let sql = format!("SELECT {COLUMNS} FROM transactions WHERE id=?1");
    Ok(conn.query_row(&sql, params![id], from_row).optional()?)
}

/// Overwrites every editable field of the stored row with `t`.
pub fn update(conn: &Connection, t: &Transaction) -> Result<()> {
    check_amount(t.amount)?;
    let n = conn.execute(
        "UPDATE transactions SET type=?2, amount=?3, category=?4, date=?5, note=?6, image_path=?7,
         location=?8, tags=?9, is_recurring=?10, recurring_pattern=?11, updated_at=?12 WHERE id=?1",
        params![
            t.id,
            t.kind.as_str(),
            t.amount.to_string(),
            t.category,
            fmt_ts(&t.date),
            t.note,
            t.image_path,
            t.location,
            t.tags,
            t.is_recurring,
            t.recurring_pattern.map(|p| p.as_str()),
            fmt_ts(&now())
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::not_found("Transaction", t.id).into());
    }
    info!(id = t.id, "transaction updated");
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(n > 0)
}

pub fn delete_many(conn: &Connection, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let marks = vec!["?"; ids.len()].join(",");
    let n = conn.execute(
        &format!("DELETE FROM transactions WHERE id IN ({marks})"),
        params_from_iter(ids.iter()),
    )?;
    info!(requested = ids.len(), deleted = n, "transactions deleted");
    Ok(n)
}

/// Matching rows, newest first.
pub fn list(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {COLUMNS} FROM transactions WHERE 1=1");
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(kind) = filter.kind {
        sql.push_str(" AND type=?");
        params_vec.push(kind.as_str().into());
    }
    if let Some(cat) = &filter.category {
        sql.push_str(" AND category=?");
        params_vec.push(cat.clone());
    }
    if let Some(from) = &filter.from {
        sql.push_str(" AND date>=?");
        params_vec.push(fmt_ts(from));
    }
    if let Some(to) = &filter.to {
        sql.push_str(" AND date<=?");
        params_vec.push(fmt_ts(to));
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params_vec.iter()), from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

fn in_range(
    conn: &Connection,
    kind: TransactionType,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Transaction>> {
    list(
        conn,
        &TransactionFilter {
            kind: Some(kind),
            from: Some(start),
            to: Some(end),
            ..Default::default()
        },
    )
}

/// Sum of `kind` amounts dated within `[start, end]`; zero when nothing matches.
pub fn total_by_type_and_range(
    conn: &Connection,
    kind: TransactionType,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Decimal> {
    let rows = in_range(conn, kind, start, end)?;
    Ok(analytics::total_by_type(kind, start, end, &rows)?)
}

pub fn category_totals(
    conn: &Connection,
    kind: TransactionType,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<CategoryTotal>> {
    let rows = in_range(conn, kind, start, end)?;
    Ok(analytics::category_totals(kind, start, end, &rows)?)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("list", sub)) => print_list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TransactionType = sub.get_one::<String>("type").unwrap().parse()?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap();
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_datetime(d)?,
        None => now(),
    };
    let recurring_pattern = sub
        .get_one::<String>("recurring")
        .map(|p| p.parse::<Period>())
        .transpose()?;
    let t = NewTransaction {
        note: sub.get_one::<String>("note").cloned().unwrap_or_default(),
        image_path: sub.get_one::<String>("image").cloned(),
        location: sub.get_one::<String>("location").cloned(),
        tags: sub.get_one::<String>("tags").cloned(),
        is_recurring: recurring_pattern.is_some(),
        recurring_pattern,
        ..NewTransaction::new(kind, amount, category.as_str(), date)
    };
    let id = insert(conn, &t)?;
    println!("Recorded #{} {} {} in '{}' on {}", id, kind, amount, category, date);
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut t = get(conn, id)?.ok_or_else(|| LedgerError::not_found("Transaction", id))?;
    if let Some(fields) = sub.get_many::<String>("clear") {
        for field in fields {
            match field.as_str() {
                "image" => t.image_path = None,
                "location" => t.location = None,
                "tags" => t.tags = None,
                "recurring" => {
                    t.is_recurring = false;
                    t.recurring_pattern = None;
                }
                _ => {}
            }
        }
    }
    if let Some(v) = sub.get_one::<String>("type") {
        t.kind = v.parse()?;
    }
    if let Some(v) = sub.get_one::<String>("amount") {
        t.amount = parse_decimal(v)?;
    }
    if let Some(v) = sub.get_one::<String>("category") {
        t.category = v.clone();
    }
    if let Some(v) = sub.get_one::<String>("date") {
        t.date = parse_datetime(v)?;
    }
    if let Some(v) = sub.get_one::<String>("note") {
        t.note = v.clone();
    }
    if let Some(v) = sub.get_one::<String>("location") {
        t.location = Some(v.clone());
    }
    if let Some(v) = sub.get_one::<String>("tags") {
        t.tags = Some(v.clone());
    }
    if let Some(v) = sub.get_one::<String>("image") {
        t.image_path = Some(v.clone());
    }
    if let Some(v) = sub.get_one::<String>("recurring") {
        t.recurring_pattern = Some(v.parse::<Period>()?);
        t.is_recurring = true;
    }
    update(conn, &t)?;
    println!("Updated transaction #{}", id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let ids: Vec<i64> = sub.get_many::<i64>("ids").unwrap().copied().collect();
    let n = delete_many(conn, &ids)?;
    println!("Removed {} transaction(s)", n);
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let t = get(conn, id)?.ok_or_else(|| LedgerError::not_found("Transaction", id))?;
    println!("{}", serde_json::to_string_pretty(&t)?);
    Ok(())
}

/// Builds the list filter from `tx list` arguments.
pub fn filter_from_args(sub: &clap::ArgMatches) -> Result<TransactionFilter> {
    let mut filter = TransactionFilter {
        kind: sub
            .get_one::<String>("type")
            .map(|s| s.parse())
            .transpose()?,
        category: sub.get_one::<String>("category").cloned(),
        limit: sub.get_one::<usize>("limit").copied(),
        ..Default::default()
    };
    if let Some(month) = sub.get_one::<String>("month") {
        let (start, end) = parse_month(month)?.range();
        filter.from = Some(start);
        filter.to = Some(end);
    }
    if let Some(from) = sub.get_one::<String>("from") {
        filter.from = Some(parse_datetime(from)?);
    }
    if let Some(to) = sub.get_one::<String>("to") {
        filter.to = Some(parse_end_datetime(to)?);
    }
    Ok(filter)
}

fn print_list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = list(conn, &filter_from_args(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.kind.to_string(),
                    fmt_money(&t.amount),
                    t.category.clone(),
                    t.note.clone(),
                    t.tags.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Amount", "Category", "Note", "Tags"],
                rows,
            )
        );
    }
    Ok(())
}
