// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

use crate::commands::{budgets, categories, currencies, transactions};
use crate::errors::LedgerError;
use crate::models::{Budget, Category, Currency, Transaction};
use crate::utils::{fmt_ts, now};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Excel,
}

impl FromStr for ExportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, LedgerError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(LedgerError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Every record in the store, as handed to the writers.
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub budgets: Vec<Budget>,
    pub currencies: Vec<Currency>,
}

impl Snapshot {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Snapshot {
            transactions: transactions::list(conn, &Default::default())?,
            categories: categories::list(conn, None, false)?,
            budgets: budgets::list(conn, false)?,
            currencies: currencies::list(conn, false)?,
        })
    }
}

/// Writes every record to `out` and returns a message describing the result.
/// Nothing is written when the format is unsupported.
pub fn export(conn: &Connection, format: ExportFormat, out: &Path) -> Result<String> {
    let write: fn(&Snapshot, &Path) -> Result<()> = match format {
        ExportFormat::Csv => write_csv,
        ExportFormat::Json => write_json,
        ExportFormat::Excel => return Err(LedgerError::UnsupportedFormat("excel".into()).into()),
    };
    let snap = Snapshot::load(conn)?;
    write(&snap, out)
        .with_context(|| format!("{:?} export to {} failed", format, out.display()))?;
    info!(?format, path = %out.display(), records = snap.transactions.len(), "export finished");
    Ok(format!(
        "Exported {} transactions, {} categories, {} budgets, {} currencies to {}",
        snap.transactions.len(),
        snap.categories.len(),
        snap.budgets.len(),
        snap.currencies.len(),
        out.display()
    ))
}

fn opt_ts(ts: &Option<chrono::NaiveDateTime>) -> String {
    ts.as_ref().map(fmt_ts).unwrap_or_default()
}

fn write_csv(snap: &Snapshot, out: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(out)?;

    wtr.write_record(["=== Transactions ==="])?;
    wtr.write_record([
        "id", "type", "amount", "category", "date", "note", "image_path", "location", "tags",
        "is_recurring", "recurring_pattern", "created_at",
    ])?;
    for t in &snap.transactions {
        wtr.write_record([
            t.id.to_string(),
            t.kind.to_string(),
            t.amount.to_string(),
            t.category.clone(),
            fmt_ts(&t.date),
            t.note.clone(),
            t.image_path.clone().unwrap_or_default(),
            t.location.clone().unwrap_or_default(),
            t.tags.clone().unwrap_or_default(),
            t.is_recurring.to_string(),
            t.recurring_pattern.map(|p| p.to_string()).unwrap_or_default(),
            opt_ts(&t.created_at),
        ])?;
    }

    wtr.write_record(["=== Categories ==="])?;
    wtr.write_record([
        "id", "name", "type", "icon", "color", "is_default", "is_active", "sort_order",
        "created_at",
    ])?;
    for c in &snap.categories {
        wtr.write_record([
            c.id.to_string(),
            c.name.clone(),
            c.kind.to_string(),
            c.icon.clone(),
            c.color.clone(),
            c.is_default.to_string(),
            c.is_active.to_string(),
            c.sort_order.to_string(),
            opt_ts(&c.created_at),
        ])?;
    }

    wtr.write_record(["=== Budgets ==="])?;
    wtr.write_record([
        "id", "category", "amount", "period", "start_date", "end_date", "is_active", "created_at",
    ])?;
    for b in &snap.budgets {
        wtr.write_record([
            b.id.to_string(),
            b.label().to_string(),
            b.amount.to_string(),
            b.period.to_string(),
            fmt_ts(&b.start_date),
            fmt_ts(&b.end_date),
            b.is_active.to_string(),
            opt_ts(&b.created_at),
        ])?;
    }

    wtr.write_record(["=== Currencies ==="])?;
    wtr.write_record([
        "id", "code", "name", "symbol", "exchange_rate", "is_base", "is_active", "sort_order",
        "created_at",
    ])?;
    for c in &snap.currencies {
        wtr.write_record([
            c.id.to_string(),
            c.code.clone(),
            c.name.clone(),
            c.symbol.clone(),
            c.exchange_rate.to_string(),
            c.is_base.to_string(),
            c.is_active.to_string(),
            c.sort_order.to_string(),
            opt_ts(&c.created_at),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_json(snap: &Snapshot, out: &Path) -> Result<()> {
    let doc = json!({
        "transactions": snap.transactions,
        "categories": snap.categories,
        "budgets": snap.budgets,
        "currencies": snap.currencies,
        "exportDate": fmt_ts(&now()),
        "version": EXPORT_VERSION,
        "totalTransactions": snap.transactions.len(),
        "totalCategories": snap.categories.len(),
        "totalBudgets": snap.budgets.len(),
        "totalCurrencies": snap.currencies.len(),
    });
    std::fs::write(out, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let format: ExportFormat = m.get_one::<String>("format").unwrap().parse()?;
    let out = m.get_one::<String>("out").unwrap();
    let message = export(conn, format, Path::new(out))?;
    println!("{}", message);
    Ok(())
}
