// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::analytics;
use crate::errors::LedgerError;
use crate::models::Currency;
use crate::utils::{
    decimal_col, fmt_ts, maybe_print_json, now, opt_ts_col, parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::info;

const COLUMNS: &str = "id, code, name, symbol, exchange_rate, is_base, is_active, sort_order, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewCurrency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub exchange_rate: Decimal,
    pub sort_order: Option<i32>,
}

fn from_row(r: &Row) -> rusqlite::Result<Currency> {
    Ok(Currency {
        id: r.get(0)?,
        code: r.get(1)?,
        name: r.get(2)?,
        symbol: r.get(3)?,
        exchange_rate: decimal_col(r, 4)?,
        is_base: r.get(5)?,
        is_active: r.get(6)?,
        sort_order: r.get(7)?,
        created_at: opt_ts_col(r, 8)?,
        updated_at: opt_ts_col(r, 9)?,
    })
}

fn check_rate(code: &str, rate: Decimal) -> Result<()> {
    if rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidRate {
            code: code.to_string(),
            rate,
        }
        .into());
    }
    Ok(())
}

/// Adds a non-base currency; `exchange_rate` is expressed against the current base.
pub fn insert(conn: &Connection, c: &NewCurrency) -> Result<i64> {
    let code = c.code.trim().to_uppercase();
    check_rate(&code, c.exchange_rate)?;
    let sort_order = match c.sort_order {
        Some(s) => s,
        None => {
            let max: Option<i32> =
                conn.query_row("SELECT MAX(sort_order) FROM currencies", [], |r| r.get(0))?;
            max.unwrap_or(0) + 1
        }
    };
    conn.execute(
        "INSERT INTO currencies(code, name, symbol, exchange_rate, is_base, is_active, sort_order, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, 1, ?5, ?6, ?6)",
        params![
            code,
            c.name,
            c.symbol,
            c.exchange_rate.to_string(),
            sort_order,
            fmt_ts(&now())
        ],
    )?;
    info!(%code, rate = %c.exchange_rate, "currency added");
    Ok(conn.last_insert_rowid())
}

pub fn list(conn: &Connection, active_only: bool) -> Result<Vec<Currency>> {
    let filter = if active_only { " WHERE is_active=1" } else { "" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM currencies{filter} ORDER BY sort_order ASC, id ASC"
    ))?;
    let rows = stmt.query_map([], from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

pub fn by_code(conn: &Connection, code: &str) -> Result<Option<Currency>> {
    let sql = format!("SELECT {COLUMNS} FROM currencies WHERE code=?1");
    Ok(conn
        .query_row(&sql, params![code.to_uppercase()], from_row)
        .optional()?)
}

fn require(conn: &Connection, code: &str) -> Result<Currency> {
    Ok(by_code(conn, code)?.ok_or_else(|| LedgerError::not_found("Currency", code))?)
}

pub fn base(conn: &Connection) -> Result<Option<Currency>> {
    let sql = format!("SELECT {COLUMNS} FROM currencies WHERE is_base=1 LIMIT 1");
    Ok(conn.query_row(&sql, [], from_row).optional()?)
}

/// Makes `code` the base currency. All rates are rescaled so the new base
/// sits at 1 and conversions between any two currencies are unchanged.
pub fn set_base(conn: &mut Connection, code: &str) -> Result<()> {
    let target = require(conn, code)?;
    check_rate(&target.code, target.exchange_rate)?;
    let divisor = target.exchange_rate;
    let others = list(conn, false)?;
    let ts = fmt_ts(&now());

    let tx = conn.transaction()?;
    tx.execute("UPDATE currencies SET is_base=0 WHERE is_base=1", [])?;
    for c in others {
        let rate = if c.id == target.id {
            Decimal::ONE
        } else {
            (c.exchange_rate / divisor).normalize()
        };
        tx.execute(
            "UPDATE currencies SET exchange_rate=?2, updated_at=?3 WHERE id=?1",
            params![c.id, rate.to_string(), ts],
        )?;
    }
    tx.execute(
        "UPDATE currencies SET is_base=1, updated_at=?2 WHERE id=?1",
        params![target.id, ts],
    )?;
    tx.commit()?;
    info!(code = %target.code, "base currency changed");
    Ok(())
}

pub fn update_rate(conn: &Connection, code: &str, rate: Decimal) -> Result<()> {
    let c = require(conn, code)?;
    check_rate(&c.code, rate)?;
    conn.execute(
        "UPDATE currencies SET exchange_rate=?2, updated_at=?3 WHERE id=?1",
        params![c.id, rate.to_string(), fmt_ts(&now())],
    )?;
    info!(code = %c.code, %rate, "exchange rate updated");
    Ok(())
}

pub fn set_active(conn: &Connection, code: &str, active: bool) -> Result<()> {
    let c = require(conn, code)?;
    conn.execute(
        "UPDATE currencies SET is_active=?2, updated_at=?3 WHERE id=?1",
        params![c.id, active, fmt_ts(&now())],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, code: &str) -> Result<()> {
    let c = require(conn, code)?;
    if c.is_base {
        return Err(LedgerError::BaseCurrencyLocked(c.code).into());
    }
    conn.execute("DELETE FROM currencies WHERE id=?1", params![c.id])?;
    Ok(())
}

/// Converts between two stored currencies by code.
pub fn convert(conn: &Connection, amount: Decimal, from: &str, to: &str) -> Result<Decimal> {
    let from = require(conn, from)?;
    let to = require(conn, to)?;
    Ok(analytics::convert(amount, &from, &to)?)
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let c = NewCurrency {
                code: sub.get_one::<String>("code").unwrap().clone(),
                name: sub.get_one::<String>("name").unwrap().clone(),
                symbol: sub.get_one::<String>("symbol").unwrap().clone(),
                exchange_rate: parse_decimal(sub.get_one::<String>("rate").unwrap())?,
                sort_order: None,
            };
            insert(conn, &c)?;
            println!("Added currency {}", c.code.to_uppercase());
        }
        Some(("list", sub)) => {
            let data = list(conn, sub.get_flag("active"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|c| {
                        vec![
                            c.code,
                            c.name,
                            c.symbol,
                            c.exchange_rate.to_string(),
                            if c.is_base { "*" } else { "" }.into(),
                            if c.is_active { "yes" } else { "no" }.into(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Code", "Name", "Symbol", "Rate", "Base", "Active"], rows)
                );
            }
        }
        Some(("set-base", sub)) => {
            let code = sub.get_one::<String>("code").unwrap().to_uppercase();
            set_base(conn, &code)?;
            println!("Base currency set to {}", code);
        }
        Some(("set-rate", sub)) => {
            let code = sub.get_one::<String>("code").unwrap();
            let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
            update_rate(conn, code, rate)?;
            println!("Rate for {} set to {}", code.to_uppercase(), rate);
        }
        Some(("enable", sub)) => {
            let code = sub.get_one::<String>("code").unwrap();
            set_active(conn, code, true)?;
            println!("Enabled currency {}", code.to_uppercase());
        }
        Some(("disable", sub)) => {
            let code = sub.get_one::<String>("code").unwrap();
            set_active(conn, code, false)?;
            println!("Disabled currency {}", code.to_uppercase());
        }
        Some(("rm", sub)) => {
            let code = sub.get_one::<String>("code").unwrap();
            delete(conn, code)?;
            println!("Removed currency {}", code.to_uppercase());
        }
        Some(("convert", sub)) => {
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let from = sub.get_one::<String>("from").unwrap();
            let to = sub.get_one::<String>("to").unwrap();
            let res = convert(conn, amount, from, to)?;
            let target = require(conn, to)?;
            println!(
                "{} {} -> {}",
                amount,
                from.to_uppercase(),
                target.format_amount(res)
            );
        }
        _ => {}
    }
    Ok(())
}
